//! In-process A4 layout of the report with lopdf.
//!
//! With a [`UnicodeFont`] every script the font covers is drawn as shaped
//! glyphs. Without one the engine falls back to the standard Helvetica
//! fonts, which only cover Latin-1.

pub mod font;

use std::sync::Arc;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};

use super::{PrintJob, RenderEngine, RenderSession};
use crate::report::RenderError;
use crate::report::document::{DimensionLine, ReportDocument};
use font::{GlyphUsage, Shaper};

pub use font::UnicodeFont;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const TEXT_GREY: (f32, f32, f32) = (0.38, 0.49, 0.55);
const TEXT_DARK: (f32, f32, f32) = (0.15, 0.2, 0.22);
const SUGGESTION_WIDTH: usize = 90;
const HEADER_WIDTH: usize = 80;
const UNICODE_FONT: &str = "U1";

#[derive(Debug, Default)]
pub struct BuiltinPdfEngine {
    font: Option<Arc<UnicodeFont>>,
}

impl BuiltinPdfEngine {
    pub fn with_font(font: Arc<UnicodeFont>) -> Self {
        Self { font: Some(font) }
    }

    /// Uses the first installed candidate font, or the standard fonts when
    /// none is found.
    pub fn discover() -> Self {
        match UnicodeFont::discover() {
            Some((path, font)) => {
                log::info!("PDF font: {}", path.display());
                Self::with_font(Arc::new(font))
            }
            None => {
                log::warn!("No Unicode PDF font found; non-Latin text will print as '?'");
                Self::default()
            }
        }
    }

    pub fn has_unicode_font(&self) -> bool {
        self.font.is_some()
    }
}

#[async_trait]
impl RenderEngine for BuiltinPdfEngine {
    fn name(&self) -> &'static str {
        "builtin"
    }

    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Ok(Box::new(BuiltinSession {
            font: self.font.clone(),
            laid_out: None,
        }))
    }
}

pub struct BuiltinSession {
    font: Option<Arc<UnicodeFont>>,
    laid_out: Option<LaidOut>,
}

struct LaidOut {
    pages: Vec<Vec<Operation>>,
    glyphs: Option<GlyphUsage>,
}

#[async_trait]
impl RenderSession for BuiltinSession {
    async fn load(&mut self, job: &PrintJob<'_>) -> Result<(), RenderError> {
        self.laid_out = Some(layout(job.document, self.font.as_deref())?);
        Ok(())
    }

    async fn export(&mut self) -> Result<Vec<u8>, RenderError> {
        let laid_out = self
            .laid_out
            .take()
            .ok_or_else(|| RenderError::Export("no content loaded".to_string()))?;
        assemble(laid_out, self.font.as_deref())
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.laid_out = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weight {
    Regular,
    Bold,
}

enum Typeface<'a> {
    Standard,
    Unicode(Shaper<'a>),
}

/// Top-down writer that starts a new page when the cursor reaches the margin.
struct PageWriter<'a> {
    pages: Vec<Vec<Operation>>,
    y: f32,
    typeface: Typeface<'a>,
}

impl<'a> PageWriter<'a> {
    fn new(typeface: Typeface<'a>) -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
            typeface,
        }
    }

    fn advance(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.y -= height;
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // `pages` is never empty.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn text(&mut self, x: f32, weight: Weight, size: f32, color: (f32, f32, f32), text: &str) {
        let text = printable(text);
        let y = self.y;
        let fill = Operation::new("rg", vec![color.0.into(), color.1.into(), color.2.into()]);
        let ops = match &mut self.typeface {
            Typeface::Standard => {
                let font = match weight {
                    Weight::Regular => "F1",
                    Weight::Bold => "F2",
                };
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![font.into(), size.into()]),
                    fill,
                    Operation::new("Td", vec![x.into(), y.into()]),
                    Operation::new("Tj", vec![Object::string_literal(to_win_ansi(&text))]),
                    Operation::new("ET", vec![]),
                ]
            }
            Typeface::Unicode(shaper) => {
                let glyphs = shaper.shape(&text, size);
                let mut ops = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![UNICODE_FONT.into(), size.into()]),
                    fill,
                ];
                // One face serves both weights; bold is filled and stroked.
                match weight {
                    Weight::Bold => ops.extend([
                        Operation::new("RG", vec![color.0.into(), color.1.into(), color.2.into()]),
                        Operation::new("w", vec![(size * 0.04).into()]),
                        Operation::new("Tr", vec![2.into()]),
                    ]),
                    Weight::Regular => ops.push(Operation::new("Tr", vec![0.into()])),
                }
                for glyph in glyphs {
                    ops.push(Operation::new(
                        "Tm",
                        vec![
                            1.into(),
                            0.into(),
                            0.into(),
                            1.into(),
                            (x + glyph.x).into(),
                            (y + glyph.y).into(),
                        ],
                    ));
                    ops.push(Operation::new(
                        "Tj",
                        vec![Object::String(glyph.id.to_be_bytes().to_vec(), StringFormat::Hexadecimal)],
                    ));
                }
                ops.push(Operation::new("ET", vec![]));
                ops
            }
        };
        self.ops().extend(ops);
    }

    fn rect(&mut self, x: f32, y_offset: f32, width: f32, height: f32, color: (f32, f32, f32)) {
        let y = self.y + y_offset;
        self.ops().extend([
            Operation::new("rg", vec![color.0.into(), color.1.into(), color.2.into()]),
            Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]),
            Operation::new("f", vec![]),
        ]);
    }

    fn line(&mut self, height: f32, weight: Weight, size: f32, color: (f32, f32, f32), text: &str) {
        self.advance(height);
        self.text(MARGIN, weight, size, color, text);
    }

    fn dimension_row(&mut self, line: &DimensionLine) {
        self.advance(18.0);
        let tier = line.tier.rgb();
        self.text(MARGIN, Weight::Regular, 11.0, TEXT_DARK, &line.label);
        self.text(230.0, Weight::Regular, 11.0, TEXT_DARK, &line.mean_display);
        self.text(300.0, Weight::Bold, 11.0, tier, &line.tier_label);
        self.rect(400.0, -1.0, 140.0, 9.0, (0.93, 0.93, 0.93));
        if line.bar_percent > 0 {
            self.rect(400.0, -1.0, 1.4 * line.bar_percent as f32, 9.0, tier);
        }
    }

    fn finish(self) -> LaidOut {
        let glyphs = match self.typeface {
            Typeface::Standard => None,
            Typeface::Unicode(shaper) => Some(shaper.finish()),
        };
        LaidOut { pages: self.pages, glyphs }
    }
}

fn layout(doc: &ReportDocument, font: Option<&UnicodeFont>) -> Result<LaidOut, RenderError> {
    let typeface = match font {
        Some(font) => Typeface::Unicode(font.shaper()?),
        None => Typeface::Standard,
    };
    let mut w = PageWriter::new(typeface);

    w.line(20.0, Weight::Bold, 20.0, TEXT_DARK, &doc.title);
    w.line(16.0, Weight::Regular, 10.0, TEXT_GREY, &format!("Generated {}", doc.generated_at));
    w.advance(10.0);
    w.line(18.0, Weight::Bold, 13.0, TEXT_DARK, &format!("Total reviews: {}", doc.total));
    w.line(
        18.0,
        Weight::Bold,
        13.0,
        doc.overall.tier.rgb(),
        &format!(
            "{}: {} ({})",
            doc.overall.label, doc.overall.mean_display, doc.overall.tier_label
        ),
    );
    w.advance(12.0);

    w.advance(18.0);
    w.text(MARGIN, Weight::Bold, 11.0, TEXT_DARK, "Service");
    w.text(230.0, Weight::Bold, 11.0, TEXT_DARK, "Average");
    w.text(300.0, Weight::Bold, 11.0, TEXT_DARK, "Rating");
    w.text(400.0, Weight::Bold, 11.0, TEXT_DARK, "Score");
    for line in &doc.dimensions {
        w.dimension_row(line);
    }

    w.advance(14.0);
    w.line(22.0, Weight::Bold, 14.0, TEXT_DARK, "Latest reviews");
    if doc.recent.is_empty() {
        w.line(16.0, Weight::Regular, 10.0, TEXT_GREY, "No recent reviews.");
    }
    for row in &doc.recent {
        w.line(
            16.0,
            Weight::Bold,
            10.0,
            TEXT_DARK,
            &truncate(
                &format!("{}  |  {}  |  {}", row.submitted_at, row.room, row.guest),
                HEADER_WIDTH,
            ),
        );
        w.advance(14.0);
        w.text(MARGIN + 12.0, Weight::Regular, 10.0, TEXT_DARK, "Average:");
        w.text(
            MARGIN + 60.0,
            Weight::Bold,
            10.0,
            row.tier.rgb(),
            &format!("{} ({})", row.average_display, row.tier_label),
        );
        for chunk in wrap(&format!("Suggestions: {}", row.suggestions), SUGGESTION_WIDTH) {
            w.advance(14.0);
            w.text(MARGIN + 12.0, Weight::Regular, 10.0, TEXT_GREY, &chunk);
        }
        w.advance(6.0);
    }

    Ok(w.finish())
}

fn assemble(laid_out: LaidOut, font: Option<&UnicodeFont>) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let fonts = match (font, &laid_out.glyphs) {
        (Some(font), Some(glyphs)) => {
            let unicode = font.embed(&mut doc, glyphs);
            dictionary! { UNICODE_FONT => unicode }
        }
        _ => {
            let regular = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            });
            let bold = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica-Bold",
                "Encoding" => "WinAnsiEncoding",
            });
            dictionary! {
                "F1" => regular,
                "F2" => bold,
            }
        }
    };
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(laid_out.pages.len());
    for operations in laid_out.pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Export(format!("content stream: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RenderError::Export(format!("write pdf: {e}")))?;
    Ok(buffer)
}

/// Control characters (line breaks in guest comments included) become spaces.
fn printable(text: &str) -> String {
    text.chars().map(|c| if c.is_control() { ' ' } else { c }).collect()
}

/// Standard Type1 fonts only cover Latin-1; anything else prints as '?'.
fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u32 as u8 } else { b'?' })
        .collect()
}

/// Greedy word wrap by character count. Words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if current_len > 0 && current_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Cut to at most `width` characters, marking the cut with "...".
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
