//! Embedded TrueType font for the builtin engine.
//!
//! Lines are ordered with the Unicode bidi algorithm and shaped with
//! rustybuzz, so joined Arabic letters and mixed-direction lines come out in
//! the right form. The font is written as a Type0/Identity-H font; its
//! ToUnicode map points every glyph used back at the text it came from, which
//! keeps the PDF searchable and copyable.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use rustybuzz::ttf_parser::GlyphId;
use rustybuzz::{BufferClusterLevel, Direction, Face, UnicodeBuffer};
use unicode_bidi::ParagraphBidiInfo;

use crate::report::RenderError;

/// Checked in order when no font path is configured.
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/local/share/fonts/DejaVuSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BASE_FONT: &str = "ReportSans";

/// Metrics in PDF glyph space (1000 units per em).
#[derive(Debug, Clone, Copy)]
struct FontMetrics {
    units_per_em: f32,
    ascent: i64,
    descent: i64,
    cap_height: i64,
    bbox: [i64; 4],
    italic_angle: f32,
}

pub struct UnicodeFont {
    data: Vec<u8>,
    metrics: FontMetrics,
}

impl fmt::Debug for UnicodeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnicodeFont")
            .field("bytes", &self.data.len())
            .field("units_per_em", &self.metrics.units_per_em)
            .finish()
    }
}

impl UnicodeFont {
    /// Accepts TrueType outlines only; CFF-flavoured OpenType cannot be
    /// embedded as FontFile2.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RenderError> {
        let metrics = {
            let face = Face::from_slice(&data, 0)
                .ok_or_else(|| RenderError::Font("not a TrueType or OpenType font".to_string()))?;
            if face.tables().glyf.is_none() {
                return Err(RenderError::Font("font has no TrueType outlines".to_string()));
            }
            let units_per_em = face.units_per_em() as f32;
            let scale = |v: i16| (f32::from(v) * 1000.0 / units_per_em).round() as i64;
            let bbox = face.global_bounding_box();
            FontMetrics {
                units_per_em,
                ascent: scale(face.ascender()),
                descent: scale(face.descender()),
                cap_height: scale(face.capital_height().unwrap_or(face.ascender())),
                bbox: [scale(bbox.x_min), scale(bbox.y_min), scale(bbox.x_max), scale(bbox.y_max)],
                italic_angle: face.italic_angle(),
            }
        };
        Ok(Self { data, metrics })
    }

    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path)
            .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        Self::from_bytes(data).map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))
    }

    /// First usable font among [`FONT_CANDIDATES`].
    pub fn discover() -> Option<(PathBuf, Self)> {
        FONT_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .filter(|path| path.is_file())
            .find_map(|path| match Self::load(&path) {
                Ok(font) => Some((path, font)),
                Err(e) => {
                    log::warn!("Skipping font {e}");
                    None
                }
            })
    }

    pub(super) fn shaper(&self) -> Result<Shaper<'_>, RenderError> {
        let face = Face::from_slice(&self.data, 0)
            .ok_or_else(|| RenderError::Font("font data no longer parses".to_string()))?;
        Ok(Shaper {
            face,
            units_per_em: self.metrics.units_per_em,
            usage: GlyphUsage::default(),
        })
    }

    /// Add the font program and its dictionaries to `doc`; returns the Type0
    /// font to reference from page resources.
    pub(super) fn embed(&self, doc: &mut Document, usage: &GlyphUsage) -> ObjectId {
        let m = self.metrics;
        let font_file = doc.add_object(Stream::new(
            dictionary! { "Length1" => self.data.len() as i64 },
            self.data.clone(),
        ));
        let descriptor = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => BASE_FONT,
            "Flags" => 32_i64,
            "FontBBox" => m.bbox.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
            "ItalicAngle" => m.italic_angle,
            "Ascent" => m.ascent,
            "Descent" => m.descent,
            "CapHeight" => m.cap_height,
            "StemV" => 80_i64,
            "FontFile2" => font_file,
        });

        let mut widths: Vec<Object> = Vec::with_capacity(usage.widths.len() * 2);
        for (&id, &width) in &usage.widths {
            widths.push(Object::Integer(i64::from(id)));
            widths.push(Object::Array(vec![Object::Integer(width)]));
        }
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => BASE_FONT,
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0_i64,
            },
            "FontDescriptor" => descriptor,
            "CIDToGIDMap" => "Identity",
            "DW" => 1000_i64,
            "W" => widths,
        });

        let to_unicode = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(usage)));
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => BASE_FONT,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant)],
            "ToUnicode" => to_unicode,
        })
    }
}

/// One glyph placed relative to the start of its line, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PlacedGlyph {
    pub id: u16,
    pub x: f32,
    pub y: f32,
}

/// Glyphs drawn so far, with the text each one stands for and its advance.
#[derive(Debug, Default)]
pub(super) struct GlyphUsage {
    text: BTreeMap<u16, String>,
    widths: BTreeMap<u16, i64>,
}

pub(super) struct Shaper<'a> {
    face: Face<'a>,
    units_per_em: f32,
    usage: GlyphUsage,
}

impl Shaper<'_> {
    /// Glyphs are returned in reading order so text extraction yields the
    /// logical string; their `x` positions are visual.
    pub fn shape(&mut self, text: &str, size: f32) -> Vec<PlacedGlyph> {
        if text.is_empty() {
            return Vec::new();
        }
        let scale = size / self.units_per_em;
        let bidi = ParagraphBidiInfo::new(text, None);
        let (levels, runs) = bidi.visual_runs(0..text.len());

        let mut pen = 0.0_f32;
        let mut placed: Vec<(usize, PlacedGlyph)> = Vec::new();
        for run in runs {
            let slice = &text[run.clone()];
            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(slice);
            // Marks keep their own clusters, so they stay extractable.
            buffer.set_cluster_level(BufferClusterLevel::MonotoneCharacters);
            buffer.set_direction(if levels[run.start].is_rtl() {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            });
            let shaped = rustybuzz::shape(&self.face, &[], buffer);

            let starts: BTreeSet<usize> =
                shaped.glyph_infos().iter().map(|info| info.cluster as usize).collect();
            let mut labelled: HashSet<usize> = HashSet::new();
            for (info, pos) in shaped.glyph_infos().iter().zip(shaped.glyph_positions()) {
                let id = info.glyph_id as u16;
                let start = info.cluster as usize;
                let end = starts.range(start + 1..).next().copied().unwrap_or(slice.len());
                let source = if labelled.insert(start) { &slice[start..end] } else { "" };
                self.record(id, source);
                placed.push((
                    run.start + start,
                    PlacedGlyph {
                        id,
                        x: pen + pos.x_offset as f32 * scale,
                        y: pos.y_offset as f32 * scale,
                    },
                ));
                pen += pos.x_advance as f32 * scale;
            }
        }

        placed.sort_by_key(|(order, _)| *order);
        placed.into_iter().map(|(_, glyph)| glyph).collect()
    }

    fn record(&mut self, id: u16, source: &str) {
        let units_per_em = self.units_per_em;
        let advance = self.face.glyph_hor_advance(GlyphId(id)).unwrap_or(0);
        self.usage
            .widths
            .entry(id)
            .or_insert_with(|| (f32::from(advance) * 1000.0 / units_per_em).round() as i64);
        let text = self.usage.text.entry(id).or_default();
        if text.is_empty() && !source.is_empty() {
            *text = source.to_string();
        }
    }

    pub fn finish(self) -> GlyphUsage {
        self.usage
    }
}

/// Glyphs with no text of their own (the tail of a multi-glyph cluster) map
/// to U+FFFD.
fn to_unicode_cmap(usage: &GlyphUsage) -> Vec<u8> {
    let entries: Vec<String> = usage
        .text
        .iter()
        .map(|(id, text)| {
            let target: String = if text.is_empty() {
                "FFFD".to_string()
            } else {
                text.encode_utf16().map(|unit| format!("{unit:04X}")).collect()
            };
            format!("<{id:04X}> <{target}>")
        })
        .collect();

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );
    // bfchar blocks hold at most 100 entries.
    for block in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", block.len()));
        for entry in block {
            cmap.push_str(entry);
            cmap.push('\n');
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap.into_bytes()
}
