//! Qualitative rating tiers for a mean score.

/// Label and display colour for a mean score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTier {
    NoData,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl RatingTier {
    pub fn label(self) -> &'static str {
        match self {
            RatingTier::NoData => "No data",
            RatingTier::Poor => "Poor",
            RatingTier::Fair => "Fair",
            RatingTier::Good => "Good",
            RatingTier::Excellent => "Excellent",
        }
    }

    /// Hex colour used by both the PDF and the email body.
    pub fn color(self) -> &'static str {
        match self {
            RatingTier::NoData => "#9e9e9e",
            RatingTier::Poor => "#c62828",
            RatingTier::Fair => "#f9a825",
            RatingTier::Good => "#558b2f",
            RatingTier::Excellent => "#2e7d32",
        }
    }

    /// Colour as RGB fractions for PDF fill operators.
    pub fn rgb(self) -> (f32, f32, f32) {
        let hex = &self.color()[1..];
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0) as f32 / 255.0
        };
        (channel(0), channel(2), channel(4))
    }
}

/// Lower bounds (inclusive) of each tier. Anything below `fair` is poor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierThresholds {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            excellent: 4.5,
            good: 3.5,
            fair: 2.5,
        }
    }
}

impl TierThresholds {
    /// Every input maps to exactly one tier; missing or NaN means map to `NoData`.
    pub fn classify(&self, mean: Option<f64>) -> RatingTier {
        match mean {
            None => RatingTier::NoData,
            Some(m) if m.is_nan() => RatingTier::NoData,
            Some(m) if m >= self.excellent => RatingTier::Excellent,
            Some(m) if m >= self.good => RatingTier::Good,
            Some(m) if m >= self.fair => RatingTier::Fair,
            Some(_) => RatingTier::Poor,
        }
    }
}
