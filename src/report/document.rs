//! The semantic report model. The PDF and the email body are both rendered
//! from a `ReportDocument`, never from the raw statistics.

use chrono::{DateTime, Utc};

use crate::models::review::{Dimension, RATING_MAX, Review};
use super::ReportSettings;
use super::aggregator::ReportStatistics;
use super::tier::RatingTier;

pub const NO_VALUE: &str = "N/A";

/// One rated service in the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionLine {
    pub label: String,
    pub mean: Option<f64>,
    pub mean_display: String,
    pub tier: RatingTier,
    pub tier_label: String,
    pub tier_color: String,
    /// Share of the maximum score, 0..=100, for the bar chart.
    pub bar_percent: u32,
}

/// One recent submission in the context table.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentLine {
    pub submitted_at: String,
    pub room: String,
    pub guest: String,
    pub average_display: String,
    pub tier: RatingTier,
    pub tier_label: String,
    pub tier_color: String,
    pub suggestions: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub hotel_name: String,
    pub generated_at: String,
    pub total: i64,
    pub overall: DimensionLine,
    pub dimensions: Vec<DimensionLine>,
    pub recent: Vec<RecentLine>,
}

impl ReportDocument {
    pub fn build(
        stats: &ReportStatistics,
        recent: &[Review],
        settings: &ReportSettings,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let line = |label: &str, mean: Option<f64>| {
            let tier = settings.tiers.classify(mean);
            DimensionLine {
                label: label.to_string(),
                mean,
                mean_display: format_mean(mean),
                tier,
                tier_label: tier.label().to_string(),
                tier_color: tier.color().to_string(),
                bar_percent: bar_percent(mean),
            }
        };

        let dimensions = Dimension::ALL
            .iter()
            .map(|d| line(d.label(), stats.averages.get(*d)))
            .collect();

        let recent = recent
            .iter()
            .map(|review| {
                let average = review.ratings.personal_average();
                let tier = settings.tiers.classify(average);
                RecentLine {
                    submitted_at: review.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    room: describe_room(review.floor, review.room_number),
                    guest: review
                        .guest_name
                        .clone()
                        .unwrap_or_else(|| "Anonymous".to_string()),
                    average_display: format_mean(average),
                    tier,
                    tier_label: tier.label().to_string(),
                    tier_color: tier.color().to_string(),
                    suggestions: review
                        .suggestions
                        .clone()
                        .unwrap_or_else(|| "-".to_string()),
                }
            })
            .collect();

        Self {
            title: format!("{} Guest Survey Report", settings.hotel_name),
            hotel_name: settings.hotel_name.clone(),
            generated_at: generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            total: stats.total,
            overall: line("Overall satisfaction", stats.averages.overall()),
            dimensions,
            recent,
        }
    }
}

/// Two decimals, or `N/A` when there is nothing to show.
pub fn format_mean(mean: Option<f64>) -> String {
    match mean {
        Some(m) if m.is_finite() => format!("{:.2}", m),
        _ => NO_VALUE.to_string(),
    }
}

fn bar_percent(mean: Option<f64>) -> u32 {
    match mean {
        Some(m) if m.is_finite() => {
            ((m / RATING_MAX as f64) * 100.0).round().clamp(0.0, 100.0) as u32
        }
        _ => 0,
    }
}

fn describe_room(floor: Option<i32>, room: Option<i32>) -> String {
    match (floor, room) {
        (Some(f), Some(r)) => format!("Floor {f}, Room {r}"),
        (None, Some(r)) => format!("Room {r}"),
        (Some(f), None) => format!("Floor {f}"),
        (None, None) => "-".to_string(),
    }
}
