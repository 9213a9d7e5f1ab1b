use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest and highest score a guest can give a single service.
pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;

/// The ten services a guest rates on the survey form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Internet,
    Maintenance,
    Reception,
    Bathroom,
    Laundry,
    Security,
    Minimarket,
    Lobby,
    Restaurant,
    Cleanliness,
}

impl Dimension {
    /// Report order.
    pub const ALL: [Dimension; 10] = [
        Dimension::Internet,
        Dimension::Maintenance,
        Dimension::Reception,
        Dimension::Bathroom,
        Dimension::Laundry,
        Dimension::Security,
        Dimension::Minimarket,
        Dimension::Lobby,
        Dimension::Restaurant,
        Dimension::Cleanliness,
    ];

    /// Column name in the `reviews` table and key in the JSON payload.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Internet => "internet",
            Dimension::Maintenance => "maintenance",
            Dimension::Reception => "reception",
            Dimension::Bathroom => "bathroom",
            Dimension::Laundry => "laundry",
            Dimension::Security => "security",
            Dimension::Minimarket => "minimarket",
            Dimension::Lobby => "lobby",
            Dimension::Restaurant => "restaurant",
            Dimension::Cleanliness => "cleanliness",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Internet => "Internet",
            Dimension::Maintenance => "Maintenance",
            Dimension::Reception => "Reception",
            Dimension::Bathroom => "Bathroom",
            Dimension::Laundry => "Laundry",
            Dimension::Security => "Security",
            Dimension::Minimarket => "Minimarket",
            Dimension::Lobby => "Lobby",
            Dimension::Restaurant => "Restaurant",
            Dimension::Cleanliness => "Cleanliness",
        }
    }
}

/// The ten scores of one submission. Any score may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ratings {
    pub internet: Option<i32>,
    pub maintenance: Option<i32>,
    pub reception: Option<i32>,
    pub bathroom: Option<i32>,
    pub laundry: Option<i32>,
    pub security: Option<i32>,
    pub minimarket: Option<i32>,
    pub lobby: Option<i32>,
    pub restaurant: Option<i32>,
    pub cleanliness: Option<i32>,
}

impl Ratings {
    pub fn get(&self, dimension: Dimension) -> Option<i32> {
        match dimension {
            Dimension::Internet => self.internet,
            Dimension::Maintenance => self.maintenance,
            Dimension::Reception => self.reception,
            Dimension::Bathroom => self.bathroom,
            Dimension::Laundry => self.laundry,
            Dimension::Security => self.security,
            Dimension::Minimarket => self.minimarket,
            Dimension::Lobby => self.lobby,
            Dimension::Restaurant => self.restaurant,
            Dimension::Cleanliness => self.cleanliness,
        }
    }

    pub fn set(&mut self, dimension: Dimension, value: Option<i32>) {
        let slot = match dimension {
            Dimension::Internet => &mut self.internet,
            Dimension::Maintenance => &mut self.maintenance,
            Dimension::Reception => &mut self.reception,
            Dimension::Bathroom => &mut self.bathroom,
            Dimension::Laundry => &mut self.laundry,
            Dimension::Security => &mut self.security,
            Dimension::Minimarket => &mut self.minimarket,
            Dimension::Lobby => &mut self.lobby,
            Dimension::Restaurant => &mut self.restaurant,
            Dimension::Cleanliness => &mut self.cleanliness,
        };
        *slot = value;
    }

    /// Mean of the scores this guest actually gave.
    pub fn personal_average(&self) -> Option<f64> {
        let given: Vec<i32> = Dimension::ALL.iter().filter_map(|d| self.get(*d)).collect();
        if given.is_empty() {
            return None;
        }
        Some(given.iter().map(|v| *v as f64).sum::<f64>() / given.len() as f64)
    }
}

/// Per-dimension means across all stored submissions. `None` means no
/// submission scored that dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct RatingAverages {
    pub internet: Option<f64>,
    pub maintenance: Option<f64>,
    pub reception: Option<f64>,
    pub bathroom: Option<f64>,
    pub laundry: Option<f64>,
    pub security: Option<f64>,
    pub minimarket: Option<f64>,
    pub lobby: Option<f64>,
    pub restaurant: Option<f64>,
    pub cleanliness: Option<f64>,
}

impl RatingAverages {
    pub fn get(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::Internet => self.internet,
            Dimension::Maintenance => self.maintenance,
            Dimension::Reception => self.reception,
            Dimension::Bathroom => self.bathroom,
            Dimension::Laundry => self.laundry,
            Dimension::Security => self.security,
            Dimension::Minimarket => self.minimarket,
            Dimension::Lobby => self.lobby,
            Dimension::Restaurant => self.restaurant,
            Dimension::Cleanliness => self.cleanliness,
        }
    }

    pub fn set(&mut self, dimension: Dimension, value: Option<f64>) {
        let slot = match dimension {
            Dimension::Internet => &mut self.internet,
            Dimension::Maintenance => &mut self.maintenance,
            Dimension::Reception => &mut self.reception,
            Dimension::Bathroom => &mut self.bathroom,
            Dimension::Laundry => &mut self.laundry,
            Dimension::Security => &mut self.security,
            Dimension::Minimarket => &mut self.minimarket,
            Dimension::Lobby => &mut self.lobby,
            Dimension::Restaurant => &mut self.restaurant,
            Dimension::Cleanliness => &mut self.cleanliness,
        };
        *slot = value;
    }

    /// Mean of the available dimension means.
    pub fn overall(&self) -> Option<f64> {
        let known: Vec<f64> = Dimension::ALL
            .iter()
            .filter_map(|d| self.get(*d))
            .filter(|v| v.is_finite())
            .collect();
        if known.is_empty() {
            return None;
        }
        Some(known.iter().sum::<f64>() / known.len() as f64)
    }
}

/// Result of the aggregate query: row count plus per-dimension means.
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct ReviewSummary {
    pub total: i64,
    #[sqlx(flatten)]
    pub averages: RatingAverages,
}

/// A stored survey submission.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub date: Option<String>,
    pub floor: Option<i32>,
    pub room_number: Option<i32>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub email: Option<String>,
    #[sqlx(flatten)]
    pub ratings: Ratings,
    pub how_did_you_hear: Option<String>,
    pub suggestions: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Survey payload as posted by the guest-facing form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub date: Option<String>,
    pub floor: Option<i32>,
    pub room_number: Option<i32>,
    pub guest_name: Option<String>,
    #[serde(alias = "guestPhone")]
    pub mobile_number: Option<String>,
    pub email: Option<String>,
    #[serde(flatten)]
    pub ratings: Ratings,
    pub how_did_you_hear: Option<String>,
    #[serde(alias = "suggestions")]
    pub comments: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl NewReview {
    /// Trim text fields and drop empty ones.
    pub fn normalized(self) -> Self {
        Self {
            date: blank_to_none(self.date),
            guest_name: blank_to_none(self.guest_name),
            mobile_number: blank_to_none(self.mobile_number),
            email: blank_to_none(self.email),
            how_did_you_hear: blank_to_none(self.how_did_you_hear),
            comments: blank_to_none(self.comments),
            ..self
        }
    }

    /// Minimal intake checks. Returns one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.floor.is_some_and(|f| f < 0) {
            errors.push("floor must not be negative".to_string());
        }
        if self.room_number.is_some_and(|r| r < 0) {
            errors.push("roomNumber must not be negative".to_string());
        }
        for dimension in Dimension::ALL {
            if let Some(score) = self.ratings.get(dimension) {
                if !(RATING_MIN..=RATING_MAX).contains(&score) {
                    errors.push(format!(
                        "{} must be between {} and {}",
                        dimension.column(),
                        RATING_MIN,
                        RATING_MAX
                    ));
                }
            }
        }

        errors
    }
}
