//! Runtime configuration, read from the environment (and `.env` via dotenvy).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::review::{RATING_MAX, RATING_MIN};
use crate::report::tier::TierThresholds;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing required setting {key}"),
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "Invalid value {value:?} for {key}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineKind {
    Builtin,
    Chromium { executable: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub to: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppSettings {
    pub api_url: String,
    pub phone_number_id: String,
    pub token: String,
    pub recipient: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub static_dir: String,
    pub reviews_threshold: u32,
    pub recent_limit: i64,
    pub hotel_name: String,
    pub tiers: TierThresholds,
    pub engine: EngineKind,
    /// TrueType font for the builtin engine; searched for when unset.
    pub pdf_font: Option<PathBuf>,
    pub email: Option<EmailSettings>,
    pub whatsapp: Option<WhatsAppSettings>,
    pub http_timeout: Duration,
}

const DEFAULT_WHATSAPP_API: &str = "https://graph.facebook.com/v19.0";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let reviews_threshold = parse_positive(&get, "REVIEWS_THRESHOLD", 1)?;
        let recent_limit = parse_positive(&get, "REPORT_RECENT_LIMIT", 5)? as i64;
        let http_timeout = Duration::from_secs(parse_positive(&get, "HTTP_TIMEOUT_SECS", 30)? as u64);

        let tiers = parse_tiers(&get)?;

        let engine = match get("RENDER_ENGINE").as_deref().unwrap_or("builtin") {
            "builtin" => EngineKind::Builtin,
            "chromium" => EngineKind::Chromium {
                executable: get("CHROMIUM_PATH").unwrap_or_else(|| "chromium".to_string()),
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "RENDER_ENGINE",
                    value: other.to_string(),
                    reason: "expected 'builtin' or 'chromium'".to_string(),
                });
            }
        };

        let email = match (get("EMAIL_API_URL"), get("EMAIL_API_KEY"), get("EMAIL_FROM"), get("EMAIL_TO")) {
            (Some(api_url), Some(api_key), Some(from), Some(to)) => {
                let to: Vec<String> = to
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if to.is_empty() {
                    None
                } else {
                    Some(EmailSettings { api_url, api_key, from, to })
                }
            }
            _ => None,
        };

        let whatsapp = match (
            get("WHATSAPP_PHONE_NUMBER_ID"),
            get("WHATSAPP_TOKEN"),
            get("WHATSAPP_RECIPIENT"),
        ) {
            (Some(phone_number_id), Some(token), Some(recipient)) => Some(WhatsAppSettings {
                api_url: get("WHATSAPP_API_URL").unwrap_or_else(|| DEFAULT_WHATSAPP_API.to_string()),
                phone_number_id,
                token,
                recipient,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "./static".to_string()),
            reviews_threshold,
            recent_limit,
            hotel_name: get("HOTEL_NAME").unwrap_or_else(|| "Panorama Hotel".to_string()),
            tiers,
            engine,
            pdf_font: get("PDF_FONT_PATH").map(PathBuf::from),
            email,
            whatsapp,
            http_timeout,
        })
    }
}

fn parse_positive<G>(get: &G, key: &'static str, default: u32) -> Result<u32, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected a positive integer".to_string(),
        }),
    }
}

/// `TIER_EXCELLENT`, `TIER_GOOD` and `TIER_FAIR` override the default lower
/// bounds. Each must lie within the rating scale and they must descend.
fn parse_tiers<G>(get: &G) -> Result<TierThresholds, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let defaults = TierThresholds::default();
    let tiers = TierThresholds {
        excellent: parse_score(get, "TIER_EXCELLENT", defaults.excellent)?,
        good: parse_score(get, "TIER_GOOD", defaults.good)?,
        fair: parse_score(get, "TIER_FAIR", defaults.fair)?,
    };

    let out_of_order = |key: &'static str, value: f64, above: &str| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: format!("must be below the {above} threshold"),
    };
    if tiers.good >= tiers.excellent {
        return Err(out_of_order("TIER_GOOD", tiers.good, "excellent"));
    }
    if tiers.fair >= tiers.good {
        return Err(out_of_order("TIER_FAIR", tiers.fair, "good"));
    }
    Ok(tiers)
}

fn parse_score<G>(get: &G, key: &'static str, default: f64) -> Result<f64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    let range = f64::from(RATING_MIN)..=f64::from(RATING_MAX);
    match raw.parse::<f64>() {
        Ok(score) if range.contains(&score) => Ok(score),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: format!("expected a score between {RATING_MIN} and {RATING_MAX}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_is_set() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/reviews")]).unwrap();
        assert_eq!(config.reviews_threshold, 1);
        assert_eq!(config.recent_limit, 5);
        assert_eq!(config.engine, EngineKind::Builtin);
        assert_eq!(config.hotel_name, "Panorama Hotel");
        assert!(config.email.is_none());
        assert!(config.whatsapp.is_none());
        assert_eq!(config.tiers, TierThresholds::default());
        assert!(config.pdf_font.is_none());
    }

    #[test]
    fn tier_thresholds_come_from_the_environment() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("TIER_EXCELLENT", "4.8"),
            ("TIER_GOOD", "4"),
            ("TIER_FAIR", "3"),
        ])
        .unwrap();
        assert_eq!(config.tiers, TierThresholds { excellent: 4.8, good: 4.0, fair: 3.0 });
        assert_eq!(config.tiers.classify(Some(4.6)), crate::report::tier::RatingTier::Good);

        // Unset keys keep their defaults.
        let config = config_from(&[("DATABASE_URL", "postgres://x"), ("TIER_FAIR", "2")]).unwrap();
        assert_eq!(config.tiers, TierThresholds { fair: 2.0, ..TierThresholds::default() });
    }

    #[test]
    fn tier_thresholds_must_descend_within_the_scale() {
        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("TIER_GOOD", "4.7")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TIER_GOOD", .. }));

        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("TIER_FAIR", "3.5")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TIER_FAIR", .. }));

        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("TIER_EXCELLENT", "6")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TIER_EXCELLENT", .. }));

        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("TIER_FAIR", "NaN")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TIER_FAIR", .. }));
    }

    #[test]
    fn pdf_font_path_is_optional() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("PDF_FONT_PATH", "/opt/fonts/NotoNaskhArabic-Regular.ttf"),
        ])
        .unwrap();
        assert_eq!(
            config.pdf_font,
            Some(PathBuf::from("/opt/fonts/NotoNaskhArabic-Regular.ttf"))
        );
    }

    #[test]
    fn database_url_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("REVIEWS_THRESHOLD", "0")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "REVIEWS_THRESHOLD", .. }));
    }

    #[test]
    fn channels_enable_only_when_complete() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("EMAIL_API_URL", "https://mail.example.com/emails"),
            ("EMAIL_API_KEY", "key"),
            ("EMAIL_FROM", "reports@example.com"),
            ("EMAIL_TO", "gm@example.com, ops@example.com"),
            ("WHATSAPP_TOKEN", "token"),
        ])
        .unwrap();
        let email = config.email.unwrap();
        assert_eq!(email.to, vec!["gm@example.com", "ops@example.com"]);
        assert!(config.whatsapp.is_none());
    }

    #[test]
    fn chromium_engine_uses_configured_path() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("RENDER_ENGINE", "chromium"),
            ("CHROMIUM_PATH", "/usr/bin/chromium-browser"),
        ])
        .unwrap();
        assert_eq!(
            config.engine,
            EngineKind::Chromium { executable: "/usr/bin/chromium-browser".to_string() }
        );
    }
}
