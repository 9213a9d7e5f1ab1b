use serde::Serialize;

/// Body returned by the survey intake endpoint, on success and on failure.
#[derive(Serialize, Debug, Clone)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SubmitResponse {
    pub fn accepted(id: i64) -> Self {
        Self {
            success: true,
            message: "Thank you! Your review was received successfully.".to_string(),
            id: Some(id),
            errors: vec![],
        }
    }

    pub fn failed(message: &str, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            id: None,
            errors,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: &'static str,
    pub reviews: i64,
}
