use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

use crate::templates_structs::SubmitResponse;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Validation(Vec<String>),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join("; ")),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(errors) => HttpResponse::BadRequest().json(SubmitResponse::failed(
                "The survey contains invalid values.",
                errors.clone(),
            )),
            AppError::Db(_) => {
                log::error!("{self}");
                HttpResponse::InternalServerError()
                    .json(SubmitResponse::failed("Server error while saving the review.", vec![]))
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}
