pub mod review_handlers;

use actix_web::{HttpResponse, error, web};

use crate::templates_structs::SubmitResponse;

const MAX_SURVEY_BYTES: usize = 64 * 1024;

/// Malformed JSON gets the same response shape as a validation failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_SURVEY_BYTES)
        .error_handler(|err, _req| {
            let detail = err.to_string();
            log::warn!("Unreadable survey payload: {}", detail);
            let response = HttpResponse::BadRequest()
                .json(SubmitResponse::failed("The survey could not be read.", vec![detail]));
            error::InternalError::from_response(err, response).into()
        })
}

/// Register the survey API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .route("/review", web::post().to(review_handlers::submit))
            .route("/health", web::get().to(review_handlers::health)),
    );
}
