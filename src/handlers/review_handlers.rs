use actix_web::{HttpResponse, web};

use crate::errors::AppError;
use crate::models::review::{NewReview, ReviewStore};
use crate::report::TriggerController;
use crate::templates_structs::{HealthResponse, SubmitResponse};

/// POST /api/review
///
/// The guest's response never waits on, or reports, the report run that the
/// submission may trigger.
pub async fn submit(
    store: web::Data<dyn ReviewStore>,
    trigger: web::Data<TriggerController>,
    payload: web::Json<NewReview>,
) -> Result<HttpResponse, AppError> {
    let review = payload.into_inner().normalized();

    let errors = review.validate();
    if !errors.is_empty() {
        log::warn!("Rejected survey submission: {}", errors.join("; "));
        return Err(AppError::Validation(errors));
    }

    let id = store.insert(&review).await?;
    log::info!("Review {} saved", id);

    // Fire and forget.
    drop(trigger.on_submission_persisted());

    Ok(HttpResponse::Created().json(SubmitResponse::accepted(id)))
}

/// GET /api/health
pub async fn health(store: web::Data<dyn ReviewStore>) -> Result<HttpResponse, AppError> {
    let reviews = store.count_all().await?;
    Ok(HttpResponse::Ok().json(HealthResponse { status: "ok", reviews }))
}
