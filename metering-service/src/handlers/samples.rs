use crate::dtos::{IngestSamplesRequest, IngestSamplesResponse};
use crate::middleware::SubjectContext;
use crate::models::SampleBatch;
use crate::startup::AppState;
use crate::utils::JsonBody;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Metering feed entry point. Samples for hours already on record are
/// dropped, so `stored` may be lower than `received`.
#[tracing::instrument(skip(state, ctx, request), fields(function = %request.function_name))]
pub async fn ingest_samples(
    State(state): State<AppState>,
    ctx: SubjectContext,
    Path(subject_id): Path<String>,
    JsonBody(request): JsonBody<IngestSamplesRequest>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    request.validate()?;

    let received = request.samples.len();
    let stored = state
        .usage
        .ingest(SampleBatch {
            subject_id,
            function_name: request.function_name,
            plan: request.plan,
            samples: request.samples,
        })
        .await?;

    Ok(Json(IngestSamplesResponse { received, stored }))
}
