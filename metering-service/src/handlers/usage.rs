use crate::billing::Window;
use crate::dtos::UsageParams;
use crate::middleware::SubjectContext;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

#[tracing::instrument(skip(state, ctx, params))]
pub async fn get_usage_summary(
    State(state): State<AppState>,
    ctx: SubjectContext,
    Path(subject_id): Path<String>,
    Query(params): Query<UsageParams>,
) -> Result<impl IntoResponse, AppError> {
    ctx.authorize_subject(&subject_id)?;

    let window = params
        .window
        .as_deref()
        .map(str::parse::<Window>)
        .transpose()?
        .unwrap_or_default();

    let summary = state
        .usage
        .usage_summary(&subject_id, window, Utc::now())
        .await?;

    Ok(Json(summary))
}
