use crate::middleware::SubjectContext;
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use service_core::error::AppError;

pub async fn platform_overview(
    State(state): State<AppState>,
    ctx: SubjectContext,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    let overview = state.usage.platform_overview(Utc::now()).await?;
    Ok(Json(overview))
}
