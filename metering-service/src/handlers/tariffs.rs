use crate::dtos::{ActivateTariffRequest, TariffInput, TariffListResponse, TariffResponse};
use crate::middleware::SubjectContext;
use crate::startup::AppState;
use crate::utils::JsonBody;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Active tariff of a subject, falling back to the default tariff.
#[tracing::instrument(skip(state, ctx))]
pub async fn get_tariff(
    State(state): State<AppState>,
    ctx: SubjectContext,
    Path(subject_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ctx.authorize_subject(&subject_id)?;
    let tariff = state.usage.tariff_for(&subject_id).await?;
    Ok(Json(TariffResponse::from(tariff)))
}

#[tracing::instrument(skip(state, ctx, request))]
pub async fn activate_tariff(
    State(state): State<AppState>,
    ctx: SubjectContext,
    Path(subject_id): Path<String>,
    JsonBody(request): JsonBody<ActivateTariffRequest>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    let tariff = state
        .catalog
        .activate(&subject_id, request.tariff_id)
        .await?;
    Ok(Json(TariffResponse::from(tariff)))
}

#[tracing::instrument(skip(state, ctx, request), fields(name = %request.name))]
pub async fn create_tariff(
    State(state): State<AppState>,
    ctx: SubjectContext,
    JsonBody(request): JsonBody<TariffInput>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    request.validate()?;

    let tariff = state.catalog.create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(TariffResponse::from(tariff))))
}

pub async fn list_tariffs(
    State(state): State<AppState>,
    ctx: SubjectContext,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    let tariffs = state.catalog.list().await?;
    Ok(Json(TariffListResponse {
        tariffs: tariffs.into_iter().map(Into::into).collect(),
    }))
}
