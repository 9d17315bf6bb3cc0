use super::parse_id;
use crate::dtos::{
    ApproveTariffChangeRequest, CreateTariffChangeRequest, RejectTariffChangeRequest,
    TariffChangeListParams, TariffChangeListResponse, TariffChangeResponse,
};
use crate::middleware::SubjectContext;
use crate::models::{ListTariffRequestsFilter, TariffRequestStatus};
use crate::services::store::page_size;
use crate::startup::AppState;
use crate::utils::JsonBody;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

#[tracing::instrument(skip(state, ctx, request), fields(caller = %ctx.subject_id))]
pub async fn create_tariff_request(
    State(state): State<AppState>,
    ctx: SubjectContext,
    JsonBody(request): JsonBody<CreateTariffChangeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject_id = ctx.acting_for(request.subject_id)?;
    let created = state
        .tariff_requests
        .create(&subject_id, &request.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TariffChangeResponse::from(created)),
    ))
}

pub async fn list_tariff_requests(
    State(state): State<AppState>,
    ctx: SubjectContext,
    Query(params): Query<TariffChangeListParams>,
) -> Result<impl IntoResponse, AppError> {
    let status = params
        .status
        .as_deref()
        .map(|s| {
            TariffRequestStatus::parse(s)
                .ok_or_else(|| AppError::ValidationError(format!("Invalid status: {}", s)))
        })
        .transpose()?;

    let filter = ListTariffRequestsFilter {
        subject_id: ctx.list_scope(params.subject_id)?,
        status,
        page_size: page_size(params.page_size),
    };

    let requests = state.tariff_requests.list(&filter).await?;
    Ok(Json(TariffChangeListResponse {
        requests: requests.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(skip(state, ctx, request))]
pub async fn approve_tariff_request(
    State(state): State<AppState>,
    ctx: SubjectContext,
    Path(request_id): Path<String>,
    JsonBody(request): JsonBody<ApproveTariffChangeRequest>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    let request_id = parse_id(&request_id)?;
    request.validate()?;

    let approved = state
        .tariff_requests
        .approve(request_id, request.tariff.into(), &request.admin_response)
        .await?;

    Ok(Json(TariffChangeResponse::from(approved)))
}

#[tracing::instrument(skip(state, ctx, request))]
pub async fn reject_tariff_request(
    State(state): State<AppState>,
    ctx: SubjectContext,
    Path(request_id): Path<String>,
    JsonBody(request): JsonBody<RejectTariffChangeRequest>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;
    let request_id = parse_id(&request_id)?;

    let rejected = state
        .tariff_requests
        .reject(request_id, &request.admin_response)
        .await?;

    Ok(Json(TariffChangeResponse::from(rejected)))
}
