use crate::dtos::{
    CreateDetailizationRequest, DetailizationListParams, DetailizationListResponse,
    DetailizationResponse,
};
use crate::middleware::SubjectContext;
use crate::models::{DetailizationStatus, ListDetailizationFilter};
use crate::services::store::page_size;
use crate::startup::AppState;
use crate::utils::JsonBody;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

#[tracing::instrument(skip(state, ctx, request), fields(caller = %ctx.subject_id))]
pub async fn create_detailization_request(
    State(state): State<AppState>,
    ctx: SubjectContext,
    JsonBody(request): JsonBody<CreateDetailizationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject_id = ctx.acting_for(request.subject_id)?;
    let created = state
        .detailization
        .create(&subject_id, request.start_date, request.end_date)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DetailizationResponse::from(created)),
    ))
}

pub async fn list_detailization_requests(
    State(state): State<AppState>,
    ctx: SubjectContext,
    Query(params): Query<DetailizationListParams>,
) -> Result<impl IntoResponse, AppError> {
    let status = match params.status.as_deref() {
        Some(s) => Some(
            DetailizationStatus::parse(s)
                .ok_or_else(|| AppError::ValidationError(format!("Invalid status: {}", s)))?,
        ),
        None => None,
    };

    let filter = ListDetailizationFilter {
        subject_id: ctx.list_scope(params.subject_id)?,
        status,
        page_size: page_size(params.page_size),
    };

    let requests = state.detailization.list(&filter).await?;
    Ok(Json(DetailizationListResponse {
        requests: requests.into_iter().map(Into::into).collect(),
    }))
}
