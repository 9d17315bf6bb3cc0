use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;

/// JSON request body whose parse failures reject with
/// `AppError::ValidationError` and the standard error body.
///
/// Field validation stays in the handler so role checks run first.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use chrono::NaiveDate;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct DateBody {
        date: NaiveDate,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_well_formed_body_is_extracted() {
        let JsonBody(body) =
            JsonBody::<DateBody>::from_request(json_request(r#"{"date":"2024-02-29"}"#), &())
                .await
                .unwrap();
        assert_eq!(body.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_validation_error() {
        let result = JsonBody::<DateBody>::from_request(json_request("{not json"), &()).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_impossible_date_maps_to_422() {
        let rejection =
            JsonBody::<DateBody>::from_request(json_request(r#"{"date":"2024-02-30"}"#), &())
                .await
                .err()
                .unwrap();
        assert_eq!(
            rejection.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
