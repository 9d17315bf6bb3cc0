//! Detailization request tracker.
//!
//! Validates and records export requests. Status changes belong to the export
//! pipeline; nothing here advances a request.

use crate::error::{BillingError, Result};
use crate::models::{
    validate_subject_id, DetailizationRequest, DetailizationStatus, ListDetailizationFilter,
};
use crate::services::metrics::{record_detailization_request, record_error};
use crate::services::store::DetailizationStore;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct DetailizationTracker {
    requests: Arc<dyn DetailizationStore>,
}

impl DetailizationTracker {
    pub fn new(requests: Arc<dyn DetailizationStore>) -> Self {
        Self { requests }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        subject_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<DetailizationRequest> {
        let result = self.create_inner(subject_id, start_date, end_date).await;
        match &result {
            Ok(_) => record_detailization_request("ok"),
            Err(e) => {
                record_detailization_request(e.kind());
                record_error(e.kind(), "create_detailization");
            }
        }
        result
    }

    async fn create_inner(
        &self,
        subject_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<DetailizationRequest> {
        validate_subject_id(subject_id)?;

        let (start_date, end_date) = match (start_date, end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(BillingError::validation(
                    "start_date and end_date are required",
                ))
            }
        };
        if end_date < start_date {
            return Err(BillingError::validation(format!(
                "end_date {} is before start_date {}",
                end_date, start_date
            )));
        }

        let request = self
            .requests
            .insert_detailization(&DetailizationRequest {
                request_id: Uuid::new_v4(),
                subject_id: subject_id.to_string(),
                start_date,
                end_date,
                status: DetailizationStatus::Pending,
                created_utc: Utc::now(),
            })
            .await?;

        info!(
            request_id = %request.request_id,
            subject_id = %subject_id,
            start_date = %start_date,
            end_date = %end_date,
            "Detailization requested"
        );
        Ok(request)
    }

    pub async fn list(&self, filter: &ListDetailizationFilter) -> Result<Vec<DetailizationRequest>> {
        self.requests.list_detailizations(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::InMemoryStorage;

    fn tracker() -> DetailizationTracker {
        DetailizationTracker::new(Arc::new(InMemoryStorage::new()))
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[tokio::test]
    async fn test_end_before_start_rejected() {
        let result = tracker()
            .create("alice", date(2024, 5, 2), date(2024, 5, 1))
            .await;
        assert!(matches!(result, Err(BillingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_single_day_range_accepted() {
        let request = tracker()
            .create("alice", date(2024, 5, 1), date(2024, 5, 1))
            .await
            .unwrap();
        assert_eq!(request.status, DetailizationStatus::Pending);
        assert_eq!(request.start_date, request.end_date);
    }

    #[tokio::test]
    async fn test_missing_dates_rejected() {
        let t = tracker();
        assert!(matches!(
            t.create("alice", None, date(2024, 5, 1)).await,
            Err(BillingError::Validation(_))
        ));
        assert!(matches!(
            t.create("alice", date(2024, 5, 1), None).await,
            Err(BillingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_newest_first() {
        let t = tracker();
        t.create("alice", date(2024, 1, 1), date(2024, 1, 31))
            .await
            .unwrap();
        t.create("bob", date(2024, 2, 1), date(2024, 2, 2))
            .await
            .unwrap();
        t.create("alice", date(2024, 3, 1), date(2024, 3, 31))
            .await
            .unwrap();

        let listed = t
            .list(&ListDetailizationFilter {
                subject_id: Some("alice".to_string()),
                status: None,
                page_size: 50,
            })
            .await
            .unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].start_date, date(2024, 3, 1).unwrap());
        assert!(listed.iter().all(|r| r.status == DetailizationStatus::Pending));
    }
}
