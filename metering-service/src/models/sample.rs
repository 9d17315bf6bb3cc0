//! Resource sample model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One function's consumption during one hour bucket.
///
/// Produced by the external metering feed and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSample {
    pub timestamp: DateTime<Utc>,
    pub invocations: u64,
    pub duration_p95_ms: u64,
    pub cold_starts: u64,
    pub cpu_core_ms: u64,
    pub ram_mb_sec: u64,
}

impl ResourceSample {
    /// Copy of the sample with its timestamp truncated to the hour bucket.
    pub fn bucketed(mut self) -> Self {
        self.timestamp = hour_bucket(self.timestamp);
        self
    }
}

/// Truncate a timestamp to the start of its UTC hour.
pub fn hour_bucket(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(3600), 0).unwrap_or(ts)
}

/// A named function's chronologically ordered samples and the plan it bills against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionUsageRow {
    pub subject_id: String,
    pub function_name: String,
    pub plan: String,
    pub samples: Vec<ResourceSample>,
}

/// Input for appending samples from the metering feed.
#[derive(Debug, Clone)]
pub struct SampleBatch {
    pub subject_id: String,
    pub function_name: String,
    pub plan: String,
    pub samples: Vec<ResourceSample>,
}
