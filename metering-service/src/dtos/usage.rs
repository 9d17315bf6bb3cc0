use crate::models::ResourceSample;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct UsageParams {
    /// `1h`, `24h` or `last<N>`; defaults to `24h`.
    pub window: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct IngestSamplesRequest {
    #[validate(length(min = 1, max = 256, message = "Function name must be 1-256 characters"))]
    pub function_name: String,
    #[serde(default = "default_plan")]
    pub plan: String,
    #[validate(length(max = 1000, message = "At most 1000 samples per batch"))]
    pub samples: Vec<ResourceSample>,
}

fn default_plan() -> String {
    crate::models::DEFAULT_TARIFF_NAME.to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestSamplesResponse {
    pub received: usize,
    pub stored: u64,
}
