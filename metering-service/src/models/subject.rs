//! Subject identifiers issued by the external identity system.

use crate::error::{BillingError, Result};

/// Longest subject id accepted.
pub const MAX_SUBJECT_ID_LEN: usize = 128;

/// Subject ids are opaque but must be non-blank, bounded and free of
/// whitespace or control characters.
pub fn validate_subject_id(subject_id: &str) -> Result<()> {
    if subject_id.is_empty() {
        return Err(BillingError::validation("subject id must not be empty"));
    }
    if subject_id.len() > MAX_SUBJECT_ID_LEN {
        return Err(BillingError::validation(format!(
            "subject id exceeds {} characters",
            MAX_SUBJECT_ID_LEN
        )));
    }
    if subject_id
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(BillingError::validation("malformed subject id"));
    }
    Ok(())
}
