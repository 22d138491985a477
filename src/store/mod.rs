//! Owner-scoped persistence for tasks and categories.
//!
//! Every function takes the acting owner and filters on it; a record that
//! belongs to someone else is reported the same way as a missing one.

pub mod category_store;
pub mod task_store;

use crate::error_handler::ServiceError;

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{} cannot be empty.", field)));
    }
    Ok(trimmed.to_string())
}

/// Blank free text is stored as NULL.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
