//! Input validation helpers
//!
//! Request DTOs carry `validator` derives; handlers call [`validate_request`]
//! so failures come back as the unified `ValidationFailed` error with the
//! offending field names in `details.fields`.

use validator::Validate;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Registration, session, trainer, branch, package and actor ids
pub const MAX_ID_LEN: usize = 64;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Run the `validator` derive of a request body
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request.validate().map_err(|errors| {
        let mut fields: Vec<String> = errors
            .errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        AppError::validation(format!("Invalid request body: {}", fields.join(", ")))
            .with_detail("fields", fields)
    })
}
