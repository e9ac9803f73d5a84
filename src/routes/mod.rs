/**
 * Routes Module
 * API route handlers
 */

pub mod ai;
pub mod auth;
pub mod campaigns;
pub mod contact;
pub mod deployments;
pub mod health;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::error::{ErrorResponse, SuccessResponse};

use regex::Regex;

lazy_static::lazy_static! {
    /// Loose address check; delivery is the real validation.
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

/// Trimmed value, or a validation error naming the field.
pub(crate) fn required(value: &str, field: &str) -> Result<String, crate::error::AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
