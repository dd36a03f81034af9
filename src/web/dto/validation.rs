//! Validated JSON extraction and field validators.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::web::error::ApiError;

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON becomes a 400; rule violations become a 422 with
/// per-field details.
///
/// ```ignore
/// use pinpin::web::dto::ValidatedJson;
///
/// async fn mint_keys(
///     ValidatedJson(req): ValidatedJson<MintKeysRequest>,
/// ) -> Result<Json<ApiResponse<MintKeysResponse>>, ApiError> {
///     // req.count is within 1..=100 here
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {e}")))?;

        value.validate().map_err(ApiError::from_validation_errors)?;
        Ok(ValidatedJson(value))
    }
}

/// Reject control characters other than line breaks and tabs.
pub fn no_control_chars(value: &str) -> Result<(), ValidationError> {
    let bad = value
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'));
    if bad {
        return Err(ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Reject blank strings.
pub fn not_empty_trimmed(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(
            ValidationError::new("not_empty_trimmed").with_message("Must not be empty".into())
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_control_chars() {
        assert!(no_control_chars("Back soon").is_ok());
        assert!(no_control_chars("Line 1\r\nLine 2\tend").is_ok());
        assert!(no_control_chars("nul\x00").is_err());
        assert!(no_control_chars("esc\x1b[0m").is_err());
    }

    #[test]
    fn test_not_empty_trimmed() {
        assert!(not_empty_trimmed("Alice").is_ok());
        assert!(not_empty_trimmed("  Alice ").is_ok());
        assert!(not_empty_trimmed("").is_err());
        assert!(not_empty_trimmed(" \t\n").is_err());
    }
}
