//! Errors returned by the web API.
//!
//! Every failure leaves the server as
//! `{"error": {"code": "...", "message": "...", "details": {...}}}` with the
//! status implied by the code. Domain errors convert with `?` in handlers.

use std::collections::HashMap;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::{PermissionError, RegistrationError};
use crate::maintenance::EditorError;
use crate::plan::RedeemError;
use crate::PinpinError;

/// Machine-readable error code, serialized in SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    PayloadTooLarge,
    /// Request body failed field validation; carries per-field details.
    ValidationError,
    UnprocessableEntity,
    TooManyRequests,
    InternalError,
    /// The API is closed for maintenance.
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        use ErrorCode::*;
        match self {
            BadRequest => StatusCode::BAD_REQUEST,
            Unauthorized => StatusCode::UNAUTHORIZED,
            Forbidden => StatusCode::FORBIDDEN,
            NotFound => StatusCode::NOT_FOUND,
            Conflict => StatusCode::CONFLICT,
            PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ValidationError | UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Field name to the messages reported for it.
pub type FieldErrors = HashMap<String, Vec<String>>;

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<FieldErrors>,
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Upload bigger than the size cap or the remaining quota.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnprocessableEntity, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TooManyRequests, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Maintenance block; the message is the operator's notice.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn validation(details: FieldErrors) -> Self {
        Self {
            code: ErrorCode::ValidationError,
            message: "Validation failed".to_string(),
            details: Some(details),
        }
    }

    /// Collect `validator` failures into per-field messages. Rules without a
    /// message get a generic one naming the field.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .map(|(field, failures)| {
                let messages = failures
                    .iter()
                    .map(|failure| match &failure.message {
                        Some(message) => message.to_string(),
                        None => format!("Invalid value for {field}"),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self::validation(details)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Log the cause and hide it from the client.
    fn hidden(context: &str, cause: impl fmt::Display) -> Self {
        tracing::error!("{context}: {cause}");
        Self::internal(INTERNAL_MESSAGE)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<PinpinError> for ApiError {
    fn from(err: PinpinError) -> Self {
        match err {
            PinpinError::Auth(msg) => Self::unauthorized(msg),
            PinpinError::NotFound(what) => Self::not_found(format!("{what} not found")),
            PinpinError::Validation(msg) => Self::unprocessable(msg),
            PinpinError::Permission(msg) => Self::forbidden(msg),
            PinpinError::Conflict(msg) => Self::conflict(msg),
            quota @ PinpinError::QuotaExceeded { .. } => Self::payload_too_large(quota.to_string()),
            other => Self::hidden("Internal error", other),
        }
    }
}

impl From<PermissionError> for ApiError {
    fn from(err: PermissionError) -> Self {
        if matches!(err, PermissionError::NotAuthenticated) {
            Self::unauthorized(err.to_string())
        } else {
            Self::forbidden(err.to_string())
        }
    }
}

impl From<EditorError> for ApiError {
    fn from(err: EditorError) -> Self {
        Self::forbidden(err.to_string())
    }
}

impl From<RedeemError> for ApiError {
    fn from(err: RedeemError) -> Self {
        let message = err.to_string();
        match err {
            RedeemError::Empty | RedeemError::InvalidFormat(_) => Self::bad_request(message),
            RedeemError::NotFound => Self::not_found(message),
            RedeemError::AlreadyUsed => Self::conflict(message),
            RedeemError::Backend(source) => {
                tracing::error!("Key redemption failed: {}", source);
                Self::internal(message)
            }
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Validation(e) => Self::unprocessable(e.to_string()),
            RegistrationError::Password(e) => Self::unprocessable(e.to_string()),
            RegistrationError::UsernameExists => Self::conflict(err.to_string()),
            RegistrationError::Database(msg) => Self::hidden("Registration failed", msg),
        }
    }
}
