use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The main error type for lockgate operations.
///
/// Domain errors map to a stable (status, message) pair on the wire;
/// unexpected failures are logged server-side and surfaced as a generic
/// 500 equivalent.
#[derive(Debug, thiserror::Error)]
pub enum LockgateError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("User with this email address already exists")]
    Conflict,

    /// Wrong email or wrong password; deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(
        "Account is temporarily locked due to too many failed login attempts. Please try again later."
    )]
    Locked,

    #[error("Please verify your email address before logging in")]
    UnverifiedEmail,

    /// Covers both verification and reset tokens, expired or unknown.
    #[error("{0}")]
    InvalidOrExpiredToken(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// A field-level validation failure, returned to the client as-is.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Wire shape for every error response: `success` is always false.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
    #[serde(rename = "needsVerification", skip_serializing_if = "Option::is_none")]
    needs_verification: Option<bool>,
}

impl LockgateError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidOrExpiredToken(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::Conflict
            | Self::InvalidCredentials
            | Self::UnverifiedEmail
            | Self::InvalidOrExpiredToken(_)
            | Self::AlreadyVerified => StatusCode::BAD_REQUEST,
            Self::Locked => StatusCode::LOCKED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::Internal(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message suitable for the client. Client errors (4xx) expose their
    /// actual message; server errors hide details, which are only logged.
    fn safe_message(&self) -> String {
        match self {
            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
            Self::Unavailable(_) => "Service unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for LockgateError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            success: false,
            message: self.safe_message(),
            errors: match self {
                Self::Validation(ref errors) => Some(errors.clone()),
                _ => None,
            },
            needs_verification: match self {
                Self::UnverifiedEmail => Some(true),
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for lockgate operations and handlers.
pub type Result<T> = std::result::Result<T, LockgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LockgateError::validation("email", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(LockgateError::Conflict.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            LockgateError::InvalidCredentials.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(LockgateError::Locked.status_code(), StatusCode::LOCKED);
        assert_eq!(
            LockgateError::UnverifiedEmail.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LockgateError::not_found("User with this email address not found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LockgateError::AlreadyVerified.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LockgateError::unauthorized("no token").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LockgateError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            LockgateError::unavailable("smtp down").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            LockgateError::RequestTimeout.status_code(),
            StatusCode::REQUEST_TIMEOUT
        );
    }

    #[test]
    fn test_safe_message_hides_server_errors() {
        let err = LockgateError::internal("db password is 'hunter2'");
        assert_eq!(err.safe_message(), "Internal server error");

        let err: LockgateError = anyhow::anyhow!("sensitive stack info").into();
        assert_eq!(err.safe_message(), "Internal server error");

        let err = LockgateError::unavailable("smtp.internal:587 unreachable");
        assert_eq!(err.safe_message(), "Service unavailable");
    }

    #[test]
    fn test_safe_message_exposes_client_errors() {
        assert_eq!(
            LockgateError::InvalidCredentials.safe_message(),
            "Invalid credentials"
        );
        assert_eq!(
            LockgateError::invalid_token("Invalid or expired reset token").safe_message(),
            "Invalid or expired reset token"
        );
    }

    #[tokio::test]
    async fn test_unverified_response_carries_needs_verification() {
        let response = LockgateError::UnverifiedEmail.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["needsVerification"], true);
    }

    #[tokio::test]
    async fn test_validation_response_carries_field_errors() {
        let err = LockgateError::Validation(vec![
            FieldError::new("firstName", "First name must be 2-50 characters"),
            FieldError::new("password", "must contain a digit"),
        ]);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        let errors = json["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0]["field"], "firstName");
    }

    #[tokio::test]
    async fn test_plain_error_has_no_optional_fields() {
        let response = LockgateError::Conflict.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], false);
        assert!(json.get("errors").is_none());
        assert!(json.get("needsVerification").is_none());
    }
}
