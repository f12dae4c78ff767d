use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Failure reported by one of the external collaborators (auth service,
/// user directory, valuation store).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Terminal failure of one dashboard activation. Each variant ends the
/// pipeline and is shown to the user as a single static message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("session lookup timed out")]
    SessionTimeout,

    #[error("no signed-in session")]
    NotSignedIn,

    #[error("user lookup failed")]
    UserLookupFailed,

    #[error("valuation fetch failed")]
    ValuationFetchFailed,
}

impl DashboardError {
    pub fn code(self) -> &'static str {
        match self {
            DashboardError::SessionTimeout => "SESSION_TIMEOUT",
            DashboardError::NotSignedIn => "NOT_SIGNED_IN",
            DashboardError::UserLookupFailed => "USER_LOOKUP_FAILED",
            DashboardError::ValuationFetchFailed => "VALUATION_FETCH_FAILED",
        }
    }

    /// A timed-out session shows the same prompt as a missing one.
    pub fn user_message(self) -> &'static str {
        match self {
            DashboardError::SessionTimeout | DashboardError::NotSignedIn => {
                "Please sign in to view valuations."
            }
            DashboardError::UserLookupFailed => "Failed to load user details",
            DashboardError::ValuationFetchFailed => "Failed to load valuations",
        }
    }

    pub fn to_body(self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.user_message(),
        }
    }
}

/// The `{code, message}` pair embedded in view responses.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_reads_like_signed_out() {
        assert_eq!(
            DashboardError::SessionTimeout.user_message(),
            DashboardError::NotSignedIn.user_message()
        );
        assert_ne!(
            DashboardError::SessionTimeout.code(),
            DashboardError::NotSignedIn.code()
        );
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            DashboardError::UserLookupFailed.user_message(),
            "Failed to load user details"
        );
        assert_eq!(
            DashboardError::ValuationFetchFailed.user_message(),
            "Failed to load valuations"
        );
    }

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let response = AppError::Validation("bad date".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
