use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::game::TurnError;

/// Errors returned by the HTTP handlers. Each maps to one status code and
/// a human-readable `{"error": ...}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input or a request the session state does not allow
    #[error("{0}")]
    BadRequest(String),
    /// Unknown or expired session
    #[error("{0}")]
    NotFound(String),
    /// Server-side data is inconsistent
    #[error("{0}")]
    Internal(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            // Driver messages can leak schema details
            ApiError::Database(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Log a database failure with what was being attempted and wrap it
pub fn db_error(action: &str, err: sqlx::Error) -> ApiError {
    tracing::error!("Database error while {}: {}", action, err);
    ApiError::Database(err)
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<TurnError> for ApiError {
    fn from(err: TurnError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            tracing::debug!(status = %status, "Rejected request: {}", self);
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::internal("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_errors_are_not_exposed() {
        let err = ApiError::Database(sqlx::Error::Protocol("relation \"sessions\" missing".into()));
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_turn_errors_are_bad_requests() {
        let err = ApiError::from(TurnError::OutOfLives);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "No lives remaining");

        let err = ApiError::from(TurnError::NoLocation);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "No location left to guess");
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = ApiError::bad_request("No lives remaining");
        assert_eq!(err.public_message(), "No lives remaining");
    }
}
