use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use quotesync_warehouse::WarehouseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures surfaced by the read API.
///
/// Every variant renders as `{"error": "..."}`; storage details are logged
/// and never sent to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("instrument '{0}' not found")]
    NotFound(String),

    #[error("invalid ticker: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Storage(#[from] WarehouseError),

    #[error("storage task failed: {0}")]
    Task(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
            Self::Storage(_) | Self::Task(_) => String::from("storage unavailable"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "read api request failed");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_hide_their_detail() {
        let error = ApiError::Task(String::from("panicked at src/lib.rs:42"));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.public_message(), "storage unavailable");
    }

    #[test]
    fn client_errors_keep_their_message() {
        let error = ApiError::NotFound(String::from("NOPE"));
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.public_message(), "instrument 'NOPE' not found");
    }
}
