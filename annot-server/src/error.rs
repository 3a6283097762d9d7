//! HTTP error mapping for annot-server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400), including output lock conflicts
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl From<annot_common::Error> for ApiError {
    fn from(err: annot_common::Error) -> Self {
        use annot_common::Error;

        match &err {
            Error::IndexOutOfRange { .. } => ApiError::NotFound("Index out of range".to_string()),
            Error::LockConflict { .. } | Error::ReservedEpisodeId(_) => {
                ApiError::BadRequest(err.to_string())
            }
            _ => {
                tracing::error!("Request failed: {}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_status() {
        let not_found: ApiError = annot_common::Error::IndexOutOfRange {
            group: "1".into(),
            index: 3,
            len: 3,
        }
        .into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let conflict: ApiError = annot_common::Error::LockConflict {
            locked: "2".into(),
        }
        .into();
        assert_eq!(conflict.to_string(), "Output file locked to group 2.");
        assert_eq!(conflict.into_response().status(), StatusCode::BAD_REQUEST);

        let reserved: ApiError = annot_common::Error::ReservedEpisodeId("__group__".into()).into();
        assert_eq!(reserved.into_response().status(), StatusCode::BAD_REQUEST);

        let io: ApiError = annot_common::Error::Internal("disk".into()).into();
        assert_eq!(io.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
