//! HTTP error responses for web adapter.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::error::EdgeFinderError;
use crate::domain::sizing::SizingError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &EdgeFinderError) -> StatusCode {
    match err {
        EdgeFinderError::ConfigMissing { .. }
        | EdgeFinderError::ConfigInvalid { .. }
        | EdgeFinderError::ConfigParse { .. }
        | EdgeFinderError::InvalidCriteria { .. }
        | EdgeFinderError::Sizing(_)
        | EdgeFinderError::Universe(_) => StatusCode::BAD_REQUEST,
        EdgeFinderError::NoData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EdgeFinderError::DataSource { .. } | EdgeFinderError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<EdgeFinderError> for WebError {
    fn from(err: EdgeFinderError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<SizingError> for WebError {
    fn from(err: SizingError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "request failed");
        }
        (self.status, Json(json!({ "detail": self.message }))).into_response()
    }
}
