use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::object_store::ObjectStoreError;

/// Every failure the proxy reports: a status code and, for everything but
/// method rejection, a plain-text description.
#[derive(Debug)]
pub enum ApiError {
    Empty(StatusCode),
    Text(StatusCode, String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Empty(code) => code.into_response(),
            ApiError::Text(code, msg) => (code, msg).into_response(),
        }
    }
}

impl ApiError {
    pub fn method_not_allowed() -> Self {
        ApiError::Empty(StatusCode::METHOD_NOT_ALLOWED)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Text(StatusCode::INTERNAL_SERVER_ERROR, message.into())
    }
}

/// Storage failures are not distinguished on the wire; all of them are a 500.
impl From<ObjectStoreError> for ApiError {
    fn from(e: ObjectStoreError) -> Self {
        ApiError::internal(e.to_string())
    }
}
