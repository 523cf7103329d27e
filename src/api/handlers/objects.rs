use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use crate::api::response::ApiError;
use crate::object_store::{Backend, ObjectStore, ObjectStoreError};
use crate::AppState;

/// Query parameter whose presence routes a request to the filesystem backend.
pub const LOCAL_FLAG: &str = "local";

/// The object key is the decoded request path without its leading `/`.
/// Escapes that do not decode to UTF-8 are refused rather than replaced, so
/// two different paths never share a key.
pub fn object_key(uri: &Uri) -> Result<String, ApiError> {
    let path = uri.path();
    let path = path.strip_prefix('/').unwrap_or(path);
    percent_decode_str(path)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|e| {
            tracing::warn!(path = %uri.path(), error = %e, "Request path is not valid UTF-8");
            ApiError::internal(format!("Invalid key: '{}' is not valid UTF-8", uri.path()))
        })
}

pub fn requested_backend(params: &HashMap<String, String>) -> Backend {
    if params.contains_key(LOCAL_FLAG) {
        Backend::Local
    } else {
        Backend::Remote
    }
}

/// Log a storage failure and turn it into the 500 the client sees.
fn store_error(store: &dyn ObjectStore, op: &str, key: &str, e: ObjectStoreError) -> ApiError {
    match e {
        ObjectStoreError::NotFound(_) => {
            tracing::warn!(backend = store.name(), op, key, "Object not found");
        }
        ref err => {
            tracing::error!(
                backend = store.name(),
                op,
                key,
                error = %err,
                "Storage operation failed"
            );
        }
    }
    ApiError::from(e)
}

/// Serve one request against the backend chosen by the `local` flag.
/// Route: any method, any path
pub async fn handle_object(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
    body: Body,
) -> Result<Response, ApiError> {
    let key = object_key(&uri)?;
    let store = state.backends.select(requested_backend(&params));

    match method {
        Method::PUT | Method::POST => {
            let data = axum::body::to_bytes(body, state.config.max_body_size())
                .await
                .map_err(|e| {
                    tracing::warn!(key = %key, error = %e, "Failed to read request body");
                    ApiError::internal(format!("Failed to read request body: {e}"))
                })?;

            let confirmation = store
                .write(&key, data)
                .await
                .map_err(|e| store_error(store, "write", &key, e))?;
            Ok((StatusCode::OK, confirmation).into_response())
        }
        Method::GET => {
            let data = store
                .read(&key)
                .await
                .map_err(|e| store_error(store, "read", &key, e))?;
            Ok((StatusCode::OK, data).into_response())
        }
        Method::DELETE => {
            let confirmation = store
                .delete(&key)
                .await
                .map_err(|e| store_error(store, "delete", &key, e))?;
            Ok((StatusCode::OK, confirmation).into_response())
        }
        _ => Err(ApiError::method_not_allowed()),
    }
}
