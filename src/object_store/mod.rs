mod local;
mod s3;

pub use local::LocalStore;
pub use s3::{S3Credentials, S3Store};

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Abstraction over object storage backends.
///
/// Every operation is whole-object: `write` replaces the stored content,
/// `read` returns all of it. `write` and `delete` return confirmation bytes
/// that the proxy hands back to the client verbatim.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;
    async fn read(&self, key: &str) -> Result<Bytes, ObjectStoreError>;
    async fn write(&self, key: &str, data: Bytes) -> Result<Bytes, ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<Bytes, ObjectStoreError>;
}

/// Which adapter a request is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Remote,
}

/// The two adapters the proxy can route to, built once at start-up.
#[derive(Clone)]
pub struct Backends {
    local: Arc<dyn ObjectStore>,
    remote: Arc<dyn ObjectStore>,
}

impl Backends {
    pub fn new(local: Arc<dyn ObjectStore>, remote: Arc<dyn ObjectStore>) -> Self {
        Self { local, remote }
    }

    pub fn select(&self, backend: Backend) -> &dyn ObjectStore {
        match backend {
            Backend::Local => self.local.as_ref(),
            Backend::Remote => self.remote.as_ref(),
        }
    }
}
