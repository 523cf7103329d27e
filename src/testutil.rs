//! Shared test helpers for router tests.

use std::sync::Arc;

use crate::config::{Config, StorageConfig};
use crate::object_store::{Backends, LocalStore, S3Credentials};
use crate::AppState;

/// Create a test AppState whose backends are two separate directories under
/// `temp_dir`: `local/` for `?local` requests and `remote/` standing in for
/// the bucket.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let local_dir = temp_dir.path().join("local");
    let remote_dir = temp_dir.path().join("remote");

    let config = Config {
        max_object_size: 1024,
        storage: StorageConfig {
            bucket: "test-bucket".to_string(),
            credentials: S3Credentials {
                access_key: "test-access".to_string(),
                secret_key: "test-secret".to_string(),
            },
            endpoint: "http://127.0.0.1:9".to_string(),
            local_storage_path: local_dir.to_string_lossy().to_string(),
            region: "us-west-2".to_string(),
        },
    };

    let local = LocalStore::new(&local_dir).expect("Failed to create local test store");
    let remote = LocalStore::new(&remote_dir).expect("Failed to create remote test store");

    Arc::new(AppState {
        config,
        backends: Backends::new(Arc::new(local), Arc::new(remote)),
    })
}
