//! object-proxy - a thin HTTP proxy in front of object storage
//!
//! This crate maps plain HTTP requests onto whole-object storage operations:
//! - PUT/POST stores the request body at the key named by the path
//! - GET returns the stored object, DELETE removes it
//! - Two interchangeable backends: an S3-compatible bucket and a local directory
//! - Bucket credentials come from a `VCAP_SERVICES` service binding

pub mod api;
pub mod binding;
pub mod config;
pub mod object_store;
#[cfg(test)]
pub mod testutil;

use config::Config;
use object_store::Backends;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub backends: Backends,
}
