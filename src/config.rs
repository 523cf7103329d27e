use axum::http::Uri;
use thiserror::Error;

use crate::binding::{BindingError, BindingLookup, DEFAULT_LABEL};
use crate::object_store::S3Credentials;

/// The proxy always listens here.
pub const BIND_ADDRESS: &str = "0.0.0.0:8080";

const DEFAULT_REGION: &str = "us-west-2";
const DEFAULT_MAX_OBJECT_SIZE: u64 = 50 * 1024 * 1024; // 50MB

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Largest request body, and so the largest object, the proxy accepts
    pub max_object_size: u64,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub credentials: S3Credentials,
    /// Absolute endpoint URL, scheme included
    pub endpoint: String,
    /// Root directory of the filesystem backend
    pub local_storage_path: String,
    /// SigV4 signing region
    pub region: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bindings = BindingLookup::from_env()?;
        Self::resolve(&bindings, |name| std::env::var(name).ok())
    }

    /// Build configuration from parsed bindings, reading every other
    /// setting through `var`.
    pub fn resolve<F>(bindings: &BindingLookup, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let label = var("BINDING_LABEL").unwrap_or_else(|| DEFAULT_LABEL.to_string());
        let name = var("BINDING_NAME").filter(|s| !s.is_empty());

        let binding = bindings.select(&label, name.as_deref())?;
        let creds = binding.require_credentials()?;

        let endpoint = parse_endpoint(&creds.endpoint)?;

        let region = var("S3_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());

        let local_storage_path =
            var("LOCAL_STORAGE_PATH").unwrap_or_else(|| format!("/{}", creds.bucket));

        let max_object_size = match var("MAX_OBJECT_SIZE") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::ValidationError(format!("MAX_OBJECT_SIZE is not a number: {raw}"))
            })?,
            None => DEFAULT_MAX_OBJECT_SIZE,
        };

        let config = Config {
            max_object_size,
            storage: StorageConfig {
                bucket: creds.bucket.clone(),
                credentials: S3Credentials {
                    access_key: creds.access_key.clone(),
                    secret_key: creds.secret_key.clone(),
                },
                endpoint,
                local_storage_path,
                region,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// `max_object_size` as a body limit; validated to fit in `usize`.
    pub fn max_body_size(&self) -> usize {
        usize::try_from(self.max_object_size).unwrap_or(usize::MAX)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_object_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_OBJECT_SIZE must be greater than zero".to_string(),
            ));
        }

        if self.storage.region.is_empty() {
            return Err(ConfigError::ValidationError(
                "S3_REGION cannot be empty".to_string(),
            ));
        }

        if usize::try_from(self.max_object_size).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "MAX_OBJECT_SIZE {} does not fit in memory on this platform",
                self.max_object_size
            )));
        }

        Ok(())
    }
}

/// Bindings often carry a bare host name; assume HTTPS for those.
fn parse_endpoint(raw: &str) -> Result<String, ConfigError> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let uri: Uri = with_scheme
        .parse()
        .map_err(|e| ConfigError::ValidationError(format!("Invalid endpoint '{raw}': {e}")))?;

    if uri.host().map_or(true, str::is_empty) {
        return Err(ConfigError::ValidationError(format!(
            "Endpoint '{raw}' has no host"
        )));
    }

    Ok(with_scheme)
}
