//! Service bindings delivered through the `VCAP_SERVICES` environment variable.
//!
//! The variable holds a JSON object keyed by service label, each label
//! mapping to the list of bound service instances:
//!
//! ```json
//! { "ecs-bucket": [ { "name": "store", "credentials": { "bucket": "b", ... } } ] }
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

pub const VCAP_SERVICES: &str = "VCAP_SERVICES";
pub const DEFAULT_LABEL: &str = "ecs-bucket";

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("VCAP_SERVICES is not set")]
    Missing,
    #[error("VCAP_SERVICES is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("No service bound under label '{0}'")]
    NoBinding(String),
    #[error("No binding named '{name}' under label '{label}'")]
    NameNotFound { label: String, name: String },
    #[error("Binding '{binding}' has no {field}")]
    MissingCredential { binding: String, field: &'static str },
}

/// All bindings, keyed by service label.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct BindingLookup(pub HashMap<String, Vec<ServiceBinding>>);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceBinding {
    pub binding_name: Option<String>,
    pub credentials: ServiceCredentials,
    pub instance_name: String,
    pub label: String,
    pub name: String,
    pub plan: String,
    pub provider: Option<String>,
    pub syslog_drain_url: Option<String>,
    pub tags: Vec<String>,
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceCredentials {
    #[serde(rename = "accessKey")]
    pub access_key: String,
    pub bucket: String,
    pub endpoint: String,
    #[serde(rename = "path-style-access")]
    pub path_style_access: bool,
    #[serde(rename = "s3Url")]
    pub s3_url: String,
    #[serde(rename = "secretKey")]
    pub secret_key: String,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("access_key", &self.access_key)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("path_style_access", &self.path_style_access)
            .field("secret_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VolumeMount {
    pub container_dir: String,
    pub device: Device,
    pub device_type: String,
    pub driver: String,
    pub mode: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Device {
    pub mount_config: HashMap<String, serde_json::Value>,
    pub volume_id: String,
}

impl BindingLookup {
    pub fn parse(json: &str) -> Result<Self, BindingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse `VCAP_SERVICES`.
    pub fn from_env() -> Result<Self, BindingError> {
        let raw = std::env::var(VCAP_SERVICES).map_err(|_| BindingError::Missing)?;
        Self::parse(&raw)
    }

    /// Pick the binding under `label`: the one called `name` if given,
    /// otherwise the first.
    pub fn select(&self, label: &str, name: Option<&str>) -> Result<&ServiceBinding, BindingError> {
        let bindings = self
            .0
            .get(label)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| BindingError::NoBinding(label.to_string()))?;

        match name {
            Some(name) => bindings.iter().find(|b| b.name == name).ok_or_else(|| {
                BindingError::NameNotFound {
                    label: label.to_string(),
                    name: name.to_string(),
                }
            }),
            None => Ok(&bindings[0]),
        }
    }
}

impl ServiceBinding {
    /// Fail unless access key, secret key, endpoint and bucket are all present.
    pub fn require_credentials(&self) -> Result<&ServiceCredentials, BindingError> {
        let creds = &self.credentials;
        let missing = [
            ("accessKey", creds.access_key.is_empty()),
            ("secretKey", creds.secret_key.is_empty()),
            ("endpoint", creds.endpoint.is_empty()),
            ("bucket", creds.bucket.is_empty()),
        ]
        .into_iter()
        .find_map(|(field, empty)| empty.then_some(field));

        match missing {
            Some(field) => Err(BindingError::MissingCredential {
                binding: self.name.clone(),
                field,
            }),
            None => Ok(creds),
        }
    }
}
