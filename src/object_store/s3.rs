use async_trait::async_trait;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{
    BehaviorVersion, Credentials, Region, RequestChecksumCalculation, ResponseChecksumValidation,
};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{ObjectStore, ObjectStoreError};

/// Static access key pair for an S3-compatible endpoint.
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// S3-compatible object store bound to one bucket, addressed path-style
/// (`<endpoint>/<bucket>/<key>`).
pub struct S3Store {
    bucket: String,
    client: Client,
}

impl S3Store {
    pub fn new(
        endpoint: &str,
        bucket: &str,
        region: &str,
        credentials: S3Credentials,
    ) -> Self {
        let credentials = Credentials::new(
            credentials.access_key,
            credentials.secret_key,
            None,
            None,
            "vcap-services",
        );

        // One call per operation. S3-compatible stores often reject the
        // newer default checksum headers, so only send them when required.
        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        Self {
            bucket: bucket.to_string(),
            client: Client::from_conf(config),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Keys travel verbatim in the request path. Dot segments would be resolved
/// by anything normalizing that path and could address another bucket.
fn check_key(key: &str) -> Result<(), ObjectStoreError> {
    if key.is_empty() {
        return Err(ObjectStoreError::InvalidKey(
            "an empty key does not name an object".to_string(),
        ));
    }
    if key.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(ObjectStoreError::InvalidKey(format!(
            "'{key}' contains a relative path segment"
        )));
    }
    Ok(())
}

/// Render response metadata as a `{ Key: value }` block.
fn describe_output(fields: &[(&str, Option<String>)]) -> Bytes {
    let lines: Vec<String> = fields
        .iter()
        .filter_map(|(label, value)| Some(format!("  {label}: {}", value.as_ref()?)))
        .collect();

    if lines.is_empty() {
        Bytes::from_static(b"{\n\n}")
    } else {
        Bytes::from(format!("{{\n{}\n}}", lines.join(",\n")))
    }
}

fn quoted(value: Option<&str>) -> Option<String> {
    value.map(|v| format!("{v:?}"))
}

/// Condense an SDK failure into one line, preferring the S3 error code.
fn backend_error<E>(operation: &str, err: SdkError<E>) -> ObjectStoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|resp| resp.status().as_u16());
    let detail = match (err.code(), err.message(), status) {
        (Some(code), Some(message), Some(status)) => {
            format!("{code}: {message} (status {status})")
        }
        (Some(code), _, Some(status)) => format!("{code} (status {status})"),
        _ => DisplayErrorContext(&err).to_string(),
    };
    ObjectStoreError::Backend(format!("{operation} failed: {detail}"))
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn read(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        check_key(key)?;

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(GetObjectError::is_no_such_key) => {
                return Err(ObjectStoreError::NotFound(key.to_string()));
            }
            Err(e) => return Err(backend_error("GetObject", e)),
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::Backend(format!("GetObject failed: {e}")))?
            .into_bytes();

        tracing::debug!(key, bucket = %self.bucket, bytes = data.len(), "GetObject");
        Ok(data)
    }

    async fn write(&self, key: &str, data: Bytes) -> Result<Bytes, ObjectStoreError> {
        check_key(key)?;
        let size = data.len();

        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/octet-stream")
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| backend_error("PutObject", e))?;

        tracing::debug!(key, bucket = %self.bucket, bytes = size, "PutObject");
        Ok(describe_output(&[
            ("ETag", quoted(output.e_tag())),
            (
                "ServerSideEncryption",
                quoted(output.server_side_encryption().map(|s| s.as_str())),
            ),
            ("VersionId", quoted(output.version_id())),
        ]))
    }

    async fn delete(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        check_key(key)?;

        let output = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| backend_error("DeleteObject", e))?;

        tracing::debug!(key, bucket = %self.bucket, "DeleteObject");
        Ok(describe_output(&[
            ("DeleteMarker", output.delete_marker().map(|m| m.to_string())),
            ("VersionId", quoted(output.version_id())),
        ]))
    }
}
