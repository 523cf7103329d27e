use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::{ObjectStore, ObjectStoreError};

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Filesystem object store rooted at a single directory.
///
/// Keys map to paths below the root. A key can never resolve outside of it:
/// `..` components that would climb above the root are rejected.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref();
        create_dirs(base_path)?;
        let base_path = base_path.canonicalize()?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a key to a path confined to the root.
    pub fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let mut relative = PathBuf::new();
        for component in Path::new(key).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir | Component::RootDir => {}
                Component::ParentDir => {
                    if !relative.pop() {
                        return Err(ObjectStoreError::InvalidKey(format!(
                            "'{key}' escapes the storage root"
                        )));
                    }
                }
                Component::Prefix(_) => {
                    return Err(ObjectStoreError::InvalidKey(format!(
                        "'{key}' is not a relative path"
                    )));
                }
            }
        }

        if relative.as_os_str().is_empty() {
            return Err(ObjectStoreError::InvalidKey(format!(
                "'{key}' does not name an object"
            )));
        }

        Ok(self.base_path.join(relative))
    }

    /// Symlinks inside the root could still point elsewhere. Check the real
    /// location of the deepest directory above `path` that already exists,
    /// so nothing is read, written or created through a link leading out.
    async fn confine(&self, key: &str, path: &Path) -> Result<(), ObjectStoreError> {
        let mut ancestor = path.parent();
        while let Some(dir) = ancestor {
            match tokio::fs::canonicalize(dir).await {
                Ok(real) if real.starts_with(&self.base_path) => return Ok(()),
                Ok(_) => {
                    return Err(ObjectStoreError::InvalidKey(format!(
                        "'{key}' escapes the storage root"
                    )))
                }
                Err(e) if e.kind() == ErrorKind::NotFound => ancestor = dir.parent(),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn create_dirs(path: &Path) -> Result<(), std::io::Error> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(path)
}

#[cfg(not(unix))]
fn create_dirs(path: &Path) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(path)
}

fn not_found(key: &str, e: std::io::Error) -> ObjectStoreError {
    if e.kind() == ErrorKind::NotFound {
        ObjectStoreError::NotFound(key.to_string())
    } else {
        ObjectStoreError::Io(e)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn read(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let path = self.object_path(key)?;
        self.confine(key, &path).await?;
        let data = tokio::fs::read(&path).await.map_err(|e| not_found(key, e))?;
        tracing::debug!(key, bytes = data.len(), "Read object from disk");
        Ok(Bytes::from(data))
    }

    async fn write(&self, key: &str, data: Bytes) -> Result<Bytes, ObjectStoreError> {
        let path = self.object_path(key)?;
        self.confine(key, &path).await?;
        if let Some(parent) = path.parent() {
            let mut builder = tokio::fs::DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            builder.mode(DIR_MODE);
            builder.create(parent).await?;
        }

        // Write beside the target and rename over it so readers never see a
        // partially written object.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path =
            path.with_file_name(format!(".{file_name}.{}.partial", uuid::Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&temp_path, &data).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(key, bytes = data.len(), "Wrote object to disk");
        Ok(Bytes::from(format!("Wrote {} bytes\n", data.len())))
    }

    async fn delete(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let path = self.object_path(key)?;
        self.confine(key, &path).await?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found(key, e))?;
        tracing::debug!(key, "Deleted object from disk");
        Ok(Bytes::from_static(b"OK"))
    }
}
