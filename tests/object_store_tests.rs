use bytes::Bytes;
use object_proxy::object_store::{LocalStore, ObjectStore, ObjectStoreError};

#[tokio::test]
async fn test_local_store_write_read() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let data = Bytes::from("hello world");
    let confirmation = store.write("test-key", data.clone()).await.unwrap();
    assert_eq!(confirmation, Bytes::from("Wrote 11 bytes\n"));

    let retrieved = store.read("test-key").await.unwrap();
    assert_eq!(retrieved, data);
}

#[tokio::test]
async fn test_local_store_binary_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let data = Bytes::from((0..=255u8).collect::<Vec<_>>());
    store.write("bin", data.clone()).await.unwrap();
    assert_eq!(store.read("bin").await.unwrap(), data);
}

#[tokio::test]
async fn test_local_store_empty_object() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let confirmation = store.write("empty", Bytes::new()).await.unwrap();
    assert_eq!(confirmation, Bytes::from("Wrote 0 bytes\n"));
    assert!(store.read("empty").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_local_store_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store.write("to-delete", Bytes::from("data")).await.unwrap();

    let confirmation = store.delete("to-delete").await.unwrap();
    assert_eq!(confirmation, Bytes::from("OK"));

    let result = store.read("to-delete").await;
    assert!(matches!(result, Err(ObjectStoreError::NotFound(_))));
}

#[tokio::test]
async fn test_local_store_delete_nonexistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let result = store.delete("nonexistent").await;
    assert!(matches!(result, Err(ObjectStoreError::NotFound(_))));
}

#[tokio::test]
async fn test_local_store_read_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let result = store.read("missing").await;
    assert!(result.is_err());
    assert!(matches!(
        result.unwrap_err(),
        ObjectStoreError::NotFound(key) if key == "missing"
    ));
}

#[tokio::test]
async fn test_local_store_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store.write("key", Bytes::from("a much longer first value")).await.unwrap();
    store.write("key", Bytes::from("second")).await.unwrap();

    let data = store.read("key").await.unwrap();
    assert_eq!(data, Bytes::from("second"));
}

#[tokio::test]
async fn test_local_store_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    assert!(!dir.path().join("a").exists());
    store.write("a/b/c", Bytes::from("deep")).await.unwrap();

    assert!(dir.path().join("a/b").is_dir());
    assert_eq!(store.read("a/b/c").await.unwrap(), Bytes::from("deep"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_local_store_directory_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store.write("x/y/z", Bytes::from("data")).await.unwrap();

    // umask may only remove bits, never add them.
    let mode = std::fs::metadata(dir.path().join("x/y"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777 & !0o755, 0);
    assert_eq!(mode & 0o700, 0o700);
}

#[tokio::test]
async fn test_local_store_delete_keeps_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store.write("p/q/leaf", Bytes::from("data")).await.unwrap();
    store.delete("p/q/leaf").await.unwrap();

    assert!(dir.path().join("p/q").is_dir());
    assert!(!dir.path().join("p/q/leaf").exists());
}

#[tokio::test]
async fn test_local_store_leaves_no_partial_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store.write("obj", Bytes::from("one")).await.unwrap();
    store.write("obj", Bytes::from("two")).await.unwrap();

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["obj".to_string()]);
}

#[tokio::test]
async fn test_local_store_rejects_traversal() {
    let root = tempfile::tempdir().unwrap();
    let store = LocalStore::new(root.path().join("objects")).unwrap();

    let result = store.write("../outside", Bytes::from("nope")).await;
    assert!(matches!(result, Err(ObjectStoreError::InvalidKey(_))));
    assert!(!root.path().join("outside").exists());

    assert!(matches!(
        store.read("a/../../outside").await,
        Err(ObjectStoreError::InvalidKey(_))
    ));
    assert!(matches!(
        store.delete("../objects/../outside").await,
        Err(ObjectStoreError::InvalidKey(_))
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn test_local_store_rejects_symlink_escape() {
    let root = tempfile::tempdir().unwrap();
    let outside = root.path().join("outside");
    std::fs::create_dir(&outside).unwrap();
    std::fs::write(outside.join("secret"), "top secret").unwrap();

    let store = LocalStore::new(root.path().join("objects")).unwrap();
    std::os::unix::fs::symlink(&outside, root.path().join("objects/link")).unwrap();

    assert!(matches!(
        store.read("link/secret").await,
        Err(ObjectStoreError::InvalidKey(_))
    ));
    assert!(matches!(
        store.write("link/new", Bytes::from("x")).await,
        Err(ObjectStoreError::InvalidKey(_))
    ));
    assert!(!outside.join("new").exists());

    // Nothing may be created through the link, not even directories.
    assert!(matches!(
        store.write("link/nested/dir/x", Bytes::from("x")).await,
        Err(ObjectStoreError::InvalidKey(_))
    ));
    assert!(!outside.join("nested").exists());
    assert_eq!(std::fs::read_dir(&outside).unwrap().count(), 1);
}

#[tokio::test]
async fn test_local_store_leading_slash_stays_under_root() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store.write("/rooted", Bytes::from("data")).await.unwrap();
    assert!(dir.path().join("rooted").is_file());
}
