use super::*;

// =============================================================
// FileStorage
// =============================================================

#[test]
fn file_storage_missing_key_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    assert!(storage.get("identity").unwrap().is_none());
}

#[test]
fn file_storage_set_get_remove() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("nested"));

    storage.set("identity", r#"{"userId":7}"#).unwrap();
    assert_eq!(storage.get("identity").unwrap().as_deref(), Some(r#"{"userId":7}"#));
    assert!(dir.path().join("nested/identity.json").exists());

    storage.remove("identity").unwrap();
    assert!(storage.get("identity").unwrap().is_none());
    storage.remove("identity").unwrap();
}

#[test]
fn file_storage_overwrites_existing_value() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    storage.set("identity", "first").unwrap();
    storage.set("identity", "second").unwrap();
    assert_eq!(storage.get("identity").unwrap().as_deref(), Some("second"));
}

#[test]
fn file_storage_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    assert!(matches!(storage.set("../escape", "x"), Err(StorageError::InvalidKey(_))));
    assert!(matches!(storage.get(""), Err(StorageError::InvalidKey(_))));
}

#[cfg(unix)]
#[test]
fn file_storage_writes_owner_only_files() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    storage.set("session", "JSESSIONID=abc").unwrap();
    let mode = std::fs::metadata(dir.path().join("session.json"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

// =============================================================
// TieredStorage
// =============================================================

#[test]
fn retention_from_remember() {
    assert_eq!(Retention::from_remember(true), Retention::Persistent);
    assert_eq!(Retention::from_remember(false), Retention::Session);
}

#[test]
fn tiered_save_moves_value_between_tiers() {
    let storage = TieredStorage::in_memory();

    storage.save(Retention::Persistent, "identity", "p").unwrap();
    assert_eq!(storage.tier(Retention::Persistent).get("identity").unwrap().as_deref(), Some("p"));
    assert!(storage.tier(Retention::Session).get("identity").unwrap().is_none());

    storage.save(Retention::Session, "identity", "s").unwrap();
    assert_eq!(storage.tier(Retention::Session).get("identity").unwrap().as_deref(), Some("s"));
    assert!(storage.tier(Retention::Persistent).get("identity").unwrap().is_none());
}

#[test]
fn tiered_load_prefers_session_tier() {
    let storage = TieredStorage::in_memory();
    storage.tier(Retention::Persistent).set("identity", "p").unwrap();
    assert_eq!(storage.load("identity").as_deref(), Some("p"));

    storage.tier(Retention::Session).set("identity", "s").unwrap();
    assert_eq!(storage.load("identity").as_deref(), Some("s"));
}

#[test]
fn tiered_clear_empties_both_tiers() {
    let storage = TieredStorage::in_memory();
    storage.tier(Retention::Persistent).set("identity", "p").unwrap();
    storage.tier(Retention::Session).set("identity", "s").unwrap();

    storage.clear("identity").unwrap();
    assert!(storage.load("identity").is_none());
}

#[test]
fn tiered_on_disk_survives_new_instance() {
    let dir = tempfile::tempdir().unwrap();
    let first = TieredStorage::on_disk(dir.path().join("s"), dir.path().join("p"));
    first.save(Retention::Persistent, "identity", "kept").unwrap();

    let second = TieredStorage::on_disk(dir.path().join("s"), dir.path().join("p"));
    assert_eq!(second.load("identity").as_deref(), Some("kept"));
}
