//! End-to-end behavior of the filesystem projection over the in-memory store.

use std::sync::Arc;

use docfs_core::{DocFs, FsConfig, FsError};
use docfs_store::{DocumentStore, InMemoryDocumentStore};
use docfs_types::{Document, DocumentId, NativeId};
use serde_json::{json, Value};

fn mounted() -> (Arc<InMemoryDocumentStore>, DocFs) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let fs = DocFs::new(store.clone(), FsConfig::default());
    (store, fs)
}

fn read_all(fs: &DocFs, path: &str) -> Vec<u8> {
    fs.read(path, usize::MAX, 0).unwrap()
}

fn read_json(fs: &DocFs, path: &str) -> Value {
    serde_json::from_slice(&read_all(fs, path)).unwrap()
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[test]
fn root_lists_databases() {
    let (store, fs) = mounted();
    store.create_collection("alpha", "a").unwrap();
    store.create_collection("beta", "b").unwrap();
    assert_eq!(fs.readdir("/").unwrap(), [".", "..", "alpha", "beta"]);
}

#[test]
fn collection_lists_both_identifier_forms() {
    let (store, fs) = mounted();
    let native = NativeId::from_bytes([7; 12]);
    store.save("db", "col", &Document::new(native.into())).unwrap();
    store
        .save("db", "col", &Document::new(DocumentId::Key("readme".into())))
        .unwrap();
    let entries = fs.readdir("/db/col").unwrap();
    assert!(entries.contains(&native.to_hex()));
    assert!(entries.contains(&"readme".to_string()));
}

// ---------------------------------------------------------------------------
// Reading and writing
// ---------------------------------------------------------------------------

#[test]
fn json_write_reads_back_formatted() {
    let (_store, fs) = mounted();
    fs.write("/db/col/42", br#"{"x":1}"#, 0).unwrap();
    let text = String::from_utf8(read_all(&fs, "/db/col/42")).unwrap();
    assert_eq!(text, "{\n    \"_id\": \"42\",\n    \"x\": 1\n}");
}

#[test]
fn text_write_to_absent_path_is_wrapped() {
    let (_store, fs) = mounted();
    fs.write("/db/notes/todo", b"buy milk", 0).unwrap();
    assert_eq!(
        read_json(&fs, "/db/notes/todo"),
        json!({"_id": "todo", "data": "buy milk"})
    );
}

#[test]
fn sequential_writes_append_text() {
    let (_store, fs) = mounted();
    fs.write("/db/log/today", b"one ", 0).unwrap();
    fs.write("/db/log/today", b"two ", 4).unwrap();
    fs.write("/db/log/today", b"three", 8).unwrap();
    assert_eq!(
        read_json(&fs, "/db/log/today"),
        json!({"_id": "today", "data": "one two three"})
    );
}

#[test]
fn editor_save_replaces_document() {
    let (_store, fs) = mounted();
    fs.write("/db/col/a", br#"{"x": 1, "y": 2}"#, 0).unwrap();
    let mut edited = read_json(&fs, "/db/col/a");
    edited["x"] = json!(10);
    edited["_id"] = json!("ignored");
    fs.truncate("/db/col/a", 0).unwrap();
    fs.write("/db/col/a", edited.to_string().as_bytes(), 0).unwrap();
    assert_eq!(read_json(&fs, "/db/col/a"), json!({"_id": "a", "x": 10, "y": 2}));
}

#[test]
fn native_identifier_paths_round_trip() {
    let (store, fs) = mounted();
    let path = "/db/col/507f1f77bcf86cd799439011";
    fs.write(path, br#"{"n": 1}"#, 0).unwrap();
    let stored = store.find_all("db", "col").unwrap();
    assert!(stored[0].id().is_native());
    assert_eq!(read_json(&fs, path)["_id"], json!("507f1f77bcf86cd799439011"));
}

#[test]
fn getattr_size_matches_read_length() {
    let (_store, fs) = mounted();
    fs.write("/db/col/a", br#"{"list": [1, 2, 3]}"#, 0).unwrap();
    let attr = fs.getattr("/db/col/a").unwrap();
    assert_eq!(attr.size, read_all(&fs, "/db/col/a").len() as u64);
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_makes_bare_document() {
    let (_store, fs) = mounted();
    fs.create("/db/col/new", 0o644).unwrap();
    assert_eq!(read_json(&fs, "/db/col/new"), json!({"_id": "new"}));
}

#[test]
fn create_on_existing_id_leaves_document_alone() {
    let (_store, fs) = mounted();
    fs.write("/db/col/a", br#"{"keep": true}"#, 0).unwrap();
    let err = fs.create("/db/col/a", 0o644).unwrap_err();
    assert!(matches!(err, FsError::AlreadyExists { .. }));
    assert_eq!(err.errno(), libc::EEXIST);
    assert_eq!(read_json(&fs, "/db/col/a"), json!({"_id": "a", "keep": true}));
}

#[test]
fn create_on_hex_string_key_leaves_document_alone() {
    let (store, fs) = mounted();
    let hex = "507f1f77bcf86cd799439011";
    let mut stored = Document::new(DocumentId::Key(hex.into()));
    stored.insert("keep", json!(1)).unwrap();
    store.save("db", "col", &stored).unwrap();

    let path = format!("/db/col/{hex}");
    assert_eq!(fs.create(&path, 0o644).unwrap_err().errno(), libc::EEXIST);
    assert_eq!(store.find_all("db", "col").unwrap().len(), 1);
    assert_eq!(read_json(&fs, &path), json!({"_id": hex, "keep": 1}));
}

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

#[test]
fn mkdir_then_rmdir_database() {
    let (_store, fs) = mounted();
    fs.mkdir("/newdb", 0o755).unwrap();
    assert!(fs.readdir("/").unwrap().contains(&"newdb".to_string()));
    assert!(fs.readdir("/newdb").unwrap().len() == 2);
    fs.rmdir("/newdb").unwrap();
    assert!(!fs.readdir("/").unwrap().contains(&"newdb".to_string()));
    assert_eq!(fs.getattr("/newdb").unwrap_err().errno(), libc::ENOENT);
}

#[test]
fn rmdir_collection_removes_it_from_listing() {
    let (_store, fs) = mounted();
    fs.mkdir("/db", 0o755).unwrap();
    fs.mkdir("/db/a", 0o755).unwrap();
    fs.mkdir("/db/b", 0o755).unwrap();
    fs.write("/db/a/doc", b"x", 0).unwrap();
    fs.rmdir("/db/a").unwrap();
    assert_eq!(fs.readdir("/db").unwrap(), [".", "..", "b"]);
}

#[test]
fn directory_operations_are_idempotent() {
    let (_store, fs) = mounted();
    fs.mkdir("/db", 0o755).unwrap();
    fs.mkdir("/db", 0o755).unwrap();
    fs.mkdir("/db/col", 0o755).unwrap();
    fs.mkdir("/db/col", 0o755).unwrap();
    fs.rmdir("/db/col").unwrap();
    fs.rmdir("/db/col").unwrap();
    fs.rmdir("/ghost").unwrap();
}

#[test]
fn mkdir_outside_directory_levels_is_refused() {
    let (_store, fs) = mounted();
    assert_eq!(fs.mkdir("/", 0o755).unwrap_err().errno(), libc::EPERM);
    assert_eq!(fs.mkdir("/db/col/doc", 0o755).unwrap_err().errno(), libc::EPERM);
    assert_eq!(fs.rmdir("/db/col/doc").unwrap_err().errno(), libc::EPERM);
    assert_eq!(fs.mkdir("/bad.name", 0o755).unwrap_err().errno(), libc::EINVAL);
}

// ---------------------------------------------------------------------------
// Unlink and rename
// ---------------------------------------------------------------------------

#[test]
fn rename_moves_content() {
    let (_store, fs) = mounted();
    fs.write("/db/col/a", br#"{"v": "prior"}"#, 0).unwrap();
    fs.rename("/db/col/a", "/db/col/b").unwrap();
    assert_eq!(fs.getattr("/db/col/a").unwrap_err().errno(), libc::ENOENT);
    assert_eq!(read_json(&fs, "/db/col/b"), json!({"_id": "b", "v": "prior"}));
}

#[test]
fn rename_overwrites_existing_target() {
    let (_store, fs) = mounted();
    fs.write("/db/col/a", br#"{"v": 1}"#, 0).unwrap();
    fs.write("/db/col/b", br#"{"v": 2}"#, 0).unwrap();
    fs.rename("/db/col/a", "/db/col/b").unwrap();
    assert_eq!(read_json(&fs, "/db/col/b"), json!({"_id": "b", "v": 1}));
    assert_eq!(fs.readdir("/db/col").unwrap(), [".", "..", "b"]);
}

#[test]
fn unlink_removes_document() {
    let (_store, fs) = mounted();
    fs.write("/db/col/a", b"x", 0).unwrap();
    fs.unlink("/db/col/a").unwrap();
    assert_eq!(fs.readdir("/db/col").unwrap(), [".", ".."]);
    assert_eq!(fs.read("/db/col/a", 10, 0).unwrap_err().errno(), libc::ENOENT);
}

// ---------------------------------------------------------------------------
// Depth
// ---------------------------------------------------------------------------

#[test]
fn four_level_paths_never_resolve() {
    let (store, fs) = mounted();
    store.create_collection("a", "b").unwrap();
    let path = "/a/b/c/d";
    let ops: [(&str, Result<(), FsError>); 6] = [
        ("getattr", fs.getattr(path).map(drop)),
        ("readdir", fs.readdir(path).map(drop)),
        ("write", fs.write(path, b"x", 0).map(drop)),
        ("create", fs.create(path, 0)),
        ("mkdir", fs.mkdir(path, 0)),
        ("unlink", fs.unlink(path)),
    ];
    for (op, result) in ops {
        let err = result.unwrap_err();
        assert!(matches!(err, FsError::InvalidDepth { .. }), "{op}: {err}");
        assert_eq!(err.errno(), libc::ENOENT);
    }
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_writers_to_distinct_paths() {
    let (_store, fs) = mounted();
    let fs = Arc::new(fs);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let fs = Arc::clone(&fs);
            std::thread::spawn(move || {
                fs.write(&format!("/db/col/doc{i}"), b"x", 0).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(fs.readdir("/db/col").unwrap().len(), 10);
}
