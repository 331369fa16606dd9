//! Existence checks against live store state, and naming rules for entries
//! that are about to be created.
//!
//! Database names must be non-empty, at most [`MAX_DATABASE_NAME`] bytes, and
//! free of `/ \ . " $ * < > : | ?`, spaces and NUL. Collection names must be
//! non-empty, free of `$` and NUL, and must not start with `system.`.
//! Document segments must not be `.`, `..`, or contain NUL.

use docfs_store::DocumentStore;
use docfs_types::{Document, DocumentId, NativeId};

use crate::entity::EntityRef;
use crate::error::{FsError, FsResult};
use crate::path::PathKey;

/// Longest database name the store accepts, in bytes.
pub const MAX_DATABASE_NAME: usize = 64;

const DATABASE_FORBIDDEN: &[char] = &['/', '\\', '.', ' ', '"', '$', '*', '<', '>', ':', '|', '?', '\0'];

/// Prefix of collection names reserved by the store.
const RESERVED_COLLECTION_PREFIX: &str = "system.";

// ---------------------------------------------------------------------------
// Naming rules
// ---------------------------------------------------------------------------

fn invalid(path: &str, name: &str, reason: impl Into<String>) -> FsError {
    FsError::InvalidName {
        path: path.to_string(),
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Check that `name` can be created as a database.
pub fn validate_database_name(path: &str, name: &str) -> FsResult<()> {
    if name.is_empty() {
        return Err(invalid(path, name, "database name must not be empty"));
    }
    if name.len() > MAX_DATABASE_NAME {
        return Err(invalid(
            path,
            name,
            format!("longer than {MAX_DATABASE_NAME} bytes"),
        ));
    }
    if let Some(ch) = name.chars().find(|c| DATABASE_FORBIDDEN.contains(c)) {
        return Err(invalid(
            path,
            name,
            format!("contains forbidden character: {ch:?}"),
        ));
    }
    Ok(())
}

/// Check that `name` can be created as a collection.
pub fn validate_collection_name(path: &str, name: &str) -> FsResult<()> {
    if name.is_empty() {
        return Err(invalid(path, name, "collection name must not be empty"));
    }
    if let Some(ch) = name.chars().find(|c| matches!(c, '$' | '\0')) {
        return Err(invalid(
            path,
            name,
            format!("contains forbidden character: {ch:?}"),
        ));
    }
    if name.starts_with(RESERVED_COLLECTION_PREFIX) {
        return Err(invalid(
            path,
            name,
            format!("must not start with '{RESERVED_COLLECTION_PREFIX}'"),
        ));
    }
    Ok(())
}

/// Check that `segment` can name a document file.
pub fn validate_document_segment(path: &str, segment: &str) -> FsResult<()> {
    if segment == "." || segment == ".." {
        return Err(invalid(path, segment, "reserved directory entry"));
    }
    if segment.contains('\0') {
        return Err(invalid(path, segment, "contains NUL"));
    }
    Ok(())
}

/// Whether a stored name can appear as a directory entry.
pub fn is_listable(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\0'])
}

// ---------------------------------------------------------------------------
// ValidationGate
// ---------------------------------------------------------------------------

/// Existence checks issued before an entity is handed to an operation.
#[derive(Clone, Copy)]
pub struct ValidationGate<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ValidationGate<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    pub fn database_exists(&self, db: &str) -> FsResult<bool> {
        Ok(self.store.database_exists(db)?)
    }

    pub fn collection_exists(&self, db: &str, col: &str) -> FsResult<bool> {
        Ok(self.store.collection_exists(db, col)?)
    }

    /// Find the document a path segment names.
    ///
    /// A segment that parses as a native identifier is looked up in that
    /// form first; on a miss, or when it does not parse, the segment is
    /// looked up as a plain string key.
    pub fn locate_document(&self, db: &str, col: &str, segment: &str) -> FsResult<Option<Document>> {
        if let Some(native) = NativeId::parse_segment(segment) {
            if let Some(doc) = self.store.find_by_id(db, col, &DocumentId::Native(native))? {
                return Ok(Some(doc));
            }
        }
        Ok(self
            .store
            .find_by_id(db, col, &DocumentId::Key(segment.to_string()))?)
    }

    /// Resolve a parsed path to an entity that exists right now.
    ///
    /// A document reference carries the identifier the store actually holds,
    /// which for a 24-hex segment may be either form.
    pub fn check(&self, key: &PathKey, path: &str) -> FsResult<EntityRef> {
        match key.segments() {
            [] => Ok(EntityRef::Root),
            [db] => {
                if self.database_exists(db)? {
                    Ok(EntityRef::Database { name: db.clone() })
                } else {
                    Err(FsError::not_found(path))
                }
            }
            [db, col] => {
                if self.collection_exists(db, col)? {
                    Ok(EntityRef::Collection {
                        database: db.clone(),
                        name: col.clone(),
                    })
                } else {
                    Err(FsError::not_found(path))
                }
            }
            [db, col, segment] => match self.locate_document(db, col, segment)? {
                Some(doc) => Ok(EntityRef::Document {
                    database: db.clone(),
                    collection: col.clone(),
                    id: doc.id().clone(),
                }),
                None => Err(FsError::not_found(path)),
            },
            _ => Err(FsError::InvalidDepth {
                path: path.to_string(),
                depth: key.depth(),
            }),
        }
    }
}

impl std::fmt::Debug for ValidationGate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationGate").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfs_store::InMemoryDocumentStore;

    const HEX: &str = "507f1f77bcf86cd799439011";

    fn seeded() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        store.create_collection("db", "col").unwrap();
        store
            .save("db", "col", &Document::new(DocumentId::from_segment(HEX)))
            .unwrap();
        store
            .save("db", "col", &Document::new(DocumentId::Key("plain".into())))
            .unwrap();
        store
    }

    // -----------------------------------------------------------------------
    // Naming rules
    // -----------------------------------------------------------------------

    #[test]
    fn valid_database_names() {
        let longest = "x".repeat(MAX_DATABASE_NAME);
        for name in ["db", "my_db", "Prod-2024", longest.as_str()] {
            assert!(validate_database_name("/", name).is_ok(), "{name}");
        }
    }

    #[test]
    fn invalid_database_names() {
        let long = "x".repeat(MAX_DATABASE_NAME + 1);
        for name in ["", ".", "..", "a.b", "a b", "a$b", "a\\b", "a:b", "a\0b", long.as_str()] {
            let err = validate_database_name("/", name).unwrap_err();
            assert_eq!(err.errno(), libc::EINVAL, "{name:?}");
        }
    }

    #[test]
    fn collection_names() {
        assert!(validate_collection_name("/db", "users").is_ok());
        assert!(validate_collection_name("/db", "users.archive").is_ok());
        assert!(validate_collection_name("/db", "").is_err());
        assert!(validate_collection_name("/db", "a$b").is_err());
        assert!(validate_collection_name("/db", "system.users").is_err());
    }

    #[test]
    fn document_segments() {
        assert!(validate_document_segment("/db/col", "42").is_ok());
        assert!(validate_document_segment("/db/col", "notes.txt").is_ok());
        assert!(validate_document_segment("/db/col", ".").is_err());
        assert!(validate_document_segment("/db/col", "..").is_err());
    }

    #[test]
    fn listable_names() {
        assert!(is_listable("a"));
        assert!(!is_listable("a/b"));
        assert!(!is_listable(".."));
        assert!(!is_listable(""));
    }

    // -----------------------------------------------------------------------
    // Document lookup
    // -----------------------------------------------------------------------

    #[test]
    fn native_segment_finds_native_document() {
        let store = seeded();
        let gate = ValidationGate::new(&store);
        let doc = gate.locate_document("db", "col", HEX).unwrap().unwrap();
        assert!(doc.id().is_native());
    }

    #[test]
    fn native_segment_falls_back_to_string_key() {
        let store = InMemoryDocumentStore::new();
        store
            .save("db", "col", &Document::new(DocumentId::Key(HEX.into())))
            .unwrap();
        let gate = ValidationGate::new(&store);
        let doc = gate.locate_document("db", "col", HEX).unwrap().unwrap();
        assert_eq!(doc.id(), &DocumentId::Key(HEX.into()));
    }

    #[test]
    fn plain_segment_is_looked_up_as_key() {
        let store = seeded();
        let gate = ValidationGate::new(&store);
        assert!(gate.locate_document("db", "col", "plain").unwrap().is_some());
        assert!(gate.locate_document("db", "col", "absent").unwrap().is_none());
        assert!(gate.locate_document("db", "nope", "plain").unwrap().is_none());
    }

    #[test]
    fn uppercase_hex_is_a_key() {
        let store = seeded();
        let gate = ValidationGate::new(&store);
        let upper = HEX.to_uppercase();
        assert!(gate.locate_document("db", "col", &upper).unwrap().is_none());
    }

    // -----------------------------------------------------------------------
    // check
    // -----------------------------------------------------------------------

    #[test]
    fn check_resolves_each_depth() {
        let store = seeded();
        let gate = ValidationGate::new(&store);
        let cases = [
            ("/", EntityRef::Root),
            ("/db", EntityRef::Database { name: "db".into() }),
            (
                "/db/col",
                EntityRef::Collection {
                    database: "db".into(),
                    name: "col".into(),
                },
            ),
            (
                "/db/col/plain",
                EntityRef::Document {
                    database: "db".into(),
                    collection: "col".into(),
                    id: DocumentId::Key("plain".into()),
                },
            ),
        ];
        for (path, expected) in cases {
            let key = PathKey::parse(path).unwrap();
            assert_eq!(gate.check(&key, path).unwrap(), expected, "{path}");
        }
    }

    #[test]
    fn check_reports_missing_entries() {
        let store = seeded();
        let gate = ValidationGate::new(&store);
        for path in ["/nope", "/db/nope", "/db/col/nope", "/nope/col/plain"] {
            let key = PathKey::parse(path).unwrap();
            let err = gate.check(&key, path).unwrap_err();
            assert!(matches!(err, FsError::NotFound { .. }), "{path}: {err}");
        }
    }
}
