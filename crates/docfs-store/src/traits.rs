use docfs_types::{Document, DocumentId};

use crate::error::StoreResult;
use crate::stats::{CollectionStats, DatabaseStats, ServerStatus};

/// Driver interface to a document store.
///
/// The namespace is three levels deep: databases contain collections,
/// collections contain documents keyed by [`DocumentId`]. Implementations
/// must be thread-safe (`Send + Sync`); every call is a single round-trip and
/// no call spans a transaction with another.
///
/// Conventions every backend follows:
/// - `insert` and `save` create a missing database or collection implicitly.
/// - `find_by_id` and `delete_by_id` match the identifier exactly; a native
///   id never matches a string key with the same text.
/// - Failures are returned immediately, never retried.
pub trait DocumentStore: Send + Sync {
    /// Names of all databases, sorted.
    fn list_databases(&self) -> StoreResult<Vec<String>>;

    /// Names of all collections in `db`, sorted. Empty if `db` is absent.
    fn list_collections(&self, db: &str) -> StoreResult<Vec<String>>;

    /// Create an empty collection, creating `db` if needed.
    ///
    /// Fails with [`StoreError::CollectionExists`](crate::StoreError::CollectionExists)
    /// when the collection is already present.
    fn create_collection(&self, db: &str, name: &str) -> StoreResult<()>;

    /// Drop a collection and its documents. Dropping an absent collection is
    /// not an error.
    fn drop_collection(&self, db: &str, name: &str) -> StoreResult<()>;

    /// Drop a database with all its collections. Dropping an absent database
    /// is not an error.
    fn drop_database(&self, db: &str) -> StoreResult<()>;

    /// Fetch one document by identifier.
    ///
    /// Returns `Ok(None)` if it does not exist.
    fn find_by_id(&self, db: &str, col: &str, id: &DocumentId) -> StoreResult<Option<Document>>;

    /// All documents of a collection, ordered by identifier.
    fn find_all(&self, db: &str, col: &str) -> StoreResult<Vec<Document>>;

    /// Insert a new document. Fails with
    /// [`StoreError::DuplicateKey`](crate::StoreError::DuplicateKey) if the
    /// identifier is taken; the existing document is left untouched.
    fn insert(&self, db: &str, col: &str, doc: &Document) -> StoreResult<()>;

    /// Insert or replace a document (upsert).
    fn save(&self, db: &str, col: &str, doc: &Document) -> StoreResult<()>;

    /// Delete one document. Returns `true` if it existed.
    fn delete_by_id(&self, db: &str, col: &str, id: &DocumentId) -> StoreResult<bool>;

    /// Size statistics for a database.
    fn database_stats(&self, db: &str) -> StoreResult<DatabaseStats>;

    /// Size statistics for a collection.
    fn collection_stats(&self, db: &str, col: &str) -> StoreResult<CollectionStats>;

    /// Store-wide status.
    fn server_status(&self) -> StoreResult<ServerStatus>;

    /// Close the connection. Called once at unmount.
    fn disconnect(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Returns `true` if `db` exists.
    fn database_exists(&self, db: &str) -> StoreResult<bool> {
        Ok(self.list_databases()?.iter().any(|name| name == db))
    }

    /// Returns `true` if `col` exists in `db`.
    fn collection_exists(&self, db: &str, col: &str) -> StoreResult<bool> {
        Ok(self.list_collections(db)?.iter().any(|name| name == col))
    }
}
