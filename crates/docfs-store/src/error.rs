use docfs_types::DocumentId;

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or refused the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// `create_collection` was called for a collection that already exists.
    #[error("collection already exists: {database}.{collection}")]
    CollectionExists {
        database: String,
        collection: String,
    },

    /// `insert` collided with an existing identifier.
    #[error("duplicate key {id} in {database}.{collection}")]
    DuplicateKey {
        database: String,
        collection: String,
        id: DocumentId,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding store state was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
