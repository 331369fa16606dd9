//! Size and status records reported by a document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-database statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
    /// Number of collections in the database.
    pub collections: u64,
    /// Number of documents across all collections.
    pub objects: u64,
    /// Bytes used by document data.
    pub storage_size: u64,
    /// Bytes allocated on disk for the database.
    pub file_size: u64,
}

/// Per-collection statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Number of documents in the collection.
    pub count: u64,
    /// Bytes used by document data.
    pub storage_size: u64,
}

/// Store-wide status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// When the store last flushed data to durable storage, if known.
    pub last_flush: Option<DateTime<Utc>>,
}
