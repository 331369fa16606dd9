//! Document store driver interface for docfs.
//!
//! The filesystem layer never talks to a database directly. It consumes the
//! [`DocumentStore`] trait: list and create/drop databases and collections,
//! find/insert/upsert/delete documents by identifier, and report size
//! statistics.
//!
//! # Storage Backends
//!
//! - [`InMemoryDocumentStore`] -- `BTreeMap`-based store with JSON snapshot
//!   persistence, used by tests and the `docfs` command-line tool
//!
//! # Design Rules
//!
//! 1. Every call is one round-trip; there are no cross-call transactions.
//! 2. Failures are returned immediately and never retried.
//! 3. Writes are last-writer-wins.

pub mod error;
pub mod memory;
pub mod stats;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryDocumentStore;
pub use stats::{CollectionStats, DatabaseStats, ServerStatus};
pub use traits::DocumentStore;
