//! Filesystem projection of a document store.
//!
//! Maps the store's database/collection/document hierarchy onto a directory
//! tree of fixed depth:
//!
//! ```text
//! /                       root        (directory: one entry per database)
//! /<database>             database    (directory: one entry per collection)
//! /<database>/<coll>      collection  (directory: one entry per document)
//! /<database>/<coll>/<id> document    (regular file: the JSON body)
//! ```
//!
//! # Architecture
//!
//! - [`DocFs`] -- operation dispatcher; the only place failures become errnos
//! - [`PathResolver`] / [`PathKey`] -- path parsing and entity resolution
//! - [`EntityRef`] -- the four entity kinds and what each one supports
//! - [`ValidationGate`] -- existence checks and naming rules
//! - [`AttributeSynthesizer`] -- `stat` records from store statistics
//! - [`DocumentCodec`] -- document ⇄ JSON body, and the write policy
//! - [`XattrTable`] -- process-local extended attributes
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use docfs_core::{DocFs, FsConfig};
//! use docfs_store::InMemoryDocumentStore;
//!
//! let fs = DocFs::new(Arc::new(InMemoryDocumentStore::new()), FsConfig::default());
//! fs.write("/shop/orders/42", br#"{"total": 9}"#, 0).unwrap();
//! let body = fs.read("/shop/orders/42", 4096, 0).unwrap();
//! assert!(String::from_utf8(body).unwrap().starts_with("{\n    \"_id\": \"42\""));
//! ```

pub mod attr;
pub mod codec;
pub mod config;
pub mod entity;
pub mod error;
pub mod fs;
pub mod path;
pub mod validation;
pub mod xattr;

pub use attr::{AttributeSynthesizer, FileAttr, FileKind};
pub use codec::{CodecError, DocumentCodec, DATA_FIELD};
pub use config::{FsConfig, Owner, StatFsConfig};
pub use entity::{EntityKind, EntityRef};
pub use error::{ConfigError, Errno, FsError, FsResult};
pub use fs::{DocFs, StatFs};
pub use path::{PathKey, PathResolver, MAX_DEPTH};
pub use validation::ValidationGate;
pub use xattr::XattrTable;
