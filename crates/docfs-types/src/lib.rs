//! Foundation types for docfs.
//!
//! This crate provides the identifier and document types shared by the store
//! driver interface and the filesystem translation layer.
//!
//! # Key Types
//!
//! - [`NativeId`] -- The store's compact 12-byte object identifier
//! - [`DocumentId`] -- A native identifier or an opaque string key
//! - [`Document`] -- An identifier plus its field map

pub mod document;
pub mod error;
pub mod id;

pub use document::{Document, ID_FIELD};
pub use error::TypeError;
pub use id::{DocumentId, NativeId};
