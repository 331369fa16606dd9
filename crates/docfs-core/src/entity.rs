//! Resolved entities and the operations each one supports.
//!
//! | capability     | root | database | collection | document |
//! |----------------|------|----------|------------|----------|
//! | list children  | yes  | yes      | yes        | ENOTDIR  |
//! | make/remove dir| EPERM| yes      | yes        | EPERM    |
//! | create/read/write | EPERM | EPERM | EPERM      | yes      |
//! | unlink, truncate | EISDIR | EISDIR | EISDIR   | yes      |

use std::collections::BTreeSet;
use std::fmt;

use docfs_store::{DocumentStore, StoreError};
use docfs_types::{Document, DocumentId};
use tracing::info;

use crate::codec::DocumentCodec;
use crate::error::{FsError, FsResult};
use crate::validation::{is_listable, ValidationGate};

/// Collection created and dropped again to make the store materialize a new
/// database.
pub const PROVISION_COLLECTION: &str = "__docfs_provision__";

/// The kind of entity a path resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Root,
    Database,
    Collection,
    Document,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Database => write!(f, "database"),
            Self::Collection => write!(f, "collection"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// A path resolved to one level of the store hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Root,
    Database {
        name: String,
    },
    Collection {
        database: String,
        name: String,
    },
    Document {
        database: String,
        collection: String,
        id: DocumentId,
    },
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Root => EntityKind::Root,
            Self::Database { .. } => EntityKind::Database,
            Self::Collection { .. } => EntityKind::Collection,
            Self::Document { .. } => EntityKind::Document,
        }
    }

    pub fn is_directory(&self) -> bool {
        !matches!(self, Self::Document { .. })
    }

    /// Canonical path of this entity.
    pub fn path(&self) -> String {
        match self {
            Self::Root => "/".to_string(),
            Self::Database { name } => format!("/{name}"),
            Self::Collection { database, name } => format!("/{database}/{name}"),
            Self::Document {
                database,
                collection,
                id,
            } => format!("/{database}/{collection}/{id}"),
        }
    }

    // -----------------------------------------------------------------------
    // Directory capabilities
    // -----------------------------------------------------------------------

    /// Names of the entries directly below this directory.
    pub fn list_children(&self, store: &dyn DocumentStore) -> FsResult<Vec<String>> {
        match self {
            Self::Root => Ok(store.list_databases()?),
            Self::Database { name } => Ok(store.list_collections(name)?),
            Self::Collection { database, name } => {
                // A native id and a string key with the same text share one name.
                let names: BTreeSet<String> = store
                    .find_all(database, name)?
                    .iter()
                    .map(|doc| doc.id().to_string())
                    .filter(|name| is_listable(name))
                    .collect();
                Ok(names.into_iter().collect())
            }
            Self::Document { .. } => Err(FsError::NotADirectory { path: self.path() }),
        }
    }

    /// Create this directory. Creating one that already exists succeeds.
    ///
    /// A new database is provisioned by creating and immediately dropping a
    /// placeholder collection.
    pub fn make_dir(&self, store: &dyn DocumentStore) -> FsResult<()> {
        match self {
            Self::Database { name } => {
                if store.database_exists(name)? {
                    return Ok(());
                }
                store.create_collection(name, PROVISION_COLLECTION)?;
                store.drop_collection(name, PROVISION_COLLECTION)?;
                info!(database = %name, "provisioned database");
                Ok(())
            }
            Self::Collection { database, name } => match store.create_collection(database, name) {
                Ok(()) => {
                    info!(database = %database, collection = %name, "created collection");
                    Ok(())
                }
                Err(StoreError::CollectionExists { .. }) => Ok(()),
                Err(e) => Err(e.into()),
            },
            Self::Root | Self::Document { .. } => Err(FsError::denied("mkdir", self.path())),
        }
    }

    /// Drop this directory with everything in it. Dropping an absent one
    /// succeeds.
    pub fn remove_dir(&self, store: &dyn DocumentStore) -> FsResult<()> {
        match self {
            Self::Database { name } => {
                store.drop_database(name)?;
                info!(database = %name, "dropped database");
                Ok(())
            }
            Self::Collection { database, name } => {
                store.drop_collection(database, name)?;
                info!(database = %database, collection = %name, "dropped collection");
                Ok(())
            }
            Self::Root | Self::Document { .. } => Err(FsError::denied("rmdir", self.path())),
        }
    }

    // -----------------------------------------------------------------------
    // File capabilities
    // -----------------------------------------------------------------------

    /// Insert an empty document. An existing document is left untouched and
    /// the call fails with [`FsError::AlreadyExists`].
    pub fn create_file(&self, store: &dyn DocumentStore) -> FsResult<()> {
        let (database, collection, id) = self.document_parts("create")?;
        let gate = ValidationGate::new(store);
        if gate.locate_document(database, collection, &id.to_string())?.is_some() {
            return Err(FsError::AlreadyExists { path: self.path() });
        }
        store.insert(database, collection, &Document::new(id.clone()))?;
        Ok(())
    }

    /// The full encoded body of this document.
    pub fn read_body(&self, store: &dyn DocumentStore, codec: &DocumentCodec) -> FsResult<Vec<u8>> {
        let (database, collection, id) = self.document_parts("read")?;
        let doc = store
            .find_by_id(database, collection, id)?
            .ok_or_else(|| FsError::not_found(self.path()))?;
        Ok(codec.encode(&doc)?)
    }

    /// Apply a write of `data` at `offset` and store the result.
    ///
    /// The document is created if absent. An existing document keeps the
    /// identifier form the store holds it under.
    pub fn write_body(
        &self,
        store: &dyn DocumentStore,
        codec: &DocumentCodec,
        data: &[u8],
        offset: u64,
    ) -> FsResult<usize> {
        let (database, collection, id) = self.document_parts("write")?;
        let existing =
            ValidationGate::new(store).locate_document(database, collection, &id.to_string())?;
        let target = existing
            .as_ref()
            .map(|doc| doc.id().clone())
            .unwrap_or_else(|| id.clone());
        let doc = codec.apply_write(target, existing, data, offset);
        store.save(database, collection, &doc)?;
        Ok(data.len())
    }

    /// Delete this document. A native identifier that matches nothing falls
    /// back to the string key with the same text.
    pub fn unlink(&self, store: &dyn DocumentStore) -> FsResult<()> {
        let Self::Document {
            database,
            collection,
            id,
        } = self
        else {
            return Err(FsError::IsADirectory { path: self.path() });
        };
        let mut deleted = store.delete_by_id(database, collection, id)?;
        if !deleted && id.is_native() {
            deleted = store.delete_by_id(database, collection, &DocumentId::Key(id.to_string()))?;
        }
        if deleted {
            Ok(())
        } else {
            Err(FsError::not_found(self.path()))
        }
    }

    /// Truncate this document. Length zero resets it to its bare
    /// identifier; any other length leaves the stored fields alone.
    pub fn truncate(&self, store: &dyn DocumentStore, length: u64) -> FsResult<()> {
        let Self::Document {
            database,
            collection,
            id,
        } = self
        else {
            return Err(FsError::IsADirectory { path: self.path() });
        };
        if length > 0 {
            return Ok(());
        }
        let target = ValidationGate::new(store)
            .locate_document(database, collection, &id.to_string())?
            .map(|doc| doc.id().clone())
            .unwrap_or_else(|| id.clone());
        store.save(database, collection, &Document::new(target))?;
        Ok(())
    }

    fn document_parts(&self, op: &'static str) -> FsResult<(&str, &str, &DocumentId)> {
        match self {
            Self::Document {
                database,
                collection,
                id,
            } => Ok((database, collection, id)),
            _ => Err(FsError::denied(op, self.path())),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.path())
    }
}
