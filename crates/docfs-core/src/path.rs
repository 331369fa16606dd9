//! Path parsing and resolution.
//!
//! A path names one of four fixed depths:
//!
//! | depth | path            | entity     |
//! |-------|-----------------|------------|
//! | 0     | `/`             | root       |
//! | 1     | `/db`           | database   |
//! | 2     | `/db/col`       | collection |
//! | 3     | `/db/col/id`    | document   |
//!
//! Anything deeper is rejected before the store is consulted.

use docfs_store::DocumentStore;
use docfs_types::DocumentId;

use crate::entity::EntityRef;
use crate::error::{FsError, FsResult};
use crate::validation::{
    validate_collection_name, validate_database_name, validate_document_segment, ValidationGate,
};

/// Deepest level of the hierarchy (database/collection/document).
pub const MAX_DEPTH: usize = 3;

/// The non-empty segments of a path, at most [`MAX_DEPTH`] of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathKey {
    segments: Vec<String>,
}

impl PathKey {
    /// Split `path` on `/`, dropping empty segments from leading, trailing
    /// or repeated slashes.
    pub fn parse(path: &str) -> FsResult<Self> {
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.len() > MAX_DEPTH {
            return Err(FsError::InvalidDepth {
                path: path.to_string(),
                depth: segments.len(),
            });
        }
        Ok(Self { segments })
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Build the entity this key names without asking the store.
    ///
    /// Names are checked against the store's naming rules, since the entity
    /// is about to be created. The document identifier is the canonical
    /// parse of its segment.
    pub fn to_entity(&self, path: &str) -> FsResult<EntityRef> {
        match self.segments.as_slice() {
            [] => Ok(EntityRef::Root),
            [db] => {
                validate_database_name(path, db)?;
                Ok(EntityRef::Database { name: db.clone() })
            }
            [db, col] => {
                validate_database_name(path, db)?;
                validate_collection_name(path, col)?;
                Ok(EntityRef::Collection {
                    database: db.clone(),
                    name: col.clone(),
                })
            }
            [db, col, segment] => {
                validate_database_name(path, db)?;
                validate_collection_name(path, col)?;
                validate_document_segment(path, segment)?;
                Ok(EntityRef::Document {
                    database: db.clone(),
                    collection: col.clone(),
                    id: DocumentId::from_segment(segment),
                })
            }
            _ => Err(FsError::InvalidDepth {
                path: path.to_string(),
                depth: self.depth(),
            }),
        }
    }
}

/// Turns path strings into entity references.
#[derive(Debug)]
pub struct PathResolver<'a> {
    gate: ValidationGate<'a>,
}

impl<'a> PathResolver<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            gate: ValidationGate::new(store),
        }
    }

    /// Resolve `path` to an entity.
    ///
    /// With `must_exist` the entity is checked against live store state and
    /// a miss is [`FsError::NotFound`]. Without it (create-type operations)
    /// no store call is made.
    pub fn resolve(&self, path: &str, must_exist: bool) -> FsResult<EntityRef> {
        let key = PathKey::parse(path)?;
        if must_exist {
            self.gate.check(&key, path)
        } else {
            key.to_entity(path)
        }
    }

    pub fn gate(&self) -> &ValidationGate<'a> {
        &self.gate
    }
}
