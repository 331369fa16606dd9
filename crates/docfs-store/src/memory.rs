use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use docfs_types::{Document, DocumentId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::stats::{CollectionStats, DatabaseStats, ServerStatus};
use crate::traits::DocumentStore;

/// Allocation unit used when reporting database file sizes.
const FILE_PAGE: u64 = 4096;

type Collection = BTreeMap<DocumentId, Document>;

#[derive(Debug, Default)]
struct Namespace {
    databases: BTreeMap<String, BTreeMap<String, Collection>>,
    last_flush: Option<DateTime<Utc>>,
}

impl Namespace {
    fn collection(&self, db: &str, col: &str) -> Option<&Collection> {
        self.databases.get(db).and_then(|cols| cols.get(col))
    }

    fn collection_mut(&mut self, db: &str, col: &str) -> &mut Collection {
        self.databases
            .entry(db.to_string())
            .or_default()
            .entry(col.to_string())
            .or_default()
    }

    fn touch(&mut self) {
        self.last_flush = Some(Utc::now());
    }
}

/// On-disk form of an [`InMemoryDocumentStore`].
///
/// Documents are listed per collection because JSON object keys must be
/// strings and a [`DocumentId`] is not.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    databases: BTreeMap<String, BTreeMap<String, Vec<Document>>>,
    last_flush: Option<DateTime<Utc>>,
}

impl From<&Namespace> for Snapshot {
    fn from(ns: &Namespace) -> Self {
        let databases = ns
            .databases
            .iter()
            .map(|(db, cols)| {
                let cols = cols
                    .iter()
                    .map(|(col, docs)| (col.clone(), docs.values().cloned().collect()))
                    .collect();
                (db.clone(), cols)
            })
            .collect();
        Self {
            databases,
            last_flush: ns.last_flush,
        }
    }
}

impl From<Snapshot> for Namespace {
    fn from(snapshot: Snapshot) -> Self {
        let databases = snapshot
            .databases
            .into_iter()
            .map(|(db, cols)| {
                let cols = cols
                    .into_iter()
                    .map(|(col, docs)| {
                        let docs = docs.into_iter().map(|d| (d.id().clone(), d)).collect();
                        (col, docs)
                    })
                    .collect();
                (db, cols)
            })
            .collect();
        Self {
            databases,
            last_flush: snapshot.last_flush,
        }
    }
}

/// In-memory document store.
///
/// All data lives in nested `BTreeMap`s behind a `RwLock`, so listings come
/// out sorted. Databases persist once created until dropped, even when they
/// hold no collections. The whole namespace can be written to and read back
/// from a JSON snapshot file.
///
/// After [`DocumentStore::disconnect`] every call fails with
/// [`StoreError::Unavailable`].
pub struct InMemoryDocumentStore {
    state: RwLock<Namespace>,
    connected: AtomicBool,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Namespace::default()),
            connected: AtomicBool::new(true),
        }
    }

    /// Load a store from a snapshot file written by [`Self::save_snapshot`].
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        info!(path = %path.display(), databases = snapshot.databases.len(), "loaded store snapshot");
        Ok(Self {
            state: RwLock::new(snapshot.into()),
            connected: AtomicBool::new(true),
        })
    }

    /// Write the whole namespace to a snapshot file.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let snapshot = Snapshot::from(&*self.read_state()?);
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        std::fs::write(path, bytes)?;
        debug!(path = %path.display(), "saved store snapshot");
        Ok(())
    }

    /// Total number of documents across all databases.
    pub fn document_count(&self) -> StoreResult<usize> {
        let state = self.read_state()?;
        Ok(state
            .databases
            .values()
            .flat_map(|cols| cols.values())
            .map(|docs| docs.len())
            .sum())
    }

    fn ensure_connected(&self) -> StoreResult<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("connection closed".into()))
        }
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, Namespace>> {
        self.ensure_connected()?;
        self.state
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, Namespace>> {
        self.ensure_connected()?;
        self.state
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn storage_size(docs: &Collection) -> u64 {
    docs.values().map(Document::stored_size).sum()
}

impl DocumentStore for InMemoryDocumentStore {
    fn list_databases(&self) -> StoreResult<Vec<String>> {
        Ok(self.read_state()?.databases.keys().cloned().collect())
    }

    fn list_collections(&self, db: &str) -> StoreResult<Vec<String>> {
        let state = self.read_state()?;
        Ok(state
            .databases
            .get(db)
            .map(|cols| cols.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn create_collection(&self, db: &str, name: &str) -> StoreResult<()> {
        let mut state = self.write_state()?;
        let cols = state.databases.entry(db.to_string()).or_default();
        if cols.contains_key(name) {
            return Err(StoreError::CollectionExists {
                database: db.to_string(),
                collection: name.to_string(),
            });
        }
        cols.insert(name.to_string(), Collection::new());
        state.touch();
        Ok(())
    }

    fn drop_collection(&self, db: &str, name: &str) -> StoreResult<()> {
        let mut state = self.write_state()?;
        if let Some(cols) = state.databases.get_mut(db) {
            cols.remove(name);
        }
        state.touch();
        Ok(())
    }

    fn drop_database(&self, db: &str) -> StoreResult<()> {
        let mut state = self.write_state()?;
        state.databases.remove(db);
        state.touch();
        Ok(())
    }

    fn find_by_id(&self, db: &str, col: &str, id: &DocumentId) -> StoreResult<Option<Document>> {
        let state = self.read_state()?;
        Ok(state.collection(db, col).and_then(|docs| docs.get(id)).cloned())
    }

    fn find_all(&self, db: &str, col: &str) -> StoreResult<Vec<Document>> {
        let state = self.read_state()?;
        Ok(state
            .collection(db, col)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    fn insert(&self, db: &str, col: &str, doc: &Document) -> StoreResult<()> {
        let mut state = self.write_state()?;
        let docs = state.collection_mut(db, col);
        if docs.contains_key(doc.id()) {
            return Err(StoreError::DuplicateKey {
                database: db.to_string(),
                collection: col.to_string(),
                id: doc.id().clone(),
            });
        }
        docs.insert(doc.id().clone(), doc.clone());
        state.touch();
        Ok(())
    }

    fn save(&self, db: &str, col: &str, doc: &Document) -> StoreResult<()> {
        let mut state = self.write_state()?;
        state
            .collection_mut(db, col)
            .insert(doc.id().clone(), doc.clone());
        state.touch();
        Ok(())
    }

    fn delete_by_id(&self, db: &str, col: &str, id: &DocumentId) -> StoreResult<bool> {
        let mut state = self.write_state()?;
        let removed = state
            .databases
            .get_mut(db)
            .and_then(|cols| cols.get_mut(col))
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            state.touch();
        }
        Ok(removed)
    }

    fn database_stats(&self, db: &str) -> StoreResult<DatabaseStats> {
        let state = self.read_state()?;
        let Some(cols) = state.databases.get(db) else {
            return Ok(DatabaseStats::default());
        };
        let storage: u64 = cols.values().map(storage_size).sum();
        Ok(DatabaseStats {
            collections: cols.len() as u64,
            objects: cols.values().map(|docs| docs.len() as u64).sum(),
            storage_size: storage,
            file_size: storage.div_ceil(FILE_PAGE) * FILE_PAGE,
        })
    }

    fn collection_stats(&self, db: &str, col: &str) -> StoreResult<CollectionStats> {
        let state = self.read_state()?;
        Ok(state
            .collection(db, col)
            .map(|docs| CollectionStats {
                count: docs.len() as u64,
                storage_size: storage_size(docs),
            })
            .unwrap_or_default())
    }

    fn server_status(&self) -> StoreResult<ServerStatus> {
        let state = self.read_state()?;
        Ok(ServerStatus {
            last_flush: state.last_flush,
        })
    }

    fn disconnect(&self) -> StoreResult<()> {
        if self.connected.swap(false, Ordering::AcqRel) {
            info!("document store disconnected");
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let databases = self
            .state
            .read()
            .map(|state| state.databases.len())
            .unwrap_or(0);
        f.debug_struct("InMemoryDocumentStore")
            .field("databases", &databases)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish()
    }
}
