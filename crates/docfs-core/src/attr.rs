//! File attribute synthesis.
//!
//! Nothing is cached: every record is computed from store statistics at the
//! time of the call.

use std::time::SystemTime;

use docfs_store::DocumentStore;

use crate::codec::DocumentCodec;
use crate::config::Owner;
use crate::entity::EntityRef;
use crate::error::FsResult;

/// Block size used for `blksize` and the `blocks` count.
pub const BLOCK_SIZE: u32 = 512;

/// Permission bits reported on every entry.
pub const PERMISSIONS: u32 = 0o777;

/// Type of a filesystem entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    RegularFile,
}

/// Attributes of one filesystem entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileAttr {
    pub kind: FileKind,
    pub perm: u32,
    pub nlink: u64,
    pub size: u64,
    pub blocks: u64,
    pub blksize: u32,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub uid: u32,
    pub gid: u32,
}

impl FileAttr {
    /// `st_mode`: type bits combined with permission bits.
    pub fn mode(&self) -> u32 {
        let kind = match self.kind {
            FileKind::Directory => libc::S_IFDIR,
            FileKind::RegularFile => libc::S_IFREG,
        };
        kind as u32 | self.perm
    }
}

/// Computes [`FileAttr`] records from store metadata.
pub struct AttributeSynthesizer<'a> {
    store: &'a dyn DocumentStore,
    codec: &'a DocumentCodec,
    owner: Owner,
}

impl<'a> AttributeSynthesizer<'a> {
    pub fn new(store: &'a dyn DocumentStore, codec: &'a DocumentCodec, owner: Owner) -> Self {
        Self {
            store,
            codec,
            owner,
        }
    }

    /// Attributes of a resolved entity.
    ///
    /// Directories report the store's last flush time as ctime and mtime,
    /// falling back to now. Documents report now for all three.
    pub fn attributes_for(&self, entity: &EntityRef) -> FsResult<FileAttr> {
        let now = SystemTime::now();
        match entity {
            EntityRef::Root => {
                let nlink = self.store.list_databases()?.len() as u64;
                Ok(self.directory(0, nlink, self.flushed_at(now)?, now))
            }
            EntityRef::Database { name } => {
                let nlink = self.store.list_databases()?.len() as u64;
                let size = self.store.database_stats(name)?.file_size;
                Ok(self.directory(size, nlink, self.flushed_at(now)?, now))
            }
            EntityRef::Collection { database, name } => {
                let size = self.store.collection_stats(database, name)?.storage_size;
                Ok(self.directory(size, 1, self.flushed_at(now)?, now))
            }
            EntityRef::Document {
                database,
                collection,
                id,
            } => {
                let size = match self.store.find_by_id(database, collection, id)? {
                    Some(doc) => self.codec.encode(&doc)?.len() as u64,
                    None => 0,
                };
                Ok(self.record(FileKind::RegularFile, size, 1, now, now))
            }
        }
    }

    fn flushed_at(&self, now: SystemTime) -> FsResult<SystemTime> {
        Ok(self
            .store
            .server_status()?
            .last_flush
            .map(SystemTime::from)
            .unwrap_or(now))
    }

    fn directory(&self, size: u64, nlink: u64, changed: SystemTime, now: SystemTime) -> FileAttr {
        self.record(FileKind::Directory, size, nlink, changed, now)
    }

    fn record(
        &self,
        kind: FileKind,
        size: u64,
        nlink: u64,
        changed: SystemTime,
        now: SystemTime,
    ) -> FileAttr {
        FileAttr {
            kind,
            perm: PERMISSIONS,
            nlink,
            size,
            blocks: size.div_ceil(u64::from(BLOCK_SIZE)),
            blksize: BLOCK_SIZE,
            atime: now,
            mtime: changed,
            ctime: changed,
            uid: self.owner.uid,
            gid: self.owner.gid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfs_store::InMemoryDocumentStore;
    use docfs_types::{Document, DocumentId};
    use serde_json::json;

    const OWNER: Owner = Owner { uid: 1000, gid: 100 };

    fn seeded() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        let mut doc = Document::new(DocumentId::Key("a".into()));
        doc.insert("x", json!(1)).unwrap();
        store.save("db", "col", &doc).unwrap();
        store.create_collection("other", "c").unwrap();
        store
    }

    fn attrs(store: &InMemoryDocumentStore, entity: &EntityRef) -> FileAttr {
        let codec = DocumentCodec::default();
        AttributeSynthesizer::new(store, &codec, OWNER)
            .attributes_for(entity)
            .unwrap()
    }

    #[test]
    fn root_links_count_databases() {
        let store = seeded();
        let attr = attrs(&store, &EntityRef::Root);
        assert_eq!(attr.kind, FileKind::Directory);
        assert_eq!(attr.nlink, 2);
        assert_eq!(attr.size, 0);
        assert_eq!(attr.mode(), libc::S_IFDIR as u32 | 0o777);
        assert_eq!((attr.uid, attr.gid), (1000, 100));
    }

    #[test]
    fn database_size_is_file_size() {
        let store = seeded();
        let attr = attrs(&store, &EntityRef::Database { name: "db".into() });
        assert_eq!(attr.size, store.database_stats("db").unwrap().file_size);
        assert_eq!(attr.nlink, 2);
    }

    #[test]
    fn collection_size_is_storage_size() {
        let store = seeded();
        let entity = EntityRef::Collection {
            database: "db".into(),
            name: "col".into(),
        };
        let attr = attrs(&store, &entity);
        assert_eq!(attr.size, store.collection_stats("db", "col").unwrap().storage_size);
        assert_eq!(attr.nlink, 1);
    }

    #[test]
    fn directory_times_follow_last_flush() {
        let store = seeded();
        let flushed = store.server_status().unwrap().last_flush.unwrap();
        let attr = attrs(&store, &EntityRef::Root);
        assert_eq!(attr.mtime, SystemTime::from(flushed));
        assert_eq!(attr.ctime, attr.mtime);
        assert!(attr.atime >= attr.mtime);
    }

    #[test]
    fn document_size_is_encoded_length() {
        let store = seeded();
        let codec = DocumentCodec::default();
        let entity = EntityRef::Document {
            database: "db".into(),
            collection: "col".into(),
            id: DocumentId::Key("a".into()),
        };
        let stored = store
            .find_by_id("db", "col", &DocumentId::Key("a".into()))
            .unwrap()
            .unwrap();
        let attr = attrs(&store, &entity);
        assert_eq!(attr.kind, FileKind::RegularFile);
        assert_eq!(attr.size, codec.encode(&stored).unwrap().len() as u64);
        assert_eq!(attr.blocks, 1);
        assert_eq!(attr.mode(), libc::S_IFREG as u32 | 0o777);
    }

    #[test]
    fn missing_document_has_zero_size() {
        let store = seeded();
        let entity = EntityRef::Document {
            database: "db".into(),
            collection: "col".into(),
            id: DocumentId::Key("gone".into()),
        };
        let attr = attrs(&store, &entity);
        assert_eq!(attr.size, 0);
        assert_eq!(attr.blocks, 0);
    }
}
