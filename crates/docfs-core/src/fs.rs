//! The filesystem operation dispatcher.
//!
//! [`DocFs`] receives one call per host filesystem operation, resolves the
//! path, checks the entity's capability, delegates, and reports failures as
//! [`FsError`]s whose [`errno`](FsError::errno) is what the host returns to
//! the caller.

use std::sync::Arc;
use std::time::SystemTime;

use docfs_store::DocumentStore;
use tracing::{debug, info, warn};

use crate::attr::{AttributeSynthesizer, FileAttr};
use crate::codec::DocumentCodec;
use crate::config::{FsConfig, Owner};
use crate::entity::EntityRef;
use crate::error::{FsError, FsResult};
use crate::path::{PathKey, PathResolver};
use crate::xattr::XattrTable;

/// Longest file name reported by `statfs`.
pub const NAME_MAX: u32 = 255;

/// Capacity figures returned by [`DocFs::statfs`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatFs {
    pub bsize: u32,
    pub blocks: u64,
    pub bfree: u64,
    pub bavail: u64,
    pub namelen: u32,
}

/// A document store exposed as a filesystem tree.
///
/// Holds the shared store handle and the extended-attribute table; every
/// other piece of state is rebuilt per call. Safe to call from several
/// threads at once.
pub struct DocFs {
    store: Arc<dyn DocumentStore>,
    codec: DocumentCodec,
    xattrs: XattrTable,
    owner: Owner,
    config: FsConfig,
}

impl DocFs {
    /// Serve `store` with the given configuration.
    pub fn new(store: Arc<dyn DocumentStore>, config: FsConfig) -> Self {
        let owner = config.effective_owner();
        info!(uid = owner.uid, gid = owner.gid, xattrs = config.xattrs, "store connected");
        Self {
            store,
            codec: DocumentCodec::new(config.json_indent),
            xattrs: XattrTable::new(config.xattrs),
            owner,
            config,
        }
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn codec(&self) -> &DocumentCodec {
        &self.codec
    }

    // -----------------------------------------------------------------------
    // Attributes and listing
    // -----------------------------------------------------------------------

    pub fn getattr(&self, path: &str) -> FsResult<FileAttr> {
        self.dispatch("getattr", path, || {
            let entity = self.resolve(path, true)?;
            AttributeSynthesizer::new(self.store.as_ref(), &self.codec, self.owner)
                .attributes_for(&entity)
        })
    }

    /// Entry names of a directory, starting with `.` and `..`.
    pub fn readdir(&self, path: &str) -> FsResult<Vec<String>> {
        self.dispatch("readdir", path, || {
            let entity = self.resolve(path, true)?;
            let children = entity.list_children(self.store.as_ref())?;
            let mut entries = Vec::with_capacity(children.len() + 2);
            entries.push(".".to_string());
            entries.push("..".to_string());
            entries.extend(children);
            Ok(entries)
        })
    }

    // -----------------------------------------------------------------------
    // File contents
    // -----------------------------------------------------------------------

    /// Up to `size` bytes of the document body starting at `offset`.
    pub fn read(&self, path: &str, size: usize, offset: u64) -> FsResult<Vec<u8>> {
        self.dispatch("read", path, || {
            let entity = self.resolve(path, true)?;
            let body = entity.read_body(self.store.as_ref(), &self.codec)?;
            let start = usize::try_from(offset).unwrap_or(usize::MAX).min(body.len());
            let end = start.saturating_add(size).min(body.len());
            Ok(body[start..end].to_vec())
        })
    }

    /// Write `data` at `offset`, creating the document if needed. Returns the
    /// number of bytes accepted, always `data.len()`.
    pub fn write(&self, path: &str, data: &[u8], offset: u64) -> FsResult<usize> {
        self.dispatch("write", path, || {
            let entity = self.resolve(path, false)?;
            entity.write_body(self.store.as_ref(), &self.codec, data, offset)
        })
    }

    /// Create an empty document. The mode is accepted and ignored.
    pub fn create(&self, path: &str, _mode: u32) -> FsResult<()> {
        self.dispatch("create", path, || {
            self.resolve(path, false)?.create_file(self.store.as_ref())
        })
    }

    pub fn truncate(&self, path: &str, length: u64) -> FsResult<()> {
        self.dispatch("truncate", path, || {
            self.resolve(path, false)?.truncate(self.store.as_ref(), length)
        })
    }

    pub fn unlink(&self, path: &str) -> FsResult<()> {
        self.dispatch("unlink", path, || {
            let entity = self.resolve(path, true)?;
            entity.unlink(self.store.as_ref())?;
            self.xattrs.forget(&entity.path())
        })
    }

    /// Move a document to a new path within the store.
    ///
    /// Runs as read, write-new, delete-old. The steps are not atomic: if the
    /// delete fails the document exists under both paths and the error is
    /// returned.
    pub fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        self.dispatch("rename", from, || {
            let source = self.resolve(from, true)?;
            if source.is_directory() {
                return Err(FsError::denied("rename", source.path()));
            }
            let target = self.resolve(to, false)?;
            if target.is_directory() {
                return Err(FsError::denied("rename", target.path()));
            }
            if source.path() == target.path() {
                return Ok(());
            }

            let store = self.store.as_ref();
            let body = source.read_body(store, &self.codec)?;
            target.write_body(store, &self.codec, &body, 0)?;
            if let Err(e) = source.unlink(store) {
                warn!(
                    from = %source.path(),
                    to = %target.path(),
                    error = %e,
                    "rename copied the document but could not remove the source"
                );
                return Err(e);
            }
            self.xattrs.rename(&source.path(), &target.path())
        })
    }

    /// Timestamps are synthesized, so setting them only checks the path.
    pub fn utimens(
        &self,
        path: &str,
        _atime: Option<SystemTime>,
        _mtime: Option<SystemTime>,
    ) -> FsResult<()> {
        self.dispatch("utimens", path, || self.resolve(path, true).map(drop))
    }

    // -----------------------------------------------------------------------
    // Directories
    // -----------------------------------------------------------------------

    /// Create a database or collection. The mode is accepted and ignored.
    pub fn mkdir(&self, path: &str, _mode: u32) -> FsResult<()> {
        self.dispatch("mkdir", path, || {
            self.resolve(path, false)?.make_dir(self.store.as_ref())
        })
    }

    /// Drop a database or collection with everything in it.
    pub fn rmdir(&self, path: &str) -> FsResult<()> {
        self.dispatch("rmdir", path, || {
            let entity = self.resolve(path, false)?;
            entity.remove_dir(self.store.as_ref())?;
            self.xattrs.forget_tree(&entity.path())
        })
    }

    // -----------------------------------------------------------------------
    // Handles
    // -----------------------------------------------------------------------

    pub fn open(&self, path: &str, _flags: i32) -> FsResult<()> {
        self.dispatch("open", path, || self.resolve(path, true).map(drop))
    }

    pub fn flush(&self, path: &str) -> FsResult<()> {
        self.dispatch("flush", path, || Ok(()))
    }

    pub fn release(&self, path: &str) -> FsResult<()> {
        self.dispatch("release", path, || Ok(()))
    }

    // -----------------------------------------------------------------------
    // Filesystem
    // -----------------------------------------------------------------------

    pub fn statfs(&self, path: &str) -> FsResult<StatFs> {
        self.dispatch("statfs", path, || {
            PathKey::parse(path)?;
            let fixed = &self.config.statfs;
            Ok(StatFs {
                bsize: fixed.bsize,
                blocks: fixed.blocks,
                bfree: fixed.bavail,
                bavail: fixed.bavail,
                namelen: NAME_MAX,
            })
        })
    }

    /// Disconnect from the store at unmount.
    pub fn destroy(&self) -> FsResult<()> {
        self.store.disconnect()?;
        info!("store disconnected");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Unsupported
    // -----------------------------------------------------------------------

    pub fn chmod(&self, path: &str, _mode: u32) -> FsResult<()> {
        self.dispatch("chmod", path, || Err(FsError::denied("chmod", path)))
    }

    pub fn chown(&self, path: &str, _uid: Option<u32>, _gid: Option<u32>) -> FsResult<()> {
        self.dispatch("chown", path, || Err(FsError::denied("chown", path)))
    }

    pub fn symlink(&self, _target: &str, link: &str) -> FsResult<()> {
        self.dispatch("symlink", link, || Err(FsError::denied("symlink", link)))
    }

    pub fn readlink(&self, path: &str) -> FsResult<String> {
        self.dispatch("readlink", path, || Err(FsError::denied("readlink", path)))
    }

    // -----------------------------------------------------------------------
    // Extended attributes
    // -----------------------------------------------------------------------

    pub fn getxattr(&self, path: &str, name: &str) -> FsResult<Vec<u8>> {
        self.dispatch("getxattr", path, || {
            let entity = self.resolve(path, true)?;
            self.xattrs.get(&entity.path(), name)
        })
    }

    pub fn setxattr(&self, path: &str, name: &str, value: &[u8]) -> FsResult<()> {
        self.dispatch("setxattr", path, || {
            let entity = self.resolve(path, true)?;
            self.xattrs.set(&entity.path(), name, value)
        })
    }

    pub fn listxattr(&self, path: &str) -> FsResult<Vec<String>> {
        self.dispatch("listxattr", path, || {
            let entity = self.resolve(path, true)?;
            self.xattrs.list(&entity.path())
        })
    }

    pub fn removexattr(&self, path: &str, name: &str) -> FsResult<()> {
        self.dispatch("removexattr", path, || {
            let entity = self.resolve(path, true)?;
            self.xattrs.remove(&entity.path(), name)
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn resolve(&self, path: &str, must_exist: bool) -> FsResult<EntityRef> {
        PathResolver::new(self.store.as_ref()).resolve(path, must_exist)
    }

    fn dispatch<T>(
        &self,
        op: &'static str,
        path: &str,
        run: impl FnOnce() -> FsResult<T>,
    ) -> FsResult<T> {
        debug!(op, path, "dispatch");
        run().inspect_err(|e| {
            warn!(op, path, errno = e.errno_name(), error = %e, "operation failed");
        })
    }
}

impl std::fmt::Debug for DocFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocFs")
            .field("codec", &self.codec)
            .field("owner", &self.owner)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
