//! In-memory extended attribute table.
//!
//! Attributes live for the lifetime of the process only. They are keyed by
//! canonical path, follow a document when it is renamed, and disappear when
//! their entry is unlinked or removed.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{FsError, FsResult};

type Attributes = BTreeMap<String, Vec<u8>>;

/// Path-keyed extended attributes.
#[derive(Debug)]
pub struct XattrTable {
    enabled: bool,
    entries: RwLock<HashMap<String, Attributes>>,
}

impl XattrTable {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, path: &str, name: &str) -> FsResult<Vec<u8>> {
        self.ensure_enabled()?;
        self.read()?
            .get(path)
            .and_then(|attrs| attrs.get(name))
            .cloned()
            .ok_or_else(|| FsError::NoAttribute {
                path: path.to_string(),
                name: name.to_string(),
            })
    }

    pub fn set(&self, path: &str, name: &str, value: &[u8]) -> FsResult<()> {
        self.ensure_enabled()?;
        self.write()?
            .entry(path.to_string())
            .or_default()
            .insert(name.to_string(), value.to_vec());
        Ok(())
    }

    /// Attribute names on `path`, sorted.
    pub fn list(&self, path: &str) -> FsResult<Vec<String>> {
        self.ensure_enabled()?;
        Ok(self
            .read()?
            .get(path)
            .map(|attrs| attrs.keys().cloned().collect())
            .unwrap_or_default())
    }

    pub fn remove(&self, path: &str, name: &str) -> FsResult<()> {
        self.ensure_enabled()?;
        let mut entries = self.write()?;
        let removed = entries
            .get_mut(path)
            .and_then(|attrs| attrs.remove(name))
            .is_some();
        if entries.get(path).is_some_and(BTreeMap::is_empty) {
            entries.remove(path);
        }
        if removed {
            Ok(())
        } else {
            Err(FsError::NoAttribute {
                path: path.to_string(),
                name: name.to_string(),
            })
        }
    }

    /// Move the attributes of `from` to `to`, replacing any on `to`.
    pub fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let mut entries = self.write()?;
        match entries.remove(from) {
            Some(attrs) => {
                entries.insert(to.to_string(), attrs);
            }
            None => {
                entries.remove(to);
            }
        }
        Ok(())
    }

    /// Drop the attributes of `path`.
    pub fn forget(&self, path: &str) -> FsResult<()> {
        self.write()?.remove(path);
        Ok(())
    }

    /// Drop the attributes of `path` and of every entry below it.
    pub fn forget_tree(&self, path: &str) -> FsResult<()> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.write()?
            .retain(|key, _| key != path && !key.starts_with(&prefix));
        Ok(())
    }

    fn ensure_enabled(&self) -> FsResult<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(FsError::NotSupported("extended attributes"))
        }
    }

    fn read(&self) -> FsResult<RwLockReadGuard<'_, HashMap<String, Attributes>>> {
        self.entries
            .read()
            .map_err(|e| FsError::Internal(format!("xattr lock poisoned: {e}")))
    }

    fn write(&self) -> FsResult<RwLockWriteGuard<'_, HashMap<String, Attributes>>> {
        self.entries
            .write()
            .map_err(|e| FsError::Internal(format!("xattr lock poisoned: {e}")))
    }
}

impl Default for XattrTable {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_list() {
        let table = XattrTable::default();
        table.set("/db/col/a", "user.b", b"2").unwrap();
        table.set("/db/col/a", "user.a", b"1").unwrap();
        assert_eq!(table.get("/db/col/a", "user.a").unwrap(), b"1");
        assert_eq!(table.list("/db/col/a").unwrap(), ["user.a", "user.b"]);
        assert!(table.list("/db/col/b").unwrap().is_empty());
    }

    #[test]
    fn missing_attribute_is_enodata() {
        let table = XattrTable::default();
        assert_eq!(table.get("/db", "user.x").unwrap_err().errno(), libc::ENODATA);
        assert_eq!(table.remove("/db", "user.x").unwrap_err().errno(), libc::ENODATA);
    }

    #[test]
    fn remove_deletes_one_name() {
        let table = XattrTable::default();
        table.set("/db", "user.a", b"1").unwrap();
        table.set("/db", "user.b", b"2").unwrap();
        table.remove("/db", "user.a").unwrap();
        assert_eq!(table.list("/db").unwrap(), ["user.b"]);
    }

    #[test]
    fn disabled_table_refuses_everything() {
        let table = XattrTable::new(false);
        assert_eq!(table.set("/db", "user.a", b"1").unwrap_err().errno(), libc::ENOTSUP);
        assert_eq!(table.list("/db").unwrap_err().errno(), libc::ENOTSUP);
        assert!(table.forget("/db").is_ok());
    }

    #[test]
    fn rename_moves_attributes() {
        let table = XattrTable::default();
        table.set("/db/col/a", "user.tag", b"x").unwrap();
        table.set("/db/col/b", "user.old", b"y").unwrap();
        table.rename("/db/col/a", "/db/col/b").unwrap();
        assert!(table.list("/db/col/a").unwrap().is_empty());
        assert_eq!(table.list("/db/col/b").unwrap(), ["user.tag"]);
    }

    #[test]
    fn forget_tree_drops_descendants_only() {
        let table = XattrTable::default();
        for path in ["/db", "/db/col", "/db/col/a", "/dbx", "/other/col"] {
            table.set(path, "user.k", b"v").unwrap();
        }
        table.forget_tree("/db").unwrap();
        for path in ["/db", "/db/col", "/db/col/a"] {
            assert!(table.list(path).unwrap().is_empty(), "{path}");
        }
        assert_eq!(table.list("/dbx").unwrap(), ["user.k"]);
        assert_eq!(table.list("/other/col").unwrap(), ["user.k"]);
    }
}
