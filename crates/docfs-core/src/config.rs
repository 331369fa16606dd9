use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::DEFAULT_INDENT;
use crate::error::ConfigError;

/// Configuration for a mounted docfs tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Spaces per indentation level in document bodies.
    pub json_indent: usize,
    /// Whether the extended-attribute operations are served.
    pub xattrs: bool,
    /// Owner reported on every entry. `None` uses the process's uid/gid.
    pub owner: Option<Owner>,
    /// Values reported by `statfs`.
    pub statfs: StatFsConfig,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            json_indent: DEFAULT_INDENT,
            xattrs: true,
            owner: None,
            statfs: StatFsConfig::default(),
        }
    }
}

impl FsConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The effective owner: configured, or the current process's.
    pub fn effective_owner(&self) -> Owner {
        self.owner.unwrap_or_else(Owner::current)
    }
}

/// User and group ids reported as the owner of every entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

impl Owner {
    /// The real uid/gid of this process.
    pub fn current() -> Self {
        // SAFETY: getuid/getgid take no arguments and cannot fail.
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Self { uid, gid }
    }
}

/// Fixed capacity figures returned by `statfs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatFsConfig {
    pub bsize: u32,
    pub blocks: u64,
    pub bavail: u64,
}

impl Default for StatFsConfig {
    fn default() -> Self {
        Self {
            bsize: 512,
            blocks: 4096,
            bavail: 2048,
        }
    }
}
