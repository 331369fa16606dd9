//! Error types for filesystem operations.

use docfs_store::StoreError;
use thiserror::Error;

use crate::codec::CodecError;

/// A POSIX error number as returned to the host filesystem framework.
pub type Errno = i32;

/// Errors that can occur while serving a filesystem operation.
///
/// Every variant maps to exactly one errno through [`FsError::errno`]. The
/// errno never carries store-specific detail; the `Display` form does, for
/// logging only.
#[derive(Debug, Error)]
pub enum FsError {
    /// A path segment does not resolve to an existing entity.
    #[error("no such entry: {path}")]
    NotFound { path: String },

    /// The path is deeper than database/collection/document.
    #[error("path has {depth} segments, at most 3 are allowed: {path}")]
    InvalidDepth { path: String, depth: usize },

    /// The operation is not legal for this entity type.
    #[error("operation not permitted: {op} on {path}")]
    PermissionDenied { op: &'static str, path: String },

    /// A document with this identifier already exists.
    #[error("already exists: {path}")]
    AlreadyExists { path: String },

    /// A directory operation was applied to a document.
    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    /// A file operation was applied to a directory.
    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    /// A name the store cannot hold (database or collection naming rules).
    #[error("invalid name {name:?} in {path}: {reason}")]
    InvalidName {
        path: String,
        name: String,
        reason: String,
    },

    /// The extended attribute is not set on this path.
    #[error("no attribute {name:?} on {path}")]
    NoAttribute { path: String, name: String },

    /// The operation is switched off by configuration.
    #[error("not supported: {0}")]
    NotSupported(&'static str),

    /// The underlying store call failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// A stored document could not be encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Process-local state is unusable (poisoned lock).
    #[error("internal error: {0}")]
    Internal(String),
}

impl FsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn denied(op: &'static str, path: impl Into<String>) -> Self {
        Self::PermissionDenied {
            op,
            path: path.into(),
        }
    }

    /// The errno reported to the host for this failure.
    pub fn errno(&self) -> Errno {
        match self {
            Self::NotFound { .. } | Self::InvalidDepth { .. } => libc::ENOENT,
            Self::PermissionDenied { .. } => libc::EPERM,
            Self::AlreadyExists { .. } => libc::EEXIST,
            Self::NotADirectory { .. } => libc::ENOTDIR,
            Self::IsADirectory { .. } => libc::EISDIR,
            Self::InvalidName { .. } => libc::EINVAL,
            Self::NoAttribute { .. } => libc::ENODATA,
            Self::NotSupported(_) => libc::ENOTSUP,
            Self::StoreUnavailable(_) | Self::Codec(_) | Self::Internal(_) => libc::EIO,
        }
    }

    /// Short symbolic name of the errno, for user-facing messages.
    pub fn errno_name(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::InvalidDepth { .. } => "ENOENT",
            Self::PermissionDenied { .. } => "EPERM",
            Self::AlreadyExists { .. } => "EEXIST",
            Self::NotADirectory { .. } => "ENOTDIR",
            Self::IsADirectory { .. } => "EISDIR",
            Self::InvalidName { .. } => "EINVAL",
            Self::NoAttribute { .. } => "ENODATA",
            Self::NotSupported(_) => "ENOTSUP",
            Self::StoreUnavailable(_) | Self::Codec(_) | Self::Internal(_) => "EIO",
        }
    }
}

impl From<StoreError> for FsError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey {
                database,
                collection,
                id,
            } => Self::AlreadyExists {
                path: format!("/{database}/{collection}/{id}"),
            },
            other => Self::StoreUnavailable(other),
        }
    }
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result alias for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;
