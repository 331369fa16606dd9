use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Length of a native identifier in bytes.
const NATIVE_LEN: usize = 12;

/// The store's native object identifier.
///
/// Twelve raw bytes, rendered as 24 lowercase hex characters. Filesystem
/// paths are plain text, so a native identifier only ever appears in a path
/// through its hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeId([u8; NATIVE_LEN]);

impl NativeId {
    /// Create a `NativeId` from raw bytes.
    pub const fn from_bytes(bytes: [u8; NATIVE_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw 12-byte identifier.
    pub fn as_bytes(&self) -> &[u8; NATIVE_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != NATIVE_LEN {
            return Err(TypeError::InvalidLength {
                expected: NATIVE_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; NATIVE_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Parse a path segment as a native identifier.
    ///
    /// Only the canonical form (24 lowercase hex characters) is accepted, so
    /// that the identifier renders back to exactly the segment it came from.
    pub fn parse_segment(segment: &str) -> Option<Self> {
        let canonical = segment.len() == NATIVE_LEN * 2
            && segment
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !canonical {
            return None;
        }
        Self::from_hex(segment).ok()
    }
}

impl fmt::Debug for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeId({})", self.to_hex())
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for NativeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for NativeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a document within a collection.
///
/// Either the store's native identifier or an arbitrary string key. The
/// string form ([`fmt::Display`]) is the document's filesystem name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentId {
    Native(NativeId),
    Key(String),
}

impl DocumentId {
    /// Canonical identifier for a path segment: native when the segment is
    /// a canonical native id, otherwise the segment itself as a string key.
    pub fn from_segment(segment: &str) -> Self {
        match NativeId::parse_segment(segment) {
            Some(native) => Self::Native(native),
            None => Self::Key(segment.to_string()),
        }
    }

    /// Returns `true` for native identifiers.
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(native) => write!(f, "{native}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<NativeId> for DocumentId {
    fn from(native: NativeId) -> Self {
        Self::Native(native)
    }
}
