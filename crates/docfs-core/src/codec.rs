//! Mapping between stored documents and their file bodies.
//!
//! A document's file body is its JSON object form, `_id` first, remaining
//! keys in sorted order, pretty-printed for editing with ordinary text tools.
//! Writes follow a fallback policy: bytes that parse as a JSON object replace
//! the document; anything else is kept as text under [`DATA_FIELD`].

use docfs_types::{Document, DocumentId, ID_FIELD};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use thiserror::Error;

/// Field holding the text of a document written as plain (non-JSON) bytes.
pub const DATA_FIELD: &str = "data";

/// Default indentation width of encoded bodies.
pub const DEFAULT_INDENT: usize = 4;

/// Errors from decoding or encoding a file body.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body is not a JSON object")]
    NotAnObject,

    #[error("body has no string `_id` field")]
    MissingId,
}

/// Field order of an encoded body: identifier, then the sorted field map.
#[derive(Serialize)]
struct Body<'a> {
    #[serde(rename = "_id")]
    id: String,
    #[serde(flatten)]
    fields: &'a Map<String, Value>,
}

/// Bidirectional document ⇄ bytes codec.
#[derive(Clone, Debug)]
pub struct DocumentCodec {
    indent: Vec<u8>,
}

impl DocumentCodec {
    pub fn new(indent: usize) -> Self {
        Self {
            indent: vec![b' '; indent],
        }
    }

    /// Encode a document as its file body.
    pub fn encode(&self, doc: &Document) -> Result<Vec<u8>, CodecError> {
        let body = Body {
            id: doc.id().to_string(),
            fields: doc.fields(),
        };
        let mut out = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&self.indent));
        body.serialize(&mut ser)?;
        Ok(out)
    }

    /// Decode a complete file body, taking the identifier from its `_id`.
    pub fn decode(&self, raw: &[u8]) -> Result<Document, CodecError> {
        let Value::Object(mut fields) = serde_json::from_slice(raw)? else {
            return Err(CodecError::NotAnObject);
        };
        let Some(Value::String(id)) = fields.remove(ID_FIELD) else {
            return Err(CodecError::MissingId);
        };
        Ok(Document::from_fields(DocumentId::from_segment(&id), fields))
    }

    /// The document that results from writing `data` at `offset`.
    ///
    /// `id` comes from the path and always wins over any `_id` in the
    /// payload. `existing` is the document currently stored under that path,
    /// if any. Writes at a nonzero offset into a missing document still
    /// produce a fresh document.
    pub fn apply_write(
        &self,
        id: DocumentId,
        existing: Option<Document>,
        data: &[u8],
        offset: u64,
    ) -> Document {
        if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(data) {
            return Document::from_fields(id, fields);
        }

        let text = String::from_utf8_lossy(data);
        match existing {
            Some(prev) if offset > 0 => {
                let mut fields = prev.fields().clone();
                let mut combined = fields
                    .get(DATA_FIELD)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                combined.push_str(&text);
                fields.insert(DATA_FIELD.to_string(), Value::String(combined));
                Document::from_fields(id, fields)
            }
            _ => text_document(id, text.into_owned()),
        }
    }
}

impl Default for DocumentCodec {
    fn default() -> Self {
        Self::new(DEFAULT_INDENT)
    }
}

fn text_document(id: DocumentId, text: String) -> Document {
    let mut fields = Map::new();
    fields.insert(DATA_FIELD.to_string(), Value::String(text));
    Document::from_fields(id, fields)
}
