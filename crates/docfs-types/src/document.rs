use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::id::DocumentId;

/// Name of the identifier field in a document's JSON form.
pub const ID_FIELD: &str = "_id";

/// A stored document: identifier plus field map.
///
/// The field map never contains [`ID_FIELD`]; the identifier is carried
/// separately so that the path, not the payload, decides identity. Keys are
/// kept in sorted order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    fields: Map<String, Value>,
}

impl Document {
    /// A document holding only its identifier.
    pub fn new(id: DocumentId) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Build a document from a field map, discarding any identifier field the
    /// map carries.
    pub fn from_fields(id: DocumentId, mut fields: Map<String, Value>) -> Self {
        fields.remove(ID_FIELD);
        Self { id, fields }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field. The identifier field cannot be set this way.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), TypeError> {
        let key = key.into();
        if key == ID_FIELD {
            return Err(TypeError::ReservedField);
        }
        self.fields.insert(key, value);
        Ok(())
    }

    /// Re-key the document, keeping its fields.
    pub fn with_id(self, id: DocumentId) -> Self {
        Self {
            id,
            fields: self.fields,
        }
    }

    /// JSON object form with the identifier injected under [`ID_FIELD`].
    pub fn to_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        Value::Object(object)
    }

    /// Size of the compact JSON form in bytes.
    pub fn stored_size(&self) -> u64 {
        serde_json::to_vec(&self.to_value())
            .map(|bytes| bytes.len() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(s: &str) -> DocumentId {
        DocumentId::Key(s.into())
    }

    #[test]
    fn new_document_is_empty() {
        let doc = Document::new(key("a"));
        assert!(doc.fields().is_empty());
        assert_eq!(doc.id(), &key("a"));
    }

    #[test]
    fn from_fields_strips_identifier() {
        let Value::Object(fields) = json!({"_id": "other", "x": 1}) else {
            panic!("not an object");
        };
        let doc = Document::from_fields(key("a"), fields);
        assert!(doc.get(ID_FIELD).is_none());
        assert_eq!(doc.get("x"), Some(&json!(1)));
        assert_eq!(doc.id(), &key("a"));
    }

    #[test]
    fn insert_rejects_identifier_field() {
        let mut doc = Document::new(key("a"));
        assert_eq!(doc.insert(ID_FIELD, json!("b")), Err(TypeError::ReservedField));
        doc.insert("y", json!(true)).unwrap();
        assert_eq!(doc.get("y"), Some(&json!(true)));
    }

    #[test]
    fn to_value_injects_identifier() {
        let mut doc = Document::new(key("42"));
        doc.insert("x", json!(1)).unwrap();
        assert_eq!(doc.to_value(), json!({"_id": "42", "x": 1}));
    }

    #[test]
    fn stored_size_is_compact_json_length() {
        let doc = Document::new(key("42"));
        assert_eq!(doc.stored_size(), r#"{"_id":"42"}"#.len() as u64);
    }

    #[test]
    fn with_id_keeps_fields() {
        let mut doc = Document::new(key("a"));
        doc.insert("x", json!(1)).unwrap();
        let moved = doc.with_id(key("b"));
        assert_eq!(moved.id(), &key("b"));
        assert_eq!(moved.get("x"), Some(&json!(1)));
    }
}
