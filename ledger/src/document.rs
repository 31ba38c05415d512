//! Opaque, owner-tagged JSON documents. Grounded on `data/document.go`.

use serde::{Deserialize, Serialize};

use crate::json_object::JsonObject;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub data: JsonObject,
}

impl Document {
    /// Builds a document from caller-supplied data, tagging it with its
    /// assigned ID.
    pub fn new(id: u64, mut data: JsonObject) -> Self {
        data.set("id", serde_json::json!(id));
        Document { id, data }
    }

    /// Builds a document from operation data, tagging it with its assigned
    /// ID and owner.
    pub fn from_operation(id: u64, owner: &str, data: &JsonObject) -> Self {
        let mut data = data.clone();
        data.set("id", serde_json::json!(id));
        data.set("owner", serde_json::json!(owner));
        Document { id, data }
    }

    pub fn owner(&self) -> Option<&str> {
        self.data.get_string("owner")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_operation_tags_id_and_owner() {
        let doc = Document::from_operation(5, "alice", &JsonObject::new());
        assert_eq!(doc.id, 5);
        assert_eq!(doc.owner(), Some("alice"));
    }
}
