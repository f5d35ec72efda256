use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::database::{Collection, Document, DocumentStore};
use crate::types::ActivityKind;

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub object_id: String,
    pub title: String,
    pub kind: ActivityKind,
    pub created_by: Option<String>,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, object_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { object_id: object_id.into(), title: title.into(), kind, created_by: None }
    }

    pub fn by(mut self, created_by: Option<String>) -> Self {
        self.created_by = created_by;
        self
    }

    pub fn into_document(self) -> Document {
        let mut doc = Document::new();
        doc.insert("objectId".to_string(), json!(self.object_id));
        doc.insert("title".to_string(), json!(self.title));
        doc.insert("type".to_string(), json!(self.kind.as_str()));
        doc.insert("description".to_string(), json!(self.kind.description()));
        doc.insert("created_by".to_string(), self.created_by.map(Value::String).unwrap_or(Value::Null));
        doc
    }
}

/// Writes the entry in the background. The caller never waits for it and a
/// failed write is only logged.
pub fn record(store: Arc<dyn DocumentStore>, entry: ActivityEntry) -> JoinHandle<()> {
    tokio::spawn(async move {
        let kind = entry.kind;
        let object_id = entry.object_id.clone();
        if let Err(e) = store.insert(Collection::Activities, entry.into_document()).await {
            tracing::warn!("Failed to record {} activity for {}: {}", kind.as_str(), object_id, e);
        }
    })
}
