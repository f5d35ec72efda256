use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use std::collections::HashMap;

use super::collection::Collection;
use super::manager::DatabaseError;
use super::store::{Document, DocumentStore, FindOptions};

/// Replaces a reference field (an id or array of ids) with the referenced
/// documents, in one batched `$in` lookup per field.
#[derive(Debug, Clone, Copy)]
pub struct Populate {
    pub path: &'static str,
    pub from: Collection,
    /// Fields kept on the referenced document besides `id`; empty keeps all.
    pub select: &'static [&'static str],
    /// Only resolve references whose target has `status == 1`.
    pub active_only: bool,
    pub nested: &'static [Populate],
}

impl Populate {
    pub const fn new(path: &'static str, from: Collection) -> Self {
        Self { path, from, select: &[], active_only: false, nested: &[] }
    }

    pub const fn select(mut self, fields: &'static [&'static str]) -> Self {
        self.select = fields;
        self
    }

    pub const fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub const fn nested(mut self, nested: &'static [Populate]) -> Self {
        self.nested = nested;
        self
    }
}

/// Resolves every spec on every document. References that do not resolve
/// become `null` (single) or are dropped (arrays).
pub fn populate<'a>(
    store: &'a dyn DocumentStore,
    docs: &'a mut [Document],
    specs: &'a [Populate],
) -> BoxFuture<'a, Result<(), DatabaseError>> {
    async move {
        for spec in specs {
            populate_one(store, &mut *docs, spec).await?;
        }
        Ok(())
    }
    .boxed()
}

async fn populate_one(
    store: &dyn DocumentStore,
    docs: &mut [Document],
    spec: &Populate,
) -> Result<(), DatabaseError> {
    let mut ids: Vec<String> = Vec::new();
    for doc in docs.iter() {
        match doc.get(spec.path) {
            Some(Value::String(id)) => ids.push(id.clone()),
            Some(Value::Array(items)) => ids.extend(items.iter().filter_map(|v| v.as_str().map(str::to_string))),
            _ => {}
        }
    }
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }

    let filter = if spec.active_only {
        json!({ "$and": [{ "id": { "$in": ids } }, { "status": 1 }] })
    } else {
        json!({ "id": { "$in": ids } })
    };
    let mut targets = store.find(spec.from, &filter, FindOptions::default()).await?;
    if !spec.nested.is_empty() {
        populate(store, &mut targets, spec.nested).await?;
    }

    let by_id: HashMap<String, Value> = targets
        .into_iter()
        .filter_map(|doc| {
            let id = doc.get("id")?.as_str()?.to_string();
            Some((id, Value::Object(project(doc, spec.select))))
        })
        .collect();

    for doc in docs.iter_mut() {
        let resolved = match doc.get(spec.path) {
            Some(Value::String(id)) => by_id.get(id).cloned().unwrap_or(Value::Null),
            Some(Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .filter_map(|v| v.as_str().and_then(|id| by_id.get(id)).cloned())
                    .collect(),
            ),
            _ => continue,
        };
        doc.insert(spec.path.to_string(), resolved);
    }
    Ok(())
}

fn project(doc: Document, select: &[&str]) -> Document {
    if select.is_empty() {
        return doc;
    }
    doc.into_iter()
        .filter(|(key, _)| key == "id" || select.contains(&key.as_str()))
        .collect()
}
