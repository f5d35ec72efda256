use async_trait::async_trait;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::collection::Collection;
use super::manager::DatabaseError;
use crate::filter::SortSpec;

/// A stored record as returned to handlers: column name to JSON value.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Option<SortSpec>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn sorted(sort: SortSpec) -> Self {
        Self { sort: Some(sort), ..Default::default() }
    }

    pub fn window(mut self, skip: Option<u64>, limit: Option<u64>) -> Self {
        self.skip = skip;
        self.limit = limit;
        self
    }
}

/// Document-store operations the query layer needs. Filters are the JSON
/// predicates produced by [`crate::query::FilterBuilder`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn count(&self, collection: Collection, filter: &Value) -> Result<u64, DatabaseError>;

    async fn find(
        &self,
        collection: Collection,
        filter: &Value,
        options: FindOptions,
    ) -> Result<Vec<Document>, DatabaseError>;

    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, DatabaseError>;

    /// Applies `changes` and returns the updated document, or `None` when no
    /// document has that id.
    async fn update_by_id(
        &self,
        collection: Collection,
        id: Uuid,
        changes: Document,
    ) -> Result<Option<Document>, DatabaseError>;

    async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, DatabaseError>;

    /// Removes every document matching a non-empty `filter` and returns how
    /// many went.
    async fn delete_where(&self, collection: Collection, filter: &Value) -> Result<u64, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, DatabaseError> {
        let filter = json!({ "id": id.to_string() });
        let mut docs = self
            .find(collection, &filter, FindOptions::default().window(None, Some(1)))
            .await?;
        Ok(docs.pop())
    }

    async fn exists(&self, collection: Collection, filter: &Value) -> Result<bool, DatabaseError> {
        let docs = self
            .find(collection, filter, FindOptions::default().window(None, Some(1)))
            .await?;
        Ok(!docs.is_empty())
    }
}
