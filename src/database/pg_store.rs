use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::collection::Collection;
use super::manager::{DatabaseError, DatabaseManager};
use super::query_builder::{bind_params, delete_sql, insert_sql, update_sql};
use super::store::{Document, DocumentStore, FindOptions};
use crate::filter::{Filter, SqlResult};

/// [`DocumentStore`] over Postgres tables described by [`Collection`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    query_logging: bool,
}

impl PgStore {
    pub fn new(pool: PgPool, query_logging: bool) -> Self {
        Self { pool, query_logging }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn filter(&self, collection: Collection, filter: &Value) -> Result<Filter, DatabaseError> {
        let mut compiled = Filter::new(collection.table(), collection.columns())?;
        compiled.debug_logging(self.query_logging);
        compiled.where_clause(filter.clone())?;
        Ok(compiled)
    }

    fn log(&self, sql: &SqlResult) {
        if self.query_logging {
            tracing::debug!(params = sql.params.len(), "{}", sql.query);
        }
    }

    async fn fetch_documents(&self, sql: &SqlResult) -> Result<Vec<Document>, DatabaseError> {
        self.log(sql);
        let rows = bind_params(sqlx::query(&sql.query), &sql.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| into_document(row.try_get("doc")?)).collect()
    }

    async fn fetch_document(&self, sql: &SqlResult) -> Result<Option<Document>, DatabaseError> {
        self.log(sql);
        let row = bind_params(sqlx::query(&sql.query), &sql.params)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| into_document(row.try_get("doc")?)).transpose()
    }
}

fn into_document(value: Value) -> Result<Document, DatabaseError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::Decode(format!("expected row object, got {}", other))),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn count(&self, collection: Collection, filter: &Value) -> Result<u64, DatabaseError> {
        let sql = self.filter(collection, filter)?.to_count_sql()?;
        self.log(&sql);
        let row = bind_params(sqlx::query(&sql.query), &sql.params)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Value,
        options: FindOptions,
    ) -> Result<Vec<Document>, DatabaseError> {
        let mut compiled = self.filter(collection, filter)?;
        compiled.order(options.sort).limit(options.limit, options.skip);
        self.fetch_documents(&compiled.to_sql()?).await
    }

    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, DatabaseError> {
        let sql = insert_sql(collection, doc)?;
        self.fetch_document(&sql)
            .await?
            .ok_or_else(|| DatabaseError::Decode(format!("insert into {} returned no row", collection)))
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: Uuid,
        changes: Document,
    ) -> Result<Option<Document>, DatabaseError> {
        self.fetch_document(&update_sql(collection, id, changes)?).await
    }

    async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, DatabaseError> {
        self.fetch_document(&delete_sql(collection, id)).await
    }

    async fn delete_where(&self, collection: Collection, filter: &Value) -> Result<u64, DatabaseError> {
        let sql = self.filter(collection, filter)?.to_delete_sql()?;
        self.log(&sql);
        let result = bind_params(sqlx::query(&sql.query), &sql.params)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
