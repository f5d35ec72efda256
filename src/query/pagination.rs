use serde::Serialize;
use serde_json::Value;

use super::error::QueryError;
use crate::database::{Collection, DatabaseError, Document, DocumentStore, FindOptions};
use crate::filter::SortSpec;

/// Paginated list payload.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub pages: u64,
    pub count: u64,
    #[serde(rename = "currentPage")]
    pub current_page: u64,
    pub data: Vec<T>,
}

/// A validated page request. `limit` of `None` means the whole result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page: u64,
    limit: Option<u64>,
}

impl PageWindow {
    /// `page` must be at least 1. A non-positive `limit` requests every
    /// matching record; positive limits are capped at `max_limit`.
    pub fn new(page: i64, limit: i64, max_limit: Option<u64>) -> Result<Self, QueryError> {
        if page < 1 {
            return Err(QueryError::InvalidPage);
        }
        let limit = if limit <= 0 {
            None
        } else {
            let limit = limit as u64;
            Some(max_limit.map_or(limit, |max| limit.min(max)))
        };
        Ok(Self { page: page as u64, limit })
    }

    /// Both values are required and must be integers.
    pub fn from_params(page: Option<&str>, limit: Option<&str>, max_limit: Option<u64>) -> Result<Self, QueryError> {
        let page = page.and_then(|p| p.trim().parse::<i64>().ok()).ok_or(QueryError::InvalidPage)?;
        let limit = limit.and_then(|l| l.trim().parse::<i64>().ok()).ok_or(QueryError::InvalidLimit)?;
        Self::new(page, limit, max_limit)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Rows before this page, clamped to the largest offset Postgres takes.
    pub fn skip(&self) -> u64 {
        let max_offset = i64::MAX as u64;
        self.limit
            .map_or(0, |limit| limit.checked_mul(self.page - 1).map_or(max_offset, |skip| skip.min(max_offset)))
    }

    pub fn total_pages(&self, count: u64) -> u64 {
        match self.limit {
            Some(limit) => (count + limit - 1) / limit,
            None => u64::from(count > 0),
        }
    }
}

/// Counts, then fetches one window. The two reads are separate round-trips,
/// so `count` and `data` may disagree under concurrent writes.
pub async fn paginate(
    store: &dyn DocumentStore,
    collection: Collection,
    filter: &Value,
    sort: SortSpec,
    window: PageWindow,
) -> Result<Page<Document>, DatabaseError> {
    let count = store.count(collection, filter).await?;
    let skip = window.limit().map(|_| window.skip());
    let data = store
        .find(collection, filter, FindOptions::sorted(sort).window(skip, window.limit()))
        .await?;

    Ok(Page {
        pages: window.total_pages(count),
        count,
        current_page: window.page(),
        data,
    })
}
