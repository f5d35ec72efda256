use serde_json::Value;

use crate::database::{populate, Collection, DatabaseError, Document, DocumentStore, FindOptions, Populate};
use crate::filter::SortSpec;
use crate::query::{paginate, Page, PageWindow};

/// Every matching document, sorted, with references resolved.
pub async fn list_all(
    store: &dyn DocumentStore,
    collection: Collection,
    filter: &Value,
    sort: SortSpec,
    specs: &[Populate],
) -> Result<Vec<Document>, DatabaseError> {
    let mut docs = store.find(collection, filter, FindOptions::sorted(sort)).await?;
    populate(store, &mut docs, specs).await?;
    Ok(docs)
}

/// One page of matching documents, with references resolved on that page only.
pub async fn list_page(
    store: &dyn DocumentStore,
    collection: Collection,
    filter: &Value,
    sort: SortSpec,
    window: PageWindow,
    specs: &[Populate],
) -> Result<Page<Document>, DatabaseError> {
    let mut page = paginate(store, collection, filter, sort, window).await?;
    populate(store, &mut page.data, specs).await?;
    Ok(page)
}
