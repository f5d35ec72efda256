use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::common::{not_blank, owner_id, page_window, put, required, required_text, stamp_owner, taken, Entity, StatusInput};
use crate::auth::Caller;
use crate::database::{Collection, Document};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::lists::CATEGORY;
use crate::query::params::present;
use crate::query::{resolve_sort, FilterBuilder, ListParams, Page, SCOPE_MEMBERS};
use crate::services::{list_all, list_page};
use crate::state::AppState;

pub const ENTITY: Entity = Entity { name: "category", collection: Collection::Categories, owner_roles: SCOPE_MEMBERS, refs: &[] };

#[derive(Debug, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub priority: Option<i64>,
    pub description: Option<String>,
}

impl CategoryInput {
    fn into_document(self) -> Document {
        let mut doc = Document::new();
        put(&mut doc, "name", self.name);
        put(&mut doc, "priority", self.priority);
        put(&mut doc, "description", self.description);
        doc
    }
}

/// POST /category/add
pub async fn category_add(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    let name = required_text(&input.name, "category.name.required")?;
    required(input.priority, "category.priority.required")?;
    required_text(&input.description, "category.description.required")?;

    if taken(state.store(), Collection::Categories, "name", &name, &owner, None).await? {
        return Err(ApiError::duplicate("category.name.exist"));
    }

    let mut doc = input.into_document();
    stamp_owner(&mut doc, &owner);
    let category = state.store().insert(Collection::Categories, doc).await?;
    Ok(ApiResponse::success("category.add.success", category))
}

/// GET /category/list/all
pub async fn category_list_all(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Document>> {
    let filter = FilterBuilder::for_list(&CATEGORY, &params, &caller).build();
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let categories = list_all(state.store(), CATEGORY.collection, &filter, sort, &[]).await?;
    Ok(ApiResponse::success("category.list.success", categories))
}

/// GET /category/list/filter
pub async fn category_list_filter(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Document>> {
    let window = page_window(&state, &params)?;
    let filter = FilterBuilder::for_list(&CATEGORY, &params, &caller).build();
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let page = list_page(state.store(), CATEGORY.collection, &filter, sort, window, &[]).await?;
    Ok(ApiResponse::success("category.list.success", page))
}

/// GET /category/:id
pub async fn category_details(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    ENTITY.show(&state, &caller, &id).await
}

/// PUT /category/:id
pub async fn category_update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    not_blank(&input.name, "category.name.required")?;
    not_blank(&input.description, "category.description.required")?;
    let (id, current) = ENTITY.require(state.store(), &caller, &id).await?;
    if let Some(name) = present(&input.name) {
        let category_owner = current.get("created_by").and_then(Value::as_str).unwrap_or(&owner);
        if taken(state.store(), Collection::Categories, "name", name, category_owner, Some(id)).await? {
            return Err(ApiError::duplicate("category.name.exist"));
        }
    }
    ENTITY.update(&state, id, input.into_document()).await
}

/// PUT /category/status/:id
pub async fn category_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Document> {
    ENTITY.set_status(&state, &caller, &id, input).await
}

/// DELETE /category/:id
pub async fn category_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let (id, _) = ENTITY.require(state.store(), &caller, &id).await?;
    ENTITY.remove(&state, id).await
}
