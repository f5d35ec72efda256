use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::common::{not_blank, owner_id, page_window, put, required_text, stamp_owner, taken, Entity, StatusInput};
use crate::auth::Caller;
use crate::database::{Collection, Document};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::lists::LOCATION;
use crate::query::params::present;
use crate::query::{resolve_sort, FilterBuilder, ListParams, Page, SCOPE_MEMBERS};
use crate::services::{list_all, list_page, record, ActivityEntry};
use crate::state::AppState;
use crate::types::ActivityKind;

pub const ENTITY: Entity = Entity { name: "location", collection: Collection::Locations, owner_roles: SCOPE_MEMBERS, refs: &[] };

#[derive(Debug, Default, Deserialize)]
pub struct LocationInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl LocationInput {
    fn into_document(self) -> Document {
        let mut doc = Document::new();
        put(&mut doc, "name", self.name);
        put(&mut doc, "description", self.description);
        doc
    }
}

/// POST /location/add
pub async fn location_add(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<LocationInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    let name = required_text(&input.name, "location.name.required")?;
    if taken(state.store(), Collection::Locations, "name", &name, &owner, None).await? {
        return Err(ApiError::duplicate("location.name.exist"));
    }

    let mut doc = input.into_document();
    stamp_owner(&mut doc, &owner);
    let location = state.store().insert(Collection::Locations, doc).await?;

    let id = location.get("id").and_then(Value::as_str).unwrap_or_default();
    record(state.store.clone(), ActivityEntry::new(ActivityKind::NewLocation, id, &name).by(Some(owner)));

    Ok(ApiResponse::success("location.add.success", location))
}

/// GET /location/list/all
pub async fn location_list_all(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Document>> {
    let filter = FilterBuilder::for_list(&LOCATION, &params, &caller).build();
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let locations = list_all(state.store(), LOCATION.collection, &filter, sort, &[]).await?;
    Ok(ApiResponse::success("location.list.success", locations))
}

/// GET /location/list/filter
pub async fn location_list_filter(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Document>> {
    let window = page_window(&state, &params)?;
    let filter = FilterBuilder::for_list(&LOCATION, &params, &caller).build();
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let page = list_page(state.store(), LOCATION.collection, &filter, sort, window, &[]).await?;
    Ok(ApiResponse::success("location.list.success", page))
}

/// GET /location/:id
pub async fn location_details(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    ENTITY.show(&state, &caller, &id).await
}

/// PUT /location/:id
pub async fn location_update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<LocationInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    not_blank(&input.name, "location.name.required")?;
    let (id, current) = ENTITY.require(state.store(), &caller, &id).await?;
    if let Some(name) = present(&input.name) {
        let location_owner = current.get("created_by").and_then(Value::as_str).unwrap_or(&owner);
        if taken(state.store(), Collection::Locations, "name", name, location_owner, Some(id)).await? {
            return Err(ApiError::duplicate("location.name.exist"));
        }
    }
    ENTITY.update(&state, id, input.into_document()).await
}

/// PUT /location/status/:id
pub async fn location_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Document> {
    ENTITY.set_status(&state, &caller, &id, input).await
}

/// DELETE /location/:id. Refused while areas still sit in the location.
pub async fn location_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let (id, _) = ENTITY.require(state.store(), &caller, &id).await?;
    if state.store().exists(Collection::Areas, &json!({ "location": id.to_string() })).await? {
        return Err(ApiError::bad_request("location.delete.has.areas"));
    }
    ENTITY.remove(&state, id).await
}
