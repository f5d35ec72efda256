use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::common::{
    ensure_can_author, not_blank, owner_id, page_window, put, required_text, stamp_owner, taken, Entity, StatusInput,
};
use crate::auth::Caller;
use crate::database::{Collection, Document, Populate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::lists::AREA;
use crate::query::params::present;
use crate::query::{resolve_sort, FilterBuilder, ListParams, Page, SCOPE_MEMBERS};
use crate::services::{list_all, list_page, record, ActivityEntry};
use crate::state::AppState;
use crate::types::ActivityKind;

const AREA_REFS: &[Populate] = &[Populate::new("location", Collection::Locations).select(&["name", "description"])];

pub const ENTITY: Entity = Entity { name: "area", collection: Collection::Areas, owner_roles: SCOPE_MEMBERS, refs: AREA_REFS };

#[derive(Debug, Default, Deserialize)]
pub struct AreaInput {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl AreaInput {
    fn into_document(self) -> Document {
        let mut doc = Document::new();
        put(&mut doc, "title", self.title);
        put(&mut doc, "type", self.kind);
        put(&mut doc, "location", self.location);
        put(&mut doc, "description", self.description);
        put(&mut doc, "image", self.image);
        doc
    }
}

fn area_filter(params: &ListParams, caller: &Caller) -> Value {
    FilterBuilder::for_list(&AREA, params, caller)
        .eq("type", present(&params.kind))
        .eq("location", present(&params.location))
        .build()
}

/// POST /area/add
pub async fn area_add(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<AreaInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    let title = required_text(&input.title, "area.title.required")?;
    required_text(&input.kind, "area.type.required")?;
    required_text(&input.location, "area.location.required")?;

    ensure_can_author(state.store(), &caller).await?;
    if taken(state.store(), Collection::Areas, "title", &title, &owner, None).await? {
        return Err(ApiError::duplicate("area.title.exist"));
    }

    let mut doc = input.into_document();
    stamp_owner(&mut doc, &owner);
    let area = state.store().insert(Collection::Areas, doc).await?;

    let id = area.get("id").and_then(Value::as_str).unwrap_or_default();
    record(state.store.clone(), ActivityEntry::new(ActivityKind::NewArea, id, &title).by(Some(owner)));

    Ok(ApiResponse::success("area.add.success", area))
}

/// GET /area/list/all
pub async fn area_list_all(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Document>> {
    let filter = area_filter(&params, &caller);
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let areas = list_all(state.store(), AREA.collection, &filter, sort, AREA_REFS).await?;
    Ok(ApiResponse::success("area.list.success", areas))
}

/// GET /area/list/filter
pub async fn area_list_filter(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Document>> {
    let window = page_window(&state, &params)?;
    let filter = area_filter(&params, &caller);
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let page = list_page(state.store(), AREA.collection, &filter, sort, window, AREA_REFS).await?;
    Ok(ApiResponse::success("area.list.success", page))
}

/// GET /area/:id
pub async fn area_details(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    ENTITY.show(&state, &caller, &id).await
}

/// PUT /area/:id
pub async fn area_update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<AreaInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    not_blank(&input.title, "area.title.required")?;
    not_blank(&input.kind, "area.type.required")?;
    not_blank(&input.location, "area.location.required")?;
    let (id, current) = ENTITY.require(state.store(), &caller, &id).await?;

    if let Some(title) = present(&input.title) {
        let area_owner = current.get("created_by").and_then(Value::as_str).unwrap_or(&owner);
        if taken(state.store(), Collection::Areas, "title", title, area_owner, Some(id)).await? {
            return Err(ApiError::duplicate("area.title.exist"));
        }
    }

    let title = present(&input.title)
        .map(str::to_string)
        .or_else(|| current.get("title").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default();
    let response = ENTITY.update(&state, id, input.into_document()).await?;

    record(
        state.store.clone(),
        ActivityEntry::new(ActivityKind::UpdateArea, id.to_string(), title).by(Some(owner)),
    );
    Ok(response)
}

/// PUT /area/status/:id
pub async fn area_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Document> {
    ENTITY.set_status(&state, &caller, &id, input).await
}

/// DELETE /area/:id. Refused while audits still reference the area.
pub async fn area_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let (id, current) = ENTITY.require(state.store(), &caller, &id).await?;
    if state.store().exists(Collection::Audits, &json!({ "area": id.to_string() })).await? {
        return Err(ApiError::bad_request("area.delete.has.audits"));
    }

    let response = ENTITY.remove(&state, id).await?;
    let title = current.get("title").and_then(Value::as_str).unwrap_or_default();
    record(
        state.store.clone(),
        ActivityEntry::new(ActivityKind::DeleteArea, id.to_string(), title).by(caller.id_string()),
    );
    Ok(response)
}
