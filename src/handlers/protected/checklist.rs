use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::common::{ensure_can_author, not_blank, owner_id, put, required_text, stamp_owner, taken, Entity, StatusInput};
use crate::auth::Caller;
use crate::database::{Collection, Document};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::lists::CHECKLIST;
use crate::query::params::present;
use crate::query::{resolve_sort, FilterBuilder, ListParams, SCOPE_NONE};
use crate::services::list_all;
use crate::state::AppState;

/// Any member may read a checklist; audits point at shared ones.
pub const ENTITY: Entity = Entity { name: "checklist", collection: Collection::Checklists, owner_roles: SCOPE_NONE, refs: &[] };

/// Writes reach a regular user's own checklists and every checklist for admins.
const EDITABLE: Entity = Entity { owner_roles: CHECKLIST.owner_roles, ..ENTITY };

#[derive(Debug, Default, Deserialize)]
pub struct ChecklistInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub language: Option<String>,
    pub standard: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub is_public: Option<bool>,
    pub is_short: Option<bool>,
}

impl ChecklistInput {
    fn into_document(self) -> Document {
        let mut doc = Document::new();
        put(&mut doc, "name", self.name);
        put(&mut doc, "code", self.code);
        put(&mut doc, "language", self.language);
        put(&mut doc, "standard", self.standard);
        put(&mut doc, "version", self.version);
        put(&mut doc, "type", self.kind);
        put(&mut doc, "is_public", self.is_public);
        put(&mut doc, "is_short", self.is_short);
        doc
    }
}

fn with_defaults(doc: &mut Document) {
    for (key, value) in [
        ("language", json!("en")),
        ("standard", json!("5s")),
        ("version", json!("1")),
        ("type", json!("production")),
        ("is_public", json!(false)),
        ("is_short", json!(false)),
    ] {
        doc.entry(key.to_string()).or_insert(value);
    }
}

/// POST /checklist/add
pub async fn checklist_add(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<ChecklistInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    let name = required_text(&input.name, "checklist.name.required")?;

    ensure_can_author(state.store(), &caller).await?;
    if taken(state.store(), Collection::Checklists, "name", &name, &owner, None).await? {
        return Err(ApiError::duplicate("checklist.name.exist"));
    }

    let mut doc = input.into_document();
    with_defaults(&mut doc);
    stamp_owner(&mut doc, &owner);
    let checklist = state.store().insert(Collection::Checklists, doc).await?;
    Ok(ApiResponse::success("checklist.add.success", checklist))
}

/// GET /checklist/list/all
pub async fn checklist_list_all(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Document>> {
    let filter = FilterBuilder::for_list(&CHECKLIST, &params, &caller)
        .eq("standard", present(&params.standard))
        .build();
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let checklists = list_all(state.store(), CHECKLIST.collection, &filter, sort, &[]).await?;
    Ok(ApiResponse::success("checklist.list.success", checklists))
}

/// GET /checklist/:id
pub async fn checklist_details(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    ENTITY.show(&state, &caller, &id).await
}

/// PUT /checklist/:id
pub async fn checklist_update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<ChecklistInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    not_blank(&input.name, "checklist.name.required")?;
    let (id, current) = EDITABLE.require(state.store(), &caller, &id).await?;

    if let Some(name) = present(&input.name) {
        let checklist_owner = current.get("created_by").and_then(Value::as_str).unwrap_or(&owner);
        if taken(state.store(), Collection::Checklists, "name", name, checklist_owner, Some(id)).await? {
            return Err(ApiError::duplicate("checklist.name.exist"));
        }
    }
    EDITABLE.update(&state, id, input.into_document()).await
}

/// PUT /checklist/status/:id
pub async fn checklist_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Document> {
    EDITABLE.set_status(&state, &caller, &id, input).await
}

/// DELETE /checklist/:id
pub async fn checklist_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let (id, _) = EDITABLE.require(state.store(), &caller, &id).await?;
    EDITABLE.remove(&state, id).await
}
