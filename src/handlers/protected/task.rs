use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::common::{not_blank, owner_id, page_window, put, required, required_text, stamp_owner, Entity, StatusInput};
use crate::auth::Caller;
use crate::database::{Collection, Document, Populate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::lists::TASK;
use crate::query::params::present;
use crate::query::{resolve_sort, FilterBuilder, ListParams, Page, SCOPE_MEMBERS};
use crate::services::{list_all, list_page, record, ActivityEntry};
use crate::state::AppState;
use crate::types::ActivityKind;

const TASK_REFS: &[Populate] = &[
    Populate::new("area", Collection::Areas).select(&["title", "type"]),
    Populate::new("location", Collection::Locations).select(&["name"]),
    Populate::new("assigned", Collection::Users)
        .select(&["first_name", "last_name", "email", "image_url"])
        .active_only(),
];

pub const ENTITY: Entity = Entity { name: "task", collection: Collection::Tasks, owner_roles: SCOPE_MEMBERS, refs: TASK_REFS };

#[derive(Debug, Default, Deserialize)]
pub struct TaskInput {
    pub audit: Option<String>,
    pub task: Option<String>,
    pub due_date: Option<String>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub priority: Option<String>,
    pub task_status: Option<String>,
    pub assigned: Option<Vec<String>>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub archived: Option<bool>,
}

impl TaskInput {
    fn validate_new(&self) -> Result<(), ApiError> {
        required_text(&self.audit, "task.audit.required")?;
        required_text(&self.task, "task.task.required")?;
        required_text(&self.due_date, "task.due_date.required")?;
        required_text(&self.location, "task.location.required")?;
        required_text(&self.area, "task.area.required")?;
        required_text(&self.priority, "task.priority.required")?;
        required_text(&self.task_status, "task.task_status.required")?;
        required(self.assigned.as_ref(), "task.assigned.required")?;
        required_text(&self.description, "task.description.required")?;
        Ok(())
    }

    fn validate_changes(&self) -> Result<(), ApiError> {
        not_blank(&self.audit, "task.audit.required")?;
        not_blank(&self.task, "task.task.required")?;
        not_blank(&self.due_date, "task.due_date.required")?;
        not_blank(&self.location, "task.location.required")?;
        not_blank(&self.area, "task.area.required")?;
        not_blank(&self.priority, "task.priority.required")?;
        not_blank(&self.task_status, "task.task_status.required")?;
        not_blank(&self.description, "task.description.required")
    }

    fn into_document(self) -> Document {
        let mut doc = Document::new();
        put(&mut doc, "audit", self.audit);
        put(&mut doc, "task", self.task);
        put(&mut doc, "due_date", self.due_date);
        put(&mut doc, "location", self.location);
        put(&mut doc, "area", self.area);
        put(&mut doc, "priority", self.priority);
        put(&mut doc, "task_status", self.task_status);
        put(&mut doc, "assigned", self.assigned);
        put(&mut doc, "description", self.description);
        put(&mut doc, "image", self.image);
        put(&mut doc, "archived", self.archived);
        doc
    }
}

fn task_filter(params: &ListParams, caller: &Caller) -> Value {
    FilterBuilder::for_list(&TASK, params, caller)
        .contains("priority", present(&params.priority))
        .eq("area", present(&params.area))
        .eq("location", present(&params.location))
        .created_between(present(&params.date_from), present(&params.date_to))
        .flag("archived", present(&params.archived))
        .build()
}

/// POST /task/add
pub async fn task_add(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<TaskInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    input.validate_new()?;

    let title = input.task.clone().unwrap_or_default();
    let mut doc = input.into_document();
    doc.entry("archived").or_insert(Value::Bool(false));
    stamp_owner(&mut doc, &owner);
    let task = state.store().insert(Collection::Tasks, doc).await?;

    let id = task.get("id").and_then(Value::as_str).unwrap_or_default();
    record(state.store.clone(), ActivityEntry::new(ActivityKind::NewTask, id, title).by(Some(owner)));

    Ok(ApiResponse::success("task.add.success", task))
}

/// GET /task/list/all
pub async fn task_list_all(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Document>> {
    let filter = task_filter(&params, &caller);
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let tasks = list_all(state.store(), TASK.collection, &filter, sort, TASK_REFS).await?;
    Ok(ApiResponse::success("task.list.success", tasks))
}

/// GET /task/list/filter
pub async fn task_list_filter(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Document>> {
    let window = page_window(&state, &params)?;
    let filter = task_filter(&params, &caller);
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let page = list_page(state.store(), TASK.collection, &filter, sort, window, TASK_REFS).await?;
    Ok(ApiResponse::success("task.list.success", page))
}

/// GET /task/:id
pub async fn task_details(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    ENTITY.show(&state, &caller, &id).await
}

/// PUT /task/:id
pub async fn task_update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<TaskInput>,
) -> ApiResult<Document> {
    input.validate_changes()?;
    let (id, _) = ENTITY.require(state.store(), &caller, &id).await?;
    ENTITY.update(&state, id, input.into_document()).await
}

/// PUT /task/status/:id
pub async fn task_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Document> {
    ENTITY.set_status(&state, &caller, &id, input).await
}

/// DELETE /task/:id
pub async fn task_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let (id, _) = ENTITY.require(state.store(), &caller, &id).await?;
    ENTITY.remove(&state, id).await
}
