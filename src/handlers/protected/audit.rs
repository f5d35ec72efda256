use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::common::{
    ensure_can_author, not_blank, owner_id, put, required_text, stamp_owner, today, Entity, StatusInput,
};
use crate::auth::Caller;
use crate::database::{Collection, Document};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::{ListParams, Page, SCOPE_MEMBERS};
use crate::services::audits::{self, AuditReport, AUDIT_REFS};
use crate::services::{record, ActivityEntry};
use crate::state::AppState;
use crate::types::ActivityKind;

pub const ENTITY: Entity = Entity { name: "audit", collection: Collection::Audits, owner_roles: SCOPE_MEMBERS, refs: AUDIT_REFS };

#[derive(Debug, Deserialize)]
pub struct ScoreInput {
    pub question: String,
    pub score: f64,
    pub image: Option<String>,
    pub comment: Option<String>,
    pub has_deviation: Option<bool>,
}

impl ScoreInput {
    fn into_document(self) -> Document {
        let mut doc = Document::new();
        doc.insert("question".to_string(), json!(self.question));
        doc.insert("score".to_string(), json!(self.score));
        put(&mut doc, "image", self.image);
        put(&mut doc, "comment", self.comment);
        doc.insert("has_deviation".to_string(), json!(self.has_deviation.unwrap_or(false)));
        doc
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditInput {
    pub area: Option<String>,
    pub checklist: Option<String>,
    pub scores: Option<Vec<ScoreInput>>,
}

/// The caller's area an audit points at. Storage failures pass through.
async fn audited_area(state: &AppState, caller: &Caller, raw: &str) -> Result<Document, ApiError> {
    match super::area::ENTITY.require(state.store(), caller, raw).await {
        Ok((_, area)) => Ok(area),
        Err(ApiError::NotFound(_)) => Err(ApiError::not_found("audit.area.not.found")),
        Err(other) => Err(other),
    }
}

/// POST /audit/add. Stores each answer, then the audit referencing them.
pub async fn audit_add(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<AuditInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    let area_id = required_text(&input.area, "audit.area.required")?;
    let scores = input
        .scores
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("audit.scores.required"))?;

    ensure_can_author(state.store(), &caller).await?;
    let area = audited_area(&state, &caller, &area_id).await?;

    let mut score_ids = Vec::with_capacity(scores.len());
    for score in scores {
        let stored = state.store().insert(Collection::Scores, score.into_document()).await?;
        if let Some(id) = stored.get("id").cloned() {
            score_ids.push(id);
        }
    }

    let mut doc = Document::new();
    doc.insert("area".to_string(), json!(area_id));
    put(&mut doc, "checklist", input.checklist);
    doc.insert("scores".to_string(), Value::Array(score_ids));
    stamp_owner(&mut doc, &owner);
    let audit = state.store().insert(Collection::Audits, doc).await?;

    let id = audit.get("id").and_then(Value::as_str).unwrap_or_default();
    let title = area.get("title").and_then(Value::as_str).unwrap_or_default();
    record(state.store.clone(), ActivityEntry::new(ActivityKind::NewAudit, id, title).by(Some(owner)));

    Ok(ApiResponse::success("audit.add.success", audit))
}

/// GET /audit/list/all
pub async fn audit_list_all(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Document>> {
    let audits = audits::list_audits(state.store(), &caller, &params, today()).await?;
    Ok(ApiResponse::success("audit.list.success", audits))
}

/// GET /audit/history/list/all
pub async fn audit_history(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Document>> {
    let history = audits::audit_history(state.store(), &caller, &params).await?;
    Ok(ApiResponse::success("audit.history.success", history))
}

/// GET /audit/list/filter
pub async fn audit_list_filter(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Document>> {
    let page = audits::filter_audits(state.store(), &caller, &params, state.max_limit(), today()).await?;
    Ok(ApiResponse::success("audit.list.success", page))
}

/// GET /audit/report/all
pub async fn audit_report_all(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<AuditReport> {
    let report = audits::score_report(state.store(), &caller, &params, None).await?;
    Ok(ApiResponse::success("audit.report.success", report))
}

/// GET /audit/report/area/:area
pub async fn audit_report_area(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(area): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<AuditReport> {
    let report = audits::score_report(state.store(), &caller, &params, Some(&area)).await?;
    Ok(ApiResponse::success("audit.report.success", report))
}

/// GET /audit/:id
pub async fn audit_details(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    ENTITY.show(&state, &caller, &id).await
}

/// Fields an existing audit may change. Answers are fixed once recorded.
#[derive(Debug, Default, Deserialize)]
pub struct AuditChanges {
    pub area: Option<String>,
    pub checklist: Option<String>,
    pub status: Option<i64>,
}

/// PUT /audit/:id
pub async fn audit_update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<AuditChanges>,
) -> ApiResult<Document> {
    not_blank(&input.area, "audit.area.required")?;
    let (id, current) = ENTITY.require(state.store(), &caller, &id).await?;
    let area = input
        .area
        .clone()
        .or_else(|| current.get("area").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default();

    let mut changes = Document::new();
    if let Some(area_id) = input.area {
        audited_area(&state, &caller, &area_id).await?;
        changes.insert("area".to_string(), json!(area_id));
    }
    put(&mut changes, "checklist", input.checklist);
    put(&mut changes, "status", input.status);

    let response = ENTITY.update(&state, id, changes).await?;
    record(
        state.store.clone(),
        ActivityEntry::new(ActivityKind::UpdateAudit, id.to_string(), area).by(caller.id_string()),
    );
    Ok(response)
}

/// PUT /audit/status/:id
pub async fn audit_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Document> {
    ENTITY.set_status(&state, &caller, &id, input).await
}

/// DELETE /audit/:id
pub async fn audit_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let (id, current) = ENTITY.require(state.store(), &caller, &id).await?;
    let response = ENTITY.remove(&state, id).await?;

    let area = current.get("area").and_then(Value::as_str).unwrap_or_default();
    record(
        state.store.clone(),
        ActivityEntry::new(ActivityKind::DeleteAudit, id.to_string(), area).by(caller.id_string()),
    );
    Ok(response)
}
