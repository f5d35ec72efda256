use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use super::common::{ensure_can_author, not_blank, owner_id, put, required, required_text, stamp_owner, Entity, StatusInput};
use crate::auth::Caller;
use crate::database::{Collection, Document, Populate};
use crate::error::ApiError;
use crate::filter::SortSpec;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::params::present;
use crate::query::{FilterBuilder, ListParams, SCOPE_NONE, SCOPE_USERS};
use crate::services::questions::{grouped_questions, CategoryGroup, CHECKLIST_MISSING};
use crate::services::list_all;
use crate::state::AppState;

const QUESTION_REFS: &[Populate] =
    &[Populate::new("category", Collection::Categories).select(&["name", "priority", "description", "status"])];

pub const ENTITY: Entity = Entity { name: "question", collection: Collection::Questions, owner_roles: SCOPE_NONE, refs: QUESTION_REFS };

/// Same reach as checklist writes.
const EDITABLE: Entity = Entity { owner_roles: SCOPE_USERS, ..ENTITY };

#[derive(Debug, Default, Deserialize)]
pub struct QuestionInput {
    pub question: Option<String>,
    pub category: Option<String>,
    pub checklist: Option<String>,
    pub example: Option<String>,
    pub language: Option<String>,
    pub max_points: Option<f64>,
    pub order: Option<i64>,
}

impl QuestionInput {
    fn into_document(self) -> Document {
        let mut doc = Document::new();
        put(&mut doc, "question", self.question);
        put(&mut doc, "category", self.category);
        put(&mut doc, "checklist", self.checklist);
        put(&mut doc, "example", self.example);
        put(&mut doc, "language", self.language);
        put(&mut doc, "max_points", self.max_points);
        put(&mut doc, "order", self.order);
        doc
    }
}

/// POST /question/add
pub async fn question_add(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<QuestionInput>,
) -> ApiResult<Document> {
    let owner = owner_id(&caller)?;
    required_text(&input.question, "question.question.required")?;
    required_text(&input.category, "question.category.required")?;
    required_text(&input.example, "question.example.required")?;
    required(input.max_points, "question.max_points.required")?;
    required(input.order, "question.order.required")?;

    ensure_can_author(state.store(), &caller).await?;
    let mut doc = input.into_document();
    stamp_owner(&mut doc, &owner);
    let question = state.store().insert(Collection::Questions, doc).await?;
    Ok(ApiResponse::success("question.add.success", question))
}

/// GET /question/list/all?checklist=<code>. Questions grouped per category.
pub async fn question_list_all(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<CategoryGroup>> {
    let code = present(&params.checklist).ok_or_else(|| ApiError::bad_request("question.checklist.required"))?;
    let groups = grouped_questions(state.store(), code).await?;
    Ok(ApiResponse::success("question.list.success", groups))
}

/// GET /question/list/all/v2. Flat list in checklist order.
pub async fn question_list_all_v2(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Document>> {
    let checklist = present(&params.checklist);
    if let Some(raw) = checklist {
        let known = match uuid::Uuid::parse_str(raw) {
            Ok(id) => state.store().find_by_id(Collection::Checklists, id).await?.is_some(),
            Err(_) => false,
        };
        if !known {
            return Err(ApiError::bad_request(CHECKLIST_MISSING));
        }
    }

    let filter = FilterBuilder::new().eq("checklist", checklist).build();
    let questions = list_all(
        state.store(),
        Collection::Questions,
        &filter,
        SortSpec::ascending("order"),
        QUESTION_REFS,
    )
    .await?;
    Ok(ApiResponse::success("question.list.success", questions))
}

/// GET /question/:id
pub async fn question_details(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    ENTITY.show(&state, &caller, &id).await
}

/// PUT /question/:id
pub async fn question_update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<QuestionInput>,
) -> ApiResult<Document> {
    not_blank(&input.question, "question.question.required")?;
    not_blank(&input.category, "question.category.required")?;
    not_blank(&input.example, "question.example.required")?;
    let (id, _) = EDITABLE.require(state.store(), &caller, &id).await?;
    EDITABLE.update(&state, id, input.into_document()).await
}

/// PUT /question/status/:id
pub async fn question_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Document> {
    EDITABLE.set_status(&state, &caller, &id, input).await
}

/// DELETE /question/:id
pub async fn question_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let (id, _) = EDITABLE.require(state.store(), &caller, &id).await?;
    EDITABLE.remove(&state, id).await
}
