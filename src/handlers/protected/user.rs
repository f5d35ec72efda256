use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::common::{not_blank, page_window, put, required, required_text, Entity, StatusInput};
use crate::auth::{Caller, Role};
use crate::database::{Collection, Document, DocumentStore};
use crate::error::ApiError;
use crate::middleware::auth::ROLE_DENIED;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::lists::USER;
use crate::query::params::present;
use crate::query::{resolve_sort, FilterBuilder, ListParams, Page, SCOPE_NONE};
use crate::services::accounts::{self, UserExport};
use crate::services::reports::{self, UserReport};
use crate::services::{list_all, list_page};
use crate::state::AppState;

pub const ENTITY: Entity = Entity { name: "user", collection: Collection::Users, owner_roles: SCOPE_NONE, refs: &[] };

/// Fields an admin may set on any account.
#[derive(Debug, Default, Deserialize)]
pub struct UserInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language: Option<String>,
    pub role: Option<i64>,
    pub status: Option<i64>,
    pub verified: Option<bool>,
    pub tester: Option<bool>,
    pub issues: Option<bool>,
    pub subscribed: Option<bool>,
    pub target_score: Option<f64>,
}

impl UserInput {
    fn into_document(self) -> Document {
        let mut doc = Document::new();
        put(&mut doc, "first_name", self.first_name);
        put(&mut doc, "last_name", self.last_name);
        put(&mut doc, "language", self.language);
        put(&mut doc, "role", self.role);
        put(&mut doc, "status", self.status);
        put(&mut doc, "verified", self.verified);
        put(&mut doc, "tester", self.tester);
        put(&mut doc, "issues", self.issues);
        put(&mut doc, "subscribed", self.subscribed);
        put(&mut doc, "target_score", self.target_score);
        doc
    }
}

/// Fields users may change on their own account.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language: Option<String>,
    pub image_url: Option<String>,
    pub issues: Option<bool>,
    pub subscribed: Option<bool>,
    pub target_score: Option<f64>,
}

impl ProfileInput {
    fn into_document(self) -> Document {
        let mut doc = Document::new();
        put(&mut doc, "first_name", self.first_name);
        put(&mut doc, "last_name", self.last_name);
        put(&mut doc, "language", self.language);
        put(&mut doc, "image_url", self.image_url);
        put(&mut doc, "issues", self.issues);
        put(&mut doc, "subscribed", self.subscribed);
        put(&mut doc, "target_score", self.target_score);
        doc
    }
}

/// Admins manage every account, users only their own.
fn ensure_self_or_admin(caller: &Caller, target: Uuid) -> Result<(), ApiError> {
    if caller.role == Role::Admin || caller.id == Some(target) {
        Ok(())
    } else {
        Err(ApiError::unauthorized(ROLE_DENIED))
    }
}

fn check_role(code: Option<i64>) -> Result<(), ApiError> {
    match code {
        None | Some(1) | Some(2) => Ok(()),
        Some(_) => Err(ApiError::bad_request("user.role.invalid")),
    }
}

/// Normalized email, refused when malformed or held by another account.
async fn claim_email(store: &dyn DocumentStore, raw: &str, except: Option<Uuid>) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !accounts::valid_email(&email) {
        return Err(ApiError::bad_request("user.email.invalid"));
    }
    if accounts::user_taken(store, "email", &email, except).await? {
        return Err(ApiError::duplicate("user.email.exist"));
    }
    Ok(email)
}

async fn claim_username(store: &dyn DocumentStore, raw: &str, except: Option<Uuid>) -> Result<String, ApiError> {
    let username = raw.trim().to_string();
    if accounts::user_taken(store, "username", &username, except).await? {
        return Err(ApiError::duplicate("user.username.exist"));
    }
    Ok(username)
}

/// Writes email and username changes into `changes`. A new email drops
/// verification unless the change says otherwise.
async fn apply_identity(
    store: &dyn DocumentStore,
    changes: &mut Document,
    current: &Document,
    email: &Option<String>,
    username: &Option<String>,
    id: Uuid,
) -> Result<(), ApiError> {
    not_blank(email, "user.email.required")?;
    not_blank(username, "user.username.required")?;
    if let Some(raw) = present(email) {
        let email = claim_email(store, raw, Some(id)).await?;
        if current.get("email").and_then(Value::as_str) != Some(email.as_str()) {
            changes.entry("verified".to_string()).or_insert(json!(false));
        }
        changes.insert("email".to_string(), json!(email));
    }
    if let Some(raw) = present(username) {
        changes.insert("username".to_string(), json!(claim_username(store, raw, Some(id)).await?));
    }
    Ok(())
}

/// `role=1,2` style list; entries that are not integers are ignored.
fn role_codes(raw: Option<&str>) -> Vec<Value> {
    raw.map(|list| {
        list.split(',')
            .filter_map(|code| code.trim().parse::<i64>().ok())
            .map(|code| json!(code))
            .collect()
    })
    .unwrap_or_default()
}

fn user_filter(params: &ListParams, caller: &Caller) -> Value {
    let mut builder = FilterBuilder::for_list(&USER, params, caller);
    let roles = role_codes(present(&params.role));
    if !roles.is_empty() {
        builder = builder.one_of("role", roles);
    }
    builder
        .flag("verified", present(&params.verified))
        .flag("issues", present(&params.issues))
        .build()
}

/// POST /user/add (admin)
pub async fn user_add(State(state): State<AppState>, Json(input): Json<UserInput>) -> ApiResult<Document> {
    let raw_email = required_text(&input.email, "user.email.required")?;
    required(input.role, "user.role.required")?;
    check_role(input.role)?;

    let email = claim_email(state.store(), &raw_email, None).await?;
    let username = match present(&input.username) {
        Some(raw) => claim_username(state.store(), raw, None).await?,
        None => accounts::unique_username(state.store(), &email).await?,
    };

    let mut doc = input.into_document();
    doc.insert("email".to_string(), json!(email));
    doc.insert("username".to_string(), json!(username));
    doc.entry("status".to_string()).or_insert(json!(1));
    doc.entry("verified".to_string()).or_insert(json!(false));
    let user = state.store().insert(Collection::Users, doc).await?;
    Ok(ApiResponse::success("user.add.success", user))
}

/// POST /user/add/admin (admin). The new admin starts active and verified.
pub async fn user_add_admin(State(state): State<AppState>, Json(input): Json<UserInput>) -> ApiResult<Document> {
    let raw_email = required_text(&input.email, "user.email.required")?;
    let email = claim_email(state.store(), &raw_email, None).await?;
    let username = accounts::unique_username(state.store(), &email).await?;

    let mut doc = Document::new();
    doc.insert("email".to_string(), json!(email));
    doc.insert("username".to_string(), json!(username));
    put(&mut doc, "first_name", input.first_name);
    put(&mut doc, "last_name", input.last_name);
    put(&mut doc, "language", input.language);
    doc.insert("role".to_string(), json!(Role::Admin.code()));
    doc.insert("status".to_string(), json!(1));
    doc.insert("verified".to_string(), json!(true));
    let user = state.store().insert(Collection::Users, doc).await?;
    Ok(ApiResponse::success("user.add.success", user))
}

/// PUT /user/:id (admin)
pub async fn user_update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<UserInput>,
) -> ApiResult<Document> {
    check_role(input.role)?;
    let (id, current) = ENTITY.require(state.store(), &caller, &id).await?;
    let (email, username) = (input.email.clone(), input.username.clone());
    let mut changes = input.into_document();
    apply_identity(state.store(), &mut changes, &current, &email, &username, id).await?;
    ENTITY.update(&state, id, changes).await
}

/// PUT /user/profile/update
pub async fn user_profile_update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<ProfileInput>,
) -> ApiResult<Document> {
    let id = caller.id.ok_or_else(|| ApiError::unauthorized(ROLE_DENIED))?;
    let current = state
        .store()
        .find_by_id(Collection::Users, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user.not.found"))?;
    let (email, username) = (input.email.clone(), input.username.clone());
    let mut changes = input.into_document();
    apply_identity(state.store(), &mut changes, &current, &email, &username, id).await?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("common.update.empty"));
    }
    let updated = state
        .store()
        .update_by_id(Collection::Users, id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("user.not.found"))?;
    Ok(ApiResponse::success("user.profile.update.success", updated))
}

/// DELETE /user/:id. Removes the account with its areas, tasks and audits.
pub async fn user_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let target = ENTITY.parse_id(&id)?;
    ensure_self_or_admin(&caller, target)?;
    let removed = accounts::erase_user(state.store(), target)
        .await?
        .ok_or_else(|| ApiError::not_found("user.not.found"))?;
    tracing::info!("User {} erased by {:?}", target, caller.id);
    Ok(ApiResponse::success("user.delete.success", removed))
}

/// GET /user/download/:id. Everything the account created.
pub async fn user_download(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<UserExport> {
    let target = ENTITY.parse_id(&id)?;
    ensure_self_or_admin(&caller, target)?;
    let (target, _) = ENTITY.require(state.store(), &caller, &id).await?;
    let export = accounts::export_user(state.store(), target).await?;
    Ok(ApiResponse::success("user.download.success", export))
}

/// GET /user/list/all (admin)
pub async fn user_list_all(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Document>> {
    let filter = user_filter(&params, &caller);
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let users = list_all(state.store(), USER.collection, &filter, sort, &[]).await?;
    Ok(ApiResponse::success("user.list.success", users))
}

/// GET /user/list/filter (admin)
pub async fn user_list_filter(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Document>> {
    let window = page_window(&state, &params)?;
    let filter = user_filter(&params, &caller);
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let page = list_page(state.store(), USER.collection, &filter, sort, window, &[]).await?;
    Ok(ApiResponse::success("user.list.success", page))
}

/// GET /user/reports (admin)
pub async fn user_reports(State(state): State<AppState>) -> ApiResult<UserReport> {
    let report = reports::user_report(state.store()).await?;
    Ok(ApiResponse::success("user.reports.success", report))
}

/// GET /user/profile/me
pub async fn user_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Document> {
    let id = caller.id.ok_or_else(|| ApiError::unauthorized(ROLE_DENIED))?;
    let user = state
        .store()
        .find_by_id(Collection::Users, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user.not.found"))?;
    Ok(ApiResponse::success("user.profile.success", user))
}

/// GET /user/:id
pub async fn user_details(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    ENTITY.show(&state, &caller, &id).await
}

/// PUT /user/status/:id. Regular users may only change their own status.
pub async fn user_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Document> {
    let target = ENTITY.parse_id(&id)?;
    ensure_self_or_admin(&caller, target)?;
    ENTITY.set_status(&state, &caller, &id, input).await
}
