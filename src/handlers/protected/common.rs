use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{Caller, Role};
use crate::database::{populate, Collection, Document, DocumentStore, Populate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::params::present;
use crate::query::{FilterBuilder, ListParams, PageWindow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: Option<i64>,
}

/// How detail, status and delete routes reach one entity's records.
#[derive(Debug, Clone, Copy)]
pub struct Entity {
    /// Prefix of every message key for the entity.
    pub name: &'static str,
    pub collection: Collection,
    /// Caller roles that only reach their own records.
    pub owner_roles: &'static [Role],
    pub refs: &'static [Populate],
}

impl Entity {
    pub fn key(&self, suffix: &str) -> String {
        format!("{}.{}", self.name, suffix)
    }

    fn not_found(&self) -> ApiError {
        ApiError::not_found(self.key("not.found"))
    }

    pub fn parse_id(&self, raw: &str) -> Result<Uuid, ApiError> {
        Uuid::parse_str(raw).map_err(|_| self.not_found())
    }

    /// The record with `raw` id as seen by `caller`.
    pub async fn require(&self, store: &dyn DocumentStore, caller: &Caller, raw: &str) -> Result<(Uuid, Document), ApiError> {
        let id = self.parse_id(raw)?;
        let filter = FilterBuilder::new()
            .push(json!({ "id": id.to_string() }))
            .owner(self.owner_roles, caller, None);
        let mut found = store
            .find(self.collection, &filter.build(), crate::database::FindOptions::default().window(None, Some(1)))
            .await?;
        match found.pop() {
            Some(doc) => Ok((id, doc)),
            None => Err(self.not_found()),
        }
    }

    pub async fn show(&self, state: &AppState, caller: &Caller, raw: &str) -> ApiResult<Document> {
        let (_, doc) = self.require(state.store(), caller, raw).await?;
        let mut docs = [doc];
        populate(state.store(), &mut docs, self.refs).await?;
        let [doc] = docs;
        Ok(ApiResponse::success(self.key("details.success"), doc))
    }

    pub async fn set_status(&self, state: &AppState, caller: &Caller, raw: &str, input: StatusInput) -> ApiResult<Document> {
        let status = input.status.ok_or_else(|| ApiError::bad_request("common.status.required"))?;
        let (id, _) = self.require(state.store(), caller, raw).await?;
        let mut changes = Document::new();
        changes.insert("status".to_string(), json!(status));
        let updated = state
            .store()
            .update_by_id(self.collection, id, changes)
            .await?
            .ok_or_else(|| self.not_found())?;
        Ok(ApiResponse::success("common.status.update.success", updated))
    }

    pub async fn update(&self, state: &AppState, id: Uuid, changes: Document) -> ApiResult<Document> {
        if changes.is_empty() {
            return Err(ApiError::bad_request("common.update.empty"));
        }
        let updated = state
            .store()
            .update_by_id(self.collection, id, changes)
            .await?
            .ok_or_else(|| self.not_found())?;
        Ok(ApiResponse::success(self.key("update.success"), updated))
    }

    pub async fn remove(&self, state: &AppState, id: Uuid) -> ApiResult<Document> {
        let removed = state
            .store()
            .delete_by_id(self.collection, id)
            .await?
            .ok_or_else(|| self.not_found())?;
        Ok(ApiResponse::success(self.key("delete.success"), removed))
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Validated page window for `/list/filter` routes.
pub fn page_window(state: &AppState, params: &ListParams) -> Result<PageWindow, ApiError> {
    Ok(PageWindow::from_params(present(&params.page), present(&params.limit), state.max_limit())?)
}

/// Id written to `created_by`; anonymous callers never reach write routes.
pub fn owner_id(caller: &Caller) -> Result<String, ApiError> {
    caller
        .id_string()
        .ok_or_else(|| ApiError::unauthorized(crate::middleware::auth::ROLE_DENIED))
}

pub fn required<T>(value: Option<T>, key: &'static str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(key))
}

/// Required text; blank counts as absent.
pub fn required_text(value: &Option<String>, key: &'static str) -> Result<String, ApiError> {
    present(value).map(str::to_string).ok_or_else(|| ApiError::bad_request(key))
}

/// Required text may be left out of an update but never blanked.
pub fn not_blank(value: &Option<String>, key: &'static str) -> Result<(), ApiError> {
    match value {
        Some(text) if text.trim().is_empty() => Err(ApiError::bad_request(key)),
        _ => Ok(()),
    }
}

pub fn put<T: Serialize>(doc: &mut Document, key: &str, value: Option<T>) {
    if let Some(value) = value {
        doc.insert(key.to_string(), json!(value));
    }
}

/// New records start active and owned by their author.
pub fn stamp_owner(doc: &mut Document, owner: &str) {
    doc.insert("status".to_string(), json!(1));
    doc.insert("created_by".to_string(), Value::String(owner.to_string()));
}

/// Only verified users and testers create records.
pub async fn ensure_can_author(store: &dyn DocumentStore, caller: &Caller) -> Result<(), ApiError> {
    let Some(id) = caller.id else {
        return Err(ApiError::bad_request("user.not.verified"));
    };
    let user = store.find_by_id(Collection::Users, id).await?;
    let allowed = user.map_or(false, |u| {
        u.get("verified").and_then(Value::as_bool).unwrap_or(false)
            || u.get("tester").and_then(Value::as_bool).unwrap_or(false)
    });
    if allowed {
        Ok(())
    } else {
        Err(ApiError::bad_request("user.not.verified"))
    }
}

/// Whether the owner already has a record with `field == value`, ignoring
/// the record being edited.
pub async fn taken(
    store: &dyn DocumentStore,
    collection: Collection,
    field: &str,
    value: &str,
    owner: &str,
    except: Option<Uuid>,
) -> Result<bool, ApiError> {
    let mut filter = FilterBuilder::new()
        .push(json!({ field: value }))
        .push(json!({ "created_by": owner }));
    if let Some(id) = except {
        filter = filter.push(json!({ "id": { "$ne": id.to_string() } }));
    }
    Ok(store.exists(collection, &filter.build()).await?)
}
