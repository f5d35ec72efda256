use serde::Serialize;
use serde_json::json;

use crate::auth::Caller;
use crate::database::{Collection, DatabaseError, DocumentStore};
use crate::query::{FilterBuilder, SCOPE_MEMBERS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counter {
    pub audits: u64,
    pub locations: u64,
    pub areas: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserReport {
    pub regular: u64,
    pub subscribed: u64,
    pub total: u64,
    pub verified: u64,
    pub issues: u64,
}

/// Audits, locations and areas owned by the caller, whatever their status.
/// The three counts run concurrently.
pub async fn counter(store: &dyn DocumentStore, caller: &Caller) -> Result<Counter, DatabaseError> {
    let filter = FilterBuilder::new().owner(SCOPE_MEMBERS, caller, None).build();
    let (audits, locations, areas) = futures::try_join!(
        store.count(Collection::Audits, &filter),
        store.count(Collection::Locations, &filter),
        store.count(Collection::Areas, &filter),
    )?;
    Ok(Counter { audits, locations, areas })
}

/// Headline numbers over the user base. `regular` are non-admin users.
pub async fn user_report(store: &dyn DocumentStore) -> Result<UserReport, DatabaseError> {
    let regular = json!({ "role": 2 });
    let subscribed = json!({ "subscribed": true });
    let verified = json!({ "verified": true });
    let issues = json!({ "issues": true });
    let everyone = json!({});
    let (regular, subscribed, total, verified, issues) = futures::try_join!(
        store.count(Collection::Users, &regular),
        store.count(Collection::Users, &subscribed),
        store.count(Collection::Users, &everyone),
        store.count(Collection::Users, &verified),
        store.count(Collection::Users, &issues),
    )?;
    Ok(UserReport { regular, subscribed, total, verified, issues })
}
