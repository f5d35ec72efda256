use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::audits::AUDIT_REFS;
use super::listing::list_all;
use crate::database::{Collection, DatabaseError, Document, DocumentStore};
use crate::filter::SortSpec;

/// Collections a user's own records live in; erased along with the account.
const OWNED: [Collection; 3] = [Collection::Areas, Collection::Tasks, Collection::Audits];

/// Everything a user created, as handed out by the download route.
#[derive(Debug, Clone, Serialize)]
pub struct UserExport {
    pub areas: Vec<Document>,
    pub tasks: Vec<Document>,
    pub audits: Vec<Document>,
}

pub fn valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(email))
}

/// Whether another user already has `field == value`.
pub async fn user_taken(
    store: &dyn DocumentStore,
    field: &str,
    value: &str,
    except: Option<Uuid>,
) -> Result<bool, DatabaseError> {
    let filter = match except {
        Some(id) => json!({ "$and": [{ field: value }, { "id": { "$ne": id.to_string() } }] }),
        None => json!({ field: value }),
    };
    store.exists(Collection::Users, &filter).await
}

/// Account name derived from the email's local part, suffixed when taken.
pub async fn unique_username(store: &dyn DocumentStore, email: &str) -> Result<String, DatabaseError> {
    let local = email.split('@').next().unwrap_or_default();
    let mut base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .to_lowercase();
    if base.is_empty() {
        base = "user".to_string();
    }
    if !user_taken(store, "username", &base, None).await? {
        return Ok(base);
    }
    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let candidate = format!("{}-{}", base, &suffix[..6]);
        if !user_taken(store, "username", &candidate, None).await? {
            return Ok(candidate);
        }
    }
}

/// Deletes the account and every area, task and audit it created.
/// `None` when there was no such account.
pub async fn erase_user(store: &dyn DocumentStore, id: Uuid) -> Result<Option<Document>, DatabaseError> {
    if store.find_by_id(Collection::Users, id).await?.is_none() {
        return Ok(None);
    }
    let owned = json!({ "created_by": id.to_string() });
    for collection in OWNED {
        let removed = store.delete_where(collection, &owned).await?;
        tracing::debug!("Erased {} {:?} of user {}", removed, collection, id);
    }
    store.delete_by_id(Collection::Users, id).await
}

pub async fn export_user(store: &dyn DocumentStore, id: Uuid) -> Result<UserExport, DatabaseError> {
    let owned = json!({ "created_by": id.to_string() });
    let newest = || SortSpec::descending("createdAt");
    let (areas, tasks, audits) = futures::try_join!(
        list_all(store, Collection::Areas, &owned, newest(), &[]),
        list_all(store, Collection::Tasks, &owned, newest(), &[]),
        list_all(store, Collection::Audits, &owned, newest(), AUDIT_REFS),
    )?;
    Ok(UserExport { areas, tasks, audits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[test]
    fn email_shape() {
        assert!(valid_email("ana@example.com"));
        assert!(!valid_email("ana@example"));
        assert!(!valid_email("ana example@x.io"));
        assert!(!valid_email(""));
    }

    #[tokio::test]
    async fn usernames_stay_unique() {
        let store = MemoryStore::new();
        assert_eq!(unique_username(&store, "Ana.B+x@example.com").await.unwrap(), "ana.bx");

        store.seed(Collection::Users, json!({"email": "ana@a.io", "username": "ana"}));
        let second = unique_username(&store, "ana@b.io").await.unwrap();
        assert!(second.starts_with("ana-"));
        assert_eq!(second.len(), "ana-".len() + 6);
    }

    #[tokio::test]
    async fn erasing_a_user_takes_their_records_along() {
        let store = MemoryStore::new();
        let gone = Uuid::new_v4();
        let kept = Uuid::new_v4();
        store.seed(Collection::Users, json!({"id": gone.to_string(), "email": "a@a.io"}));
        for owner in [gone, kept] {
            store.seed(Collection::Areas, json!({"title": "A", "status": 1, "created_by": owner.to_string()}));
            store.seed(Collection::Tasks, json!({"task": "T", "status": 1, "created_by": owner.to_string()}));
            store.seed(Collection::Audits, json!({"scores": [], "status": 0, "created_by": owner.to_string()}));
        }

        let erased = erase_user(&store, gone).await.unwrap();
        assert_eq!(erased.unwrap()["email"], json!("a@a.io"));
        for collection in OWNED {
            let left = store.all(collection);
            assert_eq!(left.len(), 1);
            assert_eq!(left[0]["created_by"], json!(kept.to_string()));
        }
        assert!(erase_user(&store, gone).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn export_holds_only_own_records() {
        let store = MemoryStore::new();
        let me = Uuid::new_v4();
        let score = store.seed(Collection::Scores, json!({"score": 3}));
        store.seed(Collection::Areas, json!({"title": "Mine", "status": 1, "created_by": me.to_string()}));
        store.seed(Collection::Areas, json!({"title": "Theirs", "status": 1, "created_by": Uuid::new_v4().to_string()}));
        store.seed(Collection::Audits, json!({"scores": [score["id"]], "status": 1, "created_by": me.to_string()}));

        let export = export_user(&store, me).await.unwrap();
        assert_eq!(export.areas.len(), 1);
        assert_eq!(export.areas[0]["title"], json!("Mine"));
        assert!(export.tasks.is_empty());
        assert_eq!(export.audits[0]["scores"][0]["score"], json!(3));
    }
}
