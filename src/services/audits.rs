use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use super::listing::{list_all, list_page};
use crate::auth::Caller;
use crate::database::{Collection, Document, DocumentStore, FindOptions, Populate};
use crate::query::lists::AUDIT;
use crate::query::params::present;
use crate::query::report::{audit_total, scored_answers};
use crate::query::{aggregate_scores, resolve_sort, CategoryTotal, FilterBuilder, ListParams, Page, PageWindow, QueryError};

const SCORE_CATEGORY: &[Populate] = &[Populate::new("category", Collection::Categories).select(&["name", "priority"])];
const SCORE_QUESTION: &[Populate] = &[Populate::new("question", Collection::Questions)
    .select(&["question", "category", "max_points", "order"])
    .nested(SCORE_CATEGORY)];

/// Area, checklist and scores with their question and category.
pub const AUDIT_REFS: &[Populate] = &[
    Populate::new("area", Collection::Areas).select(&["title", "type", "location"]),
    Populate::new("checklist", Collection::Checklists).select(&["name", "code", "standard", "is_short"]),
    Populate::new("scores", Collection::Scores).nested(SCORE_QUESTION),
];

/// Only what the score report needs.
const REPORT_REFS: &[Populate] = &[Populate::new("scores", Collection::Scores).nested(SCORE_QUESTION)];

const HISTORY_REFS: &[Populate] = &[
    Populate::new("area", Collection::Areas).select(&["title"]),
    Populate::new("checklist", Collection::Checklists).select(&["name", "standard"]),
    Populate::new("scores", Collection::Scores).select(&["score"]),
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub audits: Vec<CategoryTotal>,
    pub total: f64,
    pub user_id: Option<String>,
}

/// `true` for `short`, `false` for `full`, anything else leaves it open.
fn checklist_length(raw: Option<&str>) -> Option<bool> {
    match raw {
        Some("short") => Some(true),
        Some("full") => Some(false),
        _ => None,
    }
}

fn with_totals(mut docs: Vec<Document>, key: &str) -> Vec<Document> {
    for doc in docs.iter_mut() {
        let total = audit_total(doc);
        doc.insert(key.to_string(), json!(total));
    }
    docs
}

/// All audits visible to the caller, optionally limited to the last `range`
/// months.
pub async fn list_audits(
    store: &dyn DocumentStore,
    caller: &Caller,
    params: &ListParams,
    today: NaiveDate,
) -> Result<Vec<Document>, QueryError> {
    let filter = FilterBuilder::for_list(&AUDIT, params, caller)
        .eq("area", present(&params.area))
        .created_since_months(present(&params.range), today)
        .build();
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let docs = list_all(store, AUDIT.collection, &filter, sort, AUDIT_REFS).await?;
    Ok(with_totals(docs, "totalScores"))
}

/// Paginated audits whose checklist belongs to the requested standard.
///
/// The page window and `standard` are validated before any storage call.
pub async fn filter_audits(
    store: &dyn DocumentStore,
    caller: &Caller,
    params: &ListParams,
    max_limit: Option<u64>,
    today: NaiveDate,
) -> Result<Page<Document>, QueryError> {
    let window = PageWindow::from_params(present(&params.page), present(&params.limit), max_limit)?;
    let standard = present(&params.standard).ok_or(QueryError::Required("audit.list.standard.required"))?;

    let mut checklist_filter = FilterBuilder::new().eq("standard", Some(standard));
    if let Some(short) = checklist_length(present(&params.is_short)) {
        checklist_filter = checklist_filter.push(json!({ "is_short": short }));
    }
    let checklists = store
        .find(Collection::Checklists, &checklist_filter.build(), FindOptions::default())
        .await?;
    let ids: Vec<Value> = checklists.into_iter().filter_map(|c| c.get("id").cloned()).collect();

    let filter = FilterBuilder::for_list(&AUDIT, params, caller)
        .eq("area", present(&params.area))
        .created_since_months(present(&params.range), today)
        .one_of("checklist", ids)
        .build();
    let sort = resolve_sort(present(&params.sort), present(&params.order));

    let mut page = list_page(store, AUDIT.collection, &filter, sort, window, AUDIT_REFS).await?;
    page.data = with_totals(std::mem::take(&mut page.data), "totalScores");
    Ok(page)
}

/// Audits of one area (or all visible ones) reduced to their score total.
pub async fn audit_history(
    store: &dyn DocumentStore,
    caller: &Caller,
    params: &ListParams,
) -> Result<Vec<Document>, QueryError> {
    let filter = FilterBuilder::for_list(&AUDIT, params, caller)
        .eq("area", present(&params.area_id))
        .build();
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let docs = list_all(store, AUDIT.collection, &filter, sort, HISTORY_REFS).await?;

    Ok(with_totals(docs, "totalScore")
        .into_iter()
        .map(|mut doc| {
            doc.remove("scores");
            doc
        })
        .collect())
}

/// Per-category score totals over the caller's audits, optionally limited
/// to one area and to whole days from `start` through `end`.
pub async fn score_report(
    store: &dyn DocumentStore,
    caller: &Caller,
    params: &ListParams,
    area: Option<&str>,
) -> Result<AuditReport, QueryError> {
    let explicit = present(&params.user_id);
    let filter = FilterBuilder::new()
        .owner(AUDIT.owner_roles, caller, explicit)
        .eq("area", area)
        .created_between(present(&params.start), present(&params.end))
        .build();
    let audits = list_all(store, AUDIT.collection, &filter, resolve_sort(None, None), REPORT_REFS).await?;

    let report = aggregate_scores(&scored_answers(&audits));
    tracing::debug!("Score report over {} audits, {} categories", audits.len(), report.categories.len());

    Ok(AuditReport {
        audits: report.categories,
        total: report.total,
        user_id: explicit.map(str::to_string).or_else(|| caller.id_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::testing::MemoryStore;
    use uuid::Uuid;

    struct Fixture {
        store: MemoryStore,
        owner: Uuid,
        area: String,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let cat_a = store.seed(Collection::Categories, json!({"name": "Hygiene", "priority": 1, "status": 1}));
        let cat_b = store.seed(Collection::Categories, json!({"name": "Safety", "priority": 2, "status": 1}));
        let short = store.seed(Collection::Checklists, json!({"name": "Quick", "standard": "ISO", "is_short": true, "status": 1}));
        store.seed(Collection::Checklists, json!({"name": "Full", "standard": "ISO", "is_short": false, "status": 1}));
        let q1 = store.seed(Collection::Questions, json!({"question": "Clean?", "category": cat_a["id"], "status": 1}));
        let q2 = store.seed(Collection::Questions, json!({"question": "Exits?", "category": cat_b["id"], "status": 1}));
        let area = store.seed(Collection::Areas, json!({"title": "Kitchen", "status": 1, "created_by": owner.to_string()}));

        let s1 = store.seed(Collection::Scores, json!({"question": q1["id"], "score": 3}));
        let s2 = store.seed(Collection::Scores, json!({"question": q2["id"], "score": 2}));
        let s3 = store.seed(Collection::Scores, json!({"question": q1["id"], "score": 4}));
        store.seed(
            Collection::Audits,
            json!({"area": area["id"], "checklist": short["id"], "scores": [s1["id"], s2["id"]], "status": 1,
                   "created_by": owner.to_string(), "createdAt": "2026-03-05T10:00:00Z"}),
        );
        store.seed(
            Collection::Audits,
            json!({"area": area["id"], "checklist": short["id"], "scores": [s3["id"]], "status": 1,
                   "created_by": owner.to_string(), "createdAt": "2026-04-10T10:00:00Z"}),
        );
        // someone else's audit
        store.seed(
            Collection::Audits,
            json!({"area": area["id"], "checklist": short["id"], "scores": [s3["id"]], "status": 1,
                   "created_by": Uuid::new_v4().to_string()}),
        );

        Fixture { store, owner, area: area["id"].as_str().unwrap().to_string() }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[tokio::test]
    async fn report_sums_per_category() {
        let f = fixture();
        let caller = Caller::new(f.owner, Role::User);
        let report = score_report(&f.store, &caller, &ListParams::default(), None).await.unwrap();

        assert_eq!(report.total, 9.0);
        assert_eq!(report.audits.len(), 2);
        let hygiene = report.audits.iter().find(|c| c.category_name == "Hygiene").unwrap();
        assert_eq!(hygiene.total_score, 7.0);
        assert_eq!(report.user_id, Some(f.owner.to_string()));
    }

    #[tokio::test]
    async fn report_respects_day_bounds_and_area() {
        let f = fixture();
        let caller = Caller::new(f.owner, Role::User);
        let params = ListParams {
            start: Some("2026-03-01".into()),
            end: Some("2026-03-31".into()),
            ..Default::default()
        };
        let report = score_report(&f.store, &caller, &params, Some(&f.area)).await.unwrap();
        assert_eq!(report.total, 5.0);

        let elsewhere = score_report(&f.store, &caller, &ListParams::default(), Some(&Uuid::new_v4().to_string()))
            .await
            .unwrap();
        assert!(elsewhere.audits.is_empty());
        assert_eq!(elsewhere.total, 0.0);
    }

    #[tokio::test]
    async fn filter_requires_standard_before_touching_storage() {
        let f = fixture();
        let caller = Caller::new(f.owner, Role::User);
        let params = ListParams { page: Some("1".into()), limit: Some("10".into()), ..Default::default() };
        let before = f.store.calls();

        let err = filter_audits(&f.store, &caller, &params, None, today()).await.unwrap_err();
        assert!(matches!(err, QueryError::Required("audit.list.standard.required")));
        assert_eq!(f.store.calls(), before);
    }

    #[tokio::test]
    async fn filter_limits_to_matching_checklists() {
        let f = fixture();
        let caller = Caller::new(f.owner, Role::User);
        let mut params = ListParams {
            page: Some("1".into()),
            limit: Some("10".into()),
            standard: Some("ISO".into()),
            is_short: Some("short".into()),
            ..Default::default()
        };

        let page = filter_audits(&f.store, &caller, &params, None, today()).await.unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.data[0]["totalScores"], json!(4.0));
        assert_eq!(page.data[1]["totalScores"], json!(5.0));

        params.is_short = Some("full".into());
        let page = filter_audits(&f.store, &caller, &params, None, today()).await.unwrap();
        assert_eq!(page.count, 0);
        assert_eq!(page.pages, 0);
    }

    #[tokio::test]
    async fn history_carries_totals_without_scores() {
        let f = fixture();
        let caller = Caller::new(f.owner, Role::User);
        let params = ListParams { area_id: Some(f.area.clone()), ..Default::default() };
        let history = audit_history(&f.store, &caller, &params).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["totalScore"], json!(4.0));
        assert!(history[0].get("scores").is_none());
        assert_eq!(history[0]["area"]["title"], json!("Kitchen"));
    }

    #[tokio::test]
    async fn deactivated_audits_stay_listed_unless_status_is_asked_for() {
        let f = fixture();
        let caller = Caller::new(f.owner, Role::User);
        f.store.seed(
            Collection::Audits,
            json!({"area": f.area, "scores": [], "status": 0, "created_by": f.owner.to_string()}),
        );

        let all = list_audits(&f.store, &caller, &ListParams::default(), today()).await.unwrap();
        assert_eq!(all.len(), 3);

        let params = ListParams { area_id: Some(f.area.clone()), ..Default::default() };
        assert_eq!(audit_history(&f.store, &caller, &params).await.unwrap().len(), 3);

        let active = ListParams { status: Some("1".into()), ..Default::default() };
        assert_eq!(list_audits(&f.store, &caller, &active, today()).await.unwrap().len(), 2);
    }
}
