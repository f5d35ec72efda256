use serde::Serialize;
use serde_json::{json, Value};

use crate::database::{Collection, Document, DocumentStore, FindOptions};
use crate::filter::SortSpec;
use crate::query::{FilterBuilder, QueryError};

pub const CHECKLIST_MISSING: &str = "common.list.all.not.exist";

/// One category of a checklist with its questions in checklist order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    #[serde(rename = "categoryID")]
    pub category_id: String,
    pub category_name: String,
    pub category_description: Option<String>,
    pub priority: Option<i64>,
    pub questions: Vec<Document>,
}

fn text(doc: &Document, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

/// The checklist's questions grouped by category, categories by priority.
///
/// Questions without a category are left out.
pub async fn grouped_questions(store: &dyn DocumentStore, code: &str) -> Result<Vec<CategoryGroup>, QueryError> {
    let checklist_filter = FilterBuilder::new().eq("code", Some(code)).build();
    let checklist = store
        .find(Collection::Checklists, &checklist_filter, FindOptions::default().window(None, Some(1)))
        .await?
        .pop()
        .ok_or(QueryError::Required(CHECKLIST_MISSING))?;
    let checklist_id = text(&checklist, "id").unwrap_or_default();

    let question_filter = FilterBuilder::new().eq("checklist", Some(checklist_id.as_str())).build();
    let questions = store
        .find(Collection::Questions, &question_filter, FindOptions::sorted(SortSpec::ascending("order")))
        .await?;

    let mut category_ids: Vec<Value> = Vec::new();
    for question in &questions {
        if let Some(id) = question.get("category").filter(|id| id.is_string()) {
            if !category_ids.contains(id) {
                category_ids.push(id.clone());
            }
        }
    }
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }

    let category_filter = FilterBuilder::new().one_of("id", category_ids).build();
    let categories = store
        .find(Collection::Categories, &category_filter, FindOptions::sorted(SortSpec::ascending("priority")))
        .await?;

    Ok(categories
        .into_iter()
        .map(|category| {
            let id = text(&category, "id").unwrap_or_default();
            let questions = questions
                .iter()
                .filter(|q| q.get("category") == Some(&json!(id)))
                .cloned()
                .collect();
            CategoryGroup {
                category_name: text(&category, "name").unwrap_or_default(),
                category_description: text(&category, "description"),
                priority: category.get("priority").and_then(Value::as_i64),
                category_id: id,
                questions,
            }
        })
        .collect())
}
