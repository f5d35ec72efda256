use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use regex::RegexBuilder;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::database::{Collection, DatabaseError, Document, DocumentStore, FindOptions};
use crate::filter::{FilterError, SortDirection};

/// In-process [`DocumentStore`] evaluating the same filter expressions the
/// Postgres store compiles, including the column checks.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<Document>>>,
    calls: AtomicUsize,
    offline: Mutex<HashSet<Collection>>,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `doc` as-is, filling `id` and timestamps when absent.
    pub fn seed(&self, collection: Collection, doc: Value) -> Document {
        let mut doc = doc.as_object().cloned().unwrap_or_default();
        doc.entry("id").or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        doc.entry("createdAt").or_insert_with(|| Value::String(now()));
        doc.entry("updatedAt").or_insert_with(|| Value::String(now()));
        self.collections.lock().unwrap().entry(collection).or_default().push(doc.clone());
        doc
    }

    pub fn all(&self, collection: Collection) -> Vec<Document> {
        self.collections.lock().unwrap().get(&collection).cloned().unwrap_or_default()
    }

    /// Number of store operations served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Makes every later operation on `collection` fail as if the pool
    /// timed out.
    pub fn take_offline(&self, collection: Collection) {
        self.offline.lock().unwrap().insert(collection);
    }

    fn touch(&self, collection: Collection) -> Result<(), DatabaseError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if self.offline.lock().unwrap().contains(&collection) {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn check_columns(collection: Collection, doc: &Document) -> Result<(), DatabaseError> {
        for key in doc.keys() {
            if collection.column(key).is_none() {
                return Err(DatabaseError::UnknownField { collection: collection.table(), field: key.clone() });
            }
        }
        Ok(())
    }
}

fn validate_filter(collection: Collection, filter: &Value) -> Result<(), FilterError> {
    let Some(obj) = filter.as_object() else {
        return Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string()));
    };
    for (key, value) in obj {
        match key.as_str() {
            "$and" | "$or" => {
                for clause in value.as_array().into_iter().flatten() {
                    validate_filter(collection, clause)?;
                }
            }
            "$not" => validate_filter(collection, value)?,
            op if op.starts_with('$') => return Err(FilterError::UnsupportedOperator(op.to_string())),
            field if collection.column(field).is_none() => {
                return Err(FilterError::InvalidColumn(field.to_string()))
            }
            _ => {}
        }
    }
    Ok(())
}

pub fn matches(doc: &Document, filter: &Value) -> bool {
    let Some(obj) = filter.as_object() else { return false };
    obj.iter().all(|(key, cond)| match key.as_str() {
        "$and" => cond.as_array().map_or(false, |c| c.iter().all(|f| matches(doc, f))),
        "$or" => cond.as_array().map_or(false, |c| c.iter().any(|f| matches(doc, f))),
        "$not" => !matches(doc, cond),
        field => field_matches(doc.get(field), cond),
    })
}

fn field_matches(actual: Option<&Value>, cond: &Value) -> bool {
    match cond {
        Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) => ops.iter().all(|(op, expected)| match op.as_str() {
            "$eq" => equals(actual, expected),
            "$ne" => !equals(actual, expected),
            "$gt" => compare(actual, expected) == Some(Ordering::Greater),
            "$gte" => matches!(compare(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
            "$lt" => compare(actual, expected) == Some(Ordering::Less),
            "$lte" => matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal)),
            "$in" => expected.as_array().map_or(false, |vs| vs.iter().any(|v| equals(actual, v))),
            "$nin" => expected.as_array().map_or(true, |vs| !vs.iter().any(|v| equals(actual, v))),
            "$regex" => regex_matches(actual, expected, ops.get("$options")),
            "$options" => true,
            _ => false,
        }),
        expected => equals(actual, expected),
    }
}

fn equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None | Some(Value::Null) => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.iter().any(|item| loose_eq(item, expected)),
        Some(value) => loose_eq(value, expected),
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (a, b) {
            (Value::Bool(x), Value::String(s)) | (Value::String(s), Value::Bool(x)) => s == &x.to_string(),
            _ => false,
        },
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn compare(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    match (actual?, expected) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (a, b) => as_number(a)?.partial_cmp(&as_number(b)?),
    }
}

fn regex_matches(actual: Option<&Value>, pattern: &Value, options: Option<&Value>) -> bool {
    let (Some(actual), Some(pattern)) = (actual, pattern.as_str()) else { return false };
    let text = match actual {
        Value::String(s) => s.clone(),
        Value::Null => return false,
        other => other.to_string(),
    };
    let case_insensitive = options.and_then(Value::as_str).map_or(false, |o| o.contains('i'));
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map(|re| re.is_match(&text))
        .unwrap_or(false)
}

fn sort_key_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(x), Some(y)) => compare(Some(x), y).unwrap_or(Ordering::Equal),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn count(&self, collection: Collection, filter: &Value) -> Result<u64, DatabaseError> {
        self.touch(collection)?;
        validate_filter(collection, filter)?;
        Ok(self.all(collection).iter().filter(|d| matches(d, filter)).count() as u64)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Value,
        options: FindOptions,
    ) -> Result<Vec<Document>, DatabaseError> {
        self.touch(collection)?;
        validate_filter(collection, filter)?;
        let mut docs: Vec<Document> = self.all(collection).into_iter().filter(|d| matches(d, filter)).collect();
        if let Some(sort) = options.sort.filter(|s| collection.column(&s.field).is_some()) {
            docs.sort_by(|a, b| {
                let ord = sort_key_cmp(a.get(&sort.field), b.get(&sort.field));
                if sort.direction == SortDirection::Desc { ord.reverse() } else { ord }
            });
        }
        let skip = options.skip.unwrap_or(0) as usize;
        let limit = options.limit.map_or(usize::MAX, |l| l as usize);
        Ok(docs.into_iter().skip(skip).take(limit).collect())
    }

    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, DatabaseError> {
        self.touch(collection)?;
        Self::check_columns(collection, &doc)?;
        Ok(self.seed(collection, Value::Object(doc)))
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: Uuid,
        changes: Document,
    ) -> Result<Option<Document>, DatabaseError> {
        self.touch(collection)?;
        Self::check_columns(collection, &changes)?;
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection).or_default();
        let id = id.to_string();
        let Some(doc) = docs.iter_mut().find(|d| d.get("id").and_then(Value::as_str) == Some(id.as_str())) else {
            return Ok(None);
        };
        for (key, value) in changes {
            if !Collection::is_managed(&key) {
                doc.insert(key, value);
            }
        }
        doc.insert("updatedAt".to_string(), Value::String(now()));
        Ok(Some(doc.clone()))
    }

    async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, DatabaseError> {
        self.touch(collection)?;
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection).or_default();
        let id = id.to_string();
        let position = docs.iter().position(|d| d.get("id").and_then(Value::as_str) == Some(id.as_str()));
        Ok(position.map(|i| docs.remove(i)))
    }

    async fn delete_where(&self, collection: Collection, filter: &Value) -> Result<u64, DatabaseError> {
        self.touch(collection)?;
        validate_filter(collection, filter)?;
        if filter.as_object().map_or(true, |f| f.is_empty()) {
            return Err(FilterError::InvalidWhereClause("delete requires a condition".to_string()).into());
        }
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection).or_default();
        let before = docs.len();
        docs.retain(|d| !matches(d, filter));
        Ok((before - docs.len()) as u64)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn doc(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn evaluates_document_filters() {
        let area = doc(json!({"title": "Main Kitchen", "status": 1, "created_by": "u1", "assigned": ["u2"]}));
        assert!(matches(&area, &json!({"$and": [
            {"$or": [{"title": {"$regex": ".*kitchen.*", "$options": "i"}}, {"description": {"$regex": "x"}}]},
            {"status": {"$in": [0, 1]}},
            {"created_by": "u1"}
        ]})));
        assert!(!matches(&area, &json!({"title": {"$regex": ".*kitchen.*"}})));
        assert!(matches(&area, &json!({"status": "1"})));
        assert!(matches(&area, &json!({"assigned": "u2"})));
        assert!(!matches(&area, &json!({"description": "x"})));
        assert!(matches(&area, &json!({"description": null})));
    }
}
