use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;
use uuid::Uuid;

use super::collection::Collection;
use super::manager::DatabaseError;
use super::store::Document;
use crate::filter::SqlResult;

/// INSERT returning the stored row as `doc`.
pub fn insert_sql(collection: Collection, doc: Document) -> Result<SqlResult, DatabaseError> {
    let mut names = Vec::new();
    let mut values = Vec::new();
    let mut params = Vec::new();

    for (key, value) in doc {
        if key == "createdAt" || key == "updatedAt" {
            continue;
        }
        let column = collection
            .column(&key)
            .ok_or_else(|| DatabaseError::UnknownField { collection: collection.table(), field: key.clone() })?;
        params.push(value);
        names.push(column.quoted());
        values.push(format!("${}::{}", params.len(), column.kind.cast()));
    }

    let query = if names.is_empty() {
        format!("INSERT INTO \"{}\" AS t DEFAULT VALUES RETURNING row_to_json(t) AS doc", collection.table())
    } else {
        format!(
            "INSERT INTO \"{}\" AS t ({}) VALUES ({}) RETURNING row_to_json(t) AS doc",
            collection.table(),
            names.join(", "),
            values.join(", ")
        )
    };
    Ok(SqlResult { query, params })
}

/// UPDATE by id, touching `updatedAt`. Managed columns in `changes` are ignored.
pub fn update_sql(collection: Collection, id: Uuid, changes: Document) -> Result<SqlResult, DatabaseError> {
    let mut sets = Vec::new();
    let mut params = Vec::new();

    for (key, value) in changes {
        if Collection::is_managed(&key) {
            continue;
        }
        let column = collection
            .column(&key)
            .ok_or_else(|| DatabaseError::UnknownField { collection: collection.table(), field: key.clone() })?;
        params.push(value);
        sets.push(format!("{} = ${}::{}", column.quoted(), params.len(), column.kind.cast()));
    }
    sets.push("\"updatedAt\" = now()".to_string());

    params.push(Value::String(id.to_string()));
    let query = format!(
        "UPDATE \"{}\" AS t SET {} WHERE \"id\" = ${}::uuid RETURNING row_to_json(t) AS doc",
        collection.table(),
        sets.join(", "),
        params.len()
    );
    Ok(SqlResult { query, params })
}

pub fn delete_sql(collection: Collection, id: Uuid) -> SqlResult {
    SqlResult {
        query: format!(
            "DELETE FROM \"{}\" AS t WHERE \"id\" = $1::uuid RETURNING row_to_json(t) AS doc",
            collection.table()
        ),
        params: vec![Value::String(id.to_string())],
    }
}

pub fn bind_params<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    params: &'q [Value],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        q = bind_param_query(q, p);
    }
    q
}

fn bind_param_query<'q>(
    q: Query<'q, Postgres, PgArguments>,
    v: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        // Bound as text[]; the placeholder cast picks the element type
        Value::Array(arr) => {
            let items: Vec<String> = arr
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            q.bind(items)
        }
        Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn insert_casts_each_value() {
        let sql = insert_sql(
            Collection::Areas,
            doc(json!({"title": "Kitchen", "status": 1, "createdAt": "ignored"})),
        )
        .unwrap();
        assert_eq!(
            sql.query,
            "INSERT INTO \"areas\" AS t (\"status\", \"title\") VALUES ($1::integer, $2::text) RETURNING row_to_json(t) AS doc"
        );
        assert_eq!(sql.params, vec![json!(1), json!("Kitchen")]);
    }

    #[test]
    fn update_appends_id_param_last() {
        let id = Uuid::new_v4();
        let sql = update_sql(Collection::Areas, id, doc(json!({"status": 0, "id": "ignored"}))).unwrap();
        assert_eq!(
            sql.query,
            "UPDATE \"areas\" AS t SET \"status\" = $1::integer, \"updatedAt\" = now() WHERE \"id\" = $2::uuid RETURNING row_to_json(t) AS doc"
        );
        assert_eq!(sql.params[1], json!(id.to_string()));
    }

    #[test]
    fn rejects_fields_outside_the_collection() {
        let err = insert_sql(Collection::Locations, doc(json!({"password": "x"}))).unwrap_err();
        assert!(matches!(err, DatabaseError::UnknownField { field, .. } if field == "password"));
    }
}
