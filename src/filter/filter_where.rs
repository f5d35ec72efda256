use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{find_column, Column, ColumnType, FilterOp, SqlResult};

/// Compiles a document-style predicate (`{"$and": [{"status": 1}, ...]}`)
/// into a parameterized Postgres WHERE clause.
///
/// Field names are resolved against `columns`; an unknown field is an error.
/// Every bound parameter is cast to the type of the column it is compared with,
/// so string inputs such as `"1"` or a UUID are coerced by Postgres.
pub struct FilterWhere<'a> {
    columns: &'a [Column],
    param_values: Vec<Value>,
}

impl<'a> FilterWhere<'a> {
    pub fn new(columns: &'a [Column]) -> Self {
        Self { columns, param_values: vec![] }
    }

    /// Returns an empty query string when the predicate places no constraint.
    pub fn generate(where_data: &Value, columns: &'a [Column]) -> Result<SqlResult, FilterError> {
        let mut filter_where = Self::new(columns);
        let query = match where_data {
            Value::Null => String::new(),
            Value::Object(obj) => filter_where.build_object(obj)?.unwrap_or_default(),
            _ => return Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        };
        Ok(SqlResult { query, params: filter_where.param_values })
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build_object(&mut self, obj: &Map<String, Value>) -> Result<Option<String>, FilterError> {
        let mut parts = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                parts.push(self.build_logical(key, value)?);
            } else {
                parts.extend(self.build_field(key, value)?);
            }
        }
        Ok(match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(parts.join(" AND ")),
        })
    }

    fn build_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    // Vacuous conjunction holds, vacuous disjunction never does
                    return Ok(if op == "$and" { "TRUE" } else { "FALSE" }.to_string());
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for clause in arr {
                    let obj = clause
                        .as_object()
                        .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} entries must be objects", op)))?;
                    let sql = self.build_object(obj)?.unwrap_or_else(|| "TRUE".to_string());
                    sql_parts.push(format!("({})", sql));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => {
                let obj = value
                    .as_object()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$not requires object".to_string()))?;
                let sql = self.build_object(obj)?.unwrap_or_else(|| "TRUE".to_string());
                Ok(format!("NOT ({})", sql))
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn build_field(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        let column = *find_column(self.columns, field)
            .ok_or_else(|| FilterError::InvalidColumn(field.to_string()))?;

        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) => {
                let mut out = Vec::new();
                for (op_key, op_val) in obj {
                    if op_key == "$options" {
                        // consumed alongside $regex
                        continue;
                    }
                    let operator = FilterOp::parse(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    out.push(self.build_condition(&column, operator, op_val, obj.get("$options"))?);
                }
                Ok(out)
            }
            Value::Object(_) => Err(FilterError::InvalidOperatorData(format!(
                "nested documents are not comparable on {}",
                field
            ))),
            _ => Ok(vec![self.build_condition(&column, FilterOp::Eq, value, None)?]),
        }
    }

    fn build_condition(
        &mut self,
        column: &Column,
        operator: FilterOp,
        data: &Value,
        options: Option<&Value>,
    ) -> Result<String, FilterError> {
        let quoted = column.quoted();
        match operator {
            FilterOp::Eq => {
                if data.is_null() {
                    return Ok(format!("{} IS NULL", quoted));
                }
                match (column.kind.element(), data) {
                    (Some(element), value) if !value.is_array() => {
                        Ok(format!("{} = ANY({})", self.param(value.clone(), element), quoted))
                    }
                    _ => Ok(format!("{} = {}", quoted, self.param(data.clone(), column.kind))),
                }
            }
            FilterOp::Ne => {
                if data.is_null() {
                    Ok(format!("{} IS NOT NULL", quoted))
                } else {
                    Ok(format!("{} IS DISTINCT FROM {}", quoted, self.param(data.clone(), column.kind)))
                }
            }
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                let token = operator.comparison().unwrap_or("=");
                Ok(format!("{} {} {}", quoted, token, self.param(data.clone(), column.kind)))
            }
            FilterOp::In | FilterOp::NIn => {
                let values = data
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$in/$nin require array".to_string()))?;
                let negate = operator == FilterOp::NIn;
                if values.is_empty() {
                    return Ok(if negate { "TRUE" } else { "FALSE" }.to_string());
                }
                let kind = column.kind.element().unwrap_or(column.kind);
                let params: Vec<String> = values.iter().map(|v| self.param(v.clone(), kind)).collect();
                let sql = if column.kind.element().is_some() {
                    format!("{} && ARRAY[{}]", quoted, params.join(", "))
                } else {
                    format!("{} IN ({})", quoted, params.join(", "))
                };
                Ok(if negate { format!("NOT ({})", sql) } else { sql })
            }
            FilterOp::Regex => {
                let pattern = data
                    .as_str()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$regex requires string".to_string()))?;
                let case_insensitive = options
                    .and_then(Value::as_str)
                    .map(|o| o.contains('i'))
                    .unwrap_or(false);
                let token = if case_insensitive { "~*" } else { "~" };
                Ok(format!(
                    "{}::text {} {}",
                    quoted,
                    token,
                    self.param(Value::String(pattern.to_string()), ColumnType::Text)
                ))
            }
        }
    }

    fn param(&mut self, value: Value, kind: ColumnType) -> String {
        self.param_values.push(value);
        format!("${}::{}", self.param_values.len(), kind.cast())
    }
}
