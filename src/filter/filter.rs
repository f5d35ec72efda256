use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Column, SortSpec, SqlResult};

/// A compiled find against one collection table. Rows are returned as a
/// single JSON column named `doc`.
pub struct Filter {
    table_name: String,
    columns: &'static [Column],
    where_data: Option<Value>,
    order: Option<SortSpec>,
    limit: Option<u64>,
    offset: Option<u64>,
    debug_logging: bool,
}

impl Filter {
    pub fn new(table_name: impl Into<String>, columns: &'static [Column]) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            columns,
            where_data: None,
            order: None,
            limit: None,
            offset: None,
            debug_logging: false,
        })
    }

    pub fn debug_logging(&mut self, enabled: bool) -> &mut Self {
        self.debug_logging = enabled;
        self
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, sort: Option<SortSpec>) -> &mut Self {
        self.order = sort;
        self
    }

    pub fn limit(&mut self, limit: Option<u64>, offset: Option<u64>) -> &mut Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(self.order.as_ref(), self.columns, self.debug_logging);
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT row_to_json(t) AS doc".to_string(),
            format!("FROM \"{}\" AS t", self.table_name),
            if where_result.query.is_empty() { String::new() } else { format!("WHERE {}", where_result.query) },
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        if self.debug_logging {
            tracing::debug!("Generated SQL: {}", query);
        }

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        match self.where_data {
            Some(ref where_data) => FilterWhere::generate(where_data, self.columns),
            None => Ok(SqlResult { query: String::new(), params: vec![] }),
        }
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\" AS t", self.table_name)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" AS t WHERE {}", self.table_name, where_result.query)
        };
        Ok(SqlResult { query, params: where_result.params })
    }

    /// Bulk delete over the WHERE clause. An empty clause is refused so a
    /// missing predicate never wipes the table.
    pub fn to_delete_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        if where_result.query.is_empty() {
            return Err(FilterError::InvalidWhereClause("delete requires a condition".to_string()));
        }
        let query = format!("DELETE FROM \"{}\" AS t WHERE {}", self.table_name, where_result.query);
        Ok(SqlResult { query, params: where_result.params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
