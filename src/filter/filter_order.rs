use super::types::{find_column, Column, SortSpec};

pub struct FilterOrder;

impl FilterOrder {
    /// Builds the ORDER BY clause. A sort key that is not a column of the
    /// collection is dropped and the storage default order applies.
    pub fn generate(sort: Option<&SortSpec>, columns: &[Column], debug_logging: bool) -> String {
        let Some(sort) = sort else { return String::new() };
        match find_column(columns, &sort.field) {
            Some(column) => format!("ORDER BY {} {}", column.quoted(), sort.direction.to_sql()),
            None => {
                if debug_logging {
                    tracing::debug!("Ignoring sort on unknown field '{}'", sort.field);
                }
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::ColumnType;

    const COLUMNS: &[Column] = &[
        Column::new("createdAt", ColumnType::Timestamp),
        Column::new("title", ColumnType::Text),
    ];

    #[test]
    fn orders_known_columns() {
        let sql = FilterOrder::generate(Some(&SortSpec::descending("createdAt")), COLUMNS, false);
        assert_eq!(sql, "ORDER BY \"createdAt\" DESC");
        let sql = FilterOrder::generate(Some(&SortSpec::ascending("title")), COLUMNS, false);
        assert_eq!(sql, "ORDER BY \"title\" ASC");
    }

    #[test]
    fn unknown_sort_key_is_dropped() {
        assert!(FilterOrder::generate(Some(&SortSpec::ascending("bogus")), COLUMNS, true).is_empty());
        assert!(FilterOrder::generate(None, COLUMNS, false).is_empty());
    }
}
