use crate::filter::{SortDirection, SortSpec};

pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Explicit `sort` keys are ascending only when `order` is exactly `asc`;
/// without a key, newest records come first. Keys are not checked here.
pub fn resolve_sort(sort: Option<&str>, order: Option<&str>) -> SortSpec {
    match sort {
        Some(field) => {
            let direction = if order == Some("asc") { SortDirection::Asc } else { SortDirection::Desc };
            SortSpec::new(field, direction)
        }
        None => SortSpec::descending(DEFAULT_SORT_FIELD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_newest_first() {
        assert_eq!(resolve_sort(None, None), SortSpec::descending("createdAt"));
        assert_eq!(resolve_sort(None, Some("asc")), SortSpec::descending("createdAt"));
    }

    #[test]
    fn explicit_key_descends_unless_asc() {
        assert_eq!(resolve_sort(Some("title"), Some("asc")), SortSpec::ascending("title"));
        assert_eq!(resolve_sort(Some("title"), Some("desc")), SortSpec::descending("title"));
        assert_eq!(resolve_sort(Some("title"), None), SortSpec::descending("title"));
        assert_eq!(resolve_sort(Some("title"), Some("ASC")), SortSpec::descending("title"));
    }
}
