use serde::Deserialize;

/// Query-string parameters accepted by list, history and report endpoints.
///
/// Everything arrives as raw text: absent and empty values are the same
/// thing, and numeric interpretation happens where each value is used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub priority: Option<String>,
    pub area: Option<String>,
    pub area_id: Option<String>,
    pub location: Option<String>,
    pub range: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub archived: Option<String>,
    pub standard: Option<String>,
    #[serde(rename = "is_short")]
    pub is_short: Option<String>,
    pub role: Option<String>,
    pub verified: Option<String>,
    pub issues: Option<String>,
    pub checklist: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Trimmed value, or `None` when absent or blank.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Accepts `true`/`false` as well as numeric flags (`0` is false).
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        other => other.parse::<i64>().ok().map(|n| n != 0),
    }
}

impl ListParams {
    pub fn search(&self) -> Option<&str> {
        present(&self.search)
    }

    pub fn status(&self) -> Option<&str> {
        present(&self.status)
    }

    pub fn user_id(&self) -> Option<&str> {
        present(&self.user_id)
    }
}
