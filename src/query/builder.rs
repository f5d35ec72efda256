use chrono::{Datelike, Months, NaiveDate};
use serde_json::{json, Value};

use super::params::{parse_flag, ListParams};
use crate::auth::{Caller, Role};
use crate::database::Collection;

/// Both member roles only reach their own records.
pub const SCOPE_MEMBERS: &[Role] = &[Role::Admin, Role::User];
/// Regular users are scoped, admins see everyone's records.
pub const SCOPE_USERS: &[Role] = &[Role::User];
pub const SCOPE_NONE: &[Role] = &[];

/// How the `status` parameter narrows a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// The entity has no status field.
    Absent,
    /// Active records unless `status` asks for something else.
    ActiveByDefault,
    /// Only when `status` is supplied.
    OnRequest,
}

/// How an entity's list endpoints translate query parameters into a filter.
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    pub collection: Collection,
    /// Text fields ORed together by `search`, in match order.
    pub search_fields: &'static [&'static str],
    pub status: StatusFilter,
    /// Caller roles that only see their own records.
    pub owner_roles: &'static [Role],
    /// Whether an explicit `userId` parameter replaces the caller in the
    /// ownership clause.
    pub user_override: bool,
}

/// Accumulates AND-ed clauses into a document-style filter expression.
///
/// Building is pure: nothing here touches storage, and absent or malformed
/// optional parameters simply contribute no clause.
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    clauses: Vec<Value>,
}

/// `all` matches both active and inactive records, absent means active only,
/// and anything else is compared verbatim (numeric text as a number).
pub fn status_clause(raw: Option<&str>) -> Value {
    match raw {
        None => json!({ "status": 1 }),
        Some("all") => json!({ "status": { "$in": [0, 1] } }),
        Some(value) => match value.parse::<i64>() {
            Ok(n) => json!({ "status": n }),
            Err(_) => json!({ "status": value }),
        },
    }
}

/// Case-insensitive substring pattern; the term is matched literally.
pub fn contains_pattern(term: &str) -> String {
    format!(".*{}.*", regex::escape(term))
}

/// `YYYY-MM-DD` prefix of a date or timestamp string.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Midnight UTC of `date` as an RFC 3339 timestamp.
pub fn day_start(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00Z").to_string()
}

/// First day of the month `months` before the month containing `today`.
pub fn months_back_start(today: NaiveDate, months: u32) -> Option<NaiveDate> {
    today.with_day(1)?.checked_sub_months(Months::new(months))
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search, status and ownership clauses shared by every list endpoint.
    pub fn for_list(spec: &ListSpec, params: &ListParams, caller: &Caller) -> Self {
        let mut builder = Self::new();
        if let Some(term) = params.search() {
            builder = builder.search(spec.search_fields, term);
        }
        match (spec.status, params.status()) {
            (StatusFilter::Absent, _) | (StatusFilter::OnRequest, None) => {}
            (_, status) => builder = builder.push(status_clause(status)),
        }
        let explicit = if spec.user_override { params.user_id() } else { None };
        builder.owner(spec.owner_roles, caller, explicit)
    }

    pub fn push(mut self, clause: Value) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn search(self, fields: &[&str], term: &str) -> Self {
        if fields.is_empty() {
            return self;
        }
        let pattern = contains_pattern(term);
        let alternatives: Vec<Value> = fields
            .iter()
            .map(|field| json!({ *field: { "$regex": pattern, "$options": "i" } }))
            .collect();
        self.push(json!({ "$or": alternatives }))
    }

    /// `created_by` clause for callers whose role is in `roles`.
    pub fn owner(self, roles: &[Role], caller: &Caller, explicit: Option<&str>) -> Self {
        if !roles.contains(&caller.role) {
            return self;
        }
        match explicit.map(str::to_string).or_else(|| caller.id_string()) {
            Some(owner) => self.push(json!({ "created_by": owner })),
            None => self,
        }
    }

    pub fn eq(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.push(json!({ field: value })),
            None => self,
        }
    }

    pub fn contains(self, field: &str, term: Option<&str>) -> Self {
        match term {
            Some(term) => self.push(json!({ field: { "$regex": contains_pattern(term), "$options": "i" } })),
            None => self,
        }
    }

    pub fn one_of(self, field: &str, values: Vec<Value>) -> Self {
        self.push(json!({ field: { "$in": values } }))
    }

    /// Boolean flag; `all` and unparseable values add no clause.
    pub fn flag(self, field: &str, raw: Option<&str>) -> Self {
        match raw.filter(|v| *v != "all").and_then(parse_flag) {
            Some(flag) => self.push(json!({ field: flag })),
            None => self,
        }
    }

    /// `createdAt >=` the first day of the month `range` months back.
    pub fn created_since_months(self, range: Option<&str>, today: NaiveDate) -> Self {
        let start = range
            .and_then(|r| r.parse::<u32>().ok())
            .and_then(|months| months_back_start(today, months));
        match start {
            Some(start) => self.push(json!({ "createdAt": { "$gte": day_start(start) } })),
            None => self,
        }
    }

    /// Whole days from `from` through `to`, both inclusive. Applied only when
    /// both bounds parse.
    pub fn created_between(self, from: Option<&str>, to: Option<&str>) -> Self {
        let from = from.and_then(parse_day);
        let until = to.and_then(parse_day).and_then(|d| d.succ_opt());
        match (from, until) {
            (Some(from), Some(until)) => self.push(json!({
                "createdAt": { "$gte": day_start(from), "$lt": day_start(until) }
            })),
            _ => self,
        }
    }

    pub fn build(self) -> Value {
        if self.clauses.is_empty() {
            json!({})
        } else {
            json!({ "$and": self.clauses })
        }
    }
}
