use crate::filter::{find_column, Column, ColumnType};

use ColumnType::*;

/// Storage collections. Each maps to one table in `sql/schema.sql`; the
/// column lists below are the only field names filters and writes accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Activities,
    Areas,
    Audits,
    Categories,
    Checklists,
    Locations,
    Questions,
    Scores,
    Tasks,
    Users,
}

const ACTIVITIES: &[Column] = &[
    Column::new("id", Uuid),
    Column::new("objectId", Text),
    Column::new("title", Text),
    Column::new("type", Text),
    Column::new("description", Text),
    Column::new("created_by", Uuid),
    Column::new("createdAt", Timestamp),
    Column::new("updatedAt", Timestamp),
];

const AREAS: &[Column] = &[
    Column::new("id", Uuid),
    Column::new("title", Text),
    Column::new("type", Text),
    Column::new("location", Uuid),
    Column::new("description", Text),
    Column::new("image", Text),
    Column::new("status", Integer),
    Column::new("created_by", Uuid),
    Column::new("createdAt", Timestamp),
    Column::new("updatedAt", Timestamp),
];

const AUDITS: &[Column] = &[
    Column::new("id", Uuid),
    Column::new("area", Uuid),
    Column::new("checklist", Uuid),
    Column::new("scores", UuidArray),
    Column::new("status", Integer),
    Column::new("created_by", Uuid),
    Column::new("createdAt", Timestamp),
    Column::new("updatedAt", Timestamp),
];

const CATEGORIES: &[Column] = &[
    Column::new("id", Uuid),
    Column::new("name", Text),
    Column::new("priority", Integer),
    Column::new("description", Text),
    Column::new("status", Integer),
    Column::new("created_by", Uuid),
    Column::new("createdAt", Timestamp),
    Column::new("updatedAt", Timestamp),
];

const CHECKLISTS: &[Column] = &[
    Column::new("id", Uuid),
    Column::new("code", Text),
    Column::new("language", Text),
    Column::new("name", Text),
    Column::new("is_public", Boolean),
    Column::new("is_short", Boolean),
    Column::new("standard", Text),
    Column::new("version", Text),
    Column::new("type", Text),
    Column::new("status", Integer),
    Column::new("created_by", Uuid),
    Column::new("createdAt", Timestamp),
    Column::new("updatedAt", Timestamp),
];

const LOCATIONS: &[Column] = &[
    Column::new("id", Uuid),
    Column::new("name", Text),
    Column::new("description", Text),
    Column::new("status", Integer),
    Column::new("created_by", Uuid),
    Column::new("createdAt", Timestamp),
    Column::new("updatedAt", Timestamp),
];

const QUESTIONS: &[Column] = &[
    Column::new("id", Uuid),
    Column::new("category", Uuid),
    Column::new("checklist", Uuid),
    Column::new("example", Text),
    Column::new("language", Text),
    Column::new("max_points", Float),
    Column::new("order", Integer),
    Column::new("question", Text),
    Column::new("status", Integer),
    Column::new("created_by", Uuid),
    Column::new("createdAt", Timestamp),
    Column::new("updatedAt", Timestamp),
];

const SCORES: &[Column] = &[
    Column::new("id", Uuid),
    Column::new("question", Uuid),
    Column::new("score", Float),
    Column::new("image", Text),
    Column::new("comment", Text),
    Column::new("has_deviation", Boolean),
    Column::new("createdAt", Timestamp),
    Column::new("updatedAt", Timestamp),
];

const TASKS: &[Column] = &[
    Column::new("id", Uuid),
    Column::new("archived", Boolean),
    Column::new("area", Uuid),
    Column::new("assigned", UuidArray),
    Column::new("audit", Uuid),
    Column::new("created_by", Uuid),
    Column::new("description", Text),
    Column::new("due_date", Timestamp),
    Column::new("image", Text),
    Column::new("location", Uuid),
    Column::new("priority", Text),
    Column::new("status", Integer),
    Column::new("task_status", Text),
    Column::new("task", Text),
    Column::new("createdAt", Timestamp),
    Column::new("updatedAt", Timestamp),
];

const USERS: &[Column] = &[
    Column::new("id", Uuid),
    Column::new("email", Text),
    Column::new("username", Text),
    Column::new("first_name", Text),
    Column::new("last_name", Text),
    Column::new("image_url", Text),
    Column::new("language", Text),
    Column::new("role", Integer),
    Column::new("status", Integer),
    Column::new("verified", Boolean),
    Column::new("issues", Boolean),
    Column::new("tester", Boolean),
    Column::new("subscribed", Boolean),
    Column::new("target_score", Float),
    Column::new("createdAt", Timestamp),
    Column::new("updatedAt", Timestamp),
];

impl Collection {
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Activities => "activities",
            Collection::Areas => "areas",
            Collection::Audits => "audits",
            Collection::Categories => "categories",
            Collection::Checklists => "checklists",
            Collection::Locations => "locations",
            Collection::Questions => "questions",
            Collection::Scores => "scores",
            Collection::Tasks => "tasks",
            Collection::Users => "users",
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        match self {
            Collection::Activities => ACTIVITIES,
            Collection::Areas => AREAS,
            Collection::Audits => AUDITS,
            Collection::Categories => CATEGORIES,
            Collection::Checklists => CHECKLISTS,
            Collection::Locations => LOCATIONS,
            Collection::Questions => QUESTIONS,
            Collection::Scores => SCORES,
            Collection::Tasks => TASKS,
            Collection::Users => USERS,
        }
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        find_column(self.columns(), name)
    }

    /// Columns maintained by storage; writes silently skip them.
    pub fn is_managed(name: &str) -> bool {
        matches!(name, "id" | "createdAt" | "updatedAt")
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}
