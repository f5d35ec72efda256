use super::builder::{ListSpec, StatusFilter, SCOPE_MEMBERS, SCOPE_NONE, SCOPE_USERS};
use crate::database::Collection;

pub const ACTIVITY: ListSpec = ListSpec {
    collection: Collection::Activities,
    search_fields: &["title", "description"],
    status: StatusFilter::Absent,
    owner_roles: SCOPE_MEMBERS,
    user_override: false,
};

pub const AREA: ListSpec = ListSpec {
    collection: Collection::Areas,
    search_fields: &["title", "description"],
    status: StatusFilter::ActiveByDefault,
    owner_roles: SCOPE_MEMBERS,
    user_override: true,
};

pub const AUDIT: ListSpec = ListSpec {
    collection: Collection::Audits,
    search_fields: &[],
    status: StatusFilter::OnRequest,
    owner_roles: SCOPE_MEMBERS,
    user_override: true,
};

pub const CATEGORY: ListSpec = ListSpec {
    collection: Collection::Categories,
    search_fields: &["name", "description"],
    status: StatusFilter::ActiveByDefault,
    owner_roles: SCOPE_MEMBERS,
    user_override: false,
};

pub const CHECKLIST: ListSpec = ListSpec {
    collection: Collection::Checklists,
    search_fields: &["name", "code"],
    status: StatusFilter::OnRequest,
    owner_roles: SCOPE_USERS,
    user_override: false,
};

pub const LOCATION: ListSpec = ListSpec {
    collection: Collection::Locations,
    search_fields: &["name", "description"],
    status: StatusFilter::ActiveByDefault,
    owner_roles: SCOPE_MEMBERS,
    user_override: false,
};

pub const TASK: ListSpec = ListSpec {
    collection: Collection::Tasks,
    search_fields: &["task", "description"],
    status: StatusFilter::ActiveByDefault,
    owner_roles: SCOPE_MEMBERS,
    user_override: true,
};

pub const USER: ListSpec = ListSpec {
    collection: Collection::Users,
    search_fields: &["first_name", "last_name", "email", "username"],
    status: StatusFilter::Absent,
    owner_roles: SCOPE_NONE,
    user_override: false,
};
