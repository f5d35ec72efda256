/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Kinds of entries written to the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    NewArea,
    UpdateArea,
    DeleteArea,
    NewAudit,
    UpdateAudit,
    DeleteAudit,
    NewLocation,
    NewTask,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::NewArea => "NEW_AREA",
            ActivityKind::UpdateArea => "UPDATE_AREA",
            ActivityKind::DeleteArea => "DELETE_AREA",
            ActivityKind::NewAudit => "NEW_AUDIT",
            ActivityKind::UpdateAudit => "UPDATE_AUDIT",
            ActivityKind::DeleteAudit => "DELETE_AUDIT",
            ActivityKind::NewLocation => "NEW_LOCATION",
            ActivityKind::NewTask => "NEW_TASK",
        }
    }

    /// Message key stored as the entry description.
    pub fn description(&self) -> &'static str {
        match self {
            ActivityKind::NewArea => "activity.area.created",
            ActivityKind::UpdateArea => "activity.area.updated",
            ActivityKind::DeleteArea => "activity.area.deleted",
            ActivityKind::NewAudit => "activity.audit.created",
            ActivityKind::UpdateAudit => "activity.audit.updated",
            ActivityKind::DeleteAudit => "activity.audit.deleted",
            ActivityKind::NewLocation => "activity.location.created",
            ActivityKind::NewTask => "activity.task.created",
        }
    }
}
