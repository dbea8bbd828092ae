use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Task priority. `P0` is the most urgent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Priority {
    P0,
    P1,
    #[default]
    P2,
    P3,
}

impl Priority {
    pub fn all() -> &'static [Priority] {
        &[Priority::P0, Priority::P1, Priority::P2, Priority::P3]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::error::KanbanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "P0" => Ok(Priority::P0),
            "P1" => Ok(Priority::P1),
            "P2" => Ok(Priority::P2),
            "P3" => Ok(Priority::P3),
            _ => Err(crate::error::KanbanError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// InitiativeStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiativeStatus {
    Planning,
    Active,
    Completed,
    Archived,
}

impl InitiativeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InitiativeStatus::Planning => "planning",
            InitiativeStatus::Active => "active",
            InitiativeStatus::Completed => "completed",
            InitiativeStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for InitiativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InitiativeStatus {
    type Err = crate::error::KanbanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(InitiativeStatus::Planning),
            "active" => Ok(InitiativeStatus::Active),
            "completed" => Ok(InitiativeStatus::Completed),
            "archived" => Ok(InitiativeStatus::Archived),
            _ => Err(crate::error::KanbanError::InvalidInitiativeStatus(
                s.to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    File,
    Url,
    Doc,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::File => "file",
            ArtifactKind::Url => "url",
            ArtifactKind::Doc => "doc",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = crate::error::KanbanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(ArtifactKind::File),
            "url" => Ok(ArtifactKind::Url),
            "doc" => Ok(ArtifactKind::Doc),
            _ => Err(crate::error::KanbanError::InvalidArtifactKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActivityType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    ProjectCreated,
    ProjectUpdated,
    ProjectArchived,
    ProjectUnarchived,
    TaskCreated,
    TaskUpdated,
    TaskMoved,
    TaskDeleted,
    Comment,
    CommitLinked,
    ArtifactAdded,
    DependencyAdded,
    DependencyRemoved,
    InitiativeCreated,
    InitiativeUpdated,
    InitiativeDeleted,
    SwimlaneCreated,
    SwimlaneUpdated,
    SwimlaneDeleted,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::ProjectCreated => "project_created",
            ActivityType::ProjectUpdated => "project_updated",
            ActivityType::ProjectArchived => "project_archived",
            ActivityType::ProjectUnarchived => "project_unarchived",
            ActivityType::TaskCreated => "task_created",
            ActivityType::TaskUpdated => "task_updated",
            ActivityType::TaskMoved => "task_moved",
            ActivityType::TaskDeleted => "task_deleted",
            ActivityType::Comment => "comment",
            ActivityType::CommitLinked => "commit_linked",
            ActivityType::ArtifactAdded => "artifact_added",
            ActivityType::DependencyAdded => "dependency_added",
            ActivityType::DependencyRemoved => "dependency_removed",
            ActivityType::InitiativeCreated => "initiative_created",
            ActivityType::InitiativeUpdated => "initiative_updated",
            ActivityType::InitiativeDeleted => "initiative_deleted",
            ActivityType::SwimlaneCreated => "swimlane_created",
            ActivityType::SwimlaneUpdated => "swimlane_updated",
            ActivityType::SwimlaneDeleted => "swimlane_deleted",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parse_is_case_insensitive() {
        assert_eq!("p1".parse::<Priority>().unwrap(), Priority::P1);
        assert_eq!("P3".parse::<Priority>().unwrap(), Priority::P3);
        assert!("P9".parse::<Priority>().is_err());
        assert!("high".parse::<Priority>().is_err());
    }

    #[test]
    fn priority_orders_by_urgency() {
        assert!(Priority::P0 < Priority::P2);
        assert_eq!(Priority::default(), Priority::P2);
    }

    #[test]
    fn priority_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Priority::P0).unwrap(), "\"P0\"");
    }

    #[test]
    fn initiative_status_round_trip_text() {
        for s in ["planning", "active", "completed", "archived"] {
            let parsed: InitiativeStatus = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
        assert!("done".parse::<InitiativeStatus>().is_err());
    }

    #[test]
    fn activity_type_serde_matches_display() {
        let json = serde_json::to_string(&ActivityType::CommitLinked).unwrap();
        assert_eq!(json, format!("\"{}\"", ActivityType::CommitLinked));
    }
}
