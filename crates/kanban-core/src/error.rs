use thiserror::Error;

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("initiative not found: {0}")]
    InitiativeNotFound(String),

    #[error("swimlane not found: {0}")]
    SwimlaneNotFound(String),

    #[error("swimlane already exists: {0}")]
    SwimlaneExists(String),

    #[error("swimlane '{lane}' still holds {count} task(s)")]
    SwimlaneNotEmpty { lane: String, count: usize },

    #[error("project has no swimlanes: {0}")]
    NoSwimlanes(String),

    #[error("invalid id '{0}': must be lowercase alphanumeric with '-' or '_'")]
    InvalidId(String),

    #[error("invalid priority '{0}': expected P0, P1, P2 or P3")]
    InvalidPriority(String),

    #[error("invalid initiative status '{0}': expected planning, active, completed or archived")]
    InvalidInitiativeStatus(String),

    #[error("invalid artifact kind '{0}': expected file, url or doc")]
    InvalidArtifactKind(String),

    #[error("invalid date range: end {end} is before start {start}")]
    InvalidDateRange { start: String, end: String },

    #[error("task {0} cannot depend on itself")]
    SelfDependency(String),

    #[error("dependency {task} -> {depends_on} would create a cycle")]
    DependencyCycle { task: String, depends_on: String },

    #[error("metadata must be a JSON object")]
    InvalidMetadata,

    #[error("invalid config.yaml: {0}")]
    InvalidConfig(String),

    #[error("search error: {0}")]
    Search(String),

    #[error("home directory not found: set HOME or WICKED_KANBAN_DATA_DIR")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl KanbanError {
    /// True for the "addressed entity does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            KanbanError::ProjectNotFound(_)
                | KanbanError::TaskNotFound(_)
                | KanbanError::InitiativeNotFound(_)
                | KanbanError::SwimlaneNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, KanbanError>;
