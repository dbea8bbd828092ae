use crate::error::{KanbanError, Result};
use crate::io;
use crate::paths;
use crate::types::InitiativeStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Initiative {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    pub status: InitiativeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Initiative {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: paths::new_id(),
            name: name.into(),
            goal: None,
            status: InitiativeStatus::Planning,
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// An end date may not precede the start date.
    pub fn check_dates(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(KanbanError::InvalidDateRange {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn load(root: &Path, project_id: &str, id: &str) -> Result<Self> {
        paths::validate_id(id)?;
        io::read_json(&paths::initiative_file(root, project_id, id))?
            .ok_or_else(|| KanbanError::InitiativeNotFound(id.to_string()))
    }

    pub fn save(&self, root: &Path, project_id: &str) -> Result<()> {
        io::write_json(&paths::initiative_file(root, project_id, &self.id), self)
    }

    pub fn remove(root: &Path, project_id: &str, id: &str) -> Result<bool> {
        paths::validate_id(id)?;
        match std::fs::remove_file(paths::initiative_file(root, project_id, id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list(root: &Path, project_id: &str) -> Result<Vec<Self>> {
        let dir = paths::initiatives_dir(root, project_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut initiatives = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match io::read_json::<Initiative>(&path) {
                Ok(Some(i)) => initiatives.push(i),
                Ok(None) => {}
                Err(KanbanError::Json(e)) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable initiative"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        initiatives.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(initiatives)
    }
}
