use crate::error::{KanbanError, Result};
use crate::io;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub archived: bool,
}

impl Project {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        repo_path: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            repo_path,
            created_at: now,
            updated_at: now,
            archived: false,
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn exists(root: &Path, id: &str) -> bool {
        paths::validate_id(id).is_ok() && paths::project_file(root, id).exists()
    }

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        paths::validate_id(id)?;
        io::read_json(&paths::project_file(root, id))?
            .ok_or_else(|| KanbanError::ProjectNotFound(id.to_string()))
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        io::write_json(&paths::project_file(root, &self.id), self)
    }

    /// All projects sorted by creation time. Directories without a readable
    /// `project.json` are skipped.
    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let dir = paths::projects_dir(root);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            match Self::load(root, &id) {
                Ok(p) => projects.push(p),
                Err(KanbanError::ProjectNotFound(_)) | Err(KanbanError::InvalidId(_)) => {}
                Err(KanbanError::Json(e)) => {
                    tracing::warn!(project = %id, error = %e, "skipping unreadable project");
                }
                Err(e) => return Err(e),
            }
        }
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(projects)
    }

    /// Remove the project directory and everything under it.
    /// Returns `false` if the project did not exist.
    pub fn remove(root: &Path, id: &str) -> Result<bool> {
        paths::validate_id(id)?;
        let dir = paths::project_dir(root, id);
        if !dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir)?;
        Ok(true)
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    pub fn set_archived(&mut self, archived: bool) -> bool {
        if self.archived == archived {
            return false;
        }
        self.archived = archived;
        self.updated_at = Utc::now();
        true
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_load() {
        let dir = TempDir::new().unwrap();
        let p = Project::new("p1", "Alpha", "first", Some("/src/alpha".into()));
        p.save(dir.path()).unwrap();

        let loaded = Project::load(dir.path(), "p1").unwrap();
        assert_eq!(loaded.name, "Alpha");
        assert_eq!(loaded.repo_path.as_deref(), Some("/src/alpha"));
        assert!(!loaded.archived);
    }

    #[test]
    fn load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Project::load(dir.path(), "ghost"),
            Err(KanbanError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn list_sorted_and_skips_stray_dirs() {
        let dir = TempDir::new().unwrap();
        Project::new("b", "B", "", None).save(dir.path()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        Project::new("a", "A", "", None).save(dir.path()).unwrap();
        std::fs::create_dir_all(dir.path().join("projects/empty")).unwrap();

        let ids: Vec<_> = Project::list(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn remove_deletes_tree() {
        let dir = TempDir::new().unwrap();
        Project::new("p1", "Alpha", "", None).save(dir.path()).unwrap();
        std::fs::write(dir.path().join("projects/p1/swimlanes.json"), "[]").unwrap();

        assert!(Project::remove(dir.path(), "p1").unwrap());
        assert!(!dir.path().join("projects/p1").exists());
        assert!(!Project::remove(dir.path(), "p1").unwrap());
    }

    #[test]
    fn set_archived_reports_change() {
        let mut p = Project::new("p1", "Alpha", "", None);
        assert!(p.set_archived(true));
        assert!(!p.set_archived(true));
        assert!(p.archived);
    }
}
