use crate::comment::Comment;
use crate::error::{KanbanError, Result};
use crate::io;
use crate::paths;
use crate::types::{ArtifactKind, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

// ---------------------------------------------------------------------------
// Linked records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRef {
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub linked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub name: String,
    pub kind: ArtifactKind,
    pub path: String,
    pub added_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub swimlane: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub commits: Vec<CommitRef>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactRef>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub next_comment_seq: u32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(name: impl Into<String>, swimlane: impl Into<String>, priority: Priority) -> Self {
        let now = Utc::now();
        Self {
            id: paths::new_id(),
            name: name.into(),
            swimlane: swimlane.into(),
            priority,
            description: String::new(),
            initiative_id: None,
            assigned_to: None,
            depends_on: Vec::new(),
            commits: Vec::new(),
            artifacts: Vec::new(),
            comments: Vec::new(),
            next_comment_seq: 0,
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn load(root: &Path, project_id: &str, id: &str) -> Result<Self> {
        validate_task_id(id)?;
        io::read_json(&paths::task_file(root, project_id, id))?
            .ok_or_else(|| KanbanError::TaskNotFound(id.to_string()))
    }

    pub fn save(&self, root: &Path, project_id: &str) -> Result<()> {
        io::write_json(&paths::task_file(root, project_id, &self.id), self)
    }

    /// Delete the task file. Returns `false` if it did not exist.
    pub fn remove(root: &Path, project_id: &str, id: &str) -> Result<bool> {
        validate_task_id(id)?;
        match std::fs::remove_file(paths::task_file(root, project_id, id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Read every task file in the project, skipping `index.json` and anything
    /// that does not parse. Sorted by creation time.
    pub fn load_all(root: &Path, project_id: &str) -> Result<Vec<Self>> {
        let dir = paths::tasks_dir(root, project_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut tasks = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if path.file_name().and_then(|n| n.to_str()) == Some(paths::INDEX_FILE) {
                continue;
            }
            match io::read_json::<Task>(&path) {
                Ok(Some(t)) => tasks.push(t),
                Ok(None) => {}
                Err(KanbanError::Json(e)) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable task");
                }
                Err(e) => return Err(e),
            }
        }
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Link a commit. Returns `false` if the hash is already linked.
    pub fn link_commit(
        &mut self,
        hash: impl Into<String>,
        message: Option<String>,
        url: Option<String>,
    ) -> bool {
        let hash = hash.into();
        if self.commits.iter().any(|c| c.hash == hash) {
            return false;
        }
        self.commits.push(CommitRef {
            hash,
            message,
            url,
            linked_at: Utc::now(),
        });
        self.touch();
        true
    }

    pub fn add_artifact(
        &mut self,
        name: impl Into<String>,
        kind: ArtifactKind,
        path: impl Into<String>,
    ) -> ArtifactRef {
        let artifact = ArtifactRef {
            name: name.into(),
            kind,
            path: path.into(),
            added_at: Utc::now(),
        };
        self.artifacts.push(artifact.clone());
        self.touch();
        artifact
    }

    /// Merge `patch` into `metadata`. A `null` value removes the key.
    pub fn merge_metadata(&mut self, patch: Map<String, Value>) {
        for (k, v) in patch {
            if v.is_null() {
                self.metadata.remove(&k);
            } else {
                self.metadata.insert(k, v);
            }
        }
        self.touch();
    }

    /// Remove a dependency. Returns `false` if it was not present.
    pub fn remove_dependency(&mut self, depends_on: &str) -> bool {
        let before = self.depends_on.len();
        self.depends_on.retain(|d| d != depends_on);
        if self.depends_on.len() < before {
            self.touch();
            true
        } else {
            false
        }
    }
}

/// Task files share a directory with `index.json`.
fn validate_task_id(id: &str) -> Result<()> {
    paths::validate_id(id)?;
    if format!("{id}.json") == paths::INDEX_FILE {
        return Err(KanbanError::InvalidId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_load_remove() {
        let dir = TempDir::new().unwrap();
        let mut t = Task::new("Write docs", "lane1", Priority::P1);
        t.description = "all of them".into();
        t.save(dir.path(), "p1").unwrap();

        let loaded = Task::load(dir.path(), "p1", &t.id).unwrap();
        assert_eq!(loaded.name, "Write docs");
        assert_eq!(loaded.priority, Priority::P1);

        assert!(Task::remove(dir.path(), "p1", &t.id).unwrap());
        assert!(!Task::remove(dir.path(), "p1", &t.id).unwrap());
        assert!(matches!(
            Task::load(dir.path(), "p1", &t.id),
            Err(KanbanError::TaskNotFound(_))
        ));
    }

    #[test]
    fn load_all_skips_index_and_garbage() {
        let dir = TempDir::new().unwrap();
        Task::new("a", "l", Priority::P2).save(dir.path(), "p1").unwrap();
        Task::new("b", "l", Priority::P2).save(dir.path(), "p1").unwrap();
        let tasks_dir = dir.path().join("projects/p1/tasks");
        std::fs::write(tasks_dir.join("index.json"), "{\"tasks\":{}}").unwrap();
        std::fs::write(tasks_dir.join("broken.json"), "{").unwrap();
        std::fs::write(tasks_dir.join("notes.txt"), "hi").unwrap();

        let tasks = Task::load_all(dir.path(), "p1").unwrap();
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn index_is_not_a_task_id() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Task::remove(dir.path(), "p1", "index"),
            Err(KanbanError::InvalidId(_))
        ));
    }

    #[test]
    fn link_commit_is_idempotent() {
        let mut t = Task::new("a", "l", Priority::P2);
        assert!(t.link_commit("abc123", Some("fix".into()), None));
        assert!(!t.link_commit("abc123", None, None));
        assert_eq!(t.commits.len(), 1);
    }

    #[test]
    fn merge_metadata_sets_and_removes() {
        let mut t = Task::new("a", "l", Priority::P2);
        let mut patch = Map::new();
        patch.insert("estimate".into(), Value::from(3));
        patch.insert("owner".into(), Value::from("ops"));
        t.merge_metadata(patch);

        let mut patch = Map::new();
        patch.insert("owner".into(), Value::Null);
        t.merge_metadata(patch);

        assert_eq!(t.metadata.get("estimate"), Some(&Value::from(3)));
        assert!(!t.metadata.contains_key("owner"));
    }

    #[test]
    fn remove_dependency_reports_presence() {
        let mut t = Task::new("a", "l", Priority::P2);
        t.depends_on.push("x".into());
        assert!(t.remove_dependency("x"));
        assert!(!t.remove_dependency("x"));
    }

    #[test]
    fn older_documents_fill_defaults() {
        let raw = r#"{
            "id": "abc12345",
            "name": "legacy",
            "swimlane": "todo",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }"#;
        let t: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(t.priority, Priority::P2);
        assert!(t.depends_on.is_empty());
        assert!(t.metadata.is_empty());
    }
}
