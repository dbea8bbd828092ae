use crate::error::Result;
use crate::io;
use crate::paths;
use crate::task::Task;
use crate::types::Priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Summary row kept in `tasks/index.json` so listings avoid reading every task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub name: String,
    pub swimlane: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for IndexEntry {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            swimlane: t.swimlane.clone(),
            priority: t.priority,
            initiative_id: t.initiative_id.clone(),
            assigned_to: t.assigned_to.clone(),
            depends_on: t.depends_on.clone(),
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskIndex {
    #[serde(default)]
    pub tasks: BTreeMap<String, IndexEntry>,
}

impl TaskIndex {
    pub fn load(root: &Path, project_id: &str) -> Result<Self> {
        Ok(io::read_json(&paths::task_index_file(root, project_id))?.unwrap_or_default())
    }

    pub fn save(&self, root: &Path, project_id: &str) -> Result<()> {
        io::write_json(&paths::task_index_file(root, project_id), self)
    }

    /// Regenerate from task files on disk.
    pub fn rebuild(root: &Path, project_id: &str) -> Result<Self> {
        let tasks = Task::load_all(root, project_id)?;
        let index = Self::from_tasks(&tasks);
        index.save(root, project_id)?;
        tracing::debug!(project = project_id, tasks = tasks.len(), "rebuilt task index");
        Ok(index)
    }

    pub fn from_tasks(tasks: &[Task]) -> Self {
        Self {
            tasks: tasks
                .iter()
                .map(|t| (t.id.clone(), IndexEntry::from(t)))
                .collect(),
        }
    }

    pub fn upsert(&mut self, task: &Task) {
        self.tasks.insert(task.id.clone(), IndexEntry::from(task));
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.tasks.remove(id).is_some()
    }

    /// Entries in creation order.
    pub fn entries(&self) -> Vec<&IndexEntry> {
        let mut v: Vec<&IndexEntry> = self.tasks.values().collect();
        v.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        v
    }
}
