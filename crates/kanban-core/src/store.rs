//! `KanbanStore`: the file-backed facade over projects, swimlanes, tasks,
//! initiatives and the activity journal.
//!
//! Every mutating operation writes its documents and then appends one activity
//! entry. Writes of individual documents are atomic; a sequence of writes is
//! not. The store is meant for single-user CLI use and is not thread-safe.

use crate::activity::{self, ActivityEntry};
use crate::board::{Board, CheckReport, ProjectStats};
use crate::comment::{self, Comment};
use crate::config::{Config, WarnLevel};
use crate::dependency::DependencyGraph;
use crate::error::{KanbanError, Result};
use crate::index::{IndexEntry, TaskIndex};
use crate::initiative::Initiative;
use crate::io;
use crate::paths;
use crate::project::Project;
use crate::search::{TaskSearch, TaskSearchResult};
use crate::swimlane::{self, Swimlane};
use crate::task::{ArtifactRef, Task};
use crate::types::{ActivityType, ArtifactKind, InitiativeStatus, Priority};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub repo_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the path.
    pub repo_path: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSwimlane {
    pub name: String,
    pub order: Option<u32>,
    pub is_complete: bool,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SwimlaneUpdate {
    pub name: Option<String>,
    pub order: Option<u32>,
    pub is_complete: Option<bool>,
    pub color: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub name: String,
    /// Lane id or name. Defaults to the first lane.
    pub swimlane: Option<String>,
    /// Defaults to the configured priority.
    pub priority: Option<Priority>,
    pub description: String,
    pub initiative_id: Option<String>,
    pub assigned_to: Option<String>,
    pub depends_on: Vec<String>,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    /// Lane id or name; logged as a move.
    pub swimlane: Option<String>,
    pub initiative_id: Option<Option<String>>,
    pub assigned_to: Option<Option<String>>,
    /// Merged into existing metadata; `null` values remove keys.
    pub metadata: Option<Map<String, Value>>,
}

impl TaskUpdate {
    fn changed_fields(&self) -> Vec<&'static str> {
        let mut f = Vec::new();
        if self.name.is_some() {
            f.push("name");
        }
        if self.description.is_some() {
            f.push("description");
        }
        if self.priority.is_some() {
            f.push("priority");
        }
        if self.initiative_id.is_some() {
            f.push("initiative_id");
        }
        if self.assigned_to.is_some() {
            f.push("assigned_to");
        }
        if self.metadata.is_some() {
            f.push("metadata");
        }
        f
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Lane id or name.
    pub swimlane: Option<String>,
    pub priority: Option<Priority>,
    pub initiative_id: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewInitiative {
    pub name: String,
    pub goal: Option<String>,
    pub status: Option<InitiativeStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct InitiativeUpdate {
    pub name: Option<String>,
    pub goal: Option<Option<String>>,
    pub status: Option<InitiativeStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
}

// ---------------------------------------------------------------------------
// KanbanStore
// ---------------------------------------------------------------------------

pub struct KanbanStore {
    root: PathBuf,
    config: Config,
    actor: Option<String>,
}

impl KanbanStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        io::ensure_dir(&paths::projects_dir(&root))?;
        let config = Config::load(&root)?;
        tracing::debug!(root = %root.display(), "opened kanban store");
        Ok(Self {
            root,
            config,
            actor: None,
        })
    }

    /// Open the store at `--data-dir`, `WICKED_KANBAN_DATA_DIR`, or the default.
    pub fn from_env(explicit: Option<&Path>) -> Result<Self> {
        Self::open(paths::resolve_data_dir(explicit)?)
    }

    /// Attribute subsequent activity entries (and comments) to `actor`.
    pub fn with_actor(mut self, actor: Option<String>) -> Self {
        self.actor = actor;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn log(&self, project_id: &str, entry: ActivityEntry) -> Result<()> {
        activity::append(&self.root, project_id, &entry.actor(self.actor.clone()))
    }

    fn require_project(&self, id: &str) -> Result<Project> {
        Project::load(&self.root, id)
    }

    fn require_task(&self, project_id: &str, id: &str) -> Result<Task> {
        Task::load(&self.root, project_id, id)
    }

    /// Save a task and refresh its index row.
    fn write_task(&self, project_id: &str, task: &Task) -> Result<()> {
        task.save(&self.root, project_id)?;
        let mut index = TaskIndex::load(&self.root, project_id)?;
        index.upsert(task);
        index.save(&self.root, project_id)
    }

    fn ensure_initiative(&self, project_id: &str, id: &str) -> Result<()> {
        Initiative::load(&self.root, project_id, id).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn create_project(&self, input: NewProject) -> Result<Project> {
        if let Some(w) = self
            .config
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            return Err(KanbanError::InvalidConfig(w.message));
        }
        let mut id = paths::new_id();
        while Project::exists(&self.root, &id) {
            id = paths::new_id();
        }
        let project = Project::new(id, input.name, input.description, input.repo_path);

        let lanes = swimlane::from_templates(&self.config.default_swimlanes);
        project.save(&self.root)?;
        swimlane::save(&self.root, &project.id, &lanes)?;
        io::ensure_dir(&paths::initiatives_dir(&self.root, &project.id))?;
        TaskIndex::default().save(&self.root, &project.id)?;

        self.log(
            &project.id,
            ActivityEntry::new(
                ActivityType::ProjectCreated,
                format!("Created project '{}'", project.name),
            ),
        )?;
        tracing::debug!(project = %project.id, "created project");
        Ok(project)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        match Project::load(&self.root, id) {
            Ok(p) => Ok(Some(p)),
            Err(KanbanError::ProjectNotFound(_) | KanbanError::InvalidId(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn list_projects(&self, include_archived: bool) -> Result<Vec<Project>> {
        let mut projects = Project::list(&self.root)?;
        if !include_archived {
            projects.retain(|p| !p.archived);
        }
        Ok(projects)
    }

    pub fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<Project> {
        let mut project = self.require_project(id)?;
        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(desc) = update.description {
            project.description = desc;
        }
        if let Some(repo) = update.repo_path {
            project.repo_path = repo;
        }
        project.touch();
        project.save(&self.root)?;
        self.log(
            id,
            ActivityEntry::new(
                ActivityType::ProjectUpdated,
                format!("Updated project '{}'", project.name),
            ),
        )?;
        Ok(project)
    }

    pub fn archive_project(&self, id: &str) -> Result<Project> {
        self.set_archived(id, true)
    }

    pub fn unarchive_project(&self, id: &str) -> Result<Project> {
        self.set_archived(id, false)
    }

    fn set_archived(&self, id: &str, archived: bool) -> Result<Project> {
        let mut project = self.require_project(id)?;
        if project.set_archived(archived) {
            project.save(&self.root)?;
            let (kind, verb) = if archived {
                (ActivityType::ProjectArchived, "Archived")
            } else {
                (ActivityType::ProjectUnarchived, "Unarchived")
            };
            self.log(
                id,
                ActivityEntry::new(kind, format!("{verb} project '{}'", project.name)),
            )?;
        }
        Ok(project)
    }

    /// Irreversibly remove the project and all of its children.
    pub fn delete_project(&self, id: &str) -> Result<bool> {
        let removed = Project::remove(&self.root, id)?;
        if removed {
            tracing::debug!(project = id, "deleted project");
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Swimlanes
    // -----------------------------------------------------------------------

    pub fn list_swimlanes(&self, project_id: &str) -> Result<Vec<Swimlane>> {
        self.require_project(project_id)?;
        swimlane::load(&self.root, project_id)
    }

    /// Look a lane up by id or (case-insensitive) name.
    pub fn resolve_swimlane(&self, project_id: &str, key: &str) -> Result<Swimlane> {
        let lanes = self.list_swimlanes(project_id)?;
        swimlane::find(&lanes, key)
            .cloned()
            .ok_or_else(|| KanbanError::SwimlaneNotFound(key.to_string()))
    }

    pub fn add_swimlane(&self, project_id: &str, input: NewSwimlane) -> Result<Swimlane> {
        let mut lanes = self.list_swimlanes(project_id)?;
        let lane = swimlane::add(
            &mut lanes,
            &input.name,
            input.order,
            input.is_complete,
            input.color,
        )?;
        swimlane::save(&self.root, project_id, &lanes)?;
        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::SwimlaneCreated,
                format!("Added swimlane '{}'", lane.name),
            )
            .with("swimlane_id", lane.id.clone()),
        )?;
        Ok(lane)
    }

    pub fn update_swimlane(
        &self,
        project_id: &str,
        key: &str,
        update: SwimlaneUpdate,
    ) -> Result<Swimlane> {
        let mut lanes = self.list_swimlanes(project_id)?;
        let lane_id = swimlane::find_mut(&mut lanes, key)?.id.clone();
        if let Some(name) = &update.name {
            swimlane::ensure_unique_name(&lanes, name, Some(&lane_id))?;
        }

        let lane = swimlane::find_mut(&mut lanes, &lane_id)?;
        if let Some(name) = update.name {
            lane.name = name;
        }
        if let Some(order) = update.order {
            lane.order = order;
        }
        if let Some(done) = update.is_complete {
            lane.is_complete = done;
        }
        if let Some(color) = update.color {
            lane.color = color;
        }
        let updated = lane.clone();

        swimlane::sort(&mut lanes);
        swimlane::save(&self.root, project_id, &lanes)?;
        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::SwimlaneUpdated,
                format!("Updated swimlane '{}'", updated.name),
            )
            .with("swimlane_id", updated.id.clone()),
        )?;
        Ok(updated)
    }

    /// Remove an empty lane. Returns `false` if no such lane exists.
    pub fn delete_swimlane(&self, project_id: &str, key: &str) -> Result<bool> {
        let mut lanes = self.list_swimlanes(project_id)?;
        let Some(lane) = swimlane::find(&lanes, key).cloned() else {
            return Ok(false);
        };

        let index = TaskIndex::load(&self.root, project_id)?;
        let count = index
            .tasks
            .values()
            .filter(|t| t.swimlane == lane.id)
            .count();
        if count > 0 {
            return Err(KanbanError::SwimlaneNotEmpty {
                lane: lane.name,
                count,
            });
        }

        lanes.retain(|l| l.id != lane.id);
        swimlane::save(&self.root, project_id, &lanes)?;
        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::SwimlaneDeleted,
                format!("Deleted swimlane '{}'", lane.name),
            )
            .with("swimlane_id", lane.id),
        )?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub fn create_task(&self, project_id: &str, input: NewTask) -> Result<Task> {
        let lanes = self.list_swimlanes(project_id)?;
        let lane = match &input.swimlane {
            Some(key) => swimlane::find(&lanes, key)
                .ok_or_else(|| KanbanError::SwimlaneNotFound(key.clone()))?,
            None => swimlane::default_lane(&lanes)
                .ok_or_else(|| KanbanError::NoSwimlanes(project_id.to_string()))?,
        };

        if let Some(init) = &input.initiative_id {
            self.ensure_initiative(project_id, init)?;
        }

        let index = TaskIndex::load(&self.root, project_id)?;
        let mut depends_on: Vec<String> = Vec::new();
        for dep in input.depends_on {
            if !index.tasks.contains_key(&dep) {
                return Err(KanbanError::TaskNotFound(dep));
            }
            if !depends_on.contains(&dep) {
                depends_on.push(dep);
            }
        }

        let mut task = Task::new(
            input.name,
            lane.id.clone(),
            input.priority.unwrap_or(self.config.default_priority),
        );
        while index.tasks.contains_key(&task.id) {
            task.id = paths::new_id();
        }
        task.description = input.description;
        task.initiative_id = input.initiative_id;
        task.assigned_to = input.assigned_to;
        task.depends_on = depends_on;
        task.metadata = input.metadata;

        self.write_task(project_id, &task)?;
        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::TaskCreated,
                format!("Created task '{}' in {}", task.name, lane.name),
            )
            .task(task.id.clone())
            .with("swimlane", lane.id.clone())
            .with("priority", task.priority.as_str()),
        )?;
        Ok(task)
    }

    pub fn get_task(&self, project_id: &str, id: &str) -> Result<Option<Task>> {
        self.require_project(project_id)?;
        match Task::load(&self.root, project_id, id) {
            Ok(t) => Ok(Some(t)),
            Err(KanbanError::TaskNotFound(_) | KanbanError::InvalidId(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Index rows matching `filter`, in creation order.
    pub fn list_tasks(&self, project_id: &str, filter: &TaskFilter) -> Result<Vec<IndexEntry>> {
        let lanes = self.list_swimlanes(project_id)?;
        let lane_id = match &filter.swimlane {
            Some(key) => Some(
                swimlane::find(&lanes, key)
                    .map(|l| l.id.clone())
                    .ok_or_else(|| KanbanError::SwimlaneNotFound(key.clone()))?,
            ),
            None => None,
        };

        let index = TaskIndex::load(&self.root, project_id)?;
        Ok(index
            .entries()
            .into_iter()
            .filter(|t| lane_id.as_ref().is_none_or(|l| &t.swimlane == l))
            .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
            .filter(|t| {
                filter
                    .initiative_id
                    .as_ref()
                    .is_none_or(|i| t.initiative_id.as_ref() == Some(i))
            })
            .filter(|t| {
                filter
                    .assigned_to
                    .as_ref()
                    .is_none_or(|a| t.assigned_to.as_ref() == Some(a))
            })
            .cloned()
            .collect())
    }

    pub fn update_task(&self, project_id: &str, id: &str, update: TaskUpdate) -> Result<Task> {
        let lanes = self.list_swimlanes(project_id)?;
        if let Some(key) = &update.swimlane {
            if swimlane::find(&lanes, key).is_none() {
                return Err(KanbanError::SwimlaneNotFound(key.clone()));
            }
        }
        let fields = update.changed_fields();
        let mut task = self.require_task(project_id, id)?;

        if let Some(Some(init)) = &update.initiative_id {
            self.ensure_initiative(project_id, init)?;
        }

        if let Some(name) = update.name {
            task.name = name;
        }
        if let Some(desc) = update.description {
            task.description = desc;
        }
        if let Some(p) = update.priority {
            task.priority = p;
        }
        if let Some(init) = update.initiative_id {
            task.initiative_id = init;
        }
        if let Some(who) = update.assigned_to {
            task.assigned_to = who;
        }
        if let Some(patch) = update.metadata {
            task.merge_metadata(patch);
        }

        if !fields.is_empty() {
            task.touch();
            self.write_task(project_id, &task)?;
            self.log(
                project_id,
                ActivityEntry::new(
                    ActivityType::TaskUpdated,
                    format!("Updated task '{}'", task.name),
                )
                .task(task.id.clone())
                .with("fields", fields),
            )?;
        }

        match update.swimlane {
            Some(lane) => self.move_task(project_id, id, &lane),
            None => Ok(task),
        }
    }

    /// Move a task to another lane (id or name). Moving into the current lane is a no-op.
    pub fn move_task(&self, project_id: &str, id: &str, lane_key: &str) -> Result<Task> {
        let lanes = self.list_swimlanes(project_id)?;
        let to = swimlane::find(&lanes, lane_key)
            .ok_or_else(|| KanbanError::SwimlaneNotFound(lane_key.to_string()))?;
        let mut task = self.require_task(project_id, id)?;
        if task.swimlane == to.id {
            return Ok(task);
        }

        let from = task.swimlane.clone();
        let from_name = swimlane::find(&lanes, &from)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| from.clone());
        task.swimlane = to.id.clone();
        task.touch();
        self.write_task(project_id, &task)?;
        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::TaskMoved,
                format!("Moved '{}' from {} to {}", task.name, from_name, to.name),
            )
            .task(task.id.clone())
            .with("from", from)
            .with("to", to.id.clone()),
        )?;
        Ok(task)
    }

    /// Delete a task. Other tasks' `depends_on` entries pointing at it are left
    /// in place; `check_project` reports them.
    pub fn delete_task(&self, project_id: &str, id: &str) -> Result<bool> {
        self.require_project(project_id)?;
        let name = match Task::load(&self.root, project_id, id) {
            Ok(t) => t.name,
            Err(KanbanError::TaskNotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        Task::remove(&self.root, project_id, id)?;
        let mut index = TaskIndex::load(&self.root, project_id)?;
        index.remove(id);
        index.save(&self.root, project_id)?;

        self.log(
            project_id,
            ActivityEntry::new(ActivityType::TaskDeleted, format!("Deleted task '{name}'"))
                .task(id),
        )?;
        Ok(true)
    }

    /// Add a comment. `author` falls back to the store's actor.
    pub fn add_comment(
        &self,
        project_id: &str,
        task_id: &str,
        body: &str,
        author: Option<String>,
    ) -> Result<Comment> {
        self.require_project(project_id)?;
        let mut task = self.require_task(project_id, task_id)?;
        let author = author.or_else(|| self.actor.clone());
        let c = comment::add_comment(
            &mut task.comments,
            &mut task.next_comment_seq,
            body,
            author,
        );
        task.touch();
        self.write_task(project_id, &task)?;
        self.log(
            project_id,
            ActivityEntry::new(ActivityType::Comment, body)
                .task(task_id)
                .with("comment_id", c.id.clone()),
        )?;
        Ok(c)
    }

    pub fn link_commit(
        &self,
        project_id: &str,
        task_id: &str,
        hash: &str,
        message: Option<String>,
        url: Option<String>,
    ) -> Result<Task> {
        self.require_project(project_id)?;
        let mut task = self.require_task(project_id, task_id)?;
        if task.link_commit(hash, message.clone(), url) {
            self.write_task(project_id, &task)?;
            let summary = match &message {
                Some(m) => format!("Linked commit {hash}: {m}"),
                None => format!("Linked commit {hash}"),
            };
            self.log(
                project_id,
                ActivityEntry::new(ActivityType::CommitLinked, summary)
                    .task(task_id)
                    .with("hash", hash),
            )?;
        }
        Ok(task)
    }

    pub fn add_artifact(
        &self,
        project_id: &str,
        task_id: &str,
        name: &str,
        kind: ArtifactKind,
        path: &str,
    ) -> Result<ArtifactRef> {
        self.require_project(project_id)?;
        let mut task = self.require_task(project_id, task_id)?;
        let artifact = task.add_artifact(name, kind, path);
        self.write_task(project_id, &task)?;
        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::ArtifactAdded,
                format!("Added {kind} artifact '{name}'"),
            )
            .task(task_id)
            .with("path", path),
        )?;
        Ok(artifact)
    }

    /// Make `task_id` depend on `depends_on`. Rejects self-dependencies,
    /// unknown tasks and cycles; an existing dependency is a no-op.
    pub fn add_dependency(
        &self,
        project_id: &str,
        task_id: &str,
        depends_on: &str,
    ) -> Result<Task> {
        let lanes = self.list_swimlanes(project_id)?;
        if task_id == depends_on {
            return Err(KanbanError::SelfDependency(task_id.to_string()));
        }
        let mut task = self.require_task(project_id, task_id)?;
        let index = TaskIndex::load(&self.root, project_id)?;
        if !index.tasks.contains_key(depends_on) {
            return Err(KanbanError::TaskNotFound(depends_on.to_string()));
        }
        if task.depends_on.iter().any(|d| d == depends_on) {
            return Ok(task);
        }
        if DependencyGraph::new(&index, &lanes).would_cycle(task_id, depends_on) {
            return Err(KanbanError::DependencyCycle {
                task: task_id.to_string(),
                depends_on: depends_on.to_string(),
            });
        }

        task.depends_on.push(depends_on.to_string());
        task.touch();
        self.write_task(project_id, &task)?;
        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::DependencyAdded,
                format!("'{}' now depends on {depends_on}", task.name),
            )
            .task(task_id)
            .with("depends_on", depends_on),
        )?;
        Ok(task)
    }

    /// Returns `false` if the dependency was not present.
    pub fn remove_dependency(
        &self,
        project_id: &str,
        task_id: &str,
        depends_on: &str,
    ) -> Result<bool> {
        self.require_project(project_id)?;
        let mut task = self.require_task(project_id, task_id)?;
        if !task.remove_dependency(depends_on) {
            return Ok(false);
        }
        self.write_task(project_id, &task)?;
        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::DependencyRemoved,
                format!("'{}' no longer depends on {depends_on}", task.name),
            )
            .task(task_id)
            .with("depends_on", depends_on),
        )?;
        Ok(true)
    }

    /// Dependencies of `task_id` that sit in an incomplete lane.
    pub fn blocking_tasks(&self, project_id: &str, task_id: &str) -> Result<Vec<IndexEntry>> {
        let lanes = self.list_swimlanes(project_id)?;
        let task = self.require_task(project_id, task_id)?;
        let index = TaskIndex::load(&self.root, project_id)?;
        let graph = DependencyGraph::new(&index, &lanes);
        Ok(graph.blockers(&task.depends_on).into_iter().cloned().collect())
    }

    pub fn is_blocked(&self, project_id: &str, task_id: &str) -> Result<bool> {
        Ok(!self.blocking_tasks(project_id, task_id)?.is_empty())
    }

    /// Every blocked task in the project.
    pub fn blocked_tasks(&self, project_id: &str) -> Result<Vec<IndexEntry>> {
        let lanes = self.list_swimlanes(project_id)?;
        let index = TaskIndex::load(&self.root, project_id)?;
        let graph = DependencyGraph::new(&index, &lanes);
        Ok(graph
            .blocked_ids()
            .into_iter()
            .filter_map(|id| index.tasks.get(id).cloned())
            .collect())
    }

    pub fn search_tasks(
        &self,
        project_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TaskSearchResult>> {
        let lanes = self.list_swimlanes(project_id)?;
        let tasks = Task::load_all(&self.root, project_id)?;
        TaskSearch::build(&tasks, &lanes)?.search(query, limit)
    }

    pub fn rebuild_index(&self, project_id: &str) -> Result<TaskIndex> {
        self.require_project(project_id)?;
        TaskIndex::rebuild(&self.root, project_id)
    }

    // -----------------------------------------------------------------------
    // Initiatives
    // -----------------------------------------------------------------------

    pub fn create_initiative(&self, project_id: &str, input: NewInitiative) -> Result<Initiative> {
        self.require_project(project_id)?;
        let mut initiative = Initiative::new(input.name);
        initiative.goal = input.goal;
        if let Some(status) = input.status {
            initiative.status = status;
        }
        initiative.start_date = input.start_date;
        initiative.end_date = input.end_date;
        initiative.check_dates()?;

        initiative.save(&self.root, project_id)?;
        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::InitiativeCreated,
                format!("Created initiative '{}'", initiative.name),
            )
            .with("initiative_id", initiative.id.clone()),
        )?;
        Ok(initiative)
    }

    pub fn get_initiative(&self, project_id: &str, id: &str) -> Result<Option<Initiative>> {
        self.require_project(project_id)?;
        match Initiative::load(&self.root, project_id, id) {
            Ok(i) => Ok(Some(i)),
            Err(KanbanError::InitiativeNotFound(_) | KanbanError::InvalidId(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn list_initiatives(
        &self,
        project_id: &str,
        status: Option<InitiativeStatus>,
    ) -> Result<Vec<Initiative>> {
        self.require_project(project_id)?;
        let mut all = Initiative::list(&self.root, project_id)?;
        if let Some(s) = status {
            all.retain(|i| i.status == s);
        }
        Ok(all)
    }

    pub fn update_initiative(
        &self,
        project_id: &str,
        id: &str,
        update: InitiativeUpdate,
    ) -> Result<Initiative> {
        self.require_project(project_id)?;
        let mut initiative = Initiative::load(&self.root, project_id, id)?;
        if let Some(name) = update.name {
            initiative.name = name;
        }
        if let Some(goal) = update.goal {
            initiative.goal = goal;
        }
        if let Some(status) = update.status {
            initiative.status = status;
        }
        if let Some(start) = update.start_date {
            initiative.start_date = start;
        }
        if let Some(end) = update.end_date {
            initiative.end_date = end;
        }
        initiative.check_dates()?;
        initiative.touch();

        initiative.save(&self.root, project_id)?;
        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::InitiativeUpdated,
                format!("Updated initiative '{}'", initiative.name),
            )
            .with("initiative_id", id)
            .with("status", initiative.status.as_str()),
        )?;
        Ok(initiative)
    }

    /// Delete an initiative and unlink (not delete) its tasks.
    pub fn delete_initiative(&self, project_id: &str, id: &str) -> Result<bool> {
        self.require_project(project_id)?;
        let name = match Initiative::load(&self.root, project_id, id) {
            Ok(i) => i.name,
            Err(KanbanError::InitiativeNotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        let mut unlinked = Vec::new();
        for entry in self.initiative_tasks(project_id, id)? {
            let mut task = self.require_task(project_id, &entry.id)?;
            task.initiative_id = None;
            task.touch();
            self.write_task(project_id, &task)?;
            unlinked.push(task.id);
        }
        Initiative::remove(&self.root, project_id, id)?;

        self.log(
            project_id,
            ActivityEntry::new(
                ActivityType::InitiativeDeleted,
                format!("Deleted initiative '{name}'"),
            )
            .with("initiative_id", id)
            .with("unlinked_tasks", unlinked),
        )?;
        Ok(true)
    }

    pub fn initiative_tasks(&self, project_id: &str, id: &str) -> Result<Vec<IndexEntry>> {
        self.list_tasks(
            project_id,
            &TaskFilter {
                initiative_id: Some(id.to_string()),
                ..TaskFilter::default()
            },
        )
    }

    // -----------------------------------------------------------------------
    // Activity
    // -----------------------------------------------------------------------

    /// Append a caller-built entry. The store's actor fills in a missing one.
    pub fn log_activity(&self, project_id: &str, mut entry: ActivityEntry) -> Result<()> {
        self.require_project(project_id)?;
        if entry.actor.is_none() {
            entry.actor = self.actor.clone();
        }
        activity::append(&self.root, project_id, &entry)
    }

    pub fn activity_for_date(
        &self,
        project_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ActivityEntry>> {
        self.require_project(project_id)?;
        activity::read_day(&self.root, project_id, date)
    }

    /// Newest-first entries; `limit` defaults to the configured `activity_limit`.
    pub fn recent_activity(
        &self,
        project_id: &str,
        limit: Option<usize>,
        task_id: Option<&str>,
    ) -> Result<Vec<ActivityEntry>> {
        self.require_project(project_id)?;
        activity::recent(
            &self.root,
            project_id,
            limit.unwrap_or(self.config.activity_limit),
            task_id,
        )
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn board(&self, project_id: &str) -> Result<Board> {
        let lanes = self.list_swimlanes(project_id)?;
        let index = TaskIndex::load(&self.root, project_id)?;
        Ok(Board::build(project_id, &lanes, &index))
    }

    pub fn project_stats(&self, project_id: &str) -> Result<ProjectStats> {
        let lanes = self.list_swimlanes(project_id)?;
        let index = TaskIndex::load(&self.root, project_id)?;
        Ok(ProjectStats::compute(project_id, &lanes, &index))
    }

    pub fn check_project(&self, project_id: &str) -> Result<CheckReport> {
        let lanes = self.list_swimlanes(project_id)?;
        let index = TaskIndex::load(&self.root, project_id)?;
        let tasks = Task::load_all(&self.root, project_id)?;
        let initiatives = Initiative::list(&self.root, project_id)?;
        let report = CheckReport::run(&lanes, &index, &tasks, &initiatives);
        for d in &report.dangling_dependencies {
            tracing::warn!(task = %d.task_id, missing = %d.missing, "dangling dependency");
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, KanbanStore, Project) {
        let dir = TempDir::new().unwrap();
        let store = KanbanStore::open(dir.path())
            .unwrap()
            .with_actor(Some("tester".into()));
        let project = store
            .create_project(NewProject {
                name: "Demo".into(),
                ..NewProject::default()
            })
            .unwrap();
        (dir, store, project)
    }

    fn new_task(store: &KanbanStore, pid: &str, name: &str, deps: Vec<String>) -> Task {
        store
            .create_task(
                pid,
                NewTask {
                    name: name.into(),
                    depends_on: deps,
                    ..NewTask::default()
                },
            )
            .unwrap()
    }

    #[test]
    fn create_project_writes_default_lanes() {
        let (dir, store, p) = setup();
        let lanes = store.list_swimlanes(&p.id).unwrap();
        let names: Vec<_> = lanes.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["To Do", "In Progress", "Done"]);
        assert!(lanes[2].is_complete);
        assert!(paths::task_index_file(dir.path(), &p.id).exists());

        let log = store.recent_activity(&p.id, None, None).unwrap();
        assert_eq!(log[0].kind, ActivityType::ProjectCreated);
        assert_eq!(log[0].actor.as_deref(), Some("tester"));
    }

    #[test]
    fn missing_project_is_reported() {
        let (_dir, store, _p) = setup();
        assert!(store.get_project("nope").unwrap().is_none());
        assert!(matches!(
            store.list_swimlanes("nope"),
            Err(KanbanError::ProjectNotFound(_))
        ));
        assert!(!store.delete_project("nope").unwrap());
    }

    #[test]
    fn archive_hides_from_default_listing() {
        let (_dir, store, p) = setup();
        store.archive_project(&p.id).unwrap();
        assert!(store.list_projects(false).unwrap().is_empty());
        assert_eq!(store.list_projects(true).unwrap().len(), 1);
        assert!(!store.unarchive_project(&p.id).unwrap().archived);
        assert_eq!(store.list_projects(false).unwrap().len(), 1);
    }

    #[test]
    fn update_project_clears_repo_path() {
        let (_dir, store, p) = setup();
        let p = store
            .update_project(
                &p.id,
                ProjectUpdate {
                    repo_path: Some(Some("/src/demo".into())),
                    ..ProjectUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(p.repo_path.as_deref(), Some("/src/demo"));
        let p = store
            .update_project(
                &p.id,
                ProjectUpdate {
                    repo_path: Some(None),
                    ..ProjectUpdate::default()
                },
            )
            .unwrap();
        assert!(p.repo_path.is_none());
    }

    #[test]
    fn task_lifecycle_and_index() {
        let (dir, store, p) = setup();
        let t = new_task(&store, &p.id, "Write docs", vec![]);
        assert_eq!(t.priority, Priority::P2);
        let todo = store.resolve_swimlane(&p.id, "to do").unwrap();
        assert_eq!(t.swimlane, todo.id);

        let moved = store.move_task(&p.id, &t.id, "Done").unwrap();
        let index = TaskIndex::load(dir.path(), &p.id).unwrap();
        assert_eq!(index.tasks[&t.id].swimlane, moved.swimlane);

        let listed = store
            .list_tasks(
                &p.id,
                &TaskFilter {
                    swimlane: Some("done".into()),
                    ..TaskFilter::default()
                },
            )
            .unwrap();
        assert_eq!(listed.len(), 1);

        assert!(store.delete_task(&p.id, &t.id).unwrap());
        assert!(!store.delete_task(&p.id, &t.id).unwrap());
        assert!(store.get_task(&p.id, &t.id).unwrap().is_none());
        assert!(TaskIndex::load(dir.path(), &p.id).unwrap().tasks.is_empty());
    }

    #[test]
    fn move_to_unknown_lane_fails() {
        let (_dir, store, p) = setup();
        let t = new_task(&store, &p.id, "a", vec![]);
        assert!(matches!(
            store.move_task(&p.id, &t.id, "Limbo"),
            Err(KanbanError::SwimlaneNotFound(_))
        ));
    }

    #[test]
    fn update_task_fields_and_lane() {
        let (_dir, store, p) = setup();
        let t = new_task(&store, &p.id, "a", vec![]);
        let mut meta = Map::new();
        meta.insert("estimate".into(), Value::from(3));
        let t = store
            .update_task(
                &p.id,
                &t.id,
                TaskUpdate {
                    priority: Some(Priority::P0),
                    assigned_to: Some(Some("bob".into())),
                    swimlane: Some("In Progress".into()),
                    metadata: Some(meta),
                    ..TaskUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(t.priority, Priority::P0);
        assert_eq!(t.assigned_to.as_deref(), Some("bob"));
        assert_eq!(t.metadata["estimate"], 3);
        assert_eq!(
            store.resolve_swimlane(&p.id, &t.swimlane).unwrap().name,
            "In Progress"
        );

        let kinds: Vec<_> = store
            .recent_activity(&p.id, None, Some(&t.id))
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert!(kinds.contains(&ActivityType::TaskMoved));
        assert!(kinds.contains(&ActivityType::TaskUpdated));
    }

    #[test]
    fn update_with_unknown_lane_changes_nothing() {
        let (_dir, store, p) = setup();
        let t = new_task(&store, &p.id, "a", vec![]);
        let err = store
            .update_task(
                &p.id,
                &t.id,
                TaskUpdate {
                    priority: Some(Priority::P0),
                    swimlane: Some("Bogus".into()),
                    ..TaskUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, KanbanError::SwimlaneNotFound(_)));

        let reloaded = store.get_task(&p.id, &t.id).unwrap().unwrap();
        assert_eq!(reloaded.priority, Priority::P2);
        assert_eq!(reloaded.swimlane, t.swimlane);
        let kinds: Vec<_> = store
            .recent_activity(&p.id, None, Some(&t.id))
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![ActivityType::TaskCreated]);
    }

    #[test]
    fn malformed_ids_read_as_missing() {
        let (_dir, store, p) = setup();
        assert!(store.get_project("UPPER").unwrap().is_none());
        assert!(store.get_task(&p.id, "index").unwrap().is_none());
        assert!(store.get_task(&p.id, "UPPER").unwrap().is_none());
        assert!(store.get_initiative(&p.id, "UPPER").unwrap().is_none());
    }

    #[test]
    fn create_project_rejects_duplicate_default_lanes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "default_swimlanes:\n  - name: Done\n    is_complete: true\n  - name: done\n",
        )
        .unwrap();
        let store = KanbanStore::open(dir.path()).unwrap();
        let err = store
            .create_project(NewProject {
                name: "Demo".into(),
                ..NewProject::default()
            })
            .unwrap_err();
        assert!(matches!(err, KanbanError::InvalidConfig(_)));
        let entries = std::fs::read_dir(paths::projects_dir(dir.path())).unwrap();
        assert_eq!(entries.count(), 0);
    }

    #[test]
    fn dependencies_block_until_complete() {
        let (_dir, store, p) = setup();
        let a = new_task(&store, &p.id, "a", vec![]);
        let b = new_task(&store, &p.id, "b", vec![a.id.clone()]);
        assert!(store.is_blocked(&p.id, &b.id).unwrap());
        assert_eq!(store.blocking_tasks(&p.id, &b.id).unwrap()[0].id, a.id);
        assert_eq!(store.blocked_tasks(&p.id).unwrap().len(), 1);

        store.move_task(&p.id, &a.id, "Done").unwrap();
        assert!(!store.is_blocked(&p.id, &b.id).unwrap());
        assert!(store.blocked_tasks(&p.id).unwrap().is_empty());
    }

    #[test]
    fn dependency_validation() {
        let (_dir, store, p) = setup();
        let a = new_task(&store, &p.id, "a", vec![]);
        let b = new_task(&store, &p.id, "b", vec![a.id.clone()]);

        assert!(matches!(
            store.add_dependency(&p.id, &a.id, &a.id),
            Err(KanbanError::SelfDependency(_))
        ));
        assert!(matches!(
            store.add_dependency(&p.id, &a.id, &b.id),
            Err(KanbanError::DependencyCycle { .. })
        ));
        assert!(matches!(
            store.add_dependency(&p.id, &a.id, "feedbeef"),
            Err(KanbanError::TaskNotFound(_))
        ));
        // already present
        let b2 = store.add_dependency(&p.id, &b.id, &a.id).unwrap();
        assert_eq!(b2.depends_on.len(), 1);

        assert!(store.remove_dependency(&p.id, &b.id, &a.id).unwrap());
        assert!(!store.remove_dependency(&p.id, &b.id, &a.id).unwrap());
        assert!(!store.is_blocked(&p.id, &b.id).unwrap());
    }

    #[test]
    fn create_task_rejects_unknown_dependency() {
        let (_dir, store, p) = setup();
        let err = store
            .create_task(
                &p.id,
                NewTask {
                    name: "x".into(),
                    depends_on: vec!["feedbeef".into()],
                    ..NewTask::default()
                },
            )
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn deleting_dependency_leaves_dangling_reference() {
        let (_dir, store, p) = setup();
        let a = new_task(&store, &p.id, "a", vec![]);
        let b = new_task(&store, &p.id, "b", vec![a.id.clone()]);
        store.delete_task(&p.id, &a.id).unwrap();

        let b = store.get_task(&p.id, &b.id).unwrap().unwrap();
        assert_eq!(b.depends_on, vec![a.id.clone()]);
        assert!(!store.is_blocked(&p.id, &b.id).unwrap());

        let report = store.check_project(&p.id).unwrap();
        assert_eq!(report.dangling_dependencies.len(), 1);
        assert_eq!(report.dangling_dependencies[0].missing, a.id);
    }

    #[test]
    fn comments_commits_artifacts() {
        let (_dir, store, p) = setup();
        let t = new_task(&store, &p.id, "a", vec![]);

        let c = store.add_comment(&p.id, &t.id, "looks good", None).unwrap();
        assert_eq!(c.id, "C1");
        assert_eq!(c.author.as_deref(), Some("tester"));
        let c2 = store
            .add_comment(&p.id, &t.id, "ship it", Some("alice".into()))
            .unwrap();
        assert_eq!(c2.id, "C2");
        assert_eq!(c2.author.as_deref(), Some("alice"));

        store
            .link_commit(&p.id, &t.id, "abc123", Some("fix".into()), None)
            .unwrap();
        let t2 = store.link_commit(&p.id, &t.id, "abc123", None, None).unwrap();
        assert_eq!(t2.commits.len(), 1);

        store
            .add_artifact(&p.id, &t.id, "design", ArtifactKind::Doc, "docs/design.md")
            .unwrap();
        let t3 = store.get_task(&p.id, &t.id).unwrap().unwrap();
        assert_eq!(t3.comments.len(), 2);
        assert_eq!(t3.artifacts[0].kind, ArtifactKind::Doc);

        let commit_events = store
            .recent_activity(&p.id, None, Some(&t.id))
            .unwrap()
            .into_iter()
            .filter(|e| e.kind == ActivityType::CommitLinked)
            .count();
        assert_eq!(commit_events, 1);
    }

    #[test]
    fn swimlane_management() {
        let (_dir, store, p) = setup();
        let review = store
            .add_swimlane(
                &p.id,
                NewSwimlane {
                    name: "Review".into(),
                    ..NewSwimlane::default()
                },
            )
            .unwrap();
        assert!(matches!(
            store.add_swimlane(
                &p.id,
                NewSwimlane {
                    name: "review".into(),
                    ..NewSwimlane::default()
                }
            ),
            Err(KanbanError::SwimlaneExists(_))
        ));

        let updated = store
            .update_swimlane(
                &p.id,
                &review.id,
                SwimlaneUpdate {
                    name: Some("Code Review".into()),
                    order: Some(0),
                    ..SwimlaneUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Code Review");
        assert!(matches!(
            store.update_swimlane(
                &p.id,
                "Code Review",
                SwimlaneUpdate {
                    name: Some("done".into()),
                    ..SwimlaneUpdate::default()
                }
            ),
            Err(KanbanError::SwimlaneExists(_))
        ));

        let t = new_task(&store, &p.id, "a", vec![]);
        store.move_task(&p.id, &t.id, "Code Review").unwrap();
        assert!(matches!(
            store.delete_swimlane(&p.id, "Code Review"),
            Err(KanbanError::SwimlaneNotEmpty { count: 1, .. })
        ));
        store.delete_task(&p.id, &t.id).unwrap();
        assert!(store.delete_swimlane(&p.id, "Code Review").unwrap());
        assert!(!store.delete_swimlane(&p.id, "Code Review").unwrap());
        assert_eq!(store.list_swimlanes(&p.id).unwrap().len(), 3);
    }

    #[test]
    fn create_task_without_lanes_fails() {
        let (_dir, store, p) = setup();
        for lane in store.list_swimlanes(&p.id).unwrap() {
            store.delete_swimlane(&p.id, &lane.id).unwrap();
        }
        let err = store
            .create_task(
                &p.id,
                NewTask {
                    name: "x".into(),
                    ..NewTask::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, KanbanError::NoSwimlanes(_)));
    }

    #[test]
    fn initiatives_link_and_unlink_tasks() {
        let (_dir, store, p) = setup();
        let init = store
            .create_initiative(
                &p.id,
                NewInitiative {
                    name: "Q3 launch".into(),
                    ..NewInitiative::default()
                },
            )
            .unwrap();
        assert_eq!(init.status, InitiativeStatus::Planning);

        let t = store
            .create_task(
                &p.id,
                NewTask {
                    name: "a".into(),
                    initiative_id: Some(init.id.clone()),
                    ..NewTask::default()
                },
            )
            .unwrap();
        assert_eq!(store.initiative_tasks(&p.id, &init.id).unwrap().len(), 1);

        let active = store
            .update_initiative(
                &p.id,
                &init.id,
                InitiativeUpdate {
                    status: Some(InitiativeStatus::Active),
                    ..InitiativeUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(active.status, InitiativeStatus::Active);
        assert_eq!(
            store
                .list_initiatives(&p.id, Some(InitiativeStatus::Planning))
                .unwrap()
                .len(),
            0
        );

        assert!(store.delete_initiative(&p.id, &init.id).unwrap());
        let t = store.get_task(&p.id, &t.id).unwrap().unwrap();
        assert!(t.initiative_id.is_none());
        assert!(store.get_initiative(&p.id, &init.id).unwrap().is_none());
    }

    #[test]
    fn initiative_date_range_checked() {
        let (_dir, store, p) = setup();
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let err = store
            .create_initiative(
                &p.id,
                NewInitiative {
                    name: "bad".into(),
                    start_date: Some(d("2026-05-01")),
                    end_date: Some(d("2026-04-01")),
                    ..NewInitiative::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, KanbanError::InvalidDateRange { .. }));
    }

    #[test]
    fn task_with_unknown_initiative_rejected() {
        let (_dir, store, p) = setup();
        let err = store
            .create_task(
                &p.id,
                NewTask {
                    name: "a".into(),
                    initiative_id: Some("deadbeef".into()),
                    ..NewTask::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, KanbanError::InitiativeNotFound(_)));
    }

    #[test]
    fn search_and_views() {
        let (_dir, store, p) = setup();
        let a = new_task(&store, &p.id, "Implement login form", vec![]);
        new_task(&store, &p.id, "Billing export", vec![a.id.clone()]);

        let hits = store.search_tasks(&p.id, "login", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task_id, a.id);

        let board = store.board(&p.id).unwrap();
        assert_eq!(board.columns[0].tasks.len(), 2);
        let stats = store.project_stats(&p.id).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.blocked, 1);
        assert!(store.check_project(&p.id).unwrap().is_clean());
    }

    #[test]
    fn rebuild_index_recovers_drift() {
        let (dir, store, p) = setup();
        let t = new_task(&store, &p.id, "a", vec![]);
        std::fs::remove_file(paths::task_index_file(dir.path(), &p.id)).unwrap();
        assert!(store.list_tasks(&p.id, &TaskFilter::default()).unwrap().is_empty());
        assert_eq!(store.check_project(&p.id).unwrap().index_missing, vec![t.id.clone()]);

        store.rebuild_index(&p.id).unwrap();
        assert_eq!(store.list_tasks(&p.id, &TaskFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn log_activity_uses_store_actor() {
        let (_dir, store, p) = setup();
        store
            .log_activity(
                &p.id,
                ActivityEntry::new(ActivityType::Comment, "external note"),
            )
            .unwrap();
        let today = chrono::Utc::now().date_naive();
        let day = store.activity_for_date(&p.id, today).unwrap();
        let last = day.last().unwrap();
        assert_eq!(last.summary, "external note");
        assert_eq!(last.actor.as_deref(), Some("tester"));
    }

    #[test]
    fn delete_project_removes_everything() {
        let (dir, store, p) = setup();
        new_task(&store, &p.id, "a", vec![]);
        assert!(store.delete_project(&p.id).unwrap());
        assert!(!paths::project_dir(dir.path(), &p.id).exists());
    }
}
