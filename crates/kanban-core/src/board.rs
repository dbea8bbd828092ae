use crate::dependency::DependencyGraph;
use crate::index::{IndexEntry, TaskIndex};
use crate::initiative::Initiative;
use crate::swimlane::Swimlane;
use crate::task::Task;
use crate::types::Priority;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Card {
    #[serde(flatten)]
    pub task: IndexEntry,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    #[serde(flatten)]
    pub lane: Swimlane,
    pub tasks: Vec<Card>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub project_id: String,
    pub columns: Vec<Column>,
    /// Tasks whose swimlane id matches no lane.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unplaced: Vec<Card>,
}

impl Board {
    pub fn build(project_id: &str, lanes: &[Swimlane], index: &TaskIndex) -> Self {
        let graph = DependencyGraph::new(index, lanes);
        let card = |t: &IndexEntry| {
            let blocked_by: Vec<String> = graph
                .blockers(&t.depends_on)
                .into_iter()
                .map(|b| b.id.clone())
                .collect();
            Card {
                task: t.clone(),
                blocked: !blocked_by.is_empty(),
                blocked_by,
            }
        };

        let mut entries = index.entries();
        entries.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let columns = lanes
            .iter()
            .map(|lane| Column {
                lane: lane.clone(),
                tasks: entries
                    .iter()
                    .filter(|t| t.swimlane == lane.id)
                    .map(|t| card(t))
                    .collect(),
            })
            .collect();

        let lane_ids: HashSet<&str> = lanes.iter().map(|l| l.id.as_str()).collect();
        let unplaced = entries
            .iter()
            .filter(|t| !lane_ids.contains(t.swimlane.as_str()))
            .map(|t| card(t))
            .collect();

        Self {
            project_id: project_id.to_string(),
            columns,
            unplaced,
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub project_id: String,
    pub total: usize,
    pub completed: usize,
    pub blocked: usize,
    /// `completed / total`, 0.0 for an empty project.
    pub completion: f64,
    pub by_swimlane: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
}

impl ProjectStats {
    pub fn compute(project_id: &str, lanes: &[Swimlane], index: &TaskIndex) -> Self {
        let graph = DependencyGraph::new(index, lanes);

        let mut by_swimlane: BTreeMap<String, usize> =
            lanes.iter().map(|l| (l.name.clone(), 0)).collect();
        let mut by_priority: BTreeMap<String, usize> = Priority::all()
            .iter()
            .map(|p| (p.to_string(), 0))
            .collect();

        let mut completed = 0usize;
        for t in index.tasks.values() {
            let lane = lanes.iter().find(|l| l.id == t.swimlane);
            let lane_name = lane.map(|l| l.name.clone()).unwrap_or_else(|| t.swimlane.clone());
            *by_swimlane.entry(lane_name).or_insert(0) += 1;
            *by_priority.entry(t.priority.to_string()).or_insert(0) += 1;
            if graph.is_complete(&t.id) {
                completed += 1;
            }
        }

        let total = index.tasks.len();
        let completion = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        };

        Self {
            project_id: project_id.to_string(),
            total,
            completed,
            blocked: graph.blocked_ids().len(),
            completion,
            by_swimlane,
            by_priority,
        }
    }
}

// ---------------------------------------------------------------------------
// CheckReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DanglingDependency {
    pub task_id: String,
    pub missing: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Misplaced {
    pub task_id: String,
    pub reference: String,
}

/// Consistency findings for one project. Nothing here is repaired automatically
/// except by `rebuild_index`, which fixes the index drift lists.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub dangling_dependencies: Vec<DanglingDependency>,
    pub unknown_swimlanes: Vec<Misplaced>,
    pub unknown_initiatives: Vec<Misplaced>,
    /// Task files with no index entry, or whose entry is out of date.
    pub index_missing: Vec<String>,
    /// Index entries with no task file.
    pub index_stale: Vec<String>,
}

impl CheckReport {
    pub fn run(
        lanes: &[Swimlane],
        index: &TaskIndex,
        tasks: &[Task],
        initiatives: &[Initiative],
    ) -> Self {
        let on_disk = TaskIndex::from_tasks(tasks);
        let graph = DependencyGraph::new(&on_disk, lanes);

        let dangling_dependencies = graph
            .dangling()
            .into_iter()
            .map(|(task_id, missing)| DanglingDependency {
                task_id: task_id.to_string(),
                missing: missing.to_string(),
            })
            .collect();

        let lane_ids: HashSet<&str> = lanes.iter().map(|l| l.id.as_str()).collect();
        let initiative_ids: HashSet<&str> = initiatives.iter().map(|i| i.id.as_str()).collect();

        let mut unknown_swimlanes = Vec::new();
        let mut unknown_initiatives = Vec::new();
        let mut index_missing = Vec::new();
        for t in tasks {
            if !lane_ids.contains(t.swimlane.as_str()) {
                unknown_swimlanes.push(Misplaced {
                    task_id: t.id.clone(),
                    reference: t.swimlane.clone(),
                });
            }
            if let Some(i) = &t.initiative_id {
                if !initiative_ids.contains(i.as_str()) {
                    unknown_initiatives.push(Misplaced {
                        task_id: t.id.clone(),
                        reference: i.clone(),
                    });
                }
            }
            if index.tasks.get(&t.id) != on_disk.tasks.get(&t.id) {
                index_missing.push(t.id.clone());
            }
        }

        let index_stale = index
            .tasks
            .keys()
            .filter(|id| !on_disk.tasks.contains_key(*id))
            .cloned()
            .collect();

        Self {
            dangling_dependencies,
            unknown_swimlanes,
            unknown_initiatives,
            index_missing,
            index_stale,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.dangling_dependencies.is_empty()
            && self.unknown_swimlanes.is_empty()
            && self.unknown_initiatives.is_empty()
            && self.index_missing.is_empty()
            && self.index_stale.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
