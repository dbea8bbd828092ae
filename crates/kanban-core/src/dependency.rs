//! Blocking-status computation over a project's task dependencies.
//!
//! A task is blocked iff at least one task in its `depends_on` set exists and
//! sits in a swimlane whose `is_complete` is false. Ids that resolve to no task
//! are ignored; a lane id that resolves to no lane counts as incomplete.

use crate::index::{IndexEntry, TaskIndex};
use crate::swimlane::Swimlane;
use std::collections::{HashMap, HashSet};

pub struct DependencyGraph<'a> {
    tasks: &'a TaskIndex,
    complete_lanes: HashSet<&'a str>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(tasks: &'a TaskIndex, lanes: &'a [Swimlane]) -> Self {
        let complete_lanes = lanes
            .iter()
            .filter(|l| l.is_complete)
            .map(|l| l.id.as_str())
            .collect();
        Self {
            tasks,
            complete_lanes,
        }
    }

    pub fn is_complete(&self, task_id: &str) -> bool {
        self.tasks
            .tasks
            .get(task_id)
            .is_some_and(|t| self.complete_lanes.contains(t.swimlane.as_str()))
    }

    /// The dependencies of `depends_on` that currently block.
    pub fn blockers(&self, depends_on: &[String]) -> Vec<&'a IndexEntry> {
        let mut seen = HashSet::new();
        depends_on
            .iter()
            .filter(|d| seen.insert(d.as_str()))
            .filter_map(|d| self.tasks.tasks.get(d))
            .filter(|t| !self.complete_lanes.contains(t.swimlane.as_str()))
            .collect()
    }

    pub fn is_blocked(&self, depends_on: &[String]) -> bool {
        !self.blockers(depends_on).is_empty()
    }

    /// Ids of every indexed task that is currently blocked.
    pub fn blocked_ids(&self) -> Vec<&'a str> {
        self.tasks
            .entries()
            .into_iter()
            .filter(|t| self.is_blocked(&t.depends_on))
            .map(|t| t.id.as_str())
            .collect()
    }

    /// Whether adding `task -> depends_on` would close a cycle, i.e. `task` is
    /// already reachable from `depends_on`.
    pub fn would_cycle(&self, task: &str, depends_on: &str) -> bool {
        if task == depends_on {
            return true;
        }
        let edges: HashMap<&str, &[String]> = self
            .tasks
            .tasks
            .values()
            .map(|t| (t.id.as_str(), t.depends_on.as_slice()))
            .collect();

        let mut stack = vec![depends_on];
        let mut visited = HashSet::new();
        while let Some(cur) = stack.pop() {
            if cur == task {
                return true;
            }
            if !visited.insert(cur) {
                continue;
            }
            if let Some(next) = edges.get(cur) {
                stack.extend(next.iter().map(String::as_str));
            }
        }
        false
    }

    /// `(task, missing dependency)` pairs left behind by deletions.
    pub fn dangling(&self) -> Vec<(&'a str, &'a str)> {
        let mut out = Vec::new();
        for t in self.tasks.entries() {
            for d in &t.depends_on {
                if !self.tasks.tasks.contains_key(d) {
                    out.push((t.id.as_str(), d.as_str()));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::swimlane::from_templates;
    use crate::task::Task;
    use crate::types::Priority;

    struct Fixture {
        lanes: Vec<Swimlane>,
        index: TaskIndex,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                lanes: from_templates(&Config::default().default_swimlanes),
                index: TaskIndex::default(),
            }
        }

        fn lane(&self, name: &str) -> String {
            crate::swimlane::find(&self.lanes, name).unwrap().id.clone()
        }

        fn task(&mut self, id: &str, lane: &str, deps: &[&str]) {
            let mut t = Task::new(id, self.lane(lane), Priority::P2);
            t.id = id.to_string();
            t.depends_on = deps.iter().map(|d| d.to_string()).collect();
            self.index.upsert(&t);
        }
    }

    #[test]
    fn blocked_when_dependency_in_incomplete_lane() {
        let mut f = Fixture::new();
        f.task("a", "In Progress", &[]);
        f.task("b", "To Do", &["a"]);
        let g = DependencyGraph::new(&f.index, &f.lanes);
        assert!(g.is_blocked(&["a".to_string()]));
        assert_eq!(g.blocked_ids(), vec!["b"]);
    }

    #[test]
    fn unblocked_when_all_dependencies_complete() {
        let mut f = Fixture::new();
        f.task("a", "Done", &[]);
        f.task("c", "Done", &[]);
        f.task("b", "To Do", &["a", "c"]);
        let g = DependencyGraph::new(&f.index, &f.lanes);
        assert!(!g.is_blocked(&["a".to_string(), "c".to_string()]));
        assert!(g.blocked_ids().is_empty());
        assert!(g.is_complete("a"));
    }

    #[test]
    fn missing_dependency_does_not_block() {
        let mut f = Fixture::new();
        f.task("b", "To Do", &["gone"]);
        let g = DependencyGraph::new(&f.index, &f.lanes);
        assert!(g.blocked_ids().is_empty());
        assert_eq!(g.dangling(), vec![("b", "gone")]);
    }

    #[test]
    fn unknown_lane_counts_as_incomplete() {
        let mut f = Fixture::new();
        f.task("b", "To Do", &["a"]);
        let mut a = Task::new("a", "no-such-lane", Priority::P2);
        a.id = "a".into();
        f.index.upsert(&a);
        let g = DependencyGraph::new(&f.index, &f.lanes);
        assert!(g.is_blocked(&["a".to_string()]));
    }

    #[test]
    fn duplicate_dependencies_reported_once() {
        let mut f = Fixture::new();
        f.task("a", "To Do", &[]);
        let g = DependencyGraph::new(&f.index, &f.lanes);
        assert_eq!(g.blockers(&["a".to_string(), "a".to_string()]).len(), 1);
    }

    #[test]
    fn cycle_detection() {
        let mut f = Fixture::new();
        f.task("a", "To Do", &[]);
        f.task("b", "To Do", &["a"]);
        f.task("c", "To Do", &["b"]);
        let g = DependencyGraph::new(&f.index, &f.lanes);
        // a -> c would close a -> c -> b -> a
        assert!(g.would_cycle("a", "c"));
        assert!(g.would_cycle("a", "a"));
        assert!(!g.would_cycle("c", "a"));
    }
}
