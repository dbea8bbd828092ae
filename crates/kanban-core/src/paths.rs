use crate::error::{KanbanError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DATA_DIR_ENV: &str = "WICKED_KANBAN_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = ".something-wicked/wicked-kanban";

pub const PROJECTS_DIR: &str = "projects";
pub const TASKS_DIR: &str = "tasks";
pub const INITIATIVES_DIR: &str = "initiatives";
pub const ACTIVITY_DIR: &str = "activity";

pub const CONFIG_FILE: &str = "config.yaml";
pub const PROJECT_FILE: &str = "project.json";
pub const SWIMLANES_FILE: &str = "swimlanes.json";
pub const INDEX_FILE: &str = "index.json";

// ---------------------------------------------------------------------------
// Root resolution
// ---------------------------------------------------------------------------

/// Resolve the storage root.
///
/// Priority:
/// 1. `explicit` (the `--data-dir` flag)
/// 2. `WICKED_KANBAN_DATA_DIR`
/// 3. `~/.something-wicked/wicked-kanban`
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    if let Some(v) = std::env::var_os(DATA_DIR_ENV) {
        if !v.is_empty() {
            return Ok(PathBuf::from(v));
        }
    }
    let home = home::home_dir().ok_or(KanbanError::HomeNotFound)?;
    Ok(home.join(DEFAULT_DATA_DIR))
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn projects_dir(root: &Path) -> PathBuf {
    root.join(PROJECTS_DIR)
}

pub fn project_dir(root: &Path, project_id: &str) -> PathBuf {
    projects_dir(root).join(project_id)
}

pub fn project_file(root: &Path, project_id: &str) -> PathBuf {
    project_dir(root, project_id).join(PROJECT_FILE)
}

pub fn swimlanes_file(root: &Path, project_id: &str) -> PathBuf {
    project_dir(root, project_id).join(SWIMLANES_FILE)
}

pub fn tasks_dir(root: &Path, project_id: &str) -> PathBuf {
    project_dir(root, project_id).join(TASKS_DIR)
}

pub fn task_file(root: &Path, project_id: &str, task_id: &str) -> PathBuf {
    tasks_dir(root, project_id).join(format!("{task_id}.json"))
}

pub fn task_index_file(root: &Path, project_id: &str) -> PathBuf {
    tasks_dir(root, project_id).join(INDEX_FILE)
}

pub fn initiatives_dir(root: &Path, project_id: &str) -> PathBuf {
    project_dir(root, project_id).join(INITIATIVES_DIR)
}

pub fn initiative_file(root: &Path, project_id: &str, initiative_id: &str) -> PathBuf {
    initiatives_dir(root, project_id).join(format!("{initiative_id}.json"))
}

pub fn activity_dir(root: &Path, project_id: &str) -> PathBuf {
    project_dir(root, project_id).join(ACTIVITY_DIR)
}

pub fn activity_file(root: &Path, project_id: &str, date: NaiveDate) -> PathBuf {
    activity_dir(root, project_id).join(format!("{}.jsonl", date.format("%Y-%m-%d")))
}

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_\-]{0,63}$").unwrap())
}

/// Reject anything that could escape the storage root when joined onto a path.
pub fn validate_id(id: &str) -> Result<()> {
    if !id_re().is_match(id) {
        return Err(KanbanError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Short random id: the first 8 hex characters of a v4 UUID.
pub fn new_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        for id in ["a1b2c3d4", "x", "my-project", "task_01"] {
            validate_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_ids() {
        for id in ["", "../etc", "-dash", "UPPER", "has space", "a/b", "index.json"] {
            assert!(validate_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn new_id_is_short_hex() {
        let id = new_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        validate_id(&id).unwrap();
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn explicit_root_wins() {
        let p = Path::new("/tmp/kanban-root");
        assert_eq!(resolve_data_dir(Some(p)).unwrap(), PathBuf::from("/tmp/kanban-root"));
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/data");
        assert_eq!(
            project_file(root, "p1"),
            PathBuf::from("/data/projects/p1/project.json")
        );
        assert_eq!(
            task_index_file(root, "p1"),
            PathBuf::from("/data/projects/p1/tasks/index.json")
        );
        assert_eq!(
            initiative_file(root, "p1", "i1"),
            PathBuf::from("/data/projects/p1/initiatives/i1.json")
        );
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(
            activity_file(root, "p1", date),
            PathBuf::from("/data/projects/p1/activity/2026-03-07.jsonl")
        );
    }
}
