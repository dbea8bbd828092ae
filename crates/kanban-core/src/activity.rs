use crate::error::Result;
use crate::io;
use crate::paths;
use crate::types::ActivityType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

// ---------------------------------------------------------------------------
// ActivityEntry
// ---------------------------------------------------------------------------

/// One line of a project's daily activity journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl ActivityEntry {
    pub fn new(kind: ActivityType, summary: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            kind,
            task_id: None,
            actor: None,
            summary: summary.into(),
            data: Map::new(),
        }
    }

    pub fn task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn actor(mut self, actor: Option<String>) -> Self {
        self.actor = actor;
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Journal operations
// ---------------------------------------------------------------------------

/// Append `entry` to the journal file for the UTC date of `entry.ts`.
pub fn append(root: &Path, project_id: &str, entry: &ActivityEntry) -> Result<()> {
    let path = paths::activity_file(root, project_id, entry.ts.date_naive());
    let line = serde_json::to_string(entry)?;
    io::append_line_locked(&path, &line)
}

/// Entries for one day, oldest first. Lines that fail to parse are skipped.
pub fn read_day(root: &Path, project_id: &str, date: NaiveDate) -> Result<Vec<ActivityEntry>> {
    let path = paths::activity_file(root, project_id, date);
    let data = match std::fs::read_to_string(&path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    for (n, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ActivityEntry>(line) {
            Ok(e) => entries.push(e),
            Err(e) => {
                tracing::warn!(
                    file = %path.display(),
                    line = n + 1,
                    error = %e,
                    "skipping bad activity line"
                );
            }
        }
    }
    Ok(entries)
}

/// Dates that have a journal file, newest first.
pub fn dates(root: &Path, project_id: &str) -> Result<Vec<NaiveDate>> {
    let dir = paths::activity_dir(root, project_id);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut dates = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if let Some(stem) = name.strip_suffix(".jsonl") {
            if let Ok(d) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                dates.push(d);
            }
        }
    }
    dates.sort_unstable_by(|a, b| b.cmp(a));
    Ok(dates)
}

/// Up to `limit` entries across all days, newest first, optionally only those
/// about `task_id`.
pub fn recent(
    root: &Path,
    project_id: &str,
    limit: usize,
    task_id: Option<&str>,
) -> Result<Vec<ActivityEntry>> {
    let mut out = Vec::new();
    if limit == 0 {
        return Ok(out);
    }
    for date in dates(root, project_id)? {
        let mut day = read_day(root, project_id, date)?;
        day.sort_by(|a, b| b.ts.cmp(&a.ts));
        for entry in day {
            if task_id.is_some_and(|t| entry.task_id.as_deref() != Some(t)) {
                continue;
            }
            out.push(entry);
            if out.len() >= limit {
                return Ok(out);
            }
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
