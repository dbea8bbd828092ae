use crate::config::SwimlaneTemplate;
use crate::error::{KanbanError, Result};
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Swimlane
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swimlane {
    pub id: String,
    pub name: String,
    pub order: u32,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Swimlane {
    pub fn new(name: impl Into<String>, order: u32, is_complete: bool) -> Self {
        Self {
            id: paths::new_id(),
            name: name.into(),
            order,
            is_complete,
            color: None,
        }
    }
}

/// Lanes for a fresh project, numbered in template order.
pub fn from_templates(templates: &[SwimlaneTemplate]) -> Vec<Swimlane> {
    templates
        .iter()
        .enumerate()
        .map(|(i, t)| Swimlane {
            color: t.color.clone(),
            ..Swimlane::new(t.name.clone(), i as u32, t.is_complete)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Lanes of a project, sorted by `order`. A missing file means no lanes.
pub fn load(root: &Path, project_id: &str) -> Result<Vec<Swimlane>> {
    let mut lanes: Vec<Swimlane> =
        io::read_json(&paths::swimlanes_file(root, project_id))?.unwrap_or_default();
    sort(&mut lanes);
    Ok(lanes)
}

pub fn save(root: &Path, project_id: &str, lanes: &[Swimlane]) -> Result<()> {
    io::write_json(&paths::swimlanes_file(root, project_id), &lanes)
}

// ---------------------------------------------------------------------------
// List operations (operate on a mutable Vec<Swimlane>)
// ---------------------------------------------------------------------------

pub fn sort(lanes: &mut [Swimlane]) {
    lanes.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
}

pub fn find<'a>(lanes: &'a [Swimlane], key: &str) -> Option<&'a Swimlane> {
    lanes
        .iter()
        .find(|l| l.id == key)
        .or_else(|| lanes.iter().find(|l| l.name.eq_ignore_ascii_case(key)))
}

pub fn find_mut<'a>(lanes: &'a mut [Swimlane], key: &str) -> Result<&'a mut Swimlane> {
    let pos = lanes
        .iter()
        .position(|l| l.id == key)
        .or_else(|| lanes.iter().position(|l| l.name.eq_ignore_ascii_case(key)))
        .ok_or_else(|| KanbanError::SwimlaneNotFound(key.to_string()))?;
    Ok(&mut lanes[pos])
}

/// Fail if another lane (other than `except_id`) already uses `name`.
pub fn ensure_unique_name(lanes: &[Swimlane], name: &str, except_id: Option<&str>) -> Result<()> {
    let clash = lanes
        .iter()
        .any(|l| l.name.eq_ignore_ascii_case(name) && Some(l.id.as_str()) != except_id);
    if clash {
        return Err(KanbanError::SwimlaneExists(name.to_string()));
    }
    Ok(())
}

/// Append a lane. Without an explicit order it goes after the last lane.
pub fn add(
    lanes: &mut Vec<Swimlane>,
    name: &str,
    order: Option<u32>,
    is_complete: bool,
    color: Option<String>,
) -> Result<Swimlane> {
    ensure_unique_name(lanes, name, None)?;
    let order = order.unwrap_or_else(|| {
        lanes
            .iter()
            .map(|l| l.order.saturating_add(1))
            .max()
            .unwrap_or(0)
    });
    let lane = Swimlane {
        color,
        ..Swimlane::new(name, order, is_complete)
    };
    lanes.push(lane.clone());
    sort(lanes);
    Ok(lane)
}

/// The lane new tasks land in when none is given.
pub fn default_lane(lanes: &[Swimlane]) -> Option<&Swimlane> {
    lanes.iter().min_by_key(|l| l.order)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
