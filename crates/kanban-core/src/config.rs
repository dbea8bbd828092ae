use crate::error::Result;
use crate::paths;
use crate::types::Priority;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SwimlaneTemplate
// ---------------------------------------------------------------------------

/// A lane every new project starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimlaneTemplate {
    pub name: String,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SwimlaneTemplate {
    fn new(name: &str, is_complete: bool) -> Self {
        Self {
            name: name.to_string(),
            is_complete,
            color: None,
        }
    }
}

fn default_swimlanes() -> Vec<SwimlaneTemplate> {
    vec![
        SwimlaneTemplate::new("To Do", false),
        SwimlaneTemplate::new("In Progress", false),
        SwimlaneTemplate::new("Done", true),
    ]
}

fn default_activity_limit() -> usize {
    50
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_swimlanes")]
    pub default_swimlanes: Vec<SwimlaneTemplate>,
    #[serde(default)]
    pub default_priority: Priority,
    #[serde(default = "default_activity_limit")]
    pub activity_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_swimlanes: default_swimlanes(),
            default_priority: Priority::default(),
            activity_limit: default_activity_limit(),
        }
    }
}

impl Config {
    /// Load `<root>/config.yaml`, falling back to defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.default_swimlanes.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "default_swimlanes is empty: new projects would have no lanes"
                    .to_string(),
            });
        } else if !self.default_swimlanes.iter().any(|l| l.is_complete) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no default swimlane has is_complete: dependent tasks can never unblock"
                    .to_string(),
            });
        }

        let mut seen = HashSet::new();
        for lane in &self.default_swimlanes {
            if lane.name.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "default_swimlanes contains a lane with an empty name".to_string(),
                });
                continue;
            }
            if !seen.insert(lane.name.to_lowercase()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "duplicate swimlane name '{}' in default_swimlanes",
                        lane.name
                    ),
                });
            }
        }

        if self.activity_limit == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "activity_limit is 0: activity queries return nothing by default"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
