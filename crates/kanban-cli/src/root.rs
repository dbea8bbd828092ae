use anyhow::Context as _;
use kanban_core::{paths, KanbanStore};
use std::path::PathBuf;

/// Global flags every command needs to reach the store.
pub struct Context {
    pub data_dir: Option<PathBuf>,
    pub actor: Option<String>,
}

impl Context {
    /// The storage root: `--data-dir` / `WICKED_KANBAN_DATA_DIR`, else the
    /// default under the home directory.
    pub fn root(&self) -> anyhow::Result<PathBuf> {
        paths::resolve_data_dir(self.data_dir.as_deref()).context("cannot resolve data directory")
    }

    pub fn open(&self) -> anyhow::Result<KanbanStore> {
        let root = self.root()?;
        let store = KanbanStore::open(&root)
            .with_context(|| format!("failed to open store at {}", root.display()))?;
        Ok(store.with_actor(self.actor.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_data_dir_wins() {
        let dir = TempDir::new().unwrap();
        let ctx = Context {
            data_dir: Some(dir.path().to_path_buf()),
            actor: None,
        };
        assert_eq!(ctx.root().unwrap(), dir.path());
    }

    #[test]
    fn open_creates_projects_dir() {
        let dir = TempDir::new().unwrap();
        let ctx = Context {
            data_dir: Some(dir.path().join("store")),
            actor: Some("ci".into()),
        };
        ctx.open().unwrap();
        assert!(dir.path().join("store/projects").is_dir());
    }
}
