pub mod activity;
pub mod board;
pub mod comment;
pub mod config;
pub mod dependency;
pub mod error;
pub mod index;
pub mod initiative;
pub mod io;
pub mod paths;
pub mod project;
pub mod search;
pub mod store;
pub mod swimlane;
pub mod task;
pub mod types;

pub use error::{KanbanError, Result};
pub use store::KanbanStore;
