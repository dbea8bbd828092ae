pub mod activity;
pub mod board;
pub mod config;
pub mod initiative;
pub mod project;
pub mod search;
pub mod swimlane;
pub mod task;
