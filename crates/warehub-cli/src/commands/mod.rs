//! CLI commands

pub mod add;
pub mod generate;
pub mod github;
pub mod list;
pub mod remove;
pub mod sync;
