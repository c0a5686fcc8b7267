//! Warehub Engine - static site generation
//!
//! Turns a package snapshot into a directory pip can use as an index:
//! the PEP503 `simple/` tree, human-readable project pages, and a
//! Warehouse-style JSON API. Pages are MiniJinja templates compiled into
//! the crate.

pub mod error;
pub mod filters;
pub mod json_api;
pub mod renderer;
pub mod site;

pub use error::{EngineError, Result};
pub use renderer::{PageRenderer, ProjectView};
pub use site::{GeneratedSite, SiteGenerator};
