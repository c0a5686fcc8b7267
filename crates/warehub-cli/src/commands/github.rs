//! GitHub command - add the repository requested by an issue
//!
//! Meant for an Actions workflow triggered by an issue, with
//! `GITHUB_CONTEXT: ${{ toJSON(github) }}` in its environment.

use std::path::Path;
use warehub_core::AdditionRequest;
use warehub_repo::RegistryStore;

use crate::commands::add;
use crate::error::Result;

pub fn run(store_path: &Path, context: &str) -> Result<()> {
    let repository = AdditionRequest::from_github_context(context)?.into_repository()?;

    let mut store = RegistryStore::open(store_path)?;
    let outcome = store.upsert(repository.clone())?;
    add::report(&repository, outcome);
    Ok(())
}
