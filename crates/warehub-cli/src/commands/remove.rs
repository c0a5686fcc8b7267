//! Remove command - stop tracking a repository

use console::style;
use std::path::Path;
use warehub_repo::RegistryStore;

use crate::error::Result;

pub fn run(store_path: &Path, repository: &str) -> Result<()> {
    let mut store = RegistryStore::open(store_path)?;
    let removed = store.remove(repository)?;

    println!("{} {}", style("Removed").green().bold(), removed.path);
    println!(
        "{}",
        style("Run `warehub generate` or `warehub sync` to update the site").dim()
    );
    Ok(())
}
