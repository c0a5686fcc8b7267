//! Generate command - rebuild the site from the stored snapshot

use std::path::Path;
use warehub_core::IndexConfig;
use warehub_engine::SiteGenerator;
use warehub_repo::Registry;

use crate::display;
use crate::error::Result;

pub fn run(store_path: &Path, config_path: &Path, output: &Path) -> Result<()> {
    let config = IndexConfig::load_from(config_path)?;
    let registry = Registry::load(store_path)?;

    let site = SiteGenerator::new(&config)?.generate(&registry.packages, output)?;
    display::print_generated(&site);
    Ok(())
}
