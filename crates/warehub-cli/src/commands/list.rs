//! List command - tracked repositories and their published packages

use console::style;
use serde::Serialize;
use std::path::Path;
use warehub_engine::filters::filesize;
use warehub_repo::Registry;

use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
struct Entry<'a> {
    repository: &'a str,
    domain: &'a str,
    package: String,
    latest: Option<&'a str>,
    releases: usize,
    files: usize,
    size: u64,
}

/// Run the list command
pub fn run(store_path: &Path, output_json: bool) -> Result<()> {
    let registry = Registry::load(store_path)?;

    let entries: Vec<Entry<'_>> = registry
        .repositories
        .iter()
        .map(|repo| {
            let package = repo.package_name();
            let record = registry.packages.get(&package);
            Entry {
                repository: &repo.path,
                domain: &repo.domain,
                latest: record
                    .and_then(|r| r.latest_release())
                    .map(|r| r.version.as_str()),
                releases: record.map_or(0, |r| r.releases.len()),
                files: record.map_or(0, |r| r.assets().count()),
                size: record.map_or(0, |r| r.total_size()),
                package,
            }
        })
        .collect();

    if output_json {
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No repositories tracked. Add one with `warehub add owner/name`");
        return Ok(());
    }

    println!(
        "{:<36} {:<28} {:<12} {:>6} {:>10}",
        style("REPOSITORY").bold(),
        style("PACKAGE").bold(),
        style("LATEST").bold(),
        style("FILES").bold(),
        style("SIZE").bold()
    );

    for entry in &entries {
        let latest = match entry.latest {
            Some(version) => style(version.to_string()).green(),
            None => style("-".to_string()).dim(),
        };
        println!(
            "{:<36} {:<28} {:<12} {:>6} {:>10}",
            entry.repository,
            entry.package,
            latest,
            entry.files,
            filesize(entry.size)
        );
    }

    Ok(())
}
