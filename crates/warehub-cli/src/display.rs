//! Display formatting for CLI output

use console::style;
use warehub_engine::GeneratedSite;
use warehub_repo::RunSummary;
use warehub_repo::sync::RepoFailure;

/// Print the per-repository outcome of a sync run
pub fn print_summary(summary: &RunSummary) {
    for success in &summary.succeeded {
        println!(
            "  {} {} {} ({} release(s), {} file(s))",
            style("✓").green().bold(),
            success.repository,
            style(format!("→ {}", success.package)).dim(),
            success.releases,
            success.files
        );
    }
    for skipped in &summary.skipped {
        print_failure(&style("-").yellow().bold().to_string(), skipped);
    }
    for failed in &summary.failed {
        print_failure(&style("✗").red().bold().to_string(), failed);
    }

    println!();
    let counts = format!(
        "{} succeeded, {} skipped, {} failed",
        summary.succeeded.len(),
        summary.skipped.len(),
        summary.failed.len()
    );
    if summary.is_partial() {
        println!("{} {}", style("Partial sync:").yellow().bold(), counts);
    } else {
        println!("{} {}", style("Sync complete:").green().bold(), counts);
    }
}

fn print_failure(marker: &str, failure: &RepoFailure) {
    println!("  {} {}: {}", marker, failure.repository, failure.reason);
    if failure.kept_previous {
        println!("      {}", style("previous release data kept").dim());
    }
}

pub fn print_generated(site: &GeneratedSite) {
    println!(
        "{} {} package(s), {} page(s) in {}",
        style("Generated").green().bold(),
        site.packages,
        site.files,
        site.root.display()
    );
    if site.mirrored > 0 {
        println!("  {} distribution file(s) served from files/", site.mirrored);
    }
}
