//! Sync command - fetch every tracked repository, store, regenerate

use console::style;
use std::future::Future;
use std::path::Path;
use warehub_core::{IndexConfig, SecretsMap};
use warehub_engine::SiteGenerator;
use warehub_repo::{FetchOptions, RegistryStore, RunSummary, SyncContext, sync};

use crate::display;
use crate::error::Result;

pub struct SyncArgs<'a> {
    pub store: &'a Path,
    pub config: &'a Path,
    pub output: &'a Path,
    pub fetch: FetchOptions,
    pub jobs: usize,
    pub skip_generate: bool,
}

/// Run the sync command. Per-repository failures are reported in the
/// returned summary, not as an error.
pub async fn run(args: SyncArgs<'_>) -> Result<RunSummary> {
    // Fail on a bad config before spending time on the network
    let generator = if args.skip_generate {
        None
    } else {
        Some(SiteGenerator::new(&IndexConfig::load_from(args.config)?)?)
    };

    let secrets = SecretsMap::from_env()?;
    let mut store = RegistryStore::open(args.store)?;
    let context = SyncContext::new(secrets, args.fetch).with_jobs(args.jobs);

    println!(
        "{} {} repositor{}",
        style("Syncing").cyan().bold(),
        store.list_all().len(),
        if store.list_all().len() == 1 { "y" } else { "ies" }
    );

    let summary = sync::run(&mut store, &context, cancel_on(tokio::signal::ctrl_c())).await?;

    display::print_summary(&summary);

    if let Some(generator) = generator {
        let site = generator.generate(store.snapshot(), args.output)?;
        display::print_generated(&site);
    }

    Ok(summary)
}

/// Resolves when `signal` fires. A signal listener that cannot be installed
/// never resolves, so the run continues uncancellable rather than stopping.
async fn cancel_on(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(err) = signal.await {
        tracing::warn!(error = %err, "cannot listen for Ctrl-C, the run cannot be interrupted");
        std::future::pending::<()>().await;
    }
}
