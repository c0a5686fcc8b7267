//! warehub - a static PEP503 package index built from GitHub releases

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use warehub_core::FILES_DIR;
use warehub_repo::sync::DEFAULT_JOBS;
use warehub_repo::{DEFAULT_STORE_FILE, FetchOptions, RetryPolicy};

mod commands;
mod display;
mod error;
mod exit_codes;
mod logging;

use error::Result;

#[derive(Parser)]
#[command(name = "warehub")]
#[command(author = "Warehub Contributors")]
#[command(version)]
#[command(about = "Static PEP503 package index generated from GitHub releases", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Registry store file
    #[arg(long, global = true, env = "WAREHUB_STORE", default_value = DEFAULT_STORE_FILE)]
    store: PathBuf,

    /// Site configuration file
    #[arg(long, global = true, env = "WAREHUB_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Directory the site is generated into
    #[arg(long, global = true, env = "WAREHUB_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Timeout for each network request, in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Attempts per request when rate limited
    #[arg(long, global = true, default_value_t = 4,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a repository
    Add {
        /// Repository (owner/name)
        repository: Option<String>,

        /// API root of the repository host
        #[arg(short, long)]
        domain: Option<String>,

        /// Username or %%SECRET%% placeholder
        #[arg(short, long)]
        username: Option<String>,

        /// Password, token or %%SECRET%% placeholder
        #[arg(short, long)]
        password: Option<String>,

        /// Package name, instead of one derived from the repository
        #[arg(long)]
        name: Option<String>,

        /// Read an addition request from a file (`-` for stdin)
        #[arg(long, value_name = "FILE")]
        request: Option<String>,
    },

    /// Track the repository requested by the issue in GITHUB_CONTEXT
    Github {
        /// GitHub Actions context as JSON
        #[arg(long, env = "GITHUB_CONTEXT", hide_env_values = true)]
        context: String,
    },

    /// Stop tracking a repository
    Remove {
        /// Repository (owner/name)
        repository: String,
    },

    /// List tracked repositories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch releases, update the store and regenerate the site
    Sync {
        /// Repositories fetched concurrently
        #[arg(short, long, default_value_t = DEFAULT_JOBS)]
        jobs: usize,

        /// Update the store only
        #[arg(long)]
        skip_generate: bool,

        /// Link installers to the upstream release assets instead of
        /// copying them into the site's files/ directory
        #[arg(long)]
        no_mirror: bool,
    },

    /// Regenerate the site from the stored data, without fetching
    Generate,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also arrive here
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    logging::init(cli.debug);

    match run(cli).await {
        Ok(exit_codes::SUCCESS) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(err) if err.exit_code() == exit_codes::ERROR => Err(err.into()),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Add {
            repository,
            domain,
            username,
            password,
            name,
            request,
        } => commands::add::run(
            &cli.store,
            commands::add::AddArgs {
                repository,
                domain,
                username,
                password,
                name,
                request,
            },
        )?,

        Commands::Github { context } => commands::github::run(&cli.store, &context)?,

        Commands::Remove { repository } => commands::remove::run(&cli.store, &repository)?,

        Commands::List { json } => commands::list::run(&cli.store, json)?,

        Commands::Sync {
            jobs,
            skip_generate,
            no_mirror,
        } => {
            let fetch = FetchOptions {
                timeout: Duration::from_secs(cli.timeout),
                retry: RetryPolicy::default().with_max_attempts(cli.max_attempts),
                mirror: (!no_mirror).then(|| cli.output.join(FILES_DIR)),
                ..FetchOptions::default()
            };
            let summary = commands::sync::run(commands::sync::SyncArgs {
                store: &cli.store,
                config: &cli.config,
                output: &cli.output,
                fetch,
                jobs,
                skip_generate,
            })
            .await?;

            if summary.is_partial() {
                return Ok(exit_codes::PARTIAL_FAILURE);
            }
        }

        Commands::Generate => commands::generate::run(&cli.store, &cli.config, &cli.output)?,
    }

    Ok(exit_codes::SUCCESS)
}

