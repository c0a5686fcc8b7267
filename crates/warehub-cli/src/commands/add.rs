//! Add command - start tracking a repository

use console::style;
use std::io::Read;
use std::path::Path;
use warehub_core::{AdditionRequest, TrackedRepository};
use warehub_repo::{RegistryStore, UpsertOutcome};

use crate::error::{CliError, Result};

/// Fields given on the command line; each overrides the request file
#[derive(Debug, Default)]
pub struct AddArgs {
    pub repository: Option<String>,
    pub domain: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    /// Request document, `-` for stdin
    pub request: Option<String>,
}

pub fn run(store_path: &Path, args: AddArgs) -> Result<()> {
    let mut request = match args.request.as_deref() {
        Some("-") => {
            let mut body = String::new();
            std::io::stdin().read_to_string(&mut body)?;
            AdditionRequest::parse(&body)
        }
        Some(path) => AdditionRequest::parse(&std::fs::read_to_string(path)?),
        None => AdditionRequest::default(),
    };

    request.repository = args.repository.or(request.repository);
    request.domain = args.domain.or(request.domain);
    request.username = args.username.or(request.username);
    request.password = args.password.or(request.password);
    request.name = args.name.or(request.name);

    if request.repository.is_none() {
        return Err(CliError::usage(
            "No repository given",
            "Pass owner/name, or a request with a '- **Repository:**' line via --request",
        ));
    }

    let repository = request.into_repository()?;
    let mut store = RegistryStore::open(store_path)?;
    let outcome = store.upsert(repository.clone())?;
    report(&repository, outcome);
    Ok(())
}

/// Print what an upsert did
pub fn report(repository: &TrackedRepository, outcome: UpsertOutcome) {
    match outcome {
        UpsertOutcome::Added => println!(
            "{} {} as {}",
            style("Added").green().bold(),
            repository.path,
            style(repository.package_name()).cyan()
        ),
        UpsertOutcome::Updated => println!(
            "{} credentials for {}",
            style("Updated").green().bold(),
            repository.path
        ),
        UpsertOutcome::Unchanged => println!(
            "{} {} is already tracked",
            style("Unchanged").dim(),
            repository.path
        ),
    }
}
