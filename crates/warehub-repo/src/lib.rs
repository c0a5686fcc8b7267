//! Warehub Repository Layer
//!
//! This crate turns tracked GitHub repositories into package records:
//!
//! - **Fetching**: paged release listings with rate-limit backoff
//! - **Building**: distribution classification, signatures, digests and core
//!   metadata, optionally mirroring every file locally
//! - **Storing**: a locked JSON registry written atomically
//! - **Syncing**: bounded-concurrency runs with per-repository failure isolation
//!
//! ## Example
//!
//! ```rust,no_run
//! use warehub_repo::{FetchOptions, RegistryStore, SyncContext, sync};
//! use warehub_core::SecretsMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = RegistryStore::open("warehub.json")?;
//! let context = SyncContext::new(SecretsMap::from_env()?, FetchOptions::default());
//!
//! let summary = sync::run(&mut store, &context, async {
//!     // Without a signal handler the run is not cancellable
//!     if tokio::signal::ctrl_c().await.is_err() {
//!         std::future::pending::<()>().await;
//!     }
//! })
//! .await?;
//! println!("{} packages", summary.succeeded.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Notes
//!
//! - Credentials are only sent to the repository's own API origin, never
//!   after a cross-origin redirect
//! - Resolved secrets are redacted from `Debug` output

pub mod archive;
pub mod builder;
pub mod credentials;
pub mod digest;
pub mod error;
pub mod github;
pub mod http;
pub mod lock;
pub mod retry;
pub mod store;
pub mod sync;

pub use builder::{PackageBuilder, check_unique_names, merge_records};
pub use credentials::{ResolvedCredentials, ScopedCredentials};
pub use error::{RepoError, Result};
pub use github::{FetchOptions, Release, ReleaseFetcher, order_releases};
pub use http::SecureHttpClient;
pub use lock::StoreLock;
pub use retry::RetryPolicy;
pub use store::{DEFAULT_STORE_FILE, Registry, RegistryStore, UpsertOutcome};
pub use sync::{RunSummary, SyncContext};
