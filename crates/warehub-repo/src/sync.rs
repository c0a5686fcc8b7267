//! One synchronisation run: fetch every tracked repository, merge, store

use futures::stream::{self, StreamExt};
use std::future::Future;
use warehub_core::{PackageRecord, SecretsMap, Snapshot, TrackedRepository};

use crate::builder::{PackageBuilder, check_unique_names, merge_records};
use crate::credentials::ResolvedCredentials;
use crate::error::{RepoError, Result};
use crate::github::{FetchOptions, ReleaseFetcher};
use crate::store::RegistryStore;

/// Concurrent repository fetches used when none is given
pub const DEFAULT_JOBS: usize = 4;

/// Everything a run needs, loaded once and passed by reference
#[derive(Debug)]
pub struct SyncContext {
    pub secrets: SecretsMap,
    pub fetch: FetchOptions,
    /// Repositories fetched concurrently
    pub jobs: usize,
}

impl SyncContext {
    pub fn new(secrets: SecretsMap, fetch: FetchOptions) -> Self {
        Self {
            secrets,
            fetch,
            jobs: DEFAULT_JOBS,
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

/// A repository whose fetch did not produce a fresh record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFailure {
    pub repository: String,
    pub reason: String,
    /// A record from an earlier run is still published
    pub kept_previous: bool,
}

/// A repository fetched this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSuccess {
    pub repository: String,
    pub package: String,
    pub releases: usize,
    pub files: usize,
}

/// Per-repository outcomes of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: Vec<RepoSuccess>,
    /// Repositories the host no longer knows
    pub skipped: Vec<RepoFailure>,
    pub failed: Vec<RepoFailure>,
}

impl RunSummary {
    /// Some repositories were skipped or failed
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty() || !self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }
}

/// Fetch releases for one repository and build its record
pub async fn fetch_repository(repository: &TrackedRepository, context: &SyncContext) -> Result<PackageRecord> {
    let credentials = ResolvedCredentials::resolve(&repository.credentials, &context.secrets)?;
    let fetcher = ReleaseFetcher::new(repository.clone(), credentials, &context.fetch)?;
    let releases = fetcher.fetch_all().await?;

    let builder = PackageBuilder::new(fetcher.client(), &context.fetch);
    Ok(builder.build(repository, releases).await)
}

/// Fetch every repository, at most `context.jobs` at a time. Results come
/// back in input order.
pub async fn fetch_all(
    repositories: &[TrackedRepository],
    context: &SyncContext,
) -> Vec<(TrackedRepository, Result<PackageRecord>)> {
    let mut results: Vec<(usize, Result<PackageRecord>)> = stream::iter(repositories.iter().enumerate())
        .map(|(i, repository)| async move { (i, fetch_repository(repository, context).await) })
        .buffer_unordered(context.jobs.max(1))
        .collect()
        .await;

    results.sort_by_key(|(i, _)| *i);
    results
        .into_iter()
        .map(|(i, result)| (repositories[i].clone(), result))
        .collect()
}

/// Merge fetch results into a snapshot.
///
/// Repositories that failed keep their record from `previous`, so a
/// transient error does not unpublish a package. Run-fatal errors abort.
pub fn merge_results(
    results: Vec<(TrackedRepository, Result<PackageRecord>)>,
    previous: &Snapshot,
) -> Result<(Snapshot, RunSummary)> {
    let mut summary = RunSummary::default();
    let mut records = Vec::with_capacity(results.len());

    for (repository, result) in results {
        let err = match result {
            Ok(record) => {
                summary.succeeded.push(RepoSuccess {
                    repository: repository.path.clone(),
                    package: record.name.clone(),
                    releases: record.releases.len(),
                    files: record.assets().count(),
                });
                records.push(record);
                continue;
            }
            Err(err) if err.is_run_fatal() => return Err(err),
            Err(err) => err,
        };

        let kept = previous
            .values()
            .find(|r| r.repository == repository.path)
            .cloned();
        let failure = RepoFailure {
            repository: repository.path.clone(),
            reason: err.to_string(),
            kept_previous: kept.is_some(),
        };
        records.extend(kept);

        if matches!(err, RepoError::RepositoryNotFound { .. }) {
            tracing::warn!(repository = %repository.path, "repository not found, skipped");
            summary.skipped.push(failure);
        } else {
            tracing::warn!(repository = %repository.path, error = %err, "repository failed");
            summary.failed.push(failure);
        }
    }

    let snapshot = merge_records(records)?;
    Ok((snapshot, summary))
}

/// Run a full sync against an open store.
///
/// `cancel` resolving during the fetch phase aborts the run with
/// `Cancelled` before anything is written.
pub async fn run(
    store: &mut RegistryStore,
    context: &SyncContext,
    cancel: impl Future<Output = ()>,
) -> Result<RunSummary> {
    let repositories = store.list_all().to_vec();
    check_unique_names(&repositories)?;

    tracing::info!(
        repositories = repositories.len(),
        jobs = context.jobs,
        "starting sync"
    );

    let results = tokio::select! {
        results = fetch_all(&repositories, context) => results,
        _ = cancel => {
            tracing::warn!("sync cancelled, nothing written");
            return Err(RepoError::Cancelled);
        }
    };

    let (snapshot, summary) = merge_results(results, store.snapshot())?;
    store.replace_snapshot(snapshot)?;

    tracing::info!(
        succeeded = summary.succeeded.len(),
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "sync finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::tests::{fast_options, repo_on};
    use crate::store::Registry;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HASH: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn context() -> SyncContext {
        SyncContext::new(SecretsMap::default(), fast_options()).with_jobs(2)
    }

    async fn mount_release(server: &MockServer, repo: &str, asset: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{repo}/releases")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "tag_name": "v1.0.0",
                "published_at": "2024-01-01T00:00:00Z",
                "assets": [{
                    "name": asset,
                    "browser_download_url": format!("{}/download/{}", server.uri(), asset),
                    "size": 10,
                    "digest": format!("sha256:{HASH}")
                }]
            }])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_others() {
        let server = MockServer::start().await;
        mount_release(&server, "User123/PythonPackage", "pkg-1.0.0.tar.gz").await;
        Mock::given(method("GET"))
            .and(path("/repos/User123/Gone/releases"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/User123/Broken/releases"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut store = RegistryStore::open(dir.path().join("warehub.json")).unwrap();
        for name in ["User123/PythonPackage", "User123/Gone", "User123/Broken"] {
            store.upsert(repo_on(&server, name)).unwrap();
        }

        let summary = run(&mut store, &context(), std::future::pending()).await.unwrap();
        assert!(summary.is_partial());
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.succeeded.len(), 1);
        assert_eq!(summary.succeeded[0].package, "python-package");
        assert_eq!(summary.skipped[0].repository, "User123/Gone");
        assert_eq!(summary.failed[0].repository, "User123/Broken");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["python-package"]);
        let file = snapshot["python-package"].assets().next().unwrap();
        assert_eq!(file.filename, "pkg-1.0.0.tar.gz");
        assert_eq!(file.sha256.as_deref(), Some(HASH));
    }

    #[tokio::test]
    async fn test_failed_repository_keeps_previous_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/flaky/releases"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut store = RegistryStore::open(dir.path().join("warehub.json")).unwrap();
        store.upsert(repo_on(&server, "o/flaky")).unwrap();
        let mut previous = Snapshot::new();
        previous.insert("flaky".into(), PackageRecord::new("flaky", "o/flaky"));
        store.replace_snapshot(previous.clone()).unwrap();

        let summary = run(&mut store, &context(), std::future::pending()).await.unwrap();
        assert!(summary.failed[0].kept_previous);
        assert_eq!(store.snapshot(), &previous);
    }

    #[tokio::test]
    async fn test_missing_secret_is_per_repository() {
        let server = MockServer::start().await;
        mount_release(&server, "o/public", "public-1.0.0.tar.gz").await;

        let secret_repo = TrackedRepository::new("o/private")
            .unwrap()
            .with_domain(server.uri())
            .unwrap();
        let dir = TempDir::new().unwrap();
        let mut store = RegistryStore::open(dir.path().join("warehub.json")).unwrap();
        store.upsert(repo_on(&server, "o/public")).unwrap();
        store.upsert(secret_repo).unwrap();

        let summary = run(&mut store, &context(), std::future::pending()).await.unwrap();
        assert_eq!(summary.succeeded.len(), 1);
        assert!(summary.failed[0].reason.contains("USERNAME"));
    }

    #[tokio::test]
    async fn test_secrets_resolved_for_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/private/releases"))
            .and(wiremock::matchers::header("Authorization", "Basic dTpw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let repo = TrackedRepository::new("o/private")
            .unwrap()
            .with_domain(server.uri())
            .unwrap();
        let secrets = SecretsMap::from(HashMap::from([
            ("USERNAME".to_string(), "u".to_string()),
            ("PASSWORD".to_string(), "p".to_string()),
        ]));
        let context = SyncContext::new(secrets, fast_options());

        let record = fetch_repository(&repo, &context).await.unwrap();
        assert_eq!(record.name, "private");
        assert!(record.releases.is_empty());
        assert_eq!(record.latest, None);
    }

    #[tokio::test]
    async fn test_cancel_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/slow/releases"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(std::time::Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warehub.json");
        let mut store = RegistryStore::open(&path).unwrap();
        store.upsert(repo_on(&server, "o/slow")).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = run(&mut store, &context(), async {}).await.unwrap_err();
        assert!(matches!(err, RepoError::Cancelled));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_name_collision_aborts_before_fetch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warehub.json");

        // Written directly: the store refuses to add a colliding repository
        let registry = Registry {
            repositories: vec![
                TrackedRepository::new("a/python_package").unwrap(),
                TrackedRepository::new("b/PythonPackage").unwrap(),
            ],
            ..Registry::default()
        };
        registry.save_atomic(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let mut store = RegistryStore::open(&path).unwrap();
        let err = run(&mut store, &context(), std::future::pending()).await.unwrap_err();
        assert!(matches!(err, RepoError::DuplicatePackageName { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_merge_results_classification() {
        let ok = TrackedRepository::new("o/ok").unwrap();
        let gone = TrackedRepository::new("o/gone").unwrap();
        let results = vec![
            (ok, Ok(PackageRecord::new("ok", "o/ok"))),
            (
                gone,
                Err(RepoError::RepositoryNotFound {
                    path: "o/gone".to_string(),
                }),
            ),
        ];
        let (snapshot, summary) = merge_results(results, &Snapshot::new()).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(summary.skipped.len(), 1);
        assert!(!summary.skipped[0].kept_previous);
        assert!(summary.failed.is_empty());
    }
}
