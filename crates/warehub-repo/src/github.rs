//! GitHub releases API
//!
//! Works against github.com and GitHub Enterprise (`{domain}/repos/...`).
//! Listings are paged with `per_page` and the `Link` header.

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, TryStreamExt};
use semver::Version;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use warehub_core::TrackedRepository;
use warehub_core::package::version_from_tag;

use crate::credentials::{ResolvedCredentials, ScopedCredentials};
use crate::error::{RepoError, Result};
use crate::http::{API_ACCEPT, SecureHttpClient, next_link};
use crate::retry::RetryPolicy;

/// Largest asset downloaded for mirroring or hashing
pub const DEFAULT_MAX_DOWNLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// Largest page the releases endpoint serves
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Knobs shared by every fetch in a run
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub per_page: u32,
    pub retry: RetryPolicy,
    /// Download and hash assets that arrive without a digest
    pub hash_missing: bool,
    pub max_download_size: u64,
    /// Directory receiving a copy of every distribution file; `None` links
    /// installers to the upstream URLs
    pub mirror: Option<PathBuf>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            per_page: DEFAULT_PER_PAGE,
            retry: RetryPolicy::default(),
            hash_missing: true,
            max_download_size: DEFAULT_MAX_DOWNLOAD_SIZE,
            mirror: None,
        }
    }
}

/// A release as the API reports it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Publish time, falling back to creation time
    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.created_at)
    }

    /// Semantic version of the tag, if it has one
    pub fn version(&self) -> Option<Version> {
        parse_tag_version(&self.tag_name)
    }
}

/// A release asset as the API reports it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    /// API URL serving the bytes with `Accept: application/octet-stream`
    #[serde(default)]
    pub url: Option<String>,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
    /// `sha256:<hex>` on hosts that compute digests
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Parse a tag as semver, ignoring a leading `v` and padding `1` / `1.2`
/// to three components
pub fn parse_tag_version(tag: &str) -> Option<Version> {
    let version = version_from_tag(tag);
    if let Ok(parsed) = Version::parse(version) {
        return Some(parsed);
    }

    let (core, rest) = match version.find(['-', '+']) {
        Some(i) => version.split_at(i),
        None => (version, ""),
    };
    let components = core.split('.').count();
    if !(1..=2).contains(&components) {
        return None;
    }
    let padded = format!("{}{}{}", core, ".0".repeat(3 - components), rest);
    Version::parse(&padded).ok()
}

/// Presentation order: semver ascending; tags that are not semver come
/// first, newest first
pub fn compare_releases(a: &Release, b: &Release) -> Ordering {
    match (a.version(), b.version()) {
        (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.tag_name.cmp(&b.tag_name)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => b
            .published()
            .cmp(&a.published())
            .then_with(|| a.tag_name.cmp(&b.tag_name)),
    }
}

/// Sort releases into presentation order
pub fn order_releases(releases: &mut [Release]) {
    releases.sort_by(compare_releases);
}

/// Index of the latest release in an ordered slice: the greatest semver
/// tag, or the newest release when no tag parses
pub fn latest_index<T>(ordered: &[T], is_semver: impl Fn(&T) -> bool) -> Option<usize> {
    let last = ordered.len().checked_sub(1)?;
    if is_semver(&ordered[last]) {
        Some(last)
    } else {
        Some(0)
    }
}

/// Drop repeated tags, keeping the last occurrence in listing order
pub fn dedupe_tags(repository: &str, releases: Vec<Release>) -> Vec<Release> {
    let mut last_seen: HashMap<String, usize> = HashMap::new();
    for (i, release) in releases.iter().enumerate() {
        if let Some(previous) = last_seen.insert(release.tag_name.clone(), i) {
            tracing::warn!(
                repository,
                tag = %release.tag_name,
                "duplicate release tag, keeping the later entry (#{} over #{})",
                i,
                previous
            );
        }
    }

    releases
        .into_iter()
        .enumerate()
        .filter(|(i, r)| last_seen.get(&r.tag_name) == Some(i))
        .map(|(_, r)| r)
        .collect()
}

/// Lists releases for one repository
pub struct ReleaseFetcher {
    repository: TrackedRepository,
    client: SecureHttpClient,
    retry: RetryPolicy,
    per_page: u32,
}

impl ReleaseFetcher {
    /// Create a fetcher; credentials are only ever sent to the repository's
    /// own domain
    pub fn new(
        repository: TrackedRepository,
        credentials: Option<ResolvedCredentials>,
        options: &FetchOptions,
    ) -> Result<Self> {
        let scoped = ScopedCredentials::for_prefix(&repository.domain, credentials);
        let client = SecureHttpClient::new(scoped, options.timeout)?;

        Ok(Self {
            repository,
            client,
            retry: options.retry.clone(),
            per_page: options.per_page.clamp(1, DEFAULT_PER_PAGE),
        })
    }

    pub fn repository(&self) -> &TrackedRepository {
        &self.repository
    }

    /// Transport shared with asset hashing
    pub fn client(&self) -> &SecureHttpClient {
        &self.client
    }

    fn first_page_url(&self) -> String {
        format!("{}?per_page={}", self.repository.releases_url(), self.per_page)
    }

    /// Fetch one page, retrying rate limits; returns the releases and the
    /// next page URL
    pub async fn fetch_page(&self, url: &str) -> Result<(Vec<Release>, Option<String>)> {
        let client = &self.client;
        let path = self.repository.path.as_str();

        self.retry
            .run(move || async move {
                tracing::debug!(repository = path, url, "fetching releases page");
                let response = client.get(url, API_ACCEPT).await.map_err(|e| match e {
                    RepoError::HttpError { status: 404, .. } => RepoError::RepositoryNotFound {
                        path: path.to_string(),
                    },
                    other => other,
                })?;

                let next = next_link(response.headers());
                let body = response.bytes().await.map_err(|e| {
                    if e.is_timeout() {
                        RepoError::Timeout {
                            seconds: client.timeout().as_secs(),
                        }
                    } else {
                        RepoError::from(e)
                    }
                })?;
                let page: Vec<Release> =
                    serde_json::from_slice(&body).map_err(|e| RepoError::InvalidResponse {
                        url: url.to_string(),
                        message: e.to_string(),
                    })?;

                Ok((page, next))
            })
            .await
    }

    /// Pages of releases, pulled lazily as the stream is polled
    pub fn pages(&self) -> impl Stream<Item = Result<Vec<Release>>> + '_ {
        stream::try_unfold(Some(self.first_page_url()), move |next| async move {
            let Some(url) = next else {
                return Ok::<_, RepoError>(None);
            };
            let (page, next) = self.fetch_page(&url).await?;
            Ok(Some((page, next)))
        })
    }

    /// Releases in listing order (newest first on GitHub), across all pages
    pub fn releases(&self) -> impl Stream<Item = Result<Release>> + '_ {
        self.pages()
            .map_ok(|page| stream::iter(page.into_iter().map(Ok::<_, RepoError>)))
            .try_flatten()
    }

    /// All published releases, deduplicated by tag and in presentation order
    pub async fn fetch_all(&self) -> Result<Vec<Release>> {
        let listed: Vec<Release> = self
            .releases()
            .try_filter(|r| futures::future::ready(!r.draft))
            .try_collect()
            .await?;

        let mut releases = dedupe_tags(&self.repository.path, listed);
        order_releases(&mut releases);

        tracing::info!(
            repository = %self.repository.path,
            releases = releases.len(),
            "fetched releases"
        );
        Ok(releases)
    }
}
