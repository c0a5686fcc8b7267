//! Package metadata assembly
//!
//! Turns the releases of one repository into a [`PackageRecord`], and merges
//! the records of every repository into one [`Snapshot`].
//!
//! With a mirror directory configured, every distribution file is copied
//! there and served from the site. Otherwise only assets the API reports no
//! digest for are downloaded, to hash them. Downloads stream into a
//! temporary file while being hashed; core metadata is read from that file.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use warehub_core::{
    DistributionKind, DistributionMetadata, PackageRecord, ReleaseAsset, ReleaseEntry, Snapshot,
    TrackedRepository,
};

use crate::archive::read_metadata;
use crate::digest::{FileDigests, MultiHasher, hash_reader, parse_api_digest};
use crate::error::{RepoError, Result};
use crate::github::{Asset, FetchOptions, Release, latest_index, parse_tag_version};
use crate::http::{ASSET_ACCEPT, SecureHttpClient};

const SIGNATURE_SUFFIX: &str = ".asc";

/// Builds package records, downloading assets through the fetcher's client
pub struct PackageBuilder<'a> {
    client: &'a SecureHttpClient,
    hash_missing: bool,
    max_download_size: u64,
    mirror: Option<&'a Path>,
}

/// What is known about one asset after inspection
#[derive(Debug, Default)]
struct Inspection {
    sha256: Option<String>,
    md5: Option<String>,
    blake2_256: Option<String>,
    metadata: Option<DistributionMetadata>,
    mirrored: bool,
}

impl Inspection {
    fn from_api(sha256: Option<String>) -> Self {
        Self {
            sha256,
            ..Self::default()
        }
    }

    fn from_file(digests: FileDigests, metadata: Option<DistributionMetadata>, mirrored: bool) -> Self {
        Self {
            sha256: Some(digests.sha256),
            md5: Some(digests.md5),
            blake2_256: Some(digests.blake2_256),
            metadata,
            mirrored,
        }
    }
}

impl<'a> PackageBuilder<'a> {
    pub fn new(client: &'a SecureHttpClient, options: &'a FetchOptions) -> Self {
        Self {
            client,
            hash_missing: options.hash_missing,
            max_download_size: options.max_download_size,
            mirror: options.mirror.as_deref(),
        }
    }

    /// Build the record for `repository` from releases already in
    /// presentation order.
    ///
    /// Two tags that strip to the same version (`v1.0` and `1.0`) would
    /// publish to the same pages; the later one is kept.
    pub async fn build(&self, repository: &TrackedRepository, releases: Vec<Release>) -> PackageRecord {
        let mut record = PackageRecord::new(repository.package_name(), repository.path.clone());
        record.repository_url = Some(repository.web_url());

        for release in releases {
            let (assets, metadata) = self.build_assets(&repository.path, &release).await;
            if assets.is_empty() {
                tracing::debug!(
                    repository = %repository.path,
                    tag = %release.tag_name,
                    "release has no distributions, omitted"
                );
                continue;
            }

            let mut entry = ReleaseEntry::new(release.tag_name.clone());
            entry.published_at = release.published();
            entry.prerelease = release.prerelease;
            entry.assets = assets;
            entry.metadata = metadata;

            if let Some(i) = record.releases.iter().position(|e| e.version == entry.version) {
                tracing::warn!(
                    repository = %repository.path,
                    version = %entry.version,
                    kept = %entry.tag,
                    dropped = %record.releases[i].tag,
                    "tags resolve to the same version, keeping the later one"
                );
                record.releases.remove(i);
            }
            record.releases.push(entry);
        }

        record.latest = latest_index(&record.releases, |e| parse_tag_version(&e.tag).is_some())
            .map(|i| record.releases[i].tag.clone());

        tracing::info!(
            repository = %repository.path,
            package = %record.name,
            releases = record.releases.len(),
            files = record.assets().count(),
            mirrored = record.assets().filter(|a| a.mirrored).count(),
            "built package"
        );
        record
    }

    async fn build_assets(
        &self,
        repository: &str,
        release: &Release,
    ) -> (Vec<ReleaseAsset>, Option<DistributionMetadata>) {
        let signed: HashSet<&str> = release
            .assets
            .iter()
            .filter_map(|a| a.name.strip_suffix(SIGNATURE_SUFFIX))
            .collect();

        let mut assets = Vec::new();
        let mut metadata: Option<(DistributionKind, DistributionMetadata)> = None;
        for asset in &release.assets {
            if asset.name.ends_with(SIGNATURE_SUFFIX) {
                continue;
            }
            let Some(kind) = DistributionKind::from_filename(&asset.name) else {
                tracing::debug!(repository, asset = %asset.name, "not a Python distribution, skipped");
                continue;
            };

            let inspection = self.inspect(repository, asset, kind).await;
            if let Some(found) = inspection.metadata {
                // Wheel metadata is written by the build backend, prefer it
                let replace = match &metadata {
                    None => true,
                    Some((held, _)) => *held != DistributionKind::BdistWheel && kind == DistributionKind::BdistWheel,
                };
                if replace {
                    metadata = Some((kind, found));
                }
            }

            assets.push(ReleaseAsset {
                filename: asset.name.clone(),
                download_url: asset.browser_download_url.clone(),
                mirrored: inspection.mirrored,
                sha256: inspection.sha256,
                md5: inspection.md5,
                blake2_256: inspection.blake2_256,
                release_tag: release.tag_name.clone(),
                uploaded_at: asset.updated_at.or(asset.created_at),
                size: asset.size,
                kind,
                python_version: kind.python_version(&asset.name),
                has_signature: signed.contains(asset.name.as_str()),
            });
        }

        assets.sort_by(|a, b| a.filename.cmp(&b.filename));
        (assets, metadata.map(|(_, found)| found))
    }

    /// Mirror, hash or trust the API for one asset. Failures only degrade
    /// what is published about the file.
    async fn inspect(&self, repository: &str, asset: &Asset, kind: DistributionKind) -> Inspection {
        let api_sha256 = asset.digest.as_deref().and_then(parse_api_digest);

        if let Some(dir) = self.mirror {
            match self.mirror_asset(dir, asset, kind, api_sha256.as_deref()).await {
                Ok(inspection) => return inspection,
                Err(err) => tracing::warn!(
                    repository,
                    asset = %asset.name,
                    error = %err,
                    "could not mirror asset, linking upstream"
                ),
            }
        }

        if api_sha256.is_some() || !self.hash_missing {
            return Inspection::from_api(api_sha256);
        }

        let hashed = match NamedTempFile::new() {
            Ok(file) => self.download(asset, kind, file, None).await,
            Err(err) => Err(err.into()),
        };
        match hashed {
            Ok((_file, digests, metadata)) => Inspection::from_file(digests, metadata, false),
            Err(err) => {
                tracing::warn!(
                    repository,
                    asset = %asset.name,
                    error = %err,
                    "could not hash asset, published without a hash"
                );
                Inspection::default()
            }
        }
    }

    async fn mirror_asset(
        &self,
        dir: &Path,
        asset: &Asset,
        kind: DistributionKind,
        expected_sha256: Option<&str>,
    ) -> Result<Inspection> {
        let target = mirror_target(dir, &asset.name).ok_or_else(|| RepoError::InvalidResponse {
            url: asset.browser_download_url.clone(),
            message: format!("'{}' cannot be stored as a file name", asset.name),
        })?;

        if target.is_file() {
            let on_disk = std::fs::metadata(&target)?.len();
            let (digests, metadata) = inspect_local(target.clone(), asset.name.clone(), kind).await?;
            let current = match expected_sha256 {
                Some(expected) => expected == digests.sha256,
                None => on_disk == asset.size,
            };
            if current {
                tracing::debug!(file = %asset.name, "mirrored copy is current");
                return Ok(Inspection::from_file(digests, metadata, true));
            }
            tracing::info!(file = %asset.name, "mirrored copy is stale, downloading again");
        }

        std::fs::create_dir_all(dir)?;
        let file = NamedTempFile::new_in(dir)?;
        let (file, digests, metadata) = self.download(asset, kind, file, expected_sha256).await?;
        file.persist(&target).map_err(|e| RepoError::Io(e.error))?;

        tracing::debug!(file = %asset.name, path = %target.display(), "mirrored");
        Ok(Inspection::from_file(digests, metadata, true))
    }

    /// Stream `asset` into `file`, hashing on the way. A download whose
    /// SHA-256 disagrees with the API is rejected.
    async fn download(
        &self,
        asset: &Asset,
        kind: DistributionKind,
        mut file: NamedTempFile,
        expected_sha256: Option<&str>,
    ) -> Result<(NamedTempFile, FileDigests, Option<DistributionMetadata>)> {
        let (url, accept) = match &asset.url {
            Some(api_url) => (api_url.as_str(), ASSET_ACCEPT),
            None => (asset.browser_download_url.as_str(), "*/*"),
        };
        if asset.size > self.max_download_size {
            return Err(RepoError::AssetTooLarge {
                url: url.to_string(),
                limit: self.max_download_size,
            });
        }

        let mut hasher = MultiHasher::new();
        self.client
            .download_capped(url, accept, self.max_download_size, |chunk| {
                hasher.update(chunk);
                file.write_all(chunk)?;
                Ok(())
            })
            .await?;
        file.flush()?;

        let digests = hasher.finish();
        if let Some(expected) = expected_sha256.filter(|e| *e != digests.sha256) {
            return Err(RepoError::DigestMismatch {
                file: asset.name.clone(),
                expected: expected.to_string(),
                actual: digests.sha256,
            });
        }

        let path = file.path().to_path_buf();
        let filename = asset.name.clone();
        let metadata = blocking(move || Ok(read_metadata(&path, &filename, kind))).await?;
        Ok((file, digests, metadata))
    }
}

/// Path for `filename` inside the mirror, refusing names that would leave it
fn mirror_target(dir: &Path, filename: &str) -> Option<PathBuf> {
    let safe = !filename.is_empty() && !filename.starts_with('.') && !filename.contains(['/', '\\']);
    safe.then(|| dir.join(filename))
}

async fn inspect_local(
    path: PathBuf,
    filename: String,
    kind: DistributionKind,
) -> Result<(FileDigests, Option<DistributionMetadata>)> {
    blocking(move || {
        let digests = hash_reader(BufReader::new(File::open(&path)?))?;
        Ok((digests, read_metadata(&path, &filename, kind)))
    })
    .await
}

/// Run file I/O off the async worker threads
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RepoError::Io(std::io::Error::other(e)))?
}

/// Fail when two tracked repositories would publish the same package name
pub fn check_unique_names(repositories: &[TrackedRepository]) -> Result<()> {
    let mut owners: HashMap<String, &str> = HashMap::new();
    for repo in repositories {
        let name = repo.package_name();
        if let Some(first) = owners.insert(name.clone(), repo.path.as_str()) {
            return Err(RepoError::DuplicatePackageName {
                name,
                first: first.to_string(),
                second: repo.path.clone(),
            });
        }
    }
    Ok(())
}

/// Combine per-repository records into one snapshot keyed by package name
pub fn merge_records(records: impl IntoIterator<Item = PackageRecord>) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    for record in records {
        if let Some(existing) = snapshot.get(&record.name) {
            return Err(RepoError::DuplicatePackageName {
                name: record.name.clone(),
                first: existing.repository.clone(),
                second: record.repository,
            });
        }
        snapshot.insert(record.name.clone(), record);
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::{PKG_INFO, WHEEL_METADATA, tar_gz, zip_bytes};
    use crate::github::tests::{fast_options, release, repo_on};
    use crate::github::{ReleaseFetcher, order_releases};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HASH: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn digests(bytes: &[u8]) -> FileDigests {
        hash_reader(bytes).unwrap()
    }

    fn mirror_options(dir: &TempDir) -> FetchOptions {
        FetchOptions {
            mirror: Some(dir.path().join("files")),
            ..fast_options()
        }
    }

    /// An asset whose bytes `server` serves under `/download/<name>`
    async fn served(server: &MockServer, name: &str, bytes: &[u8], digest: Option<&str>) -> Asset {
        Mock::given(method("GET"))
            .and(path(format!("/download/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
            .mount(server)
            .await;
        Asset {
            size: bytes.len() as u64,
            ..asset(server, name, digest)
        }
    }

    fn asset(server: &MockServer, name: &str, digest: Option<&str>) -> Asset {
        Asset {
            name: name.to_string(),
            url: None,
            browser_download_url: format!("{}/download/{}", server.uri(), name),
            size: 7,
            digest: digest.map(str::to_string),
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_build_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/pkg-1.0.0-py3-none-any.whl"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"wheel!!".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let mut v1 = release("v1.0.0", "2024-01-01T00:00:00Z");
        v1.assets = vec![
            asset(&server, "pkg-1.0.0.tar.gz", Some(&format!("sha256:{HASH}"))),
            asset(&server, "pkg-1.0.0.tar.gz.asc", None),
            asset(&server, "pkg-1.0.0-py3-none-any.whl", None),
            asset(&server, "CHANGELOG.md", None),
        ];
        let mut v09 = release("v0.9.0", "2023-06-01T00:00:00Z");
        v09.assets = vec![asset(&server, "notes.txt", None)];
        let mut releases = vec![v1, v09];
        order_releases(&mut releases);

        let repo = repo_on(&server, "User123/PythonPackage");
        let client = SecureHttpClient::public(std::time::Duration::from_secs(5)).unwrap();
        let record = PackageBuilder::new(&client, &fast_options()).build(&repo, releases).await;

        assert_eq!(record.name, "python-package");
        assert_eq!(record.repository, "User123/PythonPackage");
        assert_eq!(record.releases.len(), 1, "release without distributions is omitted");
        assert_eq!(record.latest.as_deref(), Some("v1.0.0"));

        let files: Vec<&ReleaseAsset> = record.assets().collect();
        assert_eq!(files.len(), 2);

        assert_eq!(files[0].filename, "pkg-1.0.0-py3-none-any.whl");
        assert_eq!(files[0].kind, DistributionKind::BdistWheel);
        assert_eq!(files[0].python_version, "py3");
        let wheel = digests(b"wheel!!");
        assert_eq!(files[0].sha256.as_deref(), Some(wheel.sha256.as_str()));
        assert_eq!(files[0].md5.as_deref(), Some(wheel.md5.as_str()));
        assert_eq!(files[0].blake2_256.as_deref(), Some(wheel.blake2_256.as_str()));
        assert!(!files[0].has_signature);
        assert!(!files[0].mirrored);

        assert_eq!(files[1].filename, "pkg-1.0.0.tar.gz");
        assert_eq!(files[1].sha256.as_deref(), Some(HASH));
        assert_eq!(files[1].md5, None, "not downloaded when the API has a digest");
        assert_eq!(files[1].python_version, "source");
        assert!(files[1].has_signature);
    }

    #[tokio::test]
    async fn test_unhashable_asset_kept_without_hash() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/pkg-2.0.0.zip"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut big = asset(&server, "pkg-2.0.0.tar.gz", None);
        big.size = u64::MAX;
        let mut r = release("2.0.0", "2024-01-01T00:00:00Z");
        r.assets = vec![asset(&server, "pkg-2.0.0.zip", None), big];

        let client = SecureHttpClient::public(std::time::Duration::from_secs(5)).unwrap();
        let record = PackageBuilder::new(&client, &fast_options())
            .build(&repo_on(&server, "o/pkg"), vec![r])
            .await;

        assert_eq!(record.assets().count(), 2);
        assert!(record.assets().all(|a| a.sha256.is_none()));
    }

    #[tokio::test]
    async fn test_api_asset_url_is_authenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/pkg/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "tag_name": "v1.0.0",
                "published_at": "2024-01-01T00:00:00Z",
                "assets": [{
                    "name": "pkg-1.0.0.tar.gz",
                    "url": format!("{}/repos/o/pkg/releases/assets/1", server.uri()),
                    "browser_download_url": format!("{}/download/pkg-1.0.0.tar.gz", server.uri()),
                    "size": 3
                }]
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/o/pkg/releases/assets/1"))
            .and(header("Accept", ASSET_ACCEPT))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"abc".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = crate::credentials::ResolvedCredentials::Bearer {
            token: "tok".to_string(),
        };
        let repo = repo_on(&server, "o/pkg");
        let fetcher = ReleaseFetcher::new(repo.clone(), Some(credentials), &fast_options()).unwrap();
        let releases = fetcher.fetch_all().await.unwrap();
        let record = PackageBuilder::new(fetcher.client(), &fast_options())
            .build(&repo, releases)
            .await;

        let file = record.assets().next().unwrap();
        assert_eq!(file.sha256.as_deref(), Some(digests(b"abc").sha256.as_str()));
        assert_eq!(file.download_url, format!("{}/download/pkg-1.0.0.tar.gz", server.uri()));
        assert!(!file.mirrored);
    }

    #[tokio::test]
    async fn test_mirror_copies_files_and_reads_metadata() {
        let server = MockServer::start().await;
        let sdist = tar_gz(&[("pkg-1.0.0/PKG-INFO", PKG_INFO)]);
        let wheel = zip_bytes(&[("pkg-1.0.0.dist-info/METADATA", WHEEL_METADATA)]);
        let sdist_digest = format!("sha256:{}", digests(&sdist).sha256);

        let mut r = release("v1.0.0", "2024-01-01T00:00:00Z");
        r.assets = vec![
            served(&server, "pkg-1.0.0.tar.gz", &sdist, Some(&sdist_digest)).await,
            served(&server, "pkg-1.0.0-py3-none-any.whl", &wheel, None).await,
        ];

        let dir = TempDir::new().unwrap();
        let options = mirror_options(&dir);
        let client = SecureHttpClient::public(std::time::Duration::from_secs(5)).unwrap();
        let record = PackageBuilder::new(&client, &options)
            .build(&repo_on(&server, "o/pkg"), vec![r])
            .await;

        let mirror = dir.path().join("files");
        assert_eq!(std::fs::read(mirror.join("pkg-1.0.0.tar.gz")).unwrap(), sdist);
        assert_eq!(std::fs::read(mirror.join("pkg-1.0.0-py3-none-any.whl")).unwrap(), wheel);
        let leftovers = std::fs::read_dir(&mirror).unwrap().count();
        assert_eq!(leftovers, 2, "no temporary files left behind");

        for file in record.assets() {
            assert!(file.mirrored, "{} not mirrored", file.filename);
            assert!(file.md5.is_some() && file.blake2_256.is_some());
        }

        let meta = record.releases[0].metadata.as_ref().unwrap();
        assert_eq!(meta.summary.as_deref(), Some("From the wheel"));
        assert_eq!(meta.requires_dist, vec!["requests"]);
    }

    #[tokio::test]
    async fn test_mirror_reuses_current_copy() {
        let server = MockServer::start().await;
        let bytes = tar_gz(&[("pkg-1.0.0/PKG-INFO", PKG_INFO)]);
        Mock::given(method("GET"))
            .and(path("/download/pkg-1.0.0.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.clone()))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let options = mirror_options(&dir);
        let mirror = dir.path().join("files");
        std::fs::create_dir_all(&mirror).unwrap();
        std::fs::write(mirror.join("pkg-1.0.0.tar.gz"), &bytes).unwrap();

        let mut r = release("v1.0.0", "2024-01-01T00:00:00Z");
        let digest = format!("sha256:{}", digests(&bytes).sha256);
        r.assets = vec![Asset {
            size: bytes.len() as u64,
            ..asset(&server, "pkg-1.0.0.tar.gz", Some(&digest))
        }];

        let client = SecureHttpClient::public(std::time::Duration::from_secs(5)).unwrap();
        let record = PackageBuilder::new(&client, &options)
            .build(&repo_on(&server, "o/pkg"), vec![r])
            .await;

        let file = record.assets().next().unwrap();
        assert!(file.mirrored);
        assert_eq!(file.md5.as_deref(), Some(digests(&bytes).md5.as_str()));
        assert_eq!(
            record.releases[0].metadata.as_ref().unwrap().summary.as_deref(),
            Some("From the sdist")
        );
    }

    #[tokio::test]
    async fn test_mirror_rejects_digest_mismatch() {
        let server = MockServer::start().await;
        let mut r = release("v1.0.0", "2024-01-01T00:00:00Z");
        r.assets = vec![served(&server, "pkg-1.0.0.tar.gz", b"tampered", Some(&format!("sha256:{HASH}"))).await];

        let dir = TempDir::new().unwrap();
        let options = mirror_options(&dir);
        let client = SecureHttpClient::public(std::time::Duration::from_secs(5)).unwrap();
        let record = PackageBuilder::new(&client, &options)
            .build(&repo_on(&server, "o/pkg"), vec![r])
            .await;

        let file = record.assets().next().unwrap();
        assert!(!file.mirrored, "falls back to the upstream link");
        assert_eq!(file.sha256.as_deref(), Some(HASH));
        assert!(!dir.path().join("files/pkg-1.0.0.tar.gz").exists());
    }

    #[test]
    fn test_mirror_target() {
        let dir = Path::new("/site/files");
        assert_eq!(
            mirror_target(dir, "pkg-1.0.0.tar.gz"),
            Some(PathBuf::from("/site/files/pkg-1.0.0.tar.gz"))
        );
        assert_eq!(mirror_target(dir, "../index.html"), None);
        assert_eq!(mirror_target(dir, "a/b.whl"), None);
        assert_eq!(mirror_target(dir, ".hidden.zip"), None);
    }

    #[tokio::test]
    async fn test_colliding_versions_keep_later_tag() {
        let server = MockServer::start().await;
        let mut prefixed = release("v1.0.0", "2024-01-01T00:00:00Z");
        prefixed.assets = vec![asset(&server, "pkg-1.0.0.tar.gz", Some(&format!("sha256:{HASH}")))];
        let mut bare = release("1.0.0", "2024-02-01T00:00:00Z");
        bare.assets = vec![asset(&server, "pkg-1.0.0.zip", Some(&format!("sha256:{HASH}")))];

        let client = SecureHttpClient::public(std::time::Duration::from_secs(5)).unwrap();
        let record = PackageBuilder::new(&client, &fast_options())
            .build(&repo_on(&server, "o/pkg"), vec![prefixed, bare])
            .await;

        assert_eq!(record.releases.len(), 1);
        assert_eq!(record.releases[0].tag, "1.0.0");
        assert_eq!(record.releases[0].assets[0].filename, "pkg-1.0.0.zip");
        assert_eq!(record.latest.as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_latest_falls_back_to_newest() {
        let server = MockServer::start().await;
        let mut nightly = release("nightly", "2024-05-01T00:00:00Z");
        nightly.assets = vec![asset(&server, "pkg-nightly.tar.gz", Some(&format!("sha256:{HASH}")))];
        let mut older = release("preview", "2024-01-01T00:00:00Z");
        older.assets = vec![asset(&server, "pkg-preview.tar.gz", Some(&format!("sha256:{HASH}")))];
        let mut releases = vec![older, nightly];
        order_releases(&mut releases);

        let client = SecureHttpClient::public(std::time::Duration::from_secs(5)).unwrap();
        let record = PackageBuilder::new(&client, &fast_options())
            .build(&repo_on(&server, "o/pkg"), releases)
            .await;
        assert_eq!(record.latest.as_deref(), Some("nightly"));
    }

    #[test]
    fn test_merge_records() {
        let snapshot = merge_records(vec![
            PackageRecord::new("beta", "o/beta"),
            PackageRecord::new("alpha", "o/alpha"),
        ])
        .unwrap();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["alpha", "beta"]);

        let err = merge_records(vec![
            PackageRecord::new("pkg", "a/pkg"),
            PackageRecord::new("pkg", "b/Pkg"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            RepoError::DuplicatePackageName { ref name, ref first, ref second }
                if name == "pkg" && first == "a/pkg" && second == "b/Pkg"
        ));
    }

    #[test]
    fn test_check_unique_names() {
        let a = TrackedRepository::new("a/python_package").unwrap();
        let b = TrackedRepository::new("b/PythonPackage").unwrap();
        let c = TrackedRepository::new("c/other").unwrap().with_display_name("Python.Package").unwrap();

        assert!(check_unique_names(&[a.clone(), TrackedRepository::new("a/x").unwrap()]).is_ok());
        assert!(matches!(
            check_unique_names(&[a.clone(), b]),
            Err(RepoError::DuplicatePackageName { .. })
        ));
        assert!(check_unique_names(&[a, c]).is_err());
    }
}
