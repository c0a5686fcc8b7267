//! Package records - the normalized, PEP503-shaped view of a repository's releases

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::distribution::DistributionKind;
use crate::metadata::DistributionMetadata;

/// Site directory holding mirrored distribution files
pub const FILES_DIR: &str = "files";

/// Every package in the index, keyed by normalized name.
/// A `BTreeMap` keeps iteration (and therefore generated output) sorted.
pub type Snapshot = BTreeMap<String, PackageRecord>;

/// A package assembled from one tracked repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    /// Normalized package name (unique across the index)
    pub name: String,

    /// Owning repository path (`owner/name`)
    pub repository: String,

    /// Browser URL of the owning repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,

    /// Releases in presentation order (oldest first)
    #[serde(default)]
    pub releases: Vec<ReleaseEntry>,

    /// Tag of the release presented as latest
    #[serde(default)]
    pub latest: Option<String>,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repository: repository.into(),
            repository_url: None,
            releases: Vec::new(),
            latest: None,
        }
    }

    /// The release presented as latest
    pub fn latest_release(&self) -> Option<&ReleaseEntry> {
        let tag = self.latest.as_deref()?;
        self.releases.iter().find(|r| r.tag == tag)
    }

    /// Get a release by version string
    pub fn release(&self, version: &str) -> Option<&ReleaseEntry> {
        self.releases.iter().find(|r| r.version == version)
    }

    /// All assets across all releases, in release order
    pub fn assets(&self) -> impl Iterator<Item = &ReleaseAsset> {
        self.releases.iter().flat_map(|r| r.assets.iter())
    }

    /// Total size of all assets in bytes
    pub fn total_size(&self) -> u64 {
        self.assets().map(|a| a.size).sum()
    }
}

/// One published release and its installable files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseEntry {
    /// Tag as published (`v1.0.0`)
    pub tag: String,

    /// Tag without a leading `v` (`1.0.0`)
    pub version: String,

    /// Publish time reported by the host
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Marked as a pre-release by the host
    #[serde(default)]
    pub prerelease: bool,

    /// Installable files
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,

    /// Core metadata read from one of the files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DistributionMetadata>,
}

impl ReleaseEntry {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            version: version_from_tag(&tag).to_string(),
            tag,
            published_at: None,
            prerelease: false,
            assets: Vec::new(),
            metadata: None,
        }
    }
}

/// Strip a leading `v`/`V` from a tag when what follows is a digit
pub fn version_from_tag(tag: &str) -> &str {
    match tag.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => tag,
    }
}

/// A downloadable distribution file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseAsset {
    pub filename: String,

    /// Upstream download URL
    pub download_url: String,

    /// A copy is served from the site's `files/` directory
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mirrored: bool,

    /// Hex-encoded SHA-256, when known
    #[serde(default)]
    pub sha256: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blake2_256: Option<String>,

    pub release_tag: String,

    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,

    /// Size in bytes as reported by the host
    #[serde(default)]
    pub size: u64,

    pub kind: DistributionKind,

    /// Python tag (`py3`, `cp311`, `source`, ...)
    pub python_version: String,

    /// A detached `<filename>.asc` signature was published alongside
    #[serde(default)]
    pub has_signature: bool,
}

impl ReleaseAsset {
    /// Where installers fetch the file: the mirrored copy under
    /// `<base_url>/files/` when there is one, the upstream URL otherwise
    pub fn url(&self, base_url: &str) -> String {
        if self.mirrored {
            format!("{}/{}/{}", base_url.trim_end_matches('/'), FILES_DIR, self.filename)
        } else {
            self.download_url.clone()
        }
    }

    /// Link target for the simple index: [`Self::url`] with a
    /// `#sha256=<hex>` fragment when the hash is known
    pub fn pep503_href(&self, base_url: &str) -> String {
        let url = self.url(base_url);
        match &self.sha256 {
            Some(hash) => format!("{url}#sha256={hash}"),
            None => url,
        }
    }

    /// Detached signatures are never mirrored
    pub fn signature_url(&self) -> String {
        format!("{}.asc", self.download_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, sha256: Option<&str>) -> ReleaseAsset {
        ReleaseAsset {
            filename: name.to_string(),
            download_url: format!("https://example.com/dl/{name}"),
            mirrored: false,
            sha256: sha256.map(str::to_string),
            md5: None,
            blake2_256: None,
            release_tag: "v1.0.0".to_string(),
            uploaded_at: None,
            size: 10,
            kind: DistributionKind::Sdist,
            python_version: "source".to_string(),
            has_signature: false,
        }
    }

    #[test]
    fn test_version_from_tag() {
        assert_eq!(version_from_tag("v1.0.0"), "1.0.0");
        assert_eq!(version_from_tag("V2.1"), "2.1");
        assert_eq!(version_from_tag("1.0.0"), "1.0.0");
        assert_eq!(version_from_tag("vnext"), "vnext");
        assert_eq!(version_from_tag("release-3"), "release-3");
    }

    #[test]
    fn test_pep503_href() {
        let base = "https://o.github.io/index";
        assert_eq!(
            asset("pkg-1.0.0.tar.gz", Some("abc")).pep503_href(base),
            "https://example.com/dl/pkg-1.0.0.tar.gz#sha256=abc"
        );
        assert_eq!(
            asset("pkg-1.0.0.tar.gz", None).pep503_href(base),
            "https://example.com/dl/pkg-1.0.0.tar.gz"
        );
    }

    #[test]
    fn test_mirrored_asset_links_into_site() {
        let mut mirrored = asset("pkg-1.0.0.tar.gz", Some("abc"));
        mirrored.mirrored = true;
        assert_eq!(
            mirrored.pep503_href("https://o.github.io/index/"),
            "https://o.github.io/index/files/pkg-1.0.0.tar.gz#sha256=abc"
        );
        assert_eq!(mirrored.signature_url(), "https://example.com/dl/pkg-1.0.0.tar.gz.asc");

        let json = serde_json::to_string(&asset("a.tar.gz", None)).unwrap();
        assert!(!json.contains("mirrored") && !json.contains("md5"));
    }

    #[test]
    fn test_latest_release_lookup() {
        let mut record = PackageRecord::new("pkg", "o/pkg");
        let mut old = ReleaseEntry::new("v0.9.0");
        old.assets.push(asset("pkg-0.9.0.tar.gz", None));
        let mut new = ReleaseEntry::new("v1.0.0");
        new.assets.push(asset("pkg-1.0.0.tar.gz", None));
        record.releases = vec![old, new];
        record.latest = Some("v1.0.0".to_string());

        assert_eq!(record.latest_release().unwrap().version, "1.0.0");
        assert_eq!(record.release("0.9.0").unwrap().tag, "v0.9.0");
        assert_eq!(record.assets().count(), 2);
        assert_eq!(record.total_size(), 20);
    }
}
