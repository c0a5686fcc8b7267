//! Warehouse-compatible JSON API documents (`pypi/<name>/json/`)
//!
//! `info` carries the core metadata read from the release's files when the
//! sync could read it; fields it has no source for are `null`.

use serde_json::{Map, Value, json};
use warehub_core::{DistributionMetadata, IndexConfig, PackageRecord, ReleaseAsset, ReleaseEntry};

use crate::error::Result;
use crate::renderer::rfc3339;
use crate::site::version_dir;

/// JSON document for `release` of `record`
pub fn project_document(config: &IndexConfig, record: &PackageRecord, release: &ReleaseEntry) -> Value {
    let base = config.base_url();
    let project_url = format!("{}/project/{}/", base, record.name);

    let empty = DistributionMetadata::default();
    let meta = release.metadata.as_ref().unwrap_or(&empty);

    let mut project_urls = Map::new();
    for (label, url) in meta.project_url_pairs() {
        project_urls.insert(label.to_string(), Value::String(url.to_string()));
    }
    if let Some(url) = &record.repository_url {
        project_urls
            .entry("Source")
            .or_insert_with(|| Value::String(url.clone()));
    }

    let releases: Map<String, Value> = record
        .releases
        .iter()
        .map(|r| (r.version.clone(), files(base, r)))
        .collect();

    json!({
        "info": {
            "name": record.name,
            "version": release.version,
            "summary": meta.summary,
            "description": meta.description,
            "description_content_type": meta.description_content_type,
            "keywords": meta.keywords,
            "license": meta.license,
            "author": meta.author,
            "author_email": meta.author_email,
            "maintainer": meta.maintainer,
            "maintainer_email": meta.maintainer_email,
            "classifiers": meta.classifiers,
            "requires_dist": (!meta.requires_dist.is_empty()).then_some(&meta.requires_dist),
            "requires_python": meta.requires_python,
            "home_page": meta.home_page.as_ref().or(record.repository_url.as_ref()),
            "download_url": null,
            "package_url": project_url,
            "project_url": project_url,
            "project_urls": project_urls,
            "release_url": format!("{}{}/", project_url, version_dir(&release.version)),
            "yanked": false,
            "yanked_reason": null,
        },
        "urls": files(base, release),
        "releases": releases,
        "vulnerabilities": [],
        "last_serial": -1,
    })
}

/// Pretty-printed document with a trailing newline
pub fn render(config: &IndexConfig, record: &PackageRecord, release: &ReleaseEntry) -> Result<String> {
    let mut out = serde_json::to_string_pretty(&project_document(config, record, release))?;
    out.push('\n');
    Ok(out)
}

fn files(base_url: &str, release: &ReleaseEntry) -> Value {
    let requires_python = release
        .metadata
        .as_ref()
        .and_then(|m| m.requires_python.as_deref());
    Value::Array(
        release
            .assets
            .iter()
            .map(|asset| file(base_url, asset, requires_python))
            .collect(),
    )
}

fn file(base_url: &str, asset: &ReleaseAsset, requires_python: Option<&str>) -> Value {
    let mut digests = Map::new();
    for (algorithm, value) in [
        ("blake2_256", &asset.blake2_256),
        ("md5", &asset.md5),
        ("sha256", &asset.sha256),
    ] {
        if let Some(value) = value {
            digests.insert(algorithm.to_string(), Value::String(value.clone()));
        }
    }

    json!({
        "filename": asset.filename,
        "packagetype": asset.kind.as_str(),
        "python_version": asset.python_version,
        "size": asset.size,
        "has_sig": asset.has_signature,
        "digests": digests,
        "md5_digest": asset.md5,
        "url": asset.url(base_url),
        "upload_time": asset.uploaded_at.map(|at| at.format("%Y-%m-%dT%H:%M:%S").to_string()),
        "upload_time_iso_8601": asset.uploaded_at.as_ref().map(rfc3339),
        "comment_text": "",
        "requires_python": requires_python,
        "yanked": false,
        "yanked_reason": null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::tests::{config, record};

    #[test]
    fn test_latest_document() {
        let record = record();
        let doc = project_document(&config(), &record, record.latest_release().unwrap());

        assert_eq!(doc["info"]["name"], "python-package");
        assert_eq!(doc["info"]["version"], "1.0.0");
        assert_eq!(
            doc["info"]["project_url"],
            "User123.github.io/MyRepo/project/python-package/"
        );
        assert_eq!(
            doc["info"]["release_url"],
            "User123.github.io/MyRepo/project/python-package/1.0.0/"
        );
        assert_eq!(
            doc["info"]["project_urls"]["Source"],
            "https://github.com/User123/PythonPackage"
        );

        let urls = doc["urls"].as_array().unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0]["filename"], "pkg-1.0.0.tar.gz");
        assert_eq!(urls[0]["packagetype"], "sdist");
        assert_eq!(urls[0]["digests"]["sha256"], "ab12");
        assert_eq!(urls[1]["packagetype"], "bdist_wheel");
        assert_eq!(urls[1]["python_version"], "py3");
        assert_eq!(urls[1]["has_sig"], true);
        assert!(urls[1]["digests"].as_object().unwrap().is_empty());

        let releases = doc["releases"].as_object().unwrap();
        assert_eq!(releases.keys().collect::<Vec<_>>(), vec!["0.9.0", "1.0.0"]);
    }

    #[test]
    fn test_metadata_and_digests() {
        let mut record = record();
        {
            let latest = &mut record.releases[1];
            latest.metadata = Some(DistributionMetadata {
                summary: Some("A small package".to_string()),
                requires_python: Some(">=3.8".to_string()),
                classifiers: vec!["Programming Language :: Python :: 3".to_string()],
                requires_dist: vec!["requests".to_string()],
                project_urls: vec!["Documentation, https://docs.example.com".to_string()],
                ..Default::default()
            });
            let sdist = &mut latest.assets[0];
            sdist.mirrored = true;
            sdist.md5 = Some("5d41402abc4b2a76b9719d911017c592".to_string());
            sdist.blake2_256 = Some("b2".to_string());
        }

        let doc = project_document(&config(), &record, record.latest_release().unwrap());
        let info = &doc["info"];
        assert_eq!(info["summary"], "A small package");
        assert_eq!(info["requires_python"], ">=3.8");
        assert_eq!(info["classifiers"][0], "Programming Language :: Python :: 3");
        assert_eq!(info["requires_dist"][0], "requests");
        assert_eq!(info["project_urls"]["Documentation"], "https://docs.example.com");
        assert_eq!(info["project_urls"]["Source"], "https://github.com/User123/PythonPackage");
        assert_eq!(info["home_page"], "https://github.com/User123/PythonPackage");

        let sdist = &doc["urls"][0];
        assert_eq!(sdist["url"], "User123.github.io/MyRepo/files/pkg-1.0.0.tar.gz");
        assert_eq!(sdist["requires_python"], ">=3.8");
        assert_eq!(sdist["md5_digest"], "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(sdist["digests"]["md5"], "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(sdist["digests"]["blake2_256"], "b2");
        assert_eq!(sdist["digests"]["sha256"], "ab12");

        let older = project_document(&config(), &record, record.release("0.9.0").unwrap());
        assert_eq!(older["info"]["summary"], Value::Null);
        assert_eq!(older["info"]["requires_dist"], Value::Null);
        assert_eq!(older["urls"][0]["md5_digest"], Value::Null);
    }

    #[test]
    fn test_release_document() {
        let record = record();
        let doc = project_document(&config(), &record, record.release("0.9.0").unwrap());
        assert_eq!(doc["info"]["version"], "0.9.0");
        assert_eq!(doc["urls"][0]["filename"], "pkg-0.9.0.tar.gz");
        assert_eq!(doc["urls"][0]["upload_time"], Value::Null);
    }

    #[test]
    fn test_render_is_stable() {
        let record = record();
        let release = record.latest_release().unwrap();
        let first = render(&config(), &record, release).unwrap();
        assert_eq!(first, render(&config(), &record, release).unwrap());
        assert!(first.ends_with("}\n"));
    }
}
