//! Page rendering on MiniJinja
//!
//! Templates are compiled into the binary. Every page is rendered from a
//! small view struct built here, so the templates never see store types
//! directly and the on-disk format can change without touching them.

use chrono::{DateTime, SecondsFormat, Utc};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use warehub_core::{DistributionMetadata, IndexConfig, PackageRecord, ReleaseAsset, ReleaseEntry, Snapshot};

use crate::error::{EngineError, Result};
use crate::filters;
use crate::site::version_dir;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("simple.html", include_str!("../templates/simple.html")),
    ("homepage.html", include_str!("../templates/homepage.html")),
    ("project.html", include_str!("../templates/project.html")),
];

/// Title of the PEP503 root page
pub const SIMPLE_INDEX_TITLE: &str = "Simple index";

#[derive(Serialize)]
struct Link {
    href: String,
    text: String,
    gpg_sig: bool,
}

#[derive(Serialize)]
struct SimplePage<'a> {
    title: &'a str,
    links: Vec<Link>,
}

#[derive(Serialize)]
struct ConfigView<'a> {
    title: &'a str,
    description: &'a str,
    image_url: &'a str,
}

#[derive(Serialize)]
struct PackageCard<'a> {
    name: &'a str,
    version: Option<&'a str>,
}

#[derive(Serialize)]
struct Homepage<'a> {
    config: ConfigView<'a>,
    packages: Vec<PackageCard<'a>>,
    simple_url: String,
    home: &'static str,
    generator_version: &'static str,
}

#[derive(Serialize)]
struct FileView<'a> {
    url: String,
    filename: &'a str,
    kind: &'static str,
    python_version: &'a str,
    size: u64,
    has_signature: bool,
    sha256: Option<&'a str>,
}

#[derive(Serialize)]
struct ReleaseLink<'a> {
    href: String,
    version: &'a str,
    prerelease: bool,
    published: Option<String>,
}

#[derive(Serialize)]
struct UrlView<'a> {
    label: &'a str,
    url: &'a str,
}

#[derive(Serialize)]
struct MetadataView<'a> {
    summary: Option<&'a str>,
    license: Option<&'a str>,
    author: Option<&'a str>,
    requires_python: Option<&'a str>,
    project_urls: Vec<UrlView<'a>>,
    requires_dist: &'a [String],
    classifiers: &'a [String],
    description: Option<&'a str>,
}

impl<'a> MetadataView<'a> {
    fn new(meta: &'a DistributionMetadata) -> Self {
        Self {
            summary: meta.summary.as_deref(),
            license: meta.license.as_deref(),
            author: meta.author.as_deref().or(meta.author_email.as_deref()),
            requires_python: meta.requires_python.as_deref(),
            project_urls: meta
                .project_url_pairs()
                .map(|(label, url)| UrlView { label, url })
                .collect(),
            requires_dist: &meta.requires_dist,
            classifiers: &meta.classifiers,
            description: meta.description.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct ProjectPage<'a> {
    config: ConfigView<'a>,
    name: &'a str,
    version: &'a str,
    prerelease: bool,
    pip_version: String,
    repository: &'a str,
    repository_url: Option<&'a str>,
    metadata: Option<MetadataView<'a>>,
    files: Vec<FileView<'a>>,
    releases: Vec<ReleaseLink<'a>>,
    simple_url: String,
    home: &'static str,
    generator_version: &'static str,
}

/// Which project page is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectView {
    /// `project/<name>/`, showing the latest release
    Latest,
    /// `project/<name>/<version>/`
    Release,
}

/// Renders every page kind of the site
pub struct PageRenderer {
    env: Environment<'static>,
    config: IndexConfig,
}

impl PageRenderer {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // The `html` filter escapes explicitly; the builtin escaper would
        // also rewrite `/` inside every URL
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        env.add_filter("html", filters::html);
        env.add_filter("filesize", filters::filesize);
        env.add_filter("date", filters::date);

        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| EngineError::template(name, e))?;
        }

        Ok(Self {
            env,
            config: config.clone(),
        })
    }

    fn render<S: Serialize>(&self, template: &str, ctx: S) -> Result<String> {
        self.env
            .get_template(template)
            .and_then(|t| t.render(ctx))
            .map_err(|e| EngineError::template(template, e))
    }

    fn config_view(&self) -> ConfigView<'_> {
        ConfigView {
            title: &self.config.title,
            description: &self.config.description,
            image_url: &self.config.image_url,
        }
    }

    /// `simple/index.html`: one link per package, in name order
    pub fn simple_root(&self, snapshot: &Snapshot) -> Result<String> {
        let links = snapshot
            .values()
            .map(|record| Link {
                href: format!("{}/", record.name),
                text: record.name.clone(),
                gpg_sig: false,
            })
            .collect();

        self.render(
            "simple.html",
            SimplePage {
                title: SIMPLE_INDEX_TITLE,
                links,
            },
        )
    }

    /// `simple/<name>/index.html`: one link per file across all releases
    pub fn simple_package(&self, record: &PackageRecord) -> Result<String> {
        let title = format!("Links for {}", record.name);
        let base_url = self.config.base_url();
        let links = record
            .assets()
            .map(|asset| Link {
                href: asset.pep503_href(base_url),
                text: asset.filename.clone(),
                gpg_sig: asset.has_signature,
            })
            .collect();

        self.render(
            "simple.html",
            SimplePage {
                title: &title,
                links,
            },
        )
    }

    /// `index.html`: one card per package with its latest version
    pub fn homepage(&self, snapshot: &Snapshot) -> Result<String> {
        let packages = snapshot
            .values()
            .map(|record| PackageCard {
                name: &record.name,
                version: record.latest_release().map(|r| r.version.as_str()),
            })
            .collect();

        self.render(
            "homepage.html",
            Homepage {
                config: self.config_view(),
                packages,
                simple_url: self.config.simple_url(),
                home: "./",
                generator_version: env!("CARGO_PKG_VERSION"),
            },
        )
    }

    /// A project page for one release of `record`
    pub fn project(
        &self,
        record: &PackageRecord,
        release: &ReleaseEntry,
        view: ProjectView,
    ) -> Result<String> {
        let (home, prefix, pip_version) = match view {
            ProjectView::Latest => ("../../", "", String::new()),
            ProjectView::Release => ("../../../", "../", format!("=={}", release.version)),
        };

        // Newest first
        let releases = record
            .releases
            .iter()
            .rev()
            .map(|r| ReleaseLink {
                href: format!("{}{}/", prefix, version_dir(&r.version)),
                version: &r.version,
                prerelease: r.prerelease,
                published: r.published_at.as_ref().map(rfc3339),
            })
            .collect();

        self.render(
            "project.html",
            ProjectPage {
                config: self.config_view(),
                name: &record.name,
                version: &release.version,
                prerelease: release.prerelease,
                pip_version,
                repository: &record.repository,
                repository_url: record.repository_url.as_deref(),
                metadata: release.metadata.as_ref().map(MetadataView::new),
                files: release
                    .assets
                    .iter()
                    .map(|asset| file_view(asset, self.config.base_url()))
                    .collect(),
                releases,
                simple_url: self.config.simple_url(),
                home,
                generator_version: env!("CARGO_PKG_VERSION"),
            },
        )
    }
}

fn file_view<'a>(asset: &'a ReleaseAsset, base_url: &str) -> FileView<'a> {
    FileView {
        url: asset.url(base_url),
        filename: &asset.filename,
        kind: asset.kind.as_str(),
        python_version: &asset.python_version,
        size: asset.size,
        has_signature: asset.has_signature,
        sha256: asset.sha256.as_deref(),
    }
}

pub(crate) fn rfc3339(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
