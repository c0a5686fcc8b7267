//! Static site generation
//!
//! The generator owns four entries under the output directory:
//!
//! ```text
//! index.html                       homepage
//! simple/index.html                PEP503 root
//! simple/<name>/index.html         PEP503 package page
//! project/<name>/[<version>/]      project pages
//! pypi/<name>/[<version>/]json/    JSON API
//! files/<filename>                 mirrored distributions
//! ```
//!
//! Each run renders the whole tree in memory, then replaces those entries.
//! `files/` is filled by the sync; generation only removes the files no
//! package references any more. Anything else in the output directory
//! (`CNAME`, `.nojekyll`, ...) is left alone.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use warehub_core::name::{is_normalized, is_valid_name};
use warehub_core::{FILES_DIR, IndexConfig, Snapshot};

use crate::error::{EngineError, Result};
use crate::json_api;
use crate::renderer::{PageRenderer, ProjectView};

/// Directories and files rewritten on every run
pub const MANAGED_DIRS: &[&str] = &["simple", "project", "pypi"];
pub const HOMEPAGE_FILE: &str = "index.html";

/// Directory name for a version; `/` cannot appear in a path segment
pub fn version_dir(version: &str) -> String {
    version.replace('/', "-")
}

/// What a generation run wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSite {
    pub root: PathBuf,
    pub packages: usize,
    /// Pages written
    pub files: usize,
    /// Mirrored distribution files served from `files/`
    pub mirrored: usize,
}

/// Renders a snapshot into the static site layout
pub struct SiteGenerator {
    config: IndexConfig,
    renderer: PageRenderer,
}

impl SiteGenerator {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            renderer: PageRenderer::new(config)?,
        })
    }

    /// Render every page, keyed by path relative to the output directory.
    ///
    /// Package names become path segments, so a name that is not a
    /// normalized distribution name fails the whole render.
    pub fn render_all(&self, snapshot: &Snapshot) -> Result<BTreeMap<PathBuf, String>> {
        let mut files = Pages::default();

        files.insert(PathBuf::from(HOMEPAGE_FILE), self.renderer.homepage(snapshot)?);
        files.insert(
            Path::new("simple").join("index.html"),
            self.renderer.simple_root(snapshot)?,
        );

        for record in snapshot.values() {
            let name = record.name.as_str();
            if !is_valid_name(name) || !is_normalized(name) {
                return Err(EngineError::InvalidPackageName {
                    name: name.to_string(),
                });
            }
            files.insert(
                Path::new("simple").join(name).join("index.html"),
                self.renderer.simple_package(record)?,
            );

            let project = Path::new("project").join(name);
            let pypi = Path::new("pypi").join(name);

            if let Some(latest) = record.latest_release() {
                files.insert(
                    project.join("index.html"),
                    self.renderer.project(record, latest, ProjectView::Latest)?,
                );
                files.insert(
                    pypi.join("json").join("index.json"),
                    json_api::render(&self.config, record, latest)?,
                );
            } else {
                tracing::warn!(package = name, "no latest release, skipping project page");
            }

            for release in &record.releases {
                let dir = version_dir(&release.version);
                files.insert(
                    project.join(&dir).join("index.html"),
                    self.renderer.project(record, release, ProjectView::Release)?,
                );
                files.insert(
                    pypi.join(&dir).join("json").join("index.json"),
                    json_api::render(&self.config, record, release)?,
                );
            }
        }

        Ok(files.0)
    }

    /// Regenerate the site under `out` from `snapshot`.
    ///
    /// Rendering finishes before anything on disk is touched, so a template
    /// failure leaves the previous site in place.
    pub fn generate(&self, snapshot: &Snapshot, out: &Path) -> Result<GeneratedSite> {
        let files = self.render_all(snapshot)?;

        if out.exists() && !out.is_dir() {
            return Err(EngineError::NotADirectory {
                path: out.to_path_buf(),
            });
        }
        std::fs::create_dir_all(out).map_err(|e| EngineError::io(out, e))?;

        clear_managed(out)?;

        for (relative, content) in &files {
            let path = out.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
            }
            std::fs::write(&path, content).map_err(|e| EngineError::io(&path, e))?;
        }

        let mirrored = prune_mirror(out, snapshot)?;

        tracing::info!(
            output = %out.display(),
            packages = snapshot.len(),
            files = files.len(),
            mirrored,
            "site generated"
        );

        Ok(GeneratedSite {
            root: out.to_path_buf(),
            packages: snapshot.len(),
            files: files.len(),
            mirrored,
        })
    }
}

/// Rendered pages; a path claimed twice keeps the later page
#[derive(Default)]
struct Pages(BTreeMap<PathBuf, String>);

impl Pages {
    fn insert(&mut self, path: PathBuf, content: String) {
        if self.0.contains_key(&path) {
            tracing::warn!(path = %path.display(), "two releases render to the same page, keeping the later one");
        }
        self.0.insert(path, content);
    }
}

/// Delete mirrored files no package references and report the ones that
/// are referenced but missing. Returns how many referenced files exist.
fn prune_mirror(out: &Path, snapshot: &Snapshot) -> Result<usize> {
    let referenced: HashSet<&str> = snapshot
        .values()
        .flat_map(|record| record.assets())
        .filter(|asset| asset.mirrored)
        .map(|asset| asset.filename.as_str())
        .collect();

    let dir = out.join(FILES_DIR);
    let mut present = HashSet::new();
    if dir.is_dir() {
        let entries = std::fs::read_dir(&dir).map_err(|e| EngineError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::io(&dir, e))?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if !path.is_file() {
                continue;
            }
            if referenced.contains(name.as_str()) {
                present.insert(name);
            } else {
                tracing::debug!(file = %name, "removing unreferenced mirrored file");
                std::fs::remove_file(&path).map_err(|e| EngineError::io(&path, e))?;
            }
        }
    }

    for missing in referenced.iter().filter(|name| !present.contains(**name)) {
        tracing::warn!(file = %missing, "mirrored file is missing, run sync again");
    }
    Ok(present.len())
}

fn clear_managed(out: &Path) -> Result<()> {
    for dir in MANAGED_DIRS {
        let path = out.join(dir);
        if path.is_dir() {
            std::fs::remove_dir_all(&path).map_err(|e| EngineError::io(&path, e))?;
        }
    }

    let homepage = out.join(HOMEPAGE_FILE);
    if homepage.is_file() {
        std::fs::remove_file(&homepage).map_err(|e| EngineError::io(&homepage, e))?;
    }
    Ok(())
}
