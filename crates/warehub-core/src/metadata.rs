//! Core metadata of a Python distribution (`PKG-INFO` / `METADATA`)
//!
//! Both files use the same RFC 822 style layout: `Key: value` headers,
//! indented continuation lines, and since metadata 2.1 an optional
//! description body after the first blank line.

use serde::{Deserialize, Serialize};

/// Value written by older setuptools for fields it had no data for
const UNKNOWN: &str = "UNKNOWN";

/// The subset of core metadata the index publishes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DistributionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_page: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_python: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classifiers: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires_dist: Vec<String>,

    /// `Label, URL` pairs as written in `Project-URL`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_urls: Vec<String>,
}

impl DistributionMetadata {
    /// Parse a `PKG-INFO` or `METADATA` document.
    ///
    /// Unknown headers are ignored. Returns `None` when the text carries no
    /// recognizable header at all.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.replace("\r\n", "\n");
        let (head, body) = match text.split_once("\n\n") {
            Some((head, body)) => (head, Some(body)),
            None => (text.as_str(), None),
        };

        let mut headers: Vec<(String, String)> = Vec::new();
        for line in head.lines() {
            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = headers.last_mut() {
                    value.push('\n');
                    value.push_str(continuation(line));
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }

        let mut meta = Self::default();
        let mut recognized = false;
        for (key, value) in headers {
            recognized |= meta.apply(&key, value);
        }
        if !recognized {
            return None;
        }

        if let Some(body) = body.map(str::trim_end).filter(|b| !b.trim().is_empty()) {
            meta.description = Some(body.to_string());
        }
        Some(meta)
    }

    fn apply(&mut self, key: &str, value: String) -> bool {
        let single = |slot: &mut Option<String>| {
            let value = value.trim_end().to_string();
            if !value.is_empty() && value != UNKNOWN {
                *slot = Some(value);
            }
        };

        match key {
            "metadata-version" => single(&mut self.metadata_version),
            "name" => single(&mut self.name),
            "version" => single(&mut self.version),
            "summary" => single(&mut self.summary),
            "description" => single(&mut self.description),
            "description-content-type" => single(&mut self.description_content_type),
            "keywords" => single(&mut self.keywords),
            "home-page" => single(&mut self.home_page),
            "author" => single(&mut self.author),
            "author-email" => single(&mut self.author_email),
            "maintainer" => single(&mut self.maintainer),
            "maintainer-email" => single(&mut self.maintainer_email),
            "license" => single(&mut self.license),
            "requires-python" => single(&mut self.requires_python),
            "classifier" => self.classifiers.push(value),
            "requires-dist" => self.requires_dist.push(value),
            "project-url" => self.project_urls.push(value),
            _ => return false,
        }
        true
    }

    /// `Project-URL` entries split into `(label, url)`
    pub fn project_url_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.project_urls
            .iter()
            .filter_map(|entry| entry.split_once(','))
            .map(|(label, url)| (label.trim(), url.trim()))
    }
}

/// Strip the indentation setuptools adds to continuation lines
/// (eight spaces, a tab, and sometimes a `|` margin)
fn continuation(line: &str) -> &str {
    let line = line
        .strip_prefix("        ")
        .or_else(|| line.strip_prefix('\t'))
        .unwrap_or_else(|| line.trim_start());
    line.strip_prefix('|').unwrap_or(line)
}
