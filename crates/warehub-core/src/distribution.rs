//! Python distribution filename classification

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static WHEEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<namever>(?P<name>.+?)(-(?P<ver>\d.+?))?)((-(?P<build>\d.*?))?-(?P<pyver>.+?)-(?P<abi>.+?)-(?P<plat>.+?)\.whl|\.dist-info)$",
    )
    .expect("wheel pattern is valid")
});

static EGG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<namever>(?P<name>.+?)(-(?P<ver>\d.+?))?)((-(?P<build>\d.*?))?-(?P<pyver>.+?)-(?P<abi>.+?)-(?P<plat>.+?)\.egg|\.egg-info)$",
    )
    .expect("egg pattern is valid")
});

static WININST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*py(?P<pyver>\d+\.\d+)\.exe$").expect("wininst pattern is valid"));

/// Distribution format, named as Warehouse names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    Sdist,
    BdistWheel,
    BdistEgg,
    BdistWininst,
}

// Checked in order; `.tar.gz` must precede any shorter suffix it contains
const EXTENSIONS: &[(&str, DistributionKind)] = &[
    (".whl", DistributionKind::BdistWheel),
    (".exe", DistributionKind::BdistWininst),
    (".egg", DistributionKind::BdistEgg),
    (".tar.bz2", DistributionKind::Sdist),
    (".tar.gz", DistributionKind::Sdist),
    (".zip", DistributionKind::Sdist),
];

impl DistributionKind {
    /// Classify by file extension; `None` for files pip cannot install
    pub fn from_filename(filename: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(ext, _)| filename.ends_with(ext))
            .map(|(_, kind)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sdist => "sdist",
            Self::BdistWheel => "bdist_wheel",
            Self::BdistEgg => "bdist_egg",
            Self::BdistWininst => "bdist_wininst",
        }
    }

    /// Python tag for a file of this kind. Source distributions report
    /// `source`; binaries whose name does not match the expected layout
    /// report `any`.
    pub fn python_version(&self, filename: &str) -> String {
        let pattern = match self {
            Self::Sdist => return "source".to_string(),
            Self::BdistWheel => &*WHEEL,
            Self::BdistEgg => &*EGG,
            Self::BdistWininst => &*WININST,
        };

        pattern
            .captures(filename)
            .and_then(|caps| caps.name("pyver"))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "any".to_string())
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
