//! Core metadata extraction from distribution archives
//!
//! | Kind             | Container | Metadata file              |
//! |------------------|-----------|----------------------------|
//! | sdist `.tar.gz`  | tar+gzip  | `<dir>/PKG-INFO`           |
//! | sdist `.zip`     | zip       | `<dir>/PKG-INFO`           |
//! | wheel            | zip       | `<name>.dist-info/METADATA`|
//! | egg              | zip       | `EGG-INFO/PKG-INFO`        |
//! | wininst `.exe`   | zip       | `*.egg-info[/PKG-INFO]`    |
//!
//! `.tar.bz2` sdists are not opened.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use warehub_core::{DistributionKind, DistributionMetadata};

/// Metadata files larger than this are truncated before parsing
const MAX_METADATA_SIZE: u64 = 1024 * 1024;

/// Read the core metadata of the distribution stored at `path`.
///
/// Archives that cannot be opened, or that carry no metadata file, yield
/// `None`; the file is still published.
pub fn read_metadata(path: &Path, filename: &str, kind: DistributionKind) -> Option<DistributionMetadata> {
    match metadata_text(path, filename, kind) {
        Ok(Some(text)) => DistributionMetadata::parse(&text),
        Ok(None) => {
            tracing::debug!(file = filename, "no metadata file in archive");
            None
        }
        Err(err) => {
            tracing::warn!(file = filename, error = %err, "could not read archive metadata");
            None
        }
    }
}

fn metadata_text(path: &Path, filename: &str, kind: DistributionKind) -> io::Result<Option<String>> {
    let file = File::open(path)?;
    match kind {
        DistributionKind::Sdist if filename.ends_with(".tar.gz") => {
            from_tar(GzDecoder::new(BufReader::new(file)))
        }
        DistributionKind::Sdist if filename.ends_with(".zip") => from_zip(file, is_sdist_pkg_info),
        DistributionKind::Sdist => Ok(None),
        DistributionKind::BdistWheel => from_zip(file, is_wheel_metadata),
        DistributionKind::BdistEgg => from_zip(file, |name| name == "EGG-INFO/PKG-INFO"),
        DistributionKind::BdistWininst => from_zip(file, is_egg_info),
    }
}

fn from_tar(reader: impl Read) -> io::Result<Option<String>> {
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries()? {
        let entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        if is_sdist_pkg_info(&name) {
            return read_limited(entry).map(Some);
        }
    }
    Ok(None)
}

fn from_zip(file: File, wanted: fn(&str) -> bool) -> io::Result<Option<String>> {
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(zip_error)?;

    // Name order in the central directory is not guaranteed
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| wanted(name))
        .map(str::to_string)
        .collect();
    names.sort();

    let Some(name) = names.first() else {
        return Ok(None);
    };
    let entry = archive.by_name(name).map_err(zip_error)?;
    read_limited(entry).map(Some)
}

fn read_limited(reader: impl Read) -> io::Result<String> {
    let mut buf = Vec::new();
    reader.take(MAX_METADATA_SIZE).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn zip_error(err: zip::result::ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

fn is_sdist_pkg_info(name: &str) -> bool {
    let name = name.trim_start_matches("./");
    matches!(name.split_once('/'), Some((dir, "PKG-INFO")) if !dir.is_empty() && !dir.contains('/'))
}

fn is_wheel_metadata(name: &str) -> bool {
    matches!(name.split_once('/'), Some((dir, "METADATA")) if dir.ends_with(".dist-info") && !dir.contains('/'))
}

fn is_egg_info(name: &str) -> bool {
    name.ends_with(".egg-info") || name.ends_with(".egg-info/PKG-INFO")
}
