//! File digests
//!
//! Downloads are hashed as they stream in, so no asset is ever held in
//! memory whole.

use blake2::Blake2b;
use blake2::digest::consts::U32;
use md5::Md5;
use sha2::{Digest, Sha256};
use std::io::Read;

type Blake2b256 = Blake2b<U32>;

const READ_BUFFER: usize = 64 * 1024;

/// Hex digests published for a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigests {
    pub sha256: String,
    pub md5: String,
    pub blake2_256: String,
}

/// Computes every published digest over one byte stream
#[derive(Default)]
pub struct MultiHasher {
    sha256: Sha256,
    md5: Md5,
    blake2: Blake2b256,
    len: u64,
}

impl MultiHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.sha256.update(data);
        self.md5.update(data);
        self.blake2.update(data);
        self.len += data.len() as u64;
    }

    /// Bytes hashed so far
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finish(self) -> FileDigests {
        FileDigests {
            sha256: hex::encode(self.sha256.finalize()),
            md5: hex::encode(self.md5.finalize()),
            blake2_256: hex::encode(self.blake2.finalize()),
        }
    }
}

/// Hash everything `reader` yields
pub fn hash_reader(mut reader: impl Read) -> std::io::Result<FileDigests> {
    let mut hasher = MultiHasher::new();
    let mut buf = vec![0u8; READ_BUFFER];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}

/// Extract the hex hash from an API digest (`sha256:<hex>`).
///
/// Other algorithms and malformed values yield `None`.
pub fn parse_api_digest(digest: &str) -> Option<String> {
    let (algorithm, value) = digest.split_once(':')?;
    if !algorithm.eq_ignore_ascii_case("sha256") {
        return None;
    }
    let value = value.trim();
    if value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(value.to_ascii_lowercase())
    } else {
        None
    }
}
