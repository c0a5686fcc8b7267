//! Warehub Core - Core types for the static Python package index generator
//!
//! This crate provides the foundational types used throughout warehub:
//! - `TrackedRepository`: A source repository whose releases feed the index
//! - `PackageRecord`: A PEP503 package assembled from release assets
//! - `IndexConfig`: Presentation settings for the generated site
//! - `DistributionMetadata`: Core metadata read from distribution files
//! - `SecretsMap`: `%%KEY%%` placeholder resolution
//! - `normalize_name`: PEP503 name canonicalization

pub mod config;
pub mod distribution;
pub mod error;
pub mod metadata;
pub mod name;
pub mod package;
pub mod repository;
pub mod request;
pub mod secrets;

pub use config::IndexConfig;
pub use distribution::DistributionKind;
pub use error::{CoreError, Result};
pub use name::{default_package_name, is_valid_name, normalize_name};
pub use metadata::DistributionMetadata;
pub use package::{FILES_DIR, PackageRecord, ReleaseAsset, ReleaseEntry, Snapshot};
pub use repository::{CredentialRef, TrackedRepository, DEFAULT_DOMAIN};
pub use request::AdditionRequest;
pub use secrets::{SecretLookup, SecretValue, SecretsMap, placeholder, resolve};
