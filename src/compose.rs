//!
//! Canonical hash of an application compose manifest.
//!
//! The manifest published for a dstack application contains the registry
//! credentials used to pull images (`docker_config`). They differ between
//! deployments of the same application and are not part of the measured
//! manifest, so the hash is computed over the manifest with that field
//! emptied, serialized as compact JSON.
//!
use std::fs;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::utils::encode_hex;

/// Field of the manifest that is discarded before hashing
pub const VOLATILE_FIELD: &str = "docker_config";
/// Key under which a manifest that isn't a JSON object is wrapped
pub const RAW_CONTENT_KEY: &str = "content";

#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ComposeError {
    #[error("file {filename} error: {e}")]
    File { e: std::io::Error, filename: String },

    #[error("cannot serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("hash: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),
}
type Result<T> = core::result::Result<T, ComposeError>;

/// An application compose manifest
#[derive(Clone, Debug, PartialEq)]
pub enum ComposeManifest {
    /// The manifest parsed as a JSON object, keys in document order
    Structured(Map<String, Value>),
    /// Anything else, kept verbatim
    Raw(String),
}

impl ComposeManifest {
    /// Parse the manifest text. Text that isn't a JSON object (YAML compose
    /// files, JSON arrays or scalars, garbage) is kept as raw content.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => ComposeManifest::Structured(map),
            Ok(_) => {
                log::debug!("manifest is not a JSON object, hashing it as raw content");
                ComposeManifest::Raw(text.to_string())
            }
            Err(e) => {
                log::debug!("manifest is not JSON ({e}), hashing it as raw content");
                ComposeManifest::Raw(text.to_string())
            }
        }
    }

    /// Read and parse a manifest file
    pub fn from_file(filename: &str) -> Result<Self> {
        let content = fs::read_to_string(filename).map_err(|e| ComposeError::File {
            e,
            filename: filename.to_string(),
        })?;
        Ok(Self::parse(&content))
    }

    /// The document that gets hashed. `docker_config` is replaced by an empty
    /// object, keeping its position if present, appended otherwise.
    pub fn canonical_document(&self) -> Value {
        match self {
            ComposeManifest::Structured(map) => {
                let mut map = map.clone();
                map.insert(VOLATILE_FIELD.to_string(), Value::Object(Map::new()));
                Value::Object(map)
            }
            ComposeManifest::Raw(text) => {
                let mut map = Map::new();
                map.insert(RAW_CONTENT_KEY.to_string(), Value::String(text.clone()));
                Value::Object(map)
            }
        }
    }

    /// Compact JSON serialization of the canonical document, with no
    /// whitespace and no trailing newline
    pub fn canonical_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.canonical_document())?)
    }

    /// SHA-256 of the canonical string
    pub fn hash(&self) -> Result<[u8; 32]> {
        let canonical = self.canonical_string()?;
        log::trace!("canonical manifest: {canonical}");

        let digest = openssl::hash::hash(
            openssl::hash::MessageDigest::sha256(),
            canonical.as_bytes(),
        )?;
        let mut h = [0; 32];
        h.copy_from_slice(&digest);
        Ok(h)
    }
}

/// Compute the compose hash of a manifest, hex-encoded. Returns an empty
/// string for a blank manifest, or if hashing fails.
pub fn compose_hash(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    match ComposeManifest::parse(text).hash() {
        Ok(h) => encode_hex(&h),
        Err(e) => {
            log::warn!("cannot hash compose manifest: {e}");
            String::new()
        }
    }
}
