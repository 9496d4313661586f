//! Cursor metadata for the indexed consume mode.
//!
//! The index file pins the read cursor to a checksum of the code list it
//! was computed against, so external edits to the codes file can be
//! detected and reconciled on the next load.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use super::error::StorageResult;
use super::persistence::atomic_write;
use crate::utils::iso8601_now;

/// Prefix naming the digest algorithm in stored checksums.
pub const CHECKSUM_ALGORITHM: &str = "sha256";

/// On-disk cursor state: `{next_index, codes_checksum, updated_at}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFile {
    /// Position of the next code to hand out.
    pub next_index: usize,

    /// Checksum of the code list `next_index` refers to.
    pub codes_checksum: String,

    /// ISO-8601 timestamp of the last write.
    pub updated_at: String,
}

impl IndexFile {
    pub fn new(next_index: usize, codes_checksum: impl Into<String>) -> Self {
        Self {
            next_index,
            codes_checksum: codes_checksum.into(),
            updated_at: iso8601_now(),
        }
    }

    /// Load the index, falling back to a zeroed cursor when the file is
    /// missing or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::new(0, "");
        };

        match serde_json::from_str(&json) {
            Ok(index) => index,
            Err(e) => {
                crate::debug_event!("store", "malformed index", "{}: {e}", path.display());
                Self::new(0, "")
            }
        }
    }

    /// Persist the index atomically.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }

    /// True when the stored cursor already matches the reconciled state.
    pub fn matches(&self, next_index: usize, checksum: &str) -> bool {
        self.next_index == next_index && self.codes_checksum == checksum
    }
}

/// Compute `"sha256:<hex>"` over the newline-joined code list.
pub fn compute_checksum(codes: &[String]) -> String {
    let joined = codes.join("\n");
    let digest = Sha256::digest(joined.as_bytes());
    format!("{CHECKSUM_ALGORITHM}:{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_checksum_format() {
        let checksum = compute_checksum(&["111111".to_string(), "222222".to_string()]);
        assert!(checksum.starts_with("sha256:"));
        let hex = checksum.trim_start_matches("sha256:");
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_checksum_of_empty_list() {
        // sha256 of the empty string
        assert_eq!(
            compute_checksum(&[]),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_checksum_depends_on_order() {
        let a = compute_checksum(&["111111".to_string(), "222222".to_string()]);
        let b = compute_checksum(&["222222".to_string(), "111111".to_string()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");

        let index = IndexFile::new(3, "sha256:abc");
        index.save(&path).unwrap();

        let loaded = IndexFile::load_or_default(&path);
        assert_eq!(loaded, index);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"next_index\": 3"));
        assert!(raw.contains("\"codes_checksum\""));
        assert!(raw.contains("\"updated_at\""));
    }

    #[test]
    fn test_malformed_index_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");
        fs::write(&path, "{ not json").unwrap();

        let loaded = IndexFile::load_or_default(&path);
        assert_eq!(loaded.next_index, 0);
        assert!(loaded.codes_checksum.is_empty());

        let missing = IndexFile::load_or_default(&temp_dir.path().join("missing.json"));
        assert_eq!(missing.next_index, 0);
    }
}
