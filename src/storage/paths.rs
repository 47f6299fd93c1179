// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the file-backed session storage layout.

use std::path::{Path, PathBuf};

/// Default base directory for persistent session storage.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities for the file backend.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persisted data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one file per session key.
    pub fn session_dir(&self) -> PathBuf {
        self.root.join("session")
    }

    /// Path to the file backing a single storage key.
    pub fn entry(&self, key: &str) -> PathBuf {
        self.session_dir().join(key)
    }

    /// Scratch file used while atomically replacing a key.
    pub fn entry_tmp(&self, key: &str) -> PathBuf {
        self.session_dir().join(format!("{key}.tmp"))
    }
}

/// Keys map directly onto file names, so only a conservative character set
/// is accepted.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("/data"));
        assert_eq!(paths.session_dir(), PathBuf::from("/data/session"));
    }

    #[test]
    fn entry_paths_are_correct() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(
            paths.entry("aries_user"),
            PathBuf::from("/tmp/test-data/session/aries_user")
        );
        assert_eq!(
            paths.entry_tmp("aries_user"),
            PathBuf::from("/tmp/test-data/session/aries_user.tmp")
        );
    }

    #[test]
    fn key_validation_rejects_path_segments() {
        assert!(is_valid_key("aries_auth_state"));
        assert!(is_valid_key("token-1"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("../etc/passwd"));
        assert!(!is_valid_key("a/b"));
        assert!(!is_valid_key("user.tmp"));
    }
}
