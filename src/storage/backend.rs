// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Synchronous string key-value storage.
//!
//! This is the durable, origin-scoped storage the session layer persists
//! into. Every call completes synchronously; there is no network I/O.

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

use thiserror::Error;

/// Error type for storage backend operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Storage not initialized
    #[error("Storage not initialized")]
    NotInitialized,
    /// Key contains characters the backend cannot store
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    /// Backend cannot be reached (poisoned lock, failed device)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    /// Health check read back different bytes than were written
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A synchronous string key-value store.
pub trait KeyValueStorage: Send + Sync {
    /// Read a key. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a key, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a key. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Verify the backend is usable.
    fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// In-process storage, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
