// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Three-key session persistence.
//!
//! A session is stored under three keys: the serialized record, the opaque
//! token, and a persistence marker. The marker is written last and is
//! required on load, so a save that failed halfway is never mistaken for a
//! valid session.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{KeyValueStorage, StorageError, StorageResult};
use crate::auth::{AuthError, SessionRecord};

pub const USER_STORAGE_KEY: &str = "aries_user";
pub const TOKEN_STORAGE_KEY: &str = "aries_token";
pub const AUTH_PERSISTENCE_KEY: &str = "aries_auth_state";

/// Marker value meaning "a complete session was written".
pub const PERSISTED_MARKER: &str = "true";

const ALL_KEYS: [&str; 3] = [USER_STORAGE_KEY, TOKEN_STORAGE_KEY, AUTH_PERSISTENCE_KEY];

/// A session read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub record: SessionRecord,
    pub token: String,
    pub marker: String,
}

/// Session persistence over a key-value backend.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStorage>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn KeyValueStorage {
        self.backend.as_ref()
    }

    /// Persist a record and token, then the marker.
    ///
    /// On failure every key written so far is put back to the value it held
    /// before the call, so a previous session survives a failed save.
    pub fn save(&self, record: &SessionRecord, token: &str) -> StorageResult<()> {
        let serialized = serde_json::to_string(record)
            .map_err(|e| StorageError::Unavailable(format!("cannot serialize record: {e}")))?;

        let previous = ALL_KEYS
            .iter()
            .map(|key| Ok((*key, self.backend.get(key)?)))
            .collect::<StorageResult<Vec<_>>>()?;

        let writes = [
            (USER_STORAGE_KEY, serialized.as_str()),
            (TOKEN_STORAGE_KEY, token),
            (AUTH_PERSISTENCE_KEY, PERSISTED_MARKER),
        ];

        for (written, (key, value)) in writes.into_iter().enumerate() {
            if let Err(e) = self.backend.set(key, value) {
                warn!(key, error = %e, "Session save failed, rolling back");
                self.roll_back(&previous[..written]);
                return Err(e);
            }
        }

        debug!(user_id = %record.id, "Session persisted");
        Ok(())
    }

    fn roll_back(&self, previous: &[(&str, Option<String>)]) {
        for (key, value) in previous {
            let result = match value {
                Some(value) => self.backend.set(key, value),
                None => self.backend.remove(key),
            };
            if let Err(e) = result {
                warn!(key, error = %e, "Failed to roll back session key");
            }
        }
    }

    /// Read the persisted session.
    ///
    /// Returns `Ok(None)` when any key is missing or the marker is not set,
    /// and `StorageParse` when the record is present but unusable.
    pub fn try_load(&self) -> Result<Option<StoredSession>, AuthError> {
        let record = self.backend.get(USER_STORAGE_KEY)?;
        let token = self.backend.get(TOKEN_STORAGE_KEY)?;
        let marker = self.backend.get(AUTH_PERSISTENCE_KEY)?;

        let (Some(record), Some(token), Some(marker)) = (record, token, marker) else {
            return Ok(None);
        };
        if marker != PERSISTED_MARKER {
            return Ok(None);
        }

        let record = SessionRecord::from_json(&record)?;
        Ok(Some(StoredSession {
            record,
            token,
            marker,
        }))
    }

    /// Read the persisted session, treating any failure as "no session".
    pub fn load(&self) -> Option<StoredSession> {
        match self.try_load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable persisted session");
                None
            }
        }
    }

    /// Remove all three keys. Never fails; backend errors are logged.
    pub fn clear(&self) {
        for key in ALL_KEYS {
            if let Err(e) = self.backend.remove(key) {
                warn!(key, error = %e, "Failed to remove session key");
            }
        }
    }

    /// Re-write the persistence marker.
    pub fn mark_persisted(&self) -> StorageResult<()> {
        self.backend.set(AUTH_PERSISTENCE_KEY, PERSISTED_MARKER)
    }

    /// Write only the token key.
    pub fn put_token(&self, token: &str) -> StorageResult<()> {
        self.backend.set(TOKEN_STORAGE_KEY, token)
    }

    /// Remove only the token key.
    pub fn discard_token(&self) -> StorageResult<()> {
        self.backend.remove(TOKEN_STORAGE_KEY)
    }

    /// Probe the backend.
    pub fn health_check(&self) -> StorageResult<()> {
        self.backend.health_check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage, StoragePaths};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn sample_record() -> SessionRecord {
        SessionRecord::for_email("a@b.com", 1_700_000_000, 3600)
    }

    fn memory_store() -> (SessionStore, Arc<MemoryStorage>) {
        let backend = Arc::new(MemoryStorage::new());
        (SessionStore::new(backend.clone()), backend)
    }

    /// Backend that fails every write after the first `allowed` ones, and
    /// every write to `fail_key`.
    struct FlakyStorage {
        inner: MemoryStorage,
        allowed: usize,
        writes: AtomicUsize,
        fail_key: Option<&'static str>,
    }

    impl KeyValueStorage for FlakyStorage {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            if self.fail_key == Some(key)
                || self.writes.fetch_add(1, Ordering::SeqCst) >= self.allowed
            {
                return Err(StorageError::Unavailable("disk full".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let (store, _) = memory_store();
        let record = sample_record();
        store.save(&record, "token-1").unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.record, record);
        assert_eq!(loaded.token, "token-1");
        assert_eq!(loaded.marker, PERSISTED_MARKER);
    }

    #[test]
    fn save_round_trips_through_file_backend() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = FileStorage::new(StoragePaths::new(temp_dir.path()));
        backend.initialize().unwrap();
        let store = SessionStore::new(Arc::new(backend));

        let record = SessionRecord::for_wallet("0xABC", 1_700_000_000, 60).unwrap();
        store.save(&record, "wallet-token").unwrap();
        assert_eq!(store.load().unwrap().record, record);
    }

    #[test]
    fn missing_any_key_loads_nothing() {
        for missing in ALL_KEYS {
            let (store, backend) = memory_store();
            store.save(&sample_record(), "t").unwrap();
            backend.remove(missing).unwrap();
            assert!(store.load().is_none(), "loaded without {missing}");
            assert!(matches!(store.try_load(), Ok(None)));
        }
    }

    #[test]
    fn wrong_marker_loads_nothing() {
        let (store, backend) = memory_store();
        store.save(&sample_record(), "t").unwrap();
        backend.set(AUTH_PERSISTENCE_KEY, "false").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn unparsable_record_is_a_parse_error() {
        let (store, backend) = memory_store();
        backend.set(USER_STORAGE_KEY, "{broken").unwrap();
        backend.set(TOKEN_STORAGE_KEY, "t").unwrap();
        backend.set(AUTH_PERSISTENCE_KEY, PERSISTED_MARKER).unwrap();

        assert!(matches!(store.try_load(), Err(AuthError::StorageParse(_))));
        assert!(store.load().is_none());
    }

    #[test]
    fn failed_save_leaves_nothing_behind() {
        let backend = Arc::new(FlakyStorage {
            inner: MemoryStorage::new(),
            allowed: 2,
            writes: AtomicUsize::new(0),
            fail_key: None,
        });
        let store = SessionStore::new(backend.clone());

        assert!(store.save(&sample_record(), "t").is_err());
        assert!(store.load().is_none());
        assert!(backend.inner.is_empty());
    }

    #[test]
    fn failed_save_keeps_previous_session() {
        let backend = Arc::new(FlakyStorage {
            inner: MemoryStorage::new(),
            allowed: usize::MAX,
            writes: AtomicUsize::new(0),
            fail_key: Some(TOKEN_STORAGE_KEY),
        });
        let store = SessionStore::new(backend.clone());
        let previous = sample_record();
        let serialized = serde_json::to_string(&previous).unwrap();
        backend.inner.set(USER_STORAGE_KEY, &serialized).unwrap();
        backend.inner.set(TOKEN_STORAGE_KEY, "old-token").unwrap();
        backend.inner.set(AUTH_PERSISTENCE_KEY, PERSISTED_MARKER).unwrap();

        let next = SessionRecord::for_email("b@b.com", 1_700_000_000, 3600);
        assert!(store.save(&next, "new-token").is_err());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.record, previous);
        assert_eq!(loaded.token, "old-token");
        assert_eq!(loaded.marker, PERSISTED_MARKER);
    }

    #[test]
    fn clear_removes_all_keys() {
        let (store, backend) = memory_store();
        store.save(&sample_record(), "t").unwrap();
        store.clear();
        assert!(backend.is_empty());

        // Clearing an empty store is fine too.
        store.clear();
    }

    #[test]
    fn token_only_writes() {
        let (store, backend) = memory_store();
        store.put_token("placeholder").unwrap();
        assert_eq!(
            backend.get(TOKEN_STORAGE_KEY).unwrap().as_deref(),
            Some("placeholder")
        );
        store.discard_token().unwrap();
        assert!(backend.is_empty());
    }
}
