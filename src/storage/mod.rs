// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Storage Module
//!
//! Durable, synchronous key-value persistence for the signed-in session.
//!
//! ## Layers
//!
//! - [`KeyValueStorage`] - string key-value backend (memory or files)
//! - [`SessionStore`] - the three-key session contract on top of a backend
//!
//! ## File Layout
//!
//! ```text
//! <DATA_DIR>/
//!   session/
//!     aries_user         # Serialized SessionRecord (JSON)
//!     aries_token        # Opaque session token
//!     aries_auth_state   # Persistence marker ("true")
//! ```
//!
//! There is no schema versioning and no locking: every call is a single
//! synchronous read or write.

pub mod backend;
pub mod file;
pub mod paths;
pub mod session_store;

pub use backend::{KeyValueStorage, MemoryStorage, StorageError, StorageResult};
pub use file::FileStorage;
pub use paths::StoragePaths;
pub use session_store::{
    SessionStore, StoredSession, AUTH_PERSISTENCE_KEY, PERSISTED_MARKER, TOKEN_STORAGE_KEY,
    USER_STORAGE_KEY,
};
