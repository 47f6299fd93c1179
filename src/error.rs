// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StorageError;

/// Failures that stop the server from starting or serving.
///
/// Session-level failures never surface here; they are [`crate::auth::AuthError`]s
/// and at worst leave the viewer signed out.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Session storage unavailable: {0}")]
    Storage(#[from] StorageError),
    #[error("Server I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
