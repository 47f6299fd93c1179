// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Aries Dashboard - Session and Route Gating Service
//!
//! This crate owns the dashboard's client session: it restores the persisted
//! session at startup, performs logins and logouts, and decides for every
//! route whether to render, show a loading placeholder or redirect.
//!
//! ## Modules
//!
//! - `api` - HTTP dashboard shell (Axum)
//! - `auth` - Session controller, route gate and identity provider mirror
//! - `config` - Environment configuration
//! - `storage` - Durable key-value storage for the session

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod state;
pub mod storage;
