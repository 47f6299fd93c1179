// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! typed configuration loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for persisted session files | unset (in-memory) |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `SESSION_RESTORE_DEBOUNCE_MS` | Minimum delay before startup restore settles | `500` |
//! | `SESSION_TTL_SECS` | Lifetime of a new session | `604800` (7 days) |
//! | `SESSION_ENFORCE_EXPIRY` | Reject expired sessions on restore | `true` |
//! | `LOGIN_LATENCY_MS` | Simulated credential check latency | `0` |
//! | `ENTRY_ROUTE` | Where signed-out viewers are redirected | `/sign-in` |
//! | `HOME_ROUTE` | Where signed-in viewers are redirected | `/dashboard` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Environment variable name for the session data directory path.
///
/// When unset, sessions live in memory and do not survive a restart.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const RESTORE_DEBOUNCE_ENV: &str = "SESSION_RESTORE_DEBOUNCE_MS";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const ENFORCE_EXPIRY_ENV: &str = "SESSION_ENFORCE_EXPIRY";
pub const LOGIN_LATENCY_ENV: &str = "LOGIN_LATENCY_MS";
pub const ENTRY_ROUTE_ENV: &str = "ENTRY_ROUTE";
pub const HOME_ROUTE_ENV: &str = "HOME_ROUTE";

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

pub const DEFAULT_RESTORE_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_ENTRY_ROUTE: &str = "/sign-in";
pub const DEFAULT_HOME_ROUTE: &str = "/dashboard";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

fn invalid(name: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Session controller tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Minimum delay between the startup read and `loading` clearing
    pub restore_debounce: Duration,
    /// Lifetime written into new sessions
    pub session_ttl: Duration,
    /// Reject persisted sessions whose expiry has passed
    pub enforce_expiry: bool,
    /// Delay applied by the default credential verifier
    pub login_latency: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            restore_debounce: DEFAULT_RESTORE_DEBOUNCE,
            session_ttl: DEFAULT_SESSION_TTL,
            enforce_expiry: true,
            login_latency: Duration::ZERO,
        }
    }
}

impl SessionConfig {
    /// Session lifetime in whole seconds.
    pub fn ttl_secs(&self) -> i64 {
        i64::try_from(self.session_ttl.as_secs()).unwrap_or(i64::MAX)
    }
}

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub log_format: LogFormat,
    pub entry_route: String,
    pub home_route: String,
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: None,
            log_format: LogFormat::Pretty,
            entry_route: DEFAULT_ENTRY_ROUTE.to_string(),
            home_route: DEFAULT_HOME_ROUTE.to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(host) = lookup(HOST_ENV) {
            config.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            config.port = port
                .parse()
                .map_err(|_| invalid(PORT_ENV, &port, "expected a port number"))?;
        }
        config.data_dir = lookup(DATA_DIR_ENV)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => return Err(invalid(LOG_FORMAT_ENV, &format, "expected json or pretty")),
            };
        }
        if let Some(route) = lookup(ENTRY_ROUTE_ENV) {
            config.entry_route = parse_route(ENTRY_ROUTE_ENV, route)?;
        }
        if let Some(route) = lookup(HOME_ROUTE_ENV) {
            config.home_route = parse_route(HOME_ROUTE_ENV, route)?;
        }
        if config.entry_route == config.home_route {
            return Err(invalid(
                HOME_ROUTE_ENV,
                &config.home_route,
                "must differ from the entry route",
            ));
        }

        if let Some(ms) = lookup(RESTORE_DEBOUNCE_ENV) {
            config.session.restore_debounce =
                Duration::from_millis(parse_u64(RESTORE_DEBOUNCE_ENV, &ms)?);
        }
        if let Some(secs) = lookup(SESSION_TTL_ENV) {
            let secs = parse_u64(SESSION_TTL_ENV, &secs)?;
            if secs == 0 || i64::try_from(secs).is_err() {
                return Err(invalid(
                    SESSION_TTL_ENV,
                    &secs.to_string(),
                    "must be a positive number of seconds",
                ));
            }
            config.session.session_ttl = Duration::from_secs(secs);
        }
        if let Some(flag) = lookup(ENFORCE_EXPIRY_ENV) {
            config.session.enforce_expiry = parse_bool(ENFORCE_EXPIRY_ENV, &flag)?;
        }
        if let Some(ms) = lookup(LOGIN_LATENCY_ENV) {
            config.session.login_latency =
                Duration::from_millis(parse_u64(LOGIN_LATENCY_ENV, &ms)?);
        }

        Ok(config)
    }

    /// Socket address to bind the HTTP shell to.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| invalid(HOST_ENV, &addr, "expected an IP address"))
    }
}

fn parse_u64(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(name, value, "expected a non-negative integer"))
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value, "expected true or false")),
    }
}

fn parse_route(name: &'static str, value: String) -> Result<String, ConfigError> {
    if value.starts_with('/') {
        Ok(value)
    } else {
        Err(invalid(name, &value, "routes must start with '/'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.session.restore_debounce, Duration::from_millis(500));
        assert_eq!(config.session.ttl_secs(), 604_800);
        assert!(config.session.enforce_expiry);
        assert!(config.data_dir.is_none());
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("PORT", "9000"),
            ("DATA_DIR", "/var/lib/aries"),
            ("LOG_FORMAT", "JSON"),
            ("SESSION_RESTORE_DEBOUNCE_MS", "0"),
            ("SESSION_TTL_SECS", "3600"),
            ("SESSION_ENFORCE_EXPIRY", "off"),
            ("ENTRY_ROUTE", "/login"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/aries")));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.session.restore_debounce, Duration::ZERO);
        assert_eq!(config.session.ttl_secs(), 3600);
        assert!(!config.session.enforce_expiry);
        assert_eq!(config.entry_route, "/login");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("SESSION_TTL_SECS", "0")]).is_err());
        assert!(load(&[("SESSION_ENFORCE_EXPIRY", "maybe")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
        assert!(load(&[("HOME_ROUTE", "dashboard")]).is_err());
        assert!(load(&[("HOME_ROUTE", "/sign-in")]).is_err());
    }

    #[test]
    fn blank_data_dir_means_memory() {
        let config = load(&[("DATA_DIR", "  ")]).unwrap();
        assert!(config.data_dir.is_none());
    }
}
