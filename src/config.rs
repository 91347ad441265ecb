// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for the index and blobs | `./data` |
//! | `STORAGE_BACKEND` | `redb` or `memory` | `redb` |
//! | `API_KEYS` | Tenant seeds, `key=tenant[,key=tenant...]` | empty |
//! | `HISTORY_FANOUT` | Concurrent blob reads per history request | `8` |
//! | `MAX_BODY_BYTES` | Request body limit | `6291456` |
//! | `KEY_CACHE_CAPACITY` | Cached wallet public keys | `1024` |
//! | `KEY_CACHE_TTL_SECS` | Public key cache TTL | `300` |
//! | `TLS_CERT_PATH` | PEM certificate chain (enables TLS with `TLS_KEY_PATH`) | unset |
//! | `TLS_KEY_PATH` | PEM private key | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// redb index + filesystem blobs under `DATA_DIR`
    Redb,
    /// Process memory; nothing survives a restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redb" => Ok(StorageBackend::Redb),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("expected redb or memory, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected json or pretty, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub storage_backend: StorageBackend,
    /// `(api_key, tenant_id)` pairs seeded into the tenant directory.
    pub api_keys: Vec<(String, String)>,
    pub history_fanout: usize,
    pub max_body_bytes: usize,
    pub key_cache_capacity: usize,
    pub key_cache_ttl: Duration,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: PathBuf::from("./data"),
            storage_backend: StorageBackend::Redb,
            api_keys: Vec::new(),
            history_fanout: 8,
            max_body_bytes: 6 * 1024 * 1024,
            key_cache_capacity: 1024,
            key_cache_ttl: Duration::from_secs(300),
            tls: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Unset or empty variables take
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_var(&get, "PORT", defaults.bind_addr.port())?;
        let bind_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "HOST",
                value: host.clone(),
                reason: e.to_string(),
            })?;

        let tls = match (get("TLS_CERT_PATH"), get("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        Ok(Self {
            bind_addr,
            data_dir: get(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            storage_backend: parse_var(&get, "STORAGE_BACKEND", defaults.storage_backend)?,
            api_keys: match get("API_KEYS") {
                Some(raw) => parse_api_keys(&raw)?,
                None => Vec::new(),
            },
            history_fanout: parse_var(&get, "HISTORY_FANOUT", defaults.history_fanout)?.max(1),
            max_body_bytes: parse_var(&get, "MAX_BODY_BYTES", defaults.max_body_bytes)?,
            key_cache_capacity: parse_var(&get, "KEY_CACHE_CAPACITY", defaults.key_cache_capacity)?,
            key_cache_ttl: Duration::from_secs(parse_var(
                &get,
                "KEY_CACHE_TTL_SECS",
                defaults.key_cache_ttl.as_secs(),
            )?),
            tls,
            log_format: parse_var(&get, "LOG_FORMAT", defaults.log_format)?,
        })
    }
}

fn parse_var<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse `key=tenant[,key=tenant...]`.
fn parse_api_keys(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, tenant)) if !key.trim().is_empty() && !tenant.trim().is_empty() => {
                Ok((key.trim().to_string(), tenant.trim().to_string()))
            }
            _ => Err(ConfigError::Invalid {
                name: "API_KEYS",
                value: entry.to_string(),
                reason: "expected key=tenant".to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.data_dir, PathBuf::from("./data"));
        assert_eq!(cfg.storage_backend, StorageBackend::Redb);
        assert_eq!(cfg.history_fanout, 8);
        assert_eq!(cfg.max_body_bytes, 6_291_456);
        assert_eq!(cfg.key_cache_ttl, Duration::from_secs(300));
        assert!(cfg.tls.is_none());
        assert!(cfg.api_keys.is_empty());
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("STORAGE_BACKEND", "memory"),
            ("API_KEYS", "k1=acme, k2=globex"),
            ("HISTORY_FANOUT", "0"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.storage_backend, StorageBackend::Memory);
        assert_eq!(
            cfg.api_keys,
            vec![
                ("k1".to_string(), "acme".to_string()),
                ("k2".to_string(), "globex".to_string())
            ]
        );
        assert_eq!(cfg.history_fanout, 1);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("STORAGE_BACKEND", "s3")]),
            Err(ConfigError::Invalid { name: "STORAGE_BACKEND", .. })
        ));
        assert!(matches!(
            config(&[("API_KEYS", "k1=acme,broken")]),
            Err(ConfigError::Invalid { name: "API_KEYS", .. })
        ));
    }

    #[test]
    fn tls_requires_both_paths() {
        assert_eq!(
            config(&[("TLS_CERT_PATH", "/tls/cert.pem")]).unwrap_err(),
            ConfigError::IncompleteTls
        );

        let cfg = config(&[
            ("TLS_CERT_PATH", "/tls/cert.pem"),
            ("TLS_KEY_PATH", "/tls/key.pem"),
        ])
        .unwrap();
        assert_eq!(cfg.tls.unwrap().key, PathBuf::from("/tls/key.pem"));
    }
}
