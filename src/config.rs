use anyhow::{bail, Result};
use std::str::FromStr;
use std::time::Duration;

use crate::domain::order::DEFAULT_PAGE_SIZE;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Read from the environment once at startup:
//
//   SERVER_HOST              bind host                (0.0.0.0)
//   SERVER_PORT              bind port                (3000)
//   REDIS_ADDR               redis host:port          (localhost:6379)
//   ORDERS_STORE             redis | memory           (redis)
//   ORDERS_STORE_TIMEOUT_MS  per-call deadline, 0=off (5000)
//   ORDERS_PAGE_SIZE         GET /orders page size    (50)
//   SHUTDOWN_TIMEOUT_SECS    graceful shutdown window (10)
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown store backend '{}' (expected redis or memory)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub redis_addr: String,
    pub store: StoreBackend,
    pub store_timeout: Option<Duration>,
    pub page_size: usize,
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            redis_addr: "localhost:6379".to_string(),
            store: StoreBackend::Redis,
            store_timeout: Some(Duration::from_millis(5000)),
            page_size: DEFAULT_PAGE_SIZE,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("SERVER_HOST") {
            let host = host.trim();
            if host.is_empty() {
                bail!("SERVER_HOST must not be empty");
            }
            config.host = host.to_string();
        }

        if let Some(port) = parse_var(&lookup, "SERVER_PORT")? {
            config.port = port;
        }

        if let Some(addr) = lookup("REDIS_ADDR") {
            config.redis_addr = addr;
        }

        if let Some(store) = parse_var(&lookup, "ORDERS_STORE")? {
            config.store = store;
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "ORDERS_STORE_TIMEOUT_MS")? {
            config.store_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        if let Some(size) = parse_var::<usize, _>(&lookup, "ORDERS_PAGE_SIZE")? {
            if size == 0 {
                bail!("ORDERS_PAGE_SIZE must be greater than zero");
            }
            config.page_size = size;
        }

        if let Some(secs) = parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS")? {
            config.shutdown_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Host and port in the form `HttpServer::bind` resolves; names and
    /// bare IPv6 literals are accepted.
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    pub fn redis_url(&self) -> String {
        if self.redis_addr.contains("://") {
            self.redis_addr.clone()
        } else {
            format!("redis://{}", self.redis_addr)
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid {} '{}': {}", name, raw, e)),
        None => Ok(None),
    }
}
