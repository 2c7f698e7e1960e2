// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// User agent sent with every page request unless overridden
pub const DEFAULT_USER_AGENT: &str = concat!("CrawlAgentBot/", env!("CARGO_PKG_VERSION"));

/// Bytes of a response body kept for parsing; the rest is never read
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Runtime settings read from `CRAWLER_*` environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    /// Larger response bodies are cut off before parsing
    pub max_body_bytes: usize,
    /// How long an idle worker waits on the frontier before re-checking state
    pub poll_interval: Duration,
    /// How long `stop` waits for workers before detaching them
    pub shutdown_timeout: Duration,
    pub default_thread_count: usize,
    /// Capacity of the status broadcast channel
    pub status_buffer: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: Duration::from_secs(10),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            poll_interval: Duration::from_millis(500),
            shutdown_timeout: Duration::from_secs(5),
            default_thread_count: 5,
            status_buffer: 64,
        }
    }
}

impl Settings {
    /// Read settings from the process environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let user_agent = lookup("CRAWLER_USER_AGENT")
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or(defaults.user_agent);

        Ok(Self {
            bind_addr: parse_var(&lookup, "CRAWLER_BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            user_agent,
            fetch_timeout: parse_var(&lookup, "CRAWLER_FETCH_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            max_body_bytes: parse_var::<usize>(&lookup, "CRAWLER_MAX_BODY_BYTES")?
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_body_bytes),
            poll_interval: parse_var(&lookup, "CRAWLER_POLL_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            shutdown_timeout: parse_var(&lookup, "CRAWLER_SHUTDOWN_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
            default_thread_count: parse_var::<usize>(&lookup, "CRAWLER_DEFAULT_THREADS")?
                .filter(|n| *n > 0)
                .unwrap_or(defaults.default_thread_count),
            status_buffer: parse_var::<usize>(&lookup, "CRAWLER_STATUS_BUFFER")?
                .filter(|n| *n > 0)
                .unwrap_or(defaults.status_buffer),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value: {raw}"))
        })
        .transpose()
}
