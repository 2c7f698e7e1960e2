// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Tracing setup and helpers for keeping sensitive URL parts out of logs.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "crawl_agent=info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A subscriber may already be installed (tests, embedding binaries)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}

/// Hide the query string of a URL for logging: "https://a.test/p?***".
/// Query strings often carry session tokens.
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, query)) if !query.is_empty() => format!("{}?***", base),
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}
