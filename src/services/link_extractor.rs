// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::config::CrawlConfig;
use crate::models::page::FetchedPage;
use std::collections::BTreeSet;
use url::Url;

const IMAGE_SUFFIXES: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];
const PDF_SUFFIX: &str = ".pdf";

/// Link filtering rules derived from a crawl config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlPolicy {
    pub exclude_images: bool,
    pub exclude_pdfs: bool,
    /// Registrable domain every candidate host must contain, if set
    pub seed_domain: Option<String>,
}

impl CrawlPolicy {
    pub fn from_config(config: &CrawlConfig) -> Self {
        let seed_domain = if config.stay_on_domain {
            config
                .seed_list()
                .into_iter()
                .filter_map(canonicalize)
                .find_map(|seed| registrable_domain(&seed))
        } else {
            None
        };

        Self {
            exclude_images: config.exclude_images,
            exclude_pdfs: config.exclude_pdfs,
            seed_domain,
        }
    }

    /// Apply the file-type and domain filters to a canonical URL
    pub fn accepts(&self, url: &Url) -> bool {
        let lower = url.as_str().to_ascii_lowercase();

        if self.exclude_images && IMAGE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return false;
        }
        if self.exclude_pdfs && lower.ends_with(PDF_SUFFIX) {
            return false;
        }
        if let Some(domain) = &self.seed_domain {
            let host = url.host_str().unwrap_or_default();
            if !host.contains(domain.as_str()) {
                return false;
            }
        }
        true
    }
}

/// A candidate URL found on a page, one hop deeper than its parent
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredLink {
    pub url: String,
    pub depth: u32,
}

/// Filter a page's links down to deduplicated, in-policy absolute URLs
pub fn extract_links(
    page: &FetchedPage,
    current_depth: u32,
    policy: &CrawlPolicy,
) -> Vec<DiscoveredLink> {
    let accepted: BTreeSet<String> = page
        .links
        .iter()
        .filter_map(|link| parse_crawlable(link))
        .filter(|url| policy.accepts(url))
        .map(String::from)
        .collect();

    accepted
        .into_iter()
        .map(|url| DiscoveredLink {
            url,
            depth: current_depth + 1,
        })
        .collect()
}

/// Parse an absolute http(s) URL with a host and drop its fragment
fn parse_crawlable(raw: &str) -> Option<Url> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Canonical string form of a crawlable URL, or `None` if it is not one
pub fn canonicalize(raw: &str) -> Option<String> {
    parse_crawlable(raw).map(String::from)
}

pub fn is_crawlable_url(raw: &str) -> bool {
    parse_crawlable(raw).is_some()
}

/// Host without a leading `www.`, cut to its last two labels.
///
/// Multi-part public suffixes such as `co.uk` are not recognised:
/// `news.bbc.co.uk` yields `co.uk`.
pub fn registrable_domain(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() > 2 {
        Some(labels[labels.len() - 2..].join("."))
    } else {
        Some(host.to_string())
    }
}
