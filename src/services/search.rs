// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::content::PageContent;
use crate::models::crawler::ExportResponse;
use crate::models::search::{SearchHit, SearchRequest, SearchResponse};
use crate::services::store::{ContentStore, UrlStore};
use anyhow::Result;
use chrono::Utc;
use std::collections::HashSet;
use url::Url;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 1000;
/// Characters of context kept on each side of the first match
const EXCERPT_RADIUS: usize = 80;

/// Case-insensitive keyword search over stored page titles and text.
///
/// Only the newest content row of each URL is considered. Results keep
/// newest-first order.
pub fn search_content(contents: &dyn ContentStore, request: &SearchRequest) -> Result<SearchResponse> {
    let query = request.query.trim().to_lowercase();
    let limit = request.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;
    let domain = request
        .domain
        .as_deref()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty());

    if query.is_empty() {
        return Ok(SearchResponse {
            results: Vec::new(),
            total: 0,
        });
    }

    let mut pages = contents.all_content()?;
    pages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let mut seen = HashSet::new();
    let hits: Vec<SearchHit> = pages
        .into_iter()
        .filter(|page| seen.insert(page.url.clone()))
        .filter(|page| domain.as_deref().map_or(true, |d| host_matches(&page.url, d)))
        .filter_map(|page| to_hit(page, &query))
        .collect();

    let total = hits.len();
    Ok(SearchResponse {
        results: hits.into_iter().take(limit).collect(),
        total,
    })
}

/// Dump every URL record and content row
pub fn export_corpus(urls: &dyn UrlStore, contents: &dyn ContentStore) -> Result<ExportResponse> {
    Ok(ExportResponse {
        exported_at: Utc::now().to_rfc3339(),
        urls: urls.all_urls()?,
        pages: contents.all_content()?,
    })
}

fn host_matches(url: &str, domain: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .is_some_and(|host| host.contains(domain))
}

fn to_hit(page: PageContent, query: &str) -> Option<SearchHit> {
    let in_title = page.page_title.to_lowercase().contains(query);
    let excerpt = excerpt_around(&page.content_text, query);
    if !in_title && excerpt.is_none() {
        return None;
    }

    let excerpt = excerpt.unwrap_or_else(|| leading_chars(&page.content_text, EXCERPT_RADIUS * 2));
    Some(SearchHit {
        url: page.url,
        title: page.page_title,
        excerpt,
        description: page.metadata.description,
    })
}

/// Text around the first case-insensitive occurrence of `query`
fn excerpt_around(text: &str, query: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let lowered: Vec<char> = chars.iter().flat_map(|c| c.to_lowercase()).collect();
    let needle: Vec<char> = query.chars().collect();

    // Positions only line up when lowercasing kept the char count
    let position = lowered
        .windows(needle.len())
        .position(|window| window == needle.as_slice())?;
    if lowered.len() != chars.len() {
        return Some(leading_chars(text, EXCERPT_RADIUS * 2));
    }

    let start = position.saturating_sub(EXCERPT_RADIUS);
    let end = (position + needle.len() + EXCERPT_RADIUS).min(chars.len());

    let mut excerpt = String::new();
    if start > 0 {
        excerpt.push_str("...");
    }
    excerpt.extend(&chars[start..end]);
    if end < chars.len() {
        excerpt.push_str("...");
    }
    Some(excerpt)
}

fn leading_chars(text: &str, count: usize) -> String {
    let mut excerpt: String = text.chars().take(count).collect();
    if text.chars().count() > count {
        excerpt.push_str("...");
    }
    excerpt
}
