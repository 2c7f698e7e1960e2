// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::content::PageMetadata;
use crate::models::error::FetchError;
use crate::models::page::FetchedPage;
use crate::models::settings::DEFAULT_MAX_BODY_BYTES;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{ElementRef, Html, Node, Selector};
use std::io::{self, Read};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Elements whose text never counts as page content
const SKIPPED_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Retrieves and parses a single page. Implementations must not panic on
/// network or content problems; they report them as `FetchError`.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Blocking HTTP fetcher used by the worker threads
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Build a fetcher with a bounded request timeout and a fixed user agent.
    ///
    /// Must be called outside of an async runtime.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    /// Parse at most `limit` bytes of each body
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

fn body_read_error(e: io::Error) -> FetchError {
    if e.kind() == io::ErrorKind::TimedOut {
        FetchError::Timeout
    } else {
        FetchError::Body(e.to_string())
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let response = self.client.get(parsed).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase());
        if let Some(content_type) = content_type {
            if !is_markup_content_type(&content_type) {
                return Err(FetchError::UnsupportedContentType(content_type));
            }
        }

        // The final URL after redirects is the base for relative links
        let final_url = response.url().to_string();
        let mut raw = Vec::new();
        response
            .take(self.max_body_bytes as u64)
            .read_to_end(&mut raw)
            .map_err(body_read_error)?;
        if raw.len() >= self.max_body_bytes {
            debug!(limit = self.max_body_bytes, "response body truncated");
        }
        let body = String::from_utf8_lossy(&raw);

        let mut page = parse_document(&final_url, &body);
        page.url = url.to_string();
        Ok(page)
    }
}

/// Content types the parser can make sense of
fn is_markup_content_type(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    mime.starts_with("text/")
        || mime == "application/xml"
        || mime == "application/xhtml+xml"
        || mime.ends_with("+xml")
}

/// Parse an HTML document into text, title, meta tags and absolute links
pub fn parse_document(page_url: &str, html: &str) -> FetchedPage {
    let document = Html::parse_document(html);

    FetchedPage {
        url: page_url.to_string(),
        title: extract_title(&document),
        text: extract_body_text(&document),
        metadata: PageMetadata {
            description: extract_meta(&document, "description"),
            keywords: extract_meta(&document, "keywords"),
        },
        links: extract_hrefs(&document, page_url),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_title(document: &Html) -> String {
    let Some(title_selector) = selector("title") else {
        return String::new();
    };
    document
        .select(&title_selector)
        .next()
        .map(|title| normalize_whitespace(&title.text().collect::<String>()))
        .unwrap_or_default()
}

fn extract_body_text(document: &Html) -> String {
    let Some(body_selector) = selector("body") else {
        return String::new();
    };
    let mut text = String::new();
    if let Some(body) = document.select(&body_selector).next() {
        collect_text(body, &mut text);
    }
    normalize_whitespace(&text)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push(' ');
                out.push_str(text);
            }
            Node::Element(el) if SKIPPED_TEXT_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

/// `content` of the first `<meta name=...>` matching `name`, ignoring case
fn extract_meta(document: &Html, name: &str) -> Option<String> {
    let meta_selector = selector("meta[name]")?;
    document
        .select(&meta_selector)
        .find(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

/// Every `a[href]` resolved against `<base href>` or the page URL
fn extract_hrefs(document: &Html, page_url: &str) -> Vec<String> {
    let Ok(page_base) = Url::parse(page_url) else {
        return Vec::new();
    };

    let base = selector("base[href]")
        .and_then(|s| document.select(&s).next())
        .and_then(|b| b.value().attr("href"))
        .and_then(|href| page_base.join(href.trim()).ok())
        .unwrap_or(page_base);

    let Some(link_selector) = selector("a[href]") else {
        return Vec::new();
    };

    document
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter_map(|href| base.join(href).ok())
        .map(String::from)
        .collect()
}
