// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::content::PageMetadata;

/// A fetched and parsed HTML document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    /// The URL the page was requested from
    pub url: String,
    pub title: String,
    /// Whitespace-normalized text of the body
    pub text: String,
    pub metadata: PageMetadata,
    /// Hyperlinks resolved to absolute URLs, in document order
    pub links: Vec<String>,
}
