// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Description and keywords taken from a page's meta tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

/// Text extracted from one visit of a URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub id: Uuid,
    /// Key of the owning `UrlRecord`
    pub url: String,
    pub content_text: String,
    pub page_title: String,
    pub metadata: PageMetadata,
    pub created_at: DateTime<Utc>,
}

impl PageContent {
    pub fn new(
        url: impl Into<String>,
        content_text: String,
        page_title: String,
        metadata: PageMetadata,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            url: url.into(),
            content_text,
            page_title,
            metadata,
            created_at: Utc::now(),
        }
    }
}
