// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::url::UrlStatus;
use serde::{Deserialize, Serialize};

/// Progress snapshot published to status subscribers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub visited_count: u64,
    pub pending_count: u64,
    pub failed_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status: Option<UrlStatus>,
}
