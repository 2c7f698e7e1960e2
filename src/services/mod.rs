// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod engine;
pub mod fetcher;
pub mod frontier;
pub mod link_extractor;
pub mod logging;
pub mod search;
pub mod status;
pub mod store;
