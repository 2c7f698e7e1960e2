// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod config;
pub mod content;
pub mod crawler;
pub mod error;
pub mod page;
pub mod search;
pub mod settings;
pub mod status;
pub mod url;
pub mod version;
