// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Stamps `CRAWL_AGENT_VERSION` for `/version` and `--version`.
//!
//! Release pipelines set `CRAWL_AGENT_PATCH_VERSION` to a build number, which
//! replaces the patch segment of the package version.

use std::env;

const PATCH_OVERRIDE: &str = "CRAWL_AGENT_PATCH_VERSION";

fn package_segment(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("cargo did not provide {name}"))
}

fn main() {
    println!("cargo:rerun-if-env-changed={PATCH_OVERRIDE}");
    println!("cargo:rerun-if-changed=Cargo.toml");

    let major = package_segment("CARGO_PKG_VERSION_MAJOR");
    let minor = package_segment("CARGO_PKG_VERSION_MINOR");

    let patch = match env::var(PATCH_OVERRIDE) {
        Ok(build) if !build.trim().is_empty() => {
            let build = build.trim().to_string();
            assert!(
                build.bytes().all(|b| b.is_ascii_digit()),
                "{PATCH_OVERRIDE} must be numeric, got {build:?}"
            );
            build
        }
        _ => package_segment("CARGO_PKG_VERSION_PATCH"),
    };

    println!("cargo:rustc-env=CRAWL_AGENT_VERSION={major}.{minor}.{patch}");
}
