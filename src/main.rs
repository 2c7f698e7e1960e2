// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crawl_agent::app::{create_router, AppState, VERSION};
use crawl_agent::models::config::NewCrawlConfig;
use crawl_agent::models::settings::Settings;
use crawl_agent::models::url::UrlStatus;
use crawl_agent::services::engine::{Collaborators, CrawlEngine, EngineSettings};
use crawl_agent::services::fetcher::HttpFetcher;
use crawl_agent::services::logging::init_tracing;
use crawl_agent::services::status::BroadcastStatus;
use crawl_agent::services::store::{ConfigStore, MemoryStore, UrlStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "crawl-agent", version = VERSION, about = "Concurrent web crawler")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Crawl the given seeds once, print a JSON summary and exit
    Crawl(CrawlArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Comma-separated seed URLs
    #[arg(long, required = true)]
    seeds: String,
    /// Maximum link hops from a seed (unlimited when omitted)
    #[arg(long)]
    max_depth: Option<u32>,
    #[arg(long)]
    threads: Option<i32>,
    #[arg(long)]
    exclude_images: bool,
    #[arg(long)]
    exclude_pdfs: bool,
    #[arg(long)]
    stay_on_domain: bool,
    /// Give up waiting for the crawl to finish after this many seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = Settings::from_env().context("invalid CRAWLER_* configuration")?;

    // The blocking HTTP client has to be built outside of the async runtime
    let fetcher = HttpFetcher::new(&settings.user_agent, settings.fetch_timeout)
        .context("failed to build HTTP client")?
        .with_max_body_bytes(settings.max_body_bytes);

    let store = Arc::new(MemoryStore::new());
    let status = Arc::new(BroadcastStatus::new(settings.status_buffer));
    let deps = Collaborators::with_memory_store(store.clone(), status.clone(), Arc::new(fetcher));
    let engine = Arc::new(CrawlEngine::new(deps, EngineSettings::from(&settings)));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&settings, engine.clone(), store, status)?,
        Command::Crawl(args) => crawl_once(&engine, &store, args)?,
    }

    if engine.is_running() {
        engine.stop()?;
    }
    Ok(())
}

fn serve(
    settings: &Settings,
    engine: Arc<CrawlEngine>,
    store: Arc<MemoryStore>,
    status: Arc<BroadcastStatus>,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let bind_addr = settings.bind_addr;
    runtime.block_on(async move {
        let app = create_router(AppState {
            engine,
            store,
            status: status.clone(),
        });

        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("failed to bind {bind_addr}"))?;

        info!(version = VERSION, %bind_addr, "crawl-agent listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                // Open event streams would otherwise hold the server open
                status.close();
            })
            .await
            .context("HTTP server failed")?;
        anyhow::Ok(())
    })?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    wait_for_shutdown(ctrl_c, terminate).await;
}

/// Resolves on whichever shutdown source fires first
async fn wait_for_shutdown(
    ctrl_c: impl Future<Output = ()>,
    terminate: impl Future<Output = ()>,
) {
    tokio::select! {
        () = ctrl_c => info!("ctrl-c received, shutting down"),
        () = terminate => info!("SIGTERM received, shutting down"),
    }
}

fn crawl_once(engine: &CrawlEngine, store: &MemoryStore, args: CrawlArgs) -> Result<()> {
    let config = store.create_config(NewCrawlConfig {
        seed_urls: args.seeds,
        max_depth: args.max_depth,
        keywords_to_search: None,
        thread_count: args.threads,
        exclude_images: args.exclude_images,
        exclude_pdfs: args.exclude_pdfs,
        stay_on_domain: args.stay_on_domain,
    })?;

    let outcome = engine.start(config.id)?;
    info!(workers = outcome.workers, seeds = ?outcome.seeds, "one-shot crawl started");

    let drained = engine.wait_until_drained(Duration::from_secs(args.timeout_secs));
    if !drained {
        warn!(timeout_secs = args.timeout_secs, "crawl did not finish in time, stopping");
    }
    engine.stop()?;

    let summary = serde_json::json!({
        "config_id": config.id,
        "completed": drained,
        "visited": store.count_by_status(UrlStatus::Visited)?,
        "failed": store.count_by_status(UrlStatus::Failed)?,
        "urls": store.all_urls()?,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
