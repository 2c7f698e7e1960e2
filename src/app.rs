// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, route handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::models::config::{CrawlConfig, NewCrawlConfig, UpdateCrawlConfig};
use crate::models::crawler::{
    DeleteConfigResponse, ExportResponse, StartCrawlResponse, StopCrawlResponse, UrlListQuery,
    UrlListResponse,
};
use crate::models::error::EngineError;
use crate::models::search::{SearchRequest, SearchResponse};
use crate::models::status::StatusSnapshot;
use crate::models::url::UrlStatus;
use crate::models::version::VersionResponse;
use crate::services::engine::CrawlEngine;
use crate::services::search::{export_corpus, search_content};
use crate::services::status::BroadcastStatus;
use crate::services::store::{ConfigStore, MemoryStore, UrlStore};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `CRAWL_AGENT_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("CRAWL_AGENT_VERSION");

type ApiError = (StatusCode, String);

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CrawlEngine>,
    /// The same store the engine was built with
    pub store: Arc<MemoryStore>,
    /// The engine's status publisher, streamed by `/crawler/events`
    pub status: Arc<BroadcastStatus>,
}

fn store_error(e: anyhow::Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Store error: {e}"),
    )
}

fn engine_error(e: EngineError) -> ApiError {
    let status = match e {
        EngineError::AlreadyRunning | EngineError::Stopping | EngineError::NotRunning => {
            StatusCode::CONFLICT
        }
        EngineError::ConfigNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::NoValidSeeds => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::WorkerSpawn(_) | EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

/// Run a blocking engine call off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Engine task failed: {e}"),
            )
        })?
        .map_err(engine_error)
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: "crawl-agent".to_string(),
        version: VERSION.to_string(),
    })
}

pub async fn create_config_handler(
    State(state): State<AppState>,
    Json(payload): Json<NewCrawlConfig>,
) -> Result<Json<CrawlConfig>, ApiError> {
    if payload.seed_urls.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "seed_urls cannot be empty".to_string(),
        ));
    }

    let config = state.store.create_config(payload).map_err(store_error)?;
    info!(config_id = config.id, "crawl config created");
    Ok(Json(config))
}

fn config_not_found(id: i64) -> ApiError {
    (StatusCode::NOT_FOUND, format!("Config {id} not found"))
}

pub async fn update_config_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCrawlConfig>,
) -> Result<Json<CrawlConfig>, ApiError> {
    if payload.fields.seed_urls.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "seed_urls cannot be empty".to_string(),
        ));
    }

    let mut config = state
        .store
        .get_config(id)
        .map_err(store_error)?
        .ok_or_else(|| config_not_found(id))?;
    config.apply(payload);
    state.store.save_config(&config).map_err(store_error)?;

    info!(config_id = id, status = %config.status, "crawl config updated");
    Ok(Json(config))
}

pub async fn delete_config_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteConfigResponse>, ApiError> {
    if !state.store.delete_config(id).map_err(store_error)? {
        return Err(config_not_found(id));
    }

    info!(config_id = id, "crawl config deleted");
    Ok(Json(DeleteConfigResponse {
        success: true,
        message: "Config deleted".to_string(),
        id,
    }))
}

pub async fn list_configs_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<CrawlConfig>>, ApiError> {
    state.store.list_configs().map(Json).map_err(store_error)
}

pub async fn get_config_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CrawlConfig>, ApiError> {
    state
        .store
        .get_config(id)
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| config_not_found(id))
}

pub async fn start_crawl_handler(
    State(state): State<AppState>,
    Path(config_id): Path<i64>,
) -> Result<Json<StartCrawlResponse>, ApiError> {
    let engine = state.engine.clone();
    let outcome = run_blocking(move || engine.start(config_id)).await?;

    Ok(Json(StartCrawlResponse {
        success: true,
        message: "Crawler started".to_string(),
        config_id: outcome.config_id,
        workers: outcome.workers,
        seeds: outcome.seeds,
    }))
}

pub async fn stop_crawl_handler(
    State(state): State<AppState>,
) -> Result<Json<StopCrawlResponse>, ApiError> {
    let engine = state.engine.clone();
    run_blocking(move || engine.stop()).await?;

    Ok(Json(StopCrawlResponse {
        success: true,
        message: "Crawler stopped".to_string(),
    }))
}

pub async fn crawl_status_handler(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.engine.snapshot())
}

/// Server-sent `status` events: the latest snapshot, then every published one
pub async fn crawl_events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.status.subscribe();
    let current = state.status.latest();

    let updates = BroadcastStream::new(receiver).filter_map(|update| match update {
        Ok(snapshot) => Some(snapshot),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            debug!(skipped, "status stream lagged");
            None
        }
    });
    let events = tokio_stream::once(current)
        .chain(updates)
        .map(|snapshot| Event::default().event("status").json_data(snapshot));

    Sse::new(events).keep_alive(KeepAlive::default())
}

pub async fn list_urls_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlListQuery>,
) -> Result<Json<UrlListResponse>, ApiError> {
    let urls = match query.status.as_deref() {
        None => state.store.all_urls(),
        Some(raw) => {
            let status = UrlStatus::parse(raw).ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Unknown status '{raw}', expected pending, visited or failed"),
                )
            })?;
            state.store.find_by_status(status)
        }
    }
    .map_err(store_error)?;

    let count = urls.len();
    Ok(Json(UrlListResponse { urls, count }))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if payload.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query cannot be empty".to_string()));
    }

    search_content(state.store.as_ref(), &payload)
        .map(Json)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Search error: {e}"),
            )
        })
}

pub async fn export_handler(
    State(state): State<AppState>,
) -> Result<Json<ExportResponse>, ApiError> {
    export_corpus(state.store.as_ref(), state.store.as_ref())
        .map(Json)
        .map_err(store_error)
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .route("/configs", post(create_config_handler).get(list_configs_handler))
        .route(
            "/configs/{id}",
            get(get_config_handler)
                .put(update_config_handler)
                .delete(delete_config_handler),
        )
        .route("/crawler/start/{config_id}", post(start_crawl_handler))
        .route("/crawler/stop", post(stop_crawl_handler))
        .route("/crawler/status", get(crawl_status_handler))
        .route("/crawler/events", get(crawl_events_handler))
        .route("/urls", get(list_urls_handler))
        .route("/search", post(search_handler))
        .route("/export", get(export_handler))
        .with_state(state)
}
