//! HTTP server for skin and cape endpoints
//!
//! Provides /health, /MinecraftSkins/{file}, /MinecraftCloaks/{file} and
//! /statistics/api/{skins,capes}.

use crate::resolver::Resolver;
use crate::types::{HealthResponse, TextureStats};
use crate::wipe::WipeScheduler;
use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use texture_store::AssetKind;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

const TEXTURE_SOURCE: HeaderName = HeaderName::from_static("x-texture-source");

/// Shared state for the HTTP server
pub struct ServerState {
    pub resolver: Resolver,
    pub scheduler: WipeScheduler,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(resolver: Resolver, scheduler: WipeScheduler) -> Self {
        Self {
            resolver,
            scheduler,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/MinecraftSkins/{file}", get(get_skin))
        .route("/MinecraftCloaks/{file}", get(get_cape))
        .route("/statistics/api/skins", get(skin_stats))
        .route("/statistics/api/capes", get(cape_stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server and run until `shutdown` completes
pub async fn start_server(
    state: SharedState,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
    })
}

async fn get_skin(State(state): State<SharedState>, Path(file): Path<String>) -> Response {
    serve_texture(&state, AssetKind::Skin, &file).await
}

async fn get_cape(State(state): State<SharedState>, Path(file): Path<String>) -> Response {
    serve_texture(&state, AssetKind::Cape, &file).await
}

/// Resolve and send a texture. Clients request `<name>.png`.
async fn serve_texture(state: &ServerState, kind: AssetKind, file: &str) -> Response {
    let name = file.strip_suffix(".png").unwrap_or(file);
    let location = state.resolver.resolve(kind, name).await;

    match tokio::fs::read(location.path()).await {
        Ok(data) => {
            info!(kind = %kind, player = name, source = location.source(), "Served texture");
            (
                [
                    (header::CONTENT_TYPE, "image/png"),
                    (TEXTURE_SOURCE, location.source()),
                ],
                data,
            )
                .into_response()
        }
        Err(e) => {
            // The file can vanish between resolution and read if a wipe runs
            warn!(
                kind = %kind,
                player = name,
                path = %location.path().display(),
                error = %e,
                "Failed to read texture"
            );
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("No {} available", kind),
                }),
            )
                .into_response()
        }
    }
}

async fn skin_stats(State(state): State<SharedState>) -> Response {
    texture_stats(&state, AssetKind::Skin).await
}

async fn cape_stats(State(state): State<SharedState>) -> Response {
    texture_stats(&state, AssetKind::Cape).await
}

async fn texture_stats(state: &ServerState, kind: AssetKind) -> Response {
    let counts = match state.resolver.store_count(kind).await {
        Ok(counts) => counts,
        Err(e) => {
            error!(kind = %kind, error = %e, "Failed to count textures");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to count textures".to_string(),
                }),
            )
                .into_response();
        }
    };
    let wipe = state.scheduler.state(kind).await;

    Json(TextureStats {
        cached: counts.cached,
        overridden: counts.overridden,
        cache_wipe_time: wipe.next_wipe_at.timestamp_millis(),
        previous_cache_wipe_time: wipe.previous_wipe_at.timestamp_millis(),
    })
    .into_response()
}
