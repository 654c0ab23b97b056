//! The browser front end: setup form, create form and meme downloads.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tokio::sync::Mutex;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::{error, info};

use crate::pipeline::MemePipeline;

mod csrf;
mod flash;
mod images;
mod prelude;
mod session;
mod views;

use views::generate::{generate_post, new_post, regenerate_image_post, regenerate_post};
use views::{
    download_handler, meme_png_handler, reset_keys_post, root_handler, setup_post,
};

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pipeline: MemePipeline,
    /// Held for the whole of a pipeline run.
    generation_lock: Arc<Mutex<()>>,
}

impl AppState {
    fn new(pipeline: MemePipeline) -> Self {
        Self {
            pipeline,
            generation_lock: Arc::new(Mutex::new(())),
        }
    }
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/setup", post(setup_post))
        .route("/keys/reset", post(reset_keys_post))
        .route("/generate", post(generate_post))
        .route("/regenerate", post(regenerate_post))
        .route("/regenerate/image", post(regenerate_image_post))
        .route("/new", post(new_post))
        .route("/meme.png", get(meme_png_handler))
        .route("/download", get(download_handler))
        .route("/static/styles.css", get(styles_handler))
}

/// `MemoryStore` keeps expired records until the process exits, meme PNGs
/// included. Fine for a single-user local tool; `/keys/reset` drops the meme.
fn session_layer(idle_minutes: i64) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(idle_minutes)))
}

fn build_app(pipeline: MemePipeline, session_idle_minutes: i64) -> Router {
    create_router()
        .layer(session_layer(session_idle_minutes))
        .with_state(AppState::new(pipeline))
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    info!("Shutting down");
}

/// Binds the listener and serves until ctrl-c.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    pipeline: MemePipeline,
    session_idle_minutes: i64,
) -> Result<(), anyhow::Error> {
    let app = build_app(pipeline, session_idle_minutes);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
