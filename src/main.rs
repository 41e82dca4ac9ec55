use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod clip;
mod config;
mod error;

use api::AppState;
use clip::ClipService;
use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ServerConfig::from_env();

    // -----------------------------
    // Shared state / Dependencies
    // -----------------------------
    println!("🚀 Loading CLIP model ({})...", cfg.model.model_id);
    let clip = Arc::new(ClipService::load(&cfg.model)?);
    println!(
        "✅ CLIP model loaded ({} dims, {:?})",
        clip.dims(),
        clip.device()
    );

    let state = AppState { clip };

    // -----------------------------
    // Router
    // -----------------------------
    let app = Router::new()
        .merge(api::router())
        // CORS: the lost&found backend and frontend call this from other origins
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state);

    let addr = format!("0.0.0.0:{}", cfg.port);
    println!("🌐 HTTP listening on http://{addr}");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
