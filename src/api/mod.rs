use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::clip::ClipService;

pub mod handlers;
pub mod types;

use handlers::{embed_batch, embed_image, embed_text, health};

#[derive(Clone)]
pub struct AppState {
    pub clip: Arc<ClipService>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/embed-text", post(embed_text))
        .route("/embed-image", post(embed_image))
        .route("/embed-batch", post(embed_batch))
}
