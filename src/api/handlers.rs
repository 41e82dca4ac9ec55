use axum::{extract::State, Json};
use tracing::info;

use crate::api::types::{
    BatchEntry, BatchResponse, EmbeddingResponse, HealthResponse, ImageEmbeddingRequest,
    TextEmbeddingRequest,
};
use crate::api::AppState;
use crate::error::EmbedError;

pub async fn health() -> Json<HealthResponse> {
    // The service only starts serving after the model handle is constructed.
    Json(HealthResponse {
        status: "OK".into(),
        model_loaded: true,
    })
}

pub async fn embed_text(
    State(state): State<AppState>,
    Json(req): Json<TextEmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, EmbedError> {
    let embedding = state.clip.embed_text(&req.text)?;
    info!("generated text embedding for: {:.50}", req.text);
    Ok(Json(EmbeddingResponse {
        embedding,
        success: true,
    }))
}

pub async fn embed_image(
    State(state): State<AppState>,
    Json(req): Json<ImageEmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, EmbedError> {
    let embedding = state.clip.embed_image(&req.image)?;
    info!("generated image embedding ({} base64 bytes)", req.image.len());
    Ok(Json(EmbeddingResponse {
        embedding,
        success: true,
    }))
}

/// Entries are processed in input order, text before image within an entry.
/// The first failing entry aborts the whole batch; no partial results.
pub async fn embed_batch(
    State(state): State<AppState>,
    Json(entries): Json<Vec<BatchEntry>>,
) -> Result<Json<BatchResponse>, EmbedError> {
    let mut text_embeddings = Vec::new();
    let mut image_embeddings = Vec::new();

    for entry in &entries {
        if let Some(text) = &entry.text {
            text_embeddings.push(state.clip.embed_text(text).map_err(batch_err)?);
        }
        if let Some(image) = &entry.image {
            image_embeddings.push(state.clip.embed_image(image).map_err(batch_err)?);
        }
    }

    info!(
        "batch embedded {} texts, {} images",
        text_embeddings.len(),
        image_embeddings.len()
    );
    Ok(Json(BatchResponse {
        text_embeddings,
        image_embeddings,
        success: true,
    }))
}

// Batch failures surface as a single inference error regardless of which
// entry broke.
fn batch_err(e: EmbedError) -> EmbedError {
    match e {
        EmbedError::Inference(_) => e,
        other => EmbedError::Inference(other.to_string()),
    }
}
