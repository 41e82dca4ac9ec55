use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TextEmbeddingRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageEmbeddingRequest {
    /// base64-encoded image bytes
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
    pub success: bool,
}

/// One batch item; either or both fields may be present.
#[derive(Debug, Deserialize)]
pub struct BatchEntry {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub text_embeddings: Vec<Vec<f32>>,
    pub image_embeddings: Vec<Vec<f32>>,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}
