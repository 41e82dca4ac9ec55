use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Adapter-boundary error. Every kind surfaces to the caller as a 500 with a
/// `{detail}` body; only the message text distinguishes them.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

impl From<candle::Error> for EmbedError {
    fn from(e: candle::Error) -> Self {
        Self::Inference(e.to_string())
    }
}

impl From<base64::DecodeError> for EmbedError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<image::ImageError> for EmbedError {
    fn from(e: image::ImageError) -> Self {
        Self::Decode(e.to_string())
    }
}

impl IntoResponse for EmbedError {
    fn into_response(self) -> Response {
        tracing::error!("{self}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}
