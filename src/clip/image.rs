use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use candle::{DType, Device, Tensor};
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::EmbedError;

/// Decodes a base64 payload into a `(3, size, size)` F32 tensor scaled to
/// [-1, 1], ready to batch into the vision tower.
pub fn decode_to_tensor(b64: &str, size: usize, device: &Device) -> Result<Tensor, EmbedError> {
    let bytes = STANDARD.decode(strip_data_url(b64).trim())?;
    let img = image::load_from_memory(&bytes)?;
    preprocess(&img, size, device).map_err(EmbedError::from)
}

// Browser clients send `data:image/png;base64,<payload>` URLs; keep only the
// payload. A bare comma without a base64 marker is left untouched.
fn strip_data_url(raw: &str) -> &str {
    match raw.find(',') {
        Some(idx) if raw[..idx].contains("base64") => &raw[idx + 1..],
        _ => raw,
    }
}

fn preprocess(img: &DynamicImage, size: usize, device: &Device) -> candle::Result<Tensor> {
    let rgb = img
        .resize_to_fill(size as u32, size as u32, FilterType::Triangle)
        .to_rgb8();
    Tensor::from_vec(rgb.into_raw(), (size, size, 3), device)?
        .permute((2, 0, 1))?
        .to_dtype(DType::F32)?
        .affine(2. / 255., -1.)
}
