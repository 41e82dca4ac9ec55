use anyhow::{anyhow, Context, Result};
use candle::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use std::path::PathBuf;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::config::ModelConfig;
use crate::error::EmbedError;

pub mod image;

/// Shared read-only handle over the CLIP model. Loaded once before serving;
/// inference takes `&self`, so concurrent requests need no locking.
pub struct ClipService {
    model: ClipModel,
    tokenizer: Tokenizer,
    device: Device,
    image_size: usize,
    dims: usize,
}

impl ClipService {
    pub fn load(cfg: &ModelConfig) -> Result<Self> {
        let (tokenizer_path, weights_path) = resolve_snapshot(cfg)?;
        let device = Device::cuda_if_available(cfg.device_id)?;
        info!("loading {} on {device:?}", cfg.model_id);

        let config = ClipConfig::vit_base_patch32();

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow!("tokenizer load failed ({}): {e}", tokenizer_path.display())
        })?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.text_config.max_position_embeddings,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("tokenizer truncation config: {e}"))?;

        // Weights mmapped, single safetensors file for this model.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)?
        };
        let model = ClipModel::new(vb, &config)?;

        Ok(Self {
            model,
            tokenizer,
            device,
            image_size: config.image_size,
            dims: config.text_config.projection_dim,
        })
    }

    /// Embedding dimensionality (512 for vit-base-patch32).
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::Validation("text must not be empty".into()));
        }

        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbedError::Inference(format!("tokenizer encode: {e}")))?;
        let ids = enc.get_ids().to_vec();

        let input = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let features = self.model.get_text_features(&input)?;
        let v = features.squeeze(0)?.to_vec1::<f32>()?;
        Ok(l2_normalize(v))
    }

    pub fn embed_image(&self, b64: &str) -> Result<Vec<f32>, EmbedError> {
        let pixels = image::decode_to_tensor(b64, self.image_size, &self.device)?;
        let features = self.model.get_image_features(&pixels.unsqueeze(0)?)?;
        let v = features.squeeze(0)?.to_vec1::<f32>()?;
        Ok(l2_normalize(v))
    }
}

fn resolve_snapshot(cfg: &ModelConfig) -> Result<(PathBuf, PathBuf)> {
    if let Some(dir) = &cfg.snapshot_dir {
        let tokenizer = dir.join("tokenizer.json");
        let weights = dir.join("model.safetensors");
        if !tokenizer.exists() {
            return Err(anyhow!("tokenizer.json not found under {}", dir.display()));
        }
        if !weights.exists() {
            return Err(anyhow!("model.safetensors not found under {}", dir.display()));
        }
        return Ok((tokenizer, weights));
    }

    let api = Api::new().context("hub api init")?;
    let repo = api.repo(Repo::with_revision(
        cfg.model_id.clone(),
        RepoType::Model,
        cfg.revision.clone(),
    ));
    let tokenizer = repo.get("tokenizer.json").context("fetch tokenizer.json")?;
    let weights = repo
        .get("model.safetensors")
        .context("fetch model.safetensors")?;
    Ok((tokenizer, weights))
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_snapshot() -> Option<ModelConfig> {
        let dir = std::env::var("CLIP_SNAPSHOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("models/clip-vit-base-patch32"));
        if !dir.join("model.safetensors").exists() {
            eprintln!(
                "CLIP snapshot missing under {}, skipping test",
                dir.display()
            );
            return None;
        }
        Some(ModelConfig {
            snapshot_dir: Some(dir),
            model_id: crate::config::DEFAULT_MODEL_ID.into(),
            revision: crate::config::DEFAULT_REVISION.into(),
            device_id: 0,
        })
    }

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn l2_normalize_yields_unit_norm() {
        let v = l2_normalize(vec![3.0, 4.0]);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_leaves_zero_vector_alone() {
        let v = l2_normalize(vec![0.0, 0.0, 0.0]);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn embed_text_returns_unit_vector() {
        let Some(cfg) = local_snapshot() else { return };
        let svc = ClipService::load(&cfg).expect("failed to load CLIP");

        let v = svc.embed_text("red wallet").expect("text inference failed");
        assert_eq!(v.len(), svc.dims());
        assert!((norm(&v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn embed_text_rejects_empty_input() {
        let Some(cfg) = local_snapshot() else { return };
        let svc = ClipService::load(&cfg).expect("failed to load CLIP");

        assert!(matches!(
            svc.embed_text("   "),
            Err(EmbedError::Validation(_))
        ));
    }

    #[test]
    fn embed_image_returns_unit_vector() {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        use std::io::Cursor;

        let Some(cfg) = local_snapshot() else { return };
        let svc = ClipService::load(&cfg).expect("failed to load CLIP");

        let img = ::image::RgbImage::from_pixel(64, 64, ::image::Rgb([200, 30, 30]));
        let mut buf = Vec::new();
        ::image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ::image::ImageFormat::Png)
            .unwrap();

        let v = svc
            .embed_image(&STANDARD.encode(&buf))
            .expect("image inference failed");
        assert_eq!(v.len(), svc.dims());
        assert!((norm(&v) - 1.0).abs() < 1e-4);
    }
}
