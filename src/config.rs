use std::path::PathBuf;

pub const DEFAULT_MODEL_ID: &str = "openai/clip-vit-base-patch32";
// The upstream repo only carries pytorch weights on main; this ref has the
// safetensors conversion.
pub const DEFAULT_REVISION: &str = "refs/pr/15";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub model: ModelConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Local snapshot directory holding tokenizer.json + model.safetensors.
    /// When unset the snapshot is fetched from the hub.
    pub snapshot_dir: Option<PathBuf>,
    pub model_id: String,
    pub revision: String,
    pub device_id: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_or(dotenvy::var("EMBED_PORT").ok(), 8000),
            model: ModelConfig {
                snapshot_dir: dotenvy::var("CLIP_SNAPSHOT_DIR").ok().map(PathBuf::from),
                model_id: dotenvy::var("CLIP_MODEL_ID")
                    .unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string()),
                revision: dotenvy::var("CLIP_REVISION")
                    .unwrap_or_else(|_| DEFAULT_REVISION.to_string()),
                device_id: parse_or(dotenvy::var("CLIP_DEVICE_ID").ok(), 0),
            },
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_on_missing() {
        assert_eq!(parse_or::<u16>(None, 8000), 8000);
    }

    #[test]
    fn parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or::<u16>(Some("not-a-port".into()), 8000), 8000);
    }

    #[test]
    fn parse_or_reads_valid_values() {
        assert_eq!(parse_or::<u16>(Some("9090".into()), 8000), 9090);
        assert_eq!(parse_or::<usize>(Some("1".into()), 0), 1);
    }
}
