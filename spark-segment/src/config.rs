use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use spark_inference::engine::inference_engine::ExecutionProvider;
use spark_inference::inference::sam::TensorNames;
use spark_media::RGBA;
use std::path::{Path, PathBuf};

pub const DEFAULT_EMBEDDING_URL: &str =
    "https://model-zoo.metademolab.com/predictions/segment_everything_box_model";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    pub embedding: EmbeddingConfig,
    pub model: ModelConfig,
    pub render: RenderConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_EMBEDDING_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// `cpu`, `cuda[:id]` or `tensorrt[:id]`.
    pub execution_provider: String,
    pub intra_threads: usize,
    pub tensors: TensorPreset,
    /// Rescale prompts as if the longest image side were resized to this.
    pub prompt_longest_side: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/model/sam_interactive.onnx"),
            execution_provider: "cpu".to_string(),
            intra_threads: 6,
            tensors: TensorPreset::Interactive,
            prompt_longest_side: None,
        }
    }
}

impl ModelConfig {
    pub fn execution_provider(&self) -> Result<ExecutionProvider> {
        self.execution_provider.parse()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorPreset {
    #[default]
    Interactive,
    SamExport,
}

impl TensorPreset {
    pub fn names(self) -> TensorNames {
        match self {
            TensorPreset::Interactive => TensorNames::interactive(),
            TensorPreset::SamExport => TensorNames::sam_export(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub mask_color: [u8; 4],
    pub add_marker_color: [u8; 4],
    pub remove_marker_color: [u8; 4],
    pub marker_radius: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mask_color: [0, 114, 189, 128],
            add_marker_color: [46, 204, 64, 255],
            remove_marker_color: [255, 65, 54, 255],
            marker_radius: 6,
        }
    }
}

impl RenderConfig {
    pub fn mask_color(&self) -> RGBA {
        RGBA::from(self.mask_color)
    }

    pub fn add_marker_color(&self) -> RGBA {
        RGBA::from(self.add_marker_color)
    }

    pub fn remove_marker_color(&self) -> RGBA {
        RGBA::from(self.remove_marker_color)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}

impl SegmentConfig {
    /// Reads a TOML file, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());

        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
