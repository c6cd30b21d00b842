use std::path::PathBuf;

use crate::config::Config;
use crate::constants::{
    DEFAULT_ADAPTER_NAME, DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_SEQ_LEN, DEFAULT_SEP_TOKEN,
};
use crate::embedding::error::EmbeddingError;

/// Default SPECTER embedding dimension.
pub const SPECTER_EMBEDDING_DIM: usize = DEFAULT_EMBEDDING_DIM;

/// Default SPECTER max sequence length.
pub const SPECTER_MAX_SEQ_LEN: usize = DEFAULT_MAX_SEQ_LEN;

/// Bottleneck width divisor used by the published SPECTER2 adapters.
pub const DEFAULT_ADAPTER_REDUCTION_FACTOR: usize = 16;

pub const CONFIG_FILENAME: &str = "config.json";
pub const WEIGHTS_FILENAME: &str = "model.safetensors";
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

#[derive(Debug, Clone)]
/// Configuration for [`SpecterEmbedder`](super::SpecterEmbedder).
pub struct SpecterConfig {
    /// Directory with `config.json`, `model.safetensors` and `tokenizer.json`.
    pub model_dir: PathBuf,
    /// Safetensors file holding adapter weights. `None` runs the bare encoder.
    pub adapter_path: Option<PathBuf>,
    /// Adapter name as it appears in weight keys.
    pub adapter_name: String,
    pub adapter_reduction_factor: usize,
    /// Max tokens per input; longer inputs are truncated.
    pub max_seq_len: usize,
    /// Expected output dimension (the encoder's hidden size).
    pub embedding_dim: usize,
    /// Separator token placed between text template fields.
    pub separator: String,
    /// Skip GPU device selection.
    pub cpu_only: bool,
    /// If true, run in deterministic stub mode (no model files required).
    pub testing_stub: bool,
}

impl Default for SpecterConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            adapter_path: None,
            adapter_name: DEFAULT_ADAPTER_NAME.to_string(),
            adapter_reduction_factor: DEFAULT_ADAPTER_REDUCTION_FACTOR,
            max_seq_len: SPECTER_MAX_SEQ_LEN,
            embedding_dim: SPECTER_EMBEDDING_DIM,
            separator: DEFAULT_SEP_TOKEN.to_string(),
            cpu_only: false,
            testing_stub: false,
        }
    }
}

impl SpecterConfig {
    /// Creates a config for a model directory, without an adapter.
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; produces deterministic embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    /// Derives the embedder settings from the run configuration.
    ///
    /// The stub is used only when the run asks for it. Without a model directory the
    /// result fails [`validate`](Self::validate).
    pub fn from_config(config: &Config) -> Self {
        if config.stub_embedder {
            return Self::stub();
        }
        match config.model_dir {
            Some(ref dir) => Self {
                adapter_path: config.resolved_adapter_path(),
                adapter_name: config.adapter_name.clone(),
                ..Self::new(dir.clone())
            },
            None => Self::default(),
        }
    }

    pub fn with_adapter(mut self, path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        self.adapter_path = Some(path.into());
        self.adapter_name = name.into();
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join(CONFIG_FILENAME)
    }

    pub fn weights_path(&self) -> PathBuf {
        self.model_dir.join(WEIGHTS_FILENAME)
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join(TOKENIZER_FILENAME)
    }

    /// Validates settings; in model mode also checks that every file exists.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.embedding_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding_dim must be positive".to_string(),
            });
        }

        if self.testing_stub {
            return Ok(());
        }

        if self.model_dir.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_dir is required (stubbing is disabled)".to_string(),
            });
        }

        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be positive".to_string(),
            });
        }

        for path in [self.config_path(), self.weights_path(), self.tokenizer_path()] {
            if !path.is_file() {
                return Err(EmbeddingError::ModelNotFound { path });
            }
        }

        if let Some(ref path) = self.adapter_path {
            if !path.is_file() {
                return Err(EmbeddingError::ModelNotFound { path: path.clone() });
            }
            if self.adapter_reduction_factor == 0 {
                return Err(EmbeddingError::InvalidConfig {
                    reason: "adapter_reduction_factor must be positive".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Returns `true` if every model file is present.
    pub fn model_available(&self) -> bool {
        !self.model_dir.as_os_str().is_empty()
            && self.config_path().is_file()
            && self.weights_path().is_file()
            && self.tokenizer_path().is_file()
    }
}
