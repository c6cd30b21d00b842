//! SPECTER embedder (BERT encoder + task adapter, CLS pooling).
//!
//! Use [`SpecterConfig::stub`] for tests/examples without model files.

/// SPECTER configuration.
pub mod config;

#[cfg(test)]
mod tests;

pub use config::{
    DEFAULT_ADAPTER_REDUCTION_FACTOR, SPECTER_EMBEDDING_DIM, SPECTER_MAX_SEQ_LEN,
    SpecterConfig,
};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use tracing::{debug, info, warn};

use crate::constants::validate_embedding_dim;
use crate::embedding::TextEmbedder;
use crate::embedding::bert::{AdapterWeights, BertConfig, BertEncoder};
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::first_blank;
use crate::embedding::utils::load_batch_tokenizer;
use crate::hashing::hash_to_u64;

enum EmbedderBackend {
    Model {
        encoder: Box<BertEncoder>,
        tokenizer: Box<tokenizers::Tokenizer>,
        device: Device,
    },
    Stub,
}

/// Document embedder for titles/abstracts and reviewer profiles (supports stub mode).
pub struct SpecterEmbedder {
    backend: EmbedderBackend,
    config: SpecterConfig,
}

impl std::fmt::Debug for SpecterEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecterEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EmbedderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("adapter", &self.adapter_name())
            .field("embedding_dim", &self.config.embedding_dim)
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl SpecterEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: SpecterConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("SPECTER embedder running in STUB mode (no model loaded)");
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                config,
            });
        }

        let device = select_device(config.cpu_only)?;
        debug!(?device, "Selected compute device for SPECTER");

        let (encoder, tokenizer) = Self::load_model(&config, &device)?;

        info!(
            model_dir = %config.model_dir.display(),
            adapter = encoder.adapter_name().unwrap_or("none"),
            hidden_size = encoder.config().hidden_size,
            num_layers = encoder.config().num_hidden_layers,
            max_seq_len = config.max_seq_len,
            "SPECTER model loaded"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                encoder: Box::new(encoder),
                tokenizer: Box::new(tokenizer),
                device,
            },
            config,
        })
    }

    fn load_model(
        config: &SpecterConfig,
        device: &Device,
    ) -> Result<(BertEncoder, tokenizers::Tokenizer), EmbeddingError> {
        let tokenizer = load_batch_tokenizer(&config.tokenizer_path(), config.max_seq_len)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            })?;

        let raw = std::fs::read_to_string(config.config_path())?;
        let bert_config: BertConfig =
            serde_json::from_str(&raw).map_err(|e| EmbeddingError::InvalidConfig {
                reason: format!("Failed to parse {}: {}", config.config_path().display(), e),
            })?;

        validate_embedding_dim(bert_config.hidden_size, config.embedding_dim).map_err(|e| {
            EmbeddingError::InvalidConfig {
                reason: e.to_string(),
            }
        })?;

        if config.max_seq_len > bert_config.max_position_embeddings {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!(
                    "max_seq_len ({}) exceeds max_position_embeddings ({})",
                    config.max_seq_len, bert_config.max_position_embeddings
                ),
            });
        }

        // SAFETY: the weight files are not modified while the process runs.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[config.weights_path()], DType::F32, device)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to map encoder weights: {}", e),
        })?;

        let adapter = match config.adapter_path {
            Some(ref path) => {
                // SAFETY: as above.
                let adapter_vb = unsafe {
                    VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)
                }
                .map_err(|e| EmbeddingError::ModelLoadFailed {
                    reason: format!("Failed to map adapter weights: {}", e),
                })?;

                let key = format!(
                    "encoder.layer.0.output.adapters.{}.adapter_up.weight",
                    config.adapter_name
                );
                if !adapter_vb.contains_tensor(&key)
                    && !adapter_vb.contains_tensor(&format!("bert.{key}"))
                {
                    return Err(EmbeddingError::AdapterNotFound {
                        name: config.adapter_name.clone(),
                        path: path.clone(),
                    });
                }

                Some(AdapterWeights {
                    vb: adapter_vb,
                    name: config.adapter_name.clone(),
                    reduction_factor: config.adapter_reduction_factor,
                })
            }
            None => {
                warn!("No adapter configured, using the base encoder");
                None
            }
        };

        let encoder = BertEncoder::load(vb, adapter, &bert_config).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to build BERT encoder: {}", e),
            }
        })?;

        Ok((encoder, tokenizer))
    }

    /// Tokenizes every text into one padded batch and runs a single forward pass.
    fn embed_with_model(
        &self,
        texts: &[&str],
        encoder: &BertEncoder,
        tokenizer: &tokenizers::Tokenizer,
        device: &Device,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encodings = tokenizer.encode_batch(texts.to_vec(), true).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;

        let seq_len = encodings.first().map(|e| e.len()).unwrap_or(0);
        if seq_len == 0 {
            return Err(EmbeddingError::TokenizationFailed {
                reason: "tokenizer produced no tokens".to_string(),
            });
        }

        let mut ids = Vec::with_capacity(texts.len() * seq_len);
        let mut type_ids = Vec::with_capacity(texts.len() * seq_len);
        let mut mask = Vec::with_capacity(texts.len() * seq_len);
        for encoding in &encodings {
            if encoding.len() != seq_len {
                return Err(EmbeddingError::TokenizationFailed {
                    reason: format!(
                        "unpadded batch: expected {} tokens, got {}",
                        seq_len,
                        encoding.len()
                    ),
                });
            }
            ids.extend_from_slice(encoding.get_ids());
            type_ids.extend_from_slice(encoding.get_type_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        debug!(
            batch = texts.len(),
            seq_len, "Running encoder forward pass"
        );

        let shape = (texts.len(), seq_len);
        let input_ids = Tensor::from_vec(ids, shape, device)?;
        let token_type_ids = Tensor::from_vec(type_ids, shape, device)?;
        let attention_mask = Tensor::from_vec(mask, shape, device)?;

        let cls = encoder.cls(&input_ids, &token_type_ids, &attention_mask)?;
        Ok(cls.to_vec2::<f32>()?)
    }

    fn embed_stub(&self, text: &str) -> Vec<f32> {
        let mut state = hash_to_u64(text.as_bytes());

        let mut embedding = Vec::with_capacity(self.config.embedding_dim);
        for _ in 0..self.config.embedding_dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }
        embedding
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    /// Name of the active adapter, if a model with one is loaded.
    pub fn adapter_name(&self) -> Option<&str> {
        match &self.backend {
            EmbedderBackend::Model { encoder, .. } => encoder.adapter_name(),
            EmbedderBackend::Stub => None,
        }
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &SpecterConfig {
        &self.config
    }
}

impl TextEmbedder for SpecterEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        if let Some(index) = first_blank(texts) {
            return Err(EmbeddingError::EmptyInput { index });
        }

        let vectors = match &self.backend {
            EmbedderBackend::Model {
                encoder,
                tokenizer,
                device,
            } => self.embed_with_model(texts, encoder, tokenizer, device)?,
            EmbedderBackend::Stub => texts.iter().map(|text| self.embed_stub(text)).collect(),
        };

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::OutputCountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }
        Ok(vectors)
    }

    fn separator(&self) -> &str {
        &self.config.separator
    }

    fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }
}
