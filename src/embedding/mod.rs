//! Text embedding.
//!
//! - [`TextEmbedder`] is the contract the matcher depends on.
//! - [`specter`] provides the SPECTER-style encoder (with a deterministic stub mode).
//! - [`bert`] is the encoder itself, with optional bottleneck adapters.

/// BERT encoder with bottleneck adapter support.
pub mod bert;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// SPECTER embedder (document-level embeddings).
pub mod specter;
/// Tokenizer loading helpers.
pub mod utils;

pub use error::EmbeddingError;
pub use specter::{SpecterConfig, SpecterEmbedder};

/// Turns an ordered batch of texts into one vector per text.
///
/// Implementations must preserve length and order: vector `i` belongs to `texts[i]`.
/// Blank inputs are rejected with [`EmbeddingError::EmptyInput`].
pub trait TextEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Separator placed between fields of an embedding text template.
    fn separator(&self) -> &str;

    fn embedding_dim(&self) -> usize;
}

impl<T: TextEmbedder + ?Sized> TextEmbedder for &T {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed(texts)
    }

    fn separator(&self) -> &str {
        (**self).separator()
    }

    fn embedding_dim(&self) -> usize {
        (**self).embedding_dim()
    }
}

/// Index of the first blank text in `texts`, if any.
pub fn first_blank(texts: &[&str]) -> Option<usize> {
    texts.iter().position(|t| t.trim().is_empty())
}
