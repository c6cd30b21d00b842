use std::io;
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

const TOKENIZER_FILENAME: &str = "tokenizer.json";
const PAD_TOKEN: &str = "[PAD]";

/// Loads a tokenizer from a model directory or explicit tokenizer.json path.
pub fn load_tokenizer(model_path: &Path) -> io::Result<Tokenizer> {
    let tokenizer_path = if model_path
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new(TOKENIZER_FILENAME))
    {
        model_path.to_path_buf()
    } else if model_path.is_dir() {
        model_path.join(TOKENIZER_FILENAME)
    } else {
        model_path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Model path has no parent"))?
            .join(TOKENIZER_FILENAME)
    };

    Tokenizer::from_file(&tokenizer_path).map_err(io::Error::other)
}

/// Loads a tokenizer ready for padded batches.
///
/// Inputs longer than `max_len` tokens are truncated; shorter ones are padded to the
/// longest sequence in their batch with `[PAD]` (or id 0 if the vocabulary lacks it).
pub fn load_batch_tokenizer(model_path: &Path, max_len: usize) -> io::Result<Tokenizer> {
    let mut tokenizer = load_tokenizer(model_path)?;

    let truncation = TruncationParams {
        max_length: max_len,
        ..Default::default()
    };
    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| io::Error::other(format!("Failed to configure truncation: {}", e)))?;

    let pad_id = tokenizer.token_to_id(PAD_TOKEN).unwrap_or(0);
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token: PAD_TOKEN.to_string(),
        ..Default::default()
    }));

    Ok(tokenizer)
}
