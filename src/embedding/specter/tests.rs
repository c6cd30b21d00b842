use super::*;
use std::path::PathBuf;
use tempfile::TempDir;

mod config_tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_specter_config_default() {
        let config = SpecterConfig::default();
        assert_eq!(config.embedding_dim, SPECTER_EMBEDDING_DIM);
        assert_eq!(config.max_seq_len, SPECTER_MAX_SEQ_LEN);
        assert_eq!(config.adapter_reduction_factor, DEFAULT_ADAPTER_REDUCTION_FACTOR);
        assert_eq!(config.separator, "[SEP]");
        assert_eq!(config.adapter_name, "specter2_adhoc_query");
        assert!(config.adapter_path.is_none());
        assert!(!config.testing_stub);
    }

    #[test]
    fn test_specter_config_paths() {
        let config = SpecterConfig::new("/models/specter2");
        assert_eq!(config.config_path(), PathBuf::from("/models/specter2/config.json"));
        assert_eq!(
            config.weights_path(),
            PathBuf::from("/models/specter2/model.safetensors")
        );
        assert_eq!(
            config.tokenizer_path(),
            PathBuf::from("/models/specter2/tokenizer.json")
        );
    }

    #[test]
    fn test_specter_config_with_adapter() {
        let config = SpecterConfig::new("/models/specter2")
            .with_adapter("/models/adhoc.safetensors", "specter2_proximity");
        assert_eq!(
            config.adapter_path,
            Some(PathBuf::from("/models/adhoc.safetensors"))
        );
        assert_eq!(config.adapter_name, "specter2_proximity");
    }

    #[test]
    fn test_from_config_without_model_dir_is_not_stub() {
        let config = SpecterConfig::from_config(&Config::default());
        assert!(!config.testing_stub);
        assert!(matches!(
            SpecterEmbedder::load(config),
            Err(EmbeddingError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_from_config_stub_only_on_request() {
        let run = Config {
            stub_embedder: true,
            model_dir: Some(PathBuf::from("/models/specter2")),
            ..Default::default()
        };
        assert!(SpecterConfig::from_config(&run).testing_stub);
    }

    #[test]
    fn test_from_config_with_model_dir() {
        let run = Config {
            model_dir: Some(PathBuf::from("/models/specter2")),
            adapter_path: Some(PathBuf::from("/models/a.safetensors")),
            adapter_name: "custom".to_string(),
            ..Default::default()
        };
        let config = SpecterConfig::from_config(&run);
        assert!(!config.testing_stub);
        assert_eq!(config.model_dir, PathBuf::from("/models/specter2"));
        assert_eq!(config.adapter_path, Some(PathBuf::from("/models/a.safetensors")));
        assert_eq!(config.adapter_name, "custom");
    }

    #[test]
    fn test_validate_stub_skips_files() {
        assert!(SpecterConfig::stub().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_model_dir() {
        let config = SpecterConfig::default();
        assert!(matches!(
            config.validate(),
            Err(EmbeddingError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_validate_reports_first_missing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();

        let config = SpecterConfig::new(dir.path());
        assert!(!config.model_available());
        match config.validate() {
            Err(EmbeddingError::ModelNotFound { path }) => {
                assert_eq!(path, dir.path().join("model.safetensors"));
            }
            other => panic!("expected ModelNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_missing_adapter_file() {
        let dir = TempDir::new().unwrap();
        for name in ["config.json", "model.safetensors", "tokenizer.json"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let config =
            SpecterConfig::new(dir.path()).with_adapter(dir.path().join("nope.safetensors"), "x");
        assert!(config.model_available());
        assert!(matches!(
            config.validate(),
            Err(EmbeddingError::ModelNotFound { .. })
        ));
    }
}

mod stub_tests {
    use super::*;

    fn stub() -> SpecterEmbedder {
        SpecterEmbedder::load(SpecterConfig::stub()).expect("stub loads")
    }

    #[test]
    fn test_stub_load() {
        let embedder = stub();
        assert!(embedder.is_stub());
        assert!(embedder.adapter_name().is_none());
        assert_eq!(embedder.embedding_dim(), SPECTER_EMBEDDING_DIM);
        assert_eq!(embedder.separator(), "[SEP]");
        assert!(format!("{:?}", embedder).contains("Stub"));
    }

    #[test]
    fn test_embed_preserves_length_and_order() {
        let embedder = stub();
        let texts = ["alpha", "beta", "gamma"];

        let batch = embedder.embed(&texts).unwrap();
        assert_eq!(batch.len(), 3);

        for (text, vector) in texts.iter().zip(&batch) {
            let single = embedder.embed(&[*text]).unwrap();
            assert_eq!(&single[0], vector);
        }
    }

    #[test]
    fn test_embed_is_deterministic() {
        let a = stub().embed(&["Sketching with pens"]).unwrap();
        let b = stub().embed(&["Sketching with pens"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_embed_distinguishes_texts() {
        let vectors = stub().embed(&["one text", "another text"]).unwrap();
        assert_ne!(vectors[0], vectors[1]);
    }

    #[test]
    fn test_embed_unit_norm_and_dimension() {
        let vectors = stub().embed(&["Accessibility[SEP]screen readers"]).unwrap();
        assert_eq!(vectors[0].len(), SPECTER_EMBEDDING_DIM);

        let norm: f32 = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_embed_custom_dimension() {
        let embedder = SpecterEmbedder::load(SpecterConfig {
            embedding_dim: 16,
            ..SpecterConfig::stub()
        })
        .unwrap();
        let vectors = embedder.embed(&["x"]).unwrap();
        assert_eq!(vectors[0].len(), 16);
    }

    #[test]
    fn test_embed_empty_batch() {
        assert!(stub().embed(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_embed_rejects_blank_input_with_index() {
        let result = stub().embed(&["fine", "  ", "also fine"]);
        assert!(matches!(result, Err(EmbeddingError::EmptyInput { index: 1 })));
    }

    #[test]
    fn test_embed_long_input_does_not_fail() {
        let long = "word ".repeat(5_000);
        let vectors = stub().embed(&[long.as_str()]).unwrap();
        assert_eq!(vectors.len(), 1);
    }
}

mod model_tests {
    use super::*;

    #[test]
    fn test_load_without_files_fails() {
        let dir = TempDir::new().unwrap();
        let result = SpecterEmbedder::load(SpecterConfig::new(dir.path()));
        assert!(matches!(result, Err(EmbeddingError::ModelNotFound { .. })));
    }

    #[test]
    fn test_load_with_bad_tokenizer_fails() {
        let dir = TempDir::new().unwrap();
        for name in ["config.json", "model.safetensors", "tokenizer.json"] {
            std::fs::write(dir.path().join(name), b"not valid").unwrap();
        }

        let result = SpecterEmbedder::load(SpecterConfig {
            cpu_only: true,
            ..SpecterConfig::new(dir.path())
        });
        assert!(matches!(
            result,
            Err(EmbeddingError::TokenizationFailed { .. })
        ));
    }
}

mod forward_tests {
    use super::*;
    use candle_nn::VarMap;

    const WORDS: [&str; 12] = [
        "gaze", "typing", "haptic", "maps", "voice", "interfaces", "for", "blind", "users",
        "paper", "study", "design",
    ];
    const HIDDEN: usize = 16;
    const ADAPTER: &str = "specter2_adhoc_query";

    fn tiny_bert() -> BertConfig {
        BertConfig {
            vocab_size: 4 + WORDS.len(),
            hidden_size: HIDDEN,
            num_hidden_layers: 2,
            num_attention_heads: 2,
            intermediate_size: 32,
            max_position_embeddings: SPECTER_MAX_SEQ_LEN,
            type_vocab_size: 2,
            layer_norm_eps: 1e-12,
            hidden_act: "gelu".to_string(),
        }
    }

    fn tokenizer_json() -> serde_json::Value {
        let specials = ["[PAD]", "[UNK]", "[CLS]", "[SEP]"];
        let mut vocab = serde_json::Map::new();
        for (id, token) in specials.iter().chain(WORDS.iter()).enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        let added: Vec<_> = specials
            .iter()
            .enumerate()
            .map(|(id, token)| {
                serde_json::json!({
                    "id": id,
                    "content": token,
                    "single_word": false,
                    "lstrip": false,
                    "rstrip": false,
                    "normalized": false,
                    "special": true
                })
            })
            .collect();

        serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added,
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "BertPreTokenizer" },
            "post_processor": {
                "type": "BertProcessing",
                "sep": ["[SEP]", 3],
                "cls": ["[CLS]", 2]
            },
            "decoder": { "type": "WordPiece", "prefix": "##", "cleanup": true },
            "model": {
                "type": "WordPiece",
                "unk_token": "[UNK]",
                "continuing_subword_prefix": "##",
                "max_input_chars_per_word": 100,
                "vocab": vocab
            }
        })
    }

    /// Writes a randomly initialized encoder (and optionally an adapter) to `dir`.
    fn write_model(dir: &std::path::Path, with_adapter: bool) {
        let bert = tiny_bert();
        std::fs::write(
            dir.join("config.json"),
            serde_json::json!({
                "vocab_size": bert.vocab_size,
                "hidden_size": bert.hidden_size,
                "num_hidden_layers": bert.num_hidden_layers,
                "num_attention_heads": bert.num_attention_heads,
                "intermediate_size": bert.intermediate_size,
                "max_position_embeddings": bert.max_position_embeddings
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(dir.join("tokenizer.json"), tokenizer_json().to_string()).unwrap();

        let weights = VarMap::new();
        let vb = VarBuilder::from_varmap(&weights, DType::F32, &Device::Cpu);
        let adapter_weights = VarMap::new();
        let adapter = with_adapter.then(|| AdapterWeights {
            vb: VarBuilder::from_varmap(&adapter_weights, DType::F32, &Device::Cpu),
            name: ADAPTER.to_string(),
            reduction_factor: 4,
        });
        BertEncoder::load(vb, adapter, &bert).unwrap();

        weights.save(dir.join("model.safetensors")).unwrap();
        if with_adapter {
            adapter_weights.save(dir.join("adapter.safetensors")).unwrap();
        }
    }

    fn model_config(dir: &std::path::Path) -> SpecterConfig {
        SpecterConfig {
            embedding_dim: HIDDEN,
            cpu_only: true,
            ..SpecterConfig::new(dir)
        }
    }

    fn assert_close(a: &[f32], b: &[f32], what: &str) {
        assert_eq!(a.len(), b.len(), "{what}");
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-4, "{what}: {x} vs {y}");
        }
    }

    #[test]
    fn test_mixed_batch_matches_single_inputs() {
        let dir = TempDir::new().unwrap();
        write_model(dir.path(), false);
        let embedder = SpecterEmbedder::load(model_config(dir.path())).unwrap();
        assert!(!embedder.is_stub());

        let long = "haptic maps study ".repeat(300);
        let texts = [
            "gaze typing",
            long.as_str(),
            "voice interfaces for blind users[SEP]design",
            "paper",
        ];

        let batch = embedder.embed(&texts).unwrap();
        assert_eq!(batch.len(), texts.len());
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(vector.len(), HIDDEN);
            assert!(vector.iter().all(|x| x.is_finite()));
            let alone = embedder.embed(&[*text]).unwrap();
            assert_close(&alone[0], vector, &text[..text.len().min(24)]);
        }
        assert!(
            batch[0]
                .iter()
                .zip(&batch[3])
                .any(|(x, y)| (x - y).abs() > 1e-6),
            "different texts must not collapse"
        );
    }

    #[test]
    fn test_adapter_is_attached() {
        let dir = TempDir::new().unwrap();
        write_model(dir.path(), true);
        let config = model_config(dir.path())
            .with_adapter(dir.path().join("adapter.safetensors"), ADAPTER);
        let embedder = SpecterEmbedder::load(config).unwrap();
        assert_eq!(embedder.adapter_name(), Some(ADAPTER));

        let vectors = embedder.embed(&["gaze typing", "haptic maps"]).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), HIDDEN);
    }

    #[test]
    fn test_unknown_adapter_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_model(dir.path(), true);
        let config = model_config(dir.path())
            .with_adapter(dir.path().join("adapter.safetensors"), "specter2_proximity");
        assert!(matches!(
            SpecterEmbedder::load(config),
            Err(EmbeddingError::AdapterNotFound { .. })
        ));
    }

    #[test]
    fn test_model_dimension_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_model(dir.path(), false);
        let config = SpecterConfig {
            embedding_dim: SPECTER_EMBEDDING_DIM,
            ..model_config(dir.path())
        };
        assert!(matches!(
            SpecterEmbedder::load(config),
            Err(EmbeddingError::InvalidConfig { .. })
        ));
    }
}
