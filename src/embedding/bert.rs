//! BERT encoder with optional bottleneck adapters.
//!
//! The layout follows the Hugging Face BERT checkpoint format so `model.safetensors`
//! loads without renaming. An adapter, when attached, sits after each layer's
//! feed-forward output:
//!
//! ```text
//! y   = LayerNorm(ffn_out + attn_out)
//! out = LayerNorm(y + up(relu(down(y))) + attn_out)
//! ```
//!
//! Both LayerNorms are the layer's own `output.LayerNorm`.

use candle::{DType, IndexOp, Result, Tensor};
use candle_core as candle;
use candle_nn::{Embedding, LayerNorm, Linear, Module, VarBuilder};
use serde::Deserialize;

const MASKED_SCORE: f64 = -10_000.0;

fn default_max_position_embeddings() -> usize {
    512
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

fn default_hidden_act() -> String {
    "gelu".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// The subset of `config.json` the encoder needs.
pub struct BertConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    #[serde(default = "default_max_position_embeddings")]
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Gelu,
    GeluTanh,
}

impl BertConfig {
    fn activation(&self) -> Result<Activation> {
        match self.hidden_act.as_str() {
            "gelu" => Ok(Activation::Gelu),
            "gelu_new" | "gelu_pytorch_tanh" => Ok(Activation::GeluTanh),
            other => Err(candle::Error::Msg(format!(
                "unsupported hidden_act '{other}'"
            ))),
        }
    }

    fn head_dim(&self) -> Result<usize> {
        if self.num_attention_heads == 0 || self.hidden_size % self.num_attention_heads != 0 {
            return Err(candle::Error::Msg(format!(
                "hidden_size {} is not divisible by num_attention_heads {}",
                self.hidden_size, self.num_attention_heads
            )));
        }
        Ok(self.hidden_size / self.num_attention_heads)
    }
}

/// Where to find an adapter's weights and how large its bottleneck is.
pub struct AdapterWeights<'a> {
    pub vb: VarBuilder<'a>,
    pub name: String,
    /// `hidden_size / reduction_factor` is the bottleneck width.
    pub reduction_factor: usize,
}

/// Strips a `bert.` / `roberta.` prefix if the checkpoint carries one.
fn model_root<'a>(vb: VarBuilder<'a>, key: &str) -> VarBuilder<'a> {
    for prefix in ["bert", "roberta"] {
        if vb.contains_tensor(&format!("{prefix}.{key}")) {
            return vb.pp(prefix);
        }
    }
    vb
}

struct BertEmbeddings {
    word: Embedding,
    position: Embedding,
    token_type: Embedding,
    layer_norm: LayerNorm,
    max_positions: usize,
}

impl BertEmbeddings {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        Ok(Self {
            word: candle_nn::embedding(
                config.vocab_size,
                config.hidden_size,
                vb.pp("word_embeddings"),
            )?,
            position: candle_nn::embedding(
                config.max_position_embeddings,
                config.hidden_size,
                vb.pp("position_embeddings"),
            )?,
            token_type: candle_nn::embedding(
                config.type_vocab_size,
                config.hidden_size,
                vb.pp("token_type_embeddings"),
            )?,
            layer_norm: candle_nn::layer_norm(
                config.hidden_size,
                config.layer_norm_eps,
                vb.pp("LayerNorm"),
            )?,
            max_positions: config.max_position_embeddings,
        })
    }

    fn forward(&self, input_ids: &Tensor, token_type_ids: &Tensor) -> Result<Tensor> {
        let (_batch, seq_len) = input_ids.dims2()?;
        if seq_len > self.max_positions {
            return Err(candle::Error::Msg(format!(
                "sequence length {seq_len} exceeds max_position_embeddings {}",
                self.max_positions
            )));
        }

        let positions = Tensor::arange(0u32, seq_len as u32, input_ids.device())?.unsqueeze(0)?;
        let embeddings = self
            .word
            .forward(input_ids)?
            .add(&self.token_type.forward(token_type_ids)?)?
            .broadcast_add(&self.position.forward(&positions)?)?;
        self.layer_norm.forward(&embeddings)
    }
}

struct SelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    layer_norm: LayerNorm,
    num_heads: usize,
    head_dim: usize,
}

impl SelfAttention {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let hidden = config.hidden_size;
        let this = vb.pp("self");
        let out = vb.pp("output");
        Ok(Self {
            query: candle_nn::linear(hidden, hidden, this.pp("query"))?,
            key: candle_nn::linear(hidden, hidden, this.pp("key"))?,
            value: candle_nn::linear(hidden, hidden, this.pp("value"))?,
            output: candle_nn::linear(hidden, hidden, out.pp("dense"))?,
            layer_norm: candle_nn::layer_norm(hidden, config.layer_norm_eps, out.pp("LayerNorm"))?,
            num_heads: config.num_attention_heads,
            head_dim: config.head_dim()?,
        })
    }

    // [b, s, h] -> [b, heads, s, head_dim]
    fn split_heads(&self, x: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, _) = x.dims3()?;
        x.reshape((batch, seq_len, self.num_heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()
    }

    fn forward(&self, hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, width) = hidden.dims3()?;

        let q = self.split_heads(&self.query.forward(hidden)?)?;
        let k = self.split_heads(&self.key.forward(hidden)?)?;
        let v = self.split_heads(&self.value.forward(hidden)?)?;

        let scale = 1.0 / (self.head_dim as f64).sqrt();
        let scores = q
            .matmul(&k.t()?.contiguous()?)?
            .affine(scale, 0.0)?
            .broadcast_add(mask)?;
        let probs = candle_nn::ops::softmax_last_dim(&scores)?;

        let context = probs
            .matmul(&v)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch, seq_len, width))?;

        let projected = self.output.forward(&context)?;
        self.layer_norm.forward(&projected.add(hidden)?)
    }
}

struct BottleneckAdapter {
    down: Linear,
    up: Linear,
}

impl BottleneckAdapter {
    fn load(vb: VarBuilder, hidden: usize, bottleneck: usize) -> Result<Self> {
        Ok(Self {
            down: candle_nn::linear(hidden, bottleneck, vb.pp("adapter_down").pp("0"))?,
            up: candle_nn::linear(bottleneck, hidden, vb.pp("adapter_up"))?,
        })
    }

    /// `x + up(relu(down(x)))`
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let delta = self.up.forward(&self.down.forward(x)?.relu()?)?;
        delta.add(x)
    }
}

struct BertLayer {
    attention: SelfAttention,
    intermediate: Linear,
    output: Linear,
    output_norm: LayerNorm,
    adapter: Option<BottleneckAdapter>,
    activation: Activation,
}

impl BertLayer {
    fn load(
        vb: VarBuilder,
        adapter: Option<BottleneckAdapter>,
        config: &BertConfig,
    ) -> Result<Self> {
        let hidden = config.hidden_size;
        Ok(Self {
            attention: SelfAttention::load(vb.pp("attention"), config)?,
            intermediate: candle_nn::linear(
                hidden,
                config.intermediate_size,
                vb.pp("intermediate").pp("dense"),
            )?,
            output: candle_nn::linear(
                config.intermediate_size,
                hidden,
                vb.pp("output").pp("dense"),
            )?,
            output_norm: candle_nn::layer_norm(
                hidden,
                config.layer_norm_eps,
                vb.pp("output").pp("LayerNorm"),
            )?,
            adapter,
            activation: config.activation()?,
        })
    }

    fn forward(&self, hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
        let attended = self.attention.forward(hidden, mask)?;

        let intermediate = self.intermediate.forward(&attended)?;
        let intermediate = match self.activation {
            Activation::Gelu => intermediate.gelu_erf()?,
            Activation::GeluTanh => intermediate.gelu()?,
        };
        let ffn = self.output.forward(&intermediate)?;

        let normed = self.output_norm.forward(&ffn.add(&attended)?)?;
        match &self.adapter {
            None => Ok(normed),
            Some(adapter) => self
                .output_norm
                .forward(&adapter.forward(&normed)?.add(&attended)?),
        }
    }
}

/// BERT encoder returning final-layer hidden states.
pub struct BertEncoder {
    embeddings: BertEmbeddings,
    layers: Vec<BertLayer>,
    config: BertConfig,
    adapter_name: Option<String>,
}

impl BertEncoder {
    /// Builds the encoder from checkpoint weights, attaching `adapter` to every layer.
    pub fn load(
        vb: VarBuilder,
        adapter: Option<AdapterWeights>,
        config: &BertConfig,
    ) -> Result<Self> {
        config.head_dim()?;
        config.activation()?;

        let root = model_root(vb, "embeddings.word_embeddings.weight");

        let adapter = match adapter {
            Some(weights) => {
                if weights.reduction_factor == 0 || weights.reduction_factor > config.hidden_size {
                    return Err(candle::Error::Msg(format!(
                        "invalid adapter reduction factor {}",
                        weights.reduction_factor
                    )));
                }
                let key = format!(
                    "encoder.layer.0.output.adapters.{}.adapter_up.weight",
                    weights.name
                );
                let adapter_root = model_root(weights.vb, &key);
                Some((
                    adapter_root,
                    weights.name,
                    config.hidden_size / weights.reduction_factor,
                ))
            }
            None => None,
        };

        let embeddings = BertEmbeddings::load(root.pp("embeddings"), config)?;

        let mut layers = Vec::with_capacity(config.num_hidden_layers);
        for idx in 0..config.num_hidden_layers {
            let layer_adapter = match &adapter {
                Some((adapter_vb, name, bottleneck)) => Some(BottleneckAdapter::load(
                    adapter_vb
                        .pp("encoder")
                        .pp("layer")
                        .pp(idx.to_string())
                        .pp("output")
                        .pp("adapters")
                        .pp(name),
                    config.hidden_size,
                    *bottleneck,
                )?),
                None => None,
            };
            layers.push(BertLayer::load(
                root.pp("encoder").pp("layer").pp(idx.to_string()),
                layer_adapter,
                config,
            )?);
        }

        Ok(Self {
            embeddings,
            layers,
            config: config.clone(),
            adapter_name: adapter.map(|(_, name, _)| name),
        })
    }

    /// Hidden states `[batch, seq_len, hidden]`. `attention_mask` is 1 for real tokens.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let mut hidden = self.embeddings.forward(input_ids, token_type_ids)?;

        // [b, s] -> [b, 1, 1, s], 0 where attended and a large negative elsewhere.
        let mask = attention_mask
            .to_dtype(DType::F32)?
            .affine(-MASKED_SCORE, MASKED_SCORE)?
            .unsqueeze(1)?
            .unsqueeze(1)?;

        for layer in &self.layers {
            hidden = layer.forward(&hidden, &mask)?;
        }
        Ok(hidden)
    }

    /// First-token (CLS) hidden state per sequence, `[batch, hidden]`.
    pub fn cls(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        self.forward(input_ids, token_type_ids, attention_mask)?
            .i((.., 0, ..))?
            .contiguous()
    }

    pub fn config(&self) -> &BertConfig {
        &self.config
    }

    pub fn adapter_name(&self) -> Option<&str> {
        self.adapter_name.as_deref()
    }
}
