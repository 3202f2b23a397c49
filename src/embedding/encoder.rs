use candle::{DType, Device, Tensor};
use candle_core as candle;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use serde::Deserialize;
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use super::error::EmbeddingError;
use super::utils::load_skill_tokenizer;
use crate::constants::SKILL_EMBEDDING_DIM;

/// `2_Dense/config.json` of a sentence-transformers checkpoint.
#[derive(Debug, Deserialize)]
struct DenseConfig {
    in_features: usize,
    out_features: usize,
    #[serde(default = "default_bias")]
    bias: bool,
}

fn default_bias() -> bool {
    true
}

/// Sentence-transformer encoder: BERT, masked mean pooling, optional tanh dense
/// projection, L2 normalization.
pub struct SentenceEncoder {
    bert: BertModel,
    projection: Option<Linear>,
    tokenizer: Tokenizer,
    device: Device,
    output_dim: usize,
}

impl std::fmt::Debug for SentenceEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceEncoder")
            .field("device", &format!("{:?}", self.device))
            .field("projection", &self.projection.is_some())
            .field("output_dim", &self.output_dim)
            .finish()
    }
}

impl SentenceEncoder {
    pub fn load(model_dir: &Path, max_seq_len: usize, device: &Device) -> Result<Self, EmbeddingError> {
        let config_path = model_dir.join("config.json");
        let weights_path = model_dir.join("model.safetensors");

        for path in [&config_path, &weights_path] {
            if !path.is_file() {
                return Err(EmbeddingError::ModelNotFound { path: path.clone() });
            }
        }

        let config_content = std::fs::read_to_string(&config_path)?;
        let config: Config =
            serde_json::from_str(&config_content).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to parse config: {}", e),
            })?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device).map_err(
                |e| EmbeddingError::ModelLoadFailed {
                    reason: format!("Failed to map weights: {}", e),
                },
            )?
        };

        let bert = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &config)
        } else {
            BertModel::load(vb, &config)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to load BERT model: {}", e),
        })?;

        let projection = Self::load_projection(model_dir, config.hidden_size, device)?;
        let output_dim = projection
            .as_ref()
            .map(|(_, out)| *out)
            .unwrap_or(config.hidden_size);

        if output_dim != SKILL_EMBEDDING_DIM {
            warn!(
                output_dim,
                expected = SKILL_EMBEDDING_DIM,
                "Model output dimension differs from the skill embedding dimension; embeddings will be rejected"
            );
        }

        let tokenizer = load_skill_tokenizer(model_dir, max_seq_len).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        info!(
            model_dir = %model_dir.display(),
            hidden_size = config.hidden_size,
            output_dim,
            "Sentence encoder loaded"
        );

        Ok(Self {
            bert,
            projection: projection.map(|(linear, _)| linear),
            tokenizer,
            device: device.clone(),
            output_dim,
        })
    }

    fn load_projection(
        model_dir: &Path,
        hidden_size: usize,
        device: &Device,
    ) -> Result<Option<(Linear, usize)>, EmbeddingError> {
        let dense_dir = model_dir.join("2_Dense");
        let dense_config_path = dense_dir.join("config.json");
        let dense_weights_path = dense_dir.join("model.safetensors");

        if !dense_config_path.is_file() {
            return Ok(None);
        }
        if !dense_weights_path.is_file() {
            return Err(EmbeddingError::ModelNotFound {
                path: dense_weights_path,
            });
        }

        let dense: DenseConfig = serde_json::from_str(&std::fs::read_to_string(&dense_config_path)?)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to parse dense config: {}", e),
            })?;

        if dense.in_features != hidden_size {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!(
                    "dense in_features ({}) does not match hidden_size ({})",
                    dense.in_features, hidden_size
                ),
            });
        }

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[dense_weights_path], DType::F32, device)
                .map_err(|e| EmbeddingError::ModelLoadFailed {
                    reason: format!("Failed to map dense weights: {}", e),
                })?
        };

        let linear = if dense.bias {
            candle_nn::linear(dense.in_features, dense.out_features, vb.pp("linear"))
        } else {
            candle_nn::linear_no_bias(dense.in_features, dense.out_features, vb.pp("linear"))
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to load dense projection: {}", e),
        })?;

        debug!(
            in_features = dense.in_features,
            out_features = dense.out_features,
            "Dense projection loaded"
        );

        Ok(Some((linear, dense.out_features)))
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Encodes a batch in one forward pass.
    pub fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        let ids = encodings
            .iter()
            .map(|e| Tensor::new(e.get_ids(), &self.device))
            .collect::<candle::Result<Vec<_>>>()?;
        let masks = encodings
            .iter()
            .map(|e| Tensor::new(e.get_attention_mask(), &self.device))
            .collect::<candle::Result<Vec<_>>>()?;

        // [batch, seq]
        let input_ids = Tensor::stack(&ids, 0)?;
        let attention_mask = Tensor::stack(&masks, 0)?;
        let token_type_ids = input_ids.zeros_like()?;

        debug!(
            batch = texts.len(),
            seq_len = input_ids.dim(1)?,
            "Running encoder forward pass"
        );

        // [batch, seq, hidden]
        let hidden = self
            .bert
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        // Every encoding carries special tokens, so the count is never zero.
        let counts = mask.sum(1)?;
        let mut pooled = summed.broadcast_div(&counts)?;

        if let Some(projection) = &self.projection {
            pooled = projection.forward(&pooled)?.tanh()?;
        }

        let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = pooled.broadcast_div(&norms)?;

        Ok(normalized.to_vec2::<f32>()?)
    }
}
