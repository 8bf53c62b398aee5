use ndarray::Array2;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams};
use tract_onnx::prelude::*;

use super::{Classification, EngineError, InferenceEngine};

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const CONFIG_FILE: &str = "config.json";

/// Sequence classifier exported to ONNX, run on CPU with tract.
///
/// Expects the Hugging Face export layout: `model.onnx` taking `input_ids`
/// and `attention_mask`, `tokenizer.json`, and a `config.json` carrying
/// `id2label`.
pub struct OnnxSentimentEngine {
    model: TypedRunnableModel<TypedModel>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
}

impl OnnxSentimentEngine {
    pub fn load(model_dir: &Path, max_sequence_length: usize) -> Result<Self, EngineError> {
        let config_path = model_dir.join(CONFIG_FILE);
        let raw_config = fs::read_to_string(&config_path).map_err(|e| {
            EngineError::Load(format!(
                "Failed to read model config '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        let labels = parse_labels(&raw_config)?;

        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            EngineError::Load(format!(
                "Failed to load tokenizer from '{}': {}",
                tokenizer_path.display(),
                e
            ))
        })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| EngineError::Load(format!("Invalid truncation settings: {}", e)))?;
        tokenizer.with_padding(None);

        let model_path = model_dir.join(MODEL_FILE);
        let model = tract_onnx::onnx()
            .model_for_path(&model_path)
            .map_err(|e| {
                EngineError::Load(format!(
                    "Failed to load ONNX model '{}': {}",
                    model_path.display(),
                    e
                ))
            })?
            .into_optimized()
            .map_err(|e| EngineError::Load(format!("Failed to optimize ONNX model: {}", e)))?
            .into_runnable()
            .map_err(|e| EngineError::Load(format!("Failed to make model runnable: {}", e)))?;

        Ok(Self {
            model,
            tokenizer,
            labels,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn logits(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let encoding = self.tokenizer.encode(text, true).map_err(|e| {
            EngineError::Tokenization(format!(
                "Tokenization failed on '{}': {}",
                text.chars().take(50).collect::<String>(),
                e
            ))
        })?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();
        let length = ids.len();

        let input_ids = Array2::from_shape_vec((1, length), ids)
            .map_err(|e| EngineError::Inference(format!("Bad input_ids shape: {}", e)))?
            .into_tensor();
        let attention_mask = Array2::from_shape_vec((1, length), mask)
            .map_err(|e| EngineError::Inference(format!("Bad attention_mask shape: {}", e)))?
            .into_tensor();

        let outputs = self
            .model
            .run(tvec!(input_ids.into(), attention_mask.into()))
            .map_err(|e| EngineError::Inference(format!("Model inference failed: {}", e)))?;

        let logits = outputs
            .first()
            .ok_or_else(|| EngineError::InvalidOutput("Model produced no outputs".into()))?
            .to_array_view::<f32>()
            .map_err(|e| EngineError::InvalidOutput(format!("Unexpected logits tensor: {}", e)))?;

        Ok(logits.iter().copied().collect())
    }
}

impl InferenceEngine for OnnxSentimentEngine {
    fn classify(&self, text: &str) -> Result<Vec<Classification>, EngineError> {
        let logits = self.logits(text)?;
        classify_logits(&logits, &self.labels)
    }
}

/// Picks the most probable label for one row of logits.
fn classify_logits(logits: &[f32], labels: &[String]) -> Result<Vec<Classification>, EngineError> {
    if logits.len() != labels.len() {
        return Err(EngineError::InvalidOutput(format!(
            "Model produced {} logits for {} labels",
            logits.len(),
            labels.len()
        )));
    }
    if logits.iter().any(|x| !x.is_finite()) {
        return Err(EngineError::InvalidOutput(format!(
            "Model produced non-finite logits: {:?}",
            logits
        )));
    }

    let probs = softmax(logits);
    let (pred_id, score) = probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .ok_or_else(|| EngineError::InvalidOutput("Model produced empty logits".into()))?;

    Ok(vec![Classification::new(
        labels[pred_id].clone(),
        f64::from(score),
    )?])
}

#[derive(Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

/// Turns `config.json`'s `id2label` map into a table indexed by class id.
fn parse_labels(raw: &str) -> Result<Vec<String>, EngineError> {
    let config: ModelConfig = serde_json::from_str(raw)
        .map_err(|e| EngineError::Load(format!("Invalid model config: {}", e)))?;
    if config.id2label.is_empty() {
        return Err(EngineError::Load("Model config has no labels".into()));
    }

    let mut labels = vec![None; config.id2label.len()];
    for (id, label) in config.id2label {
        let slot = id
            .parse::<usize>()
            .ok()
            .and_then(|idx| labels.get_mut(idx))
            .ok_or_else(|| EngineError::Load(format!("Invalid label id '{}' in id2label", id)))?;
        *slot = Some(label);
    }

    labels
        .into_iter()
        .collect::<Option<Vec<String>>>()
        .ok_or_else(|| EngineError::Load("Label ids in id2label are not contiguous".into()))
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
