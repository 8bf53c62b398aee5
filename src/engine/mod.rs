//! Inference engine boundary.
//!
//! The endpoint only sees [`InferenceEngine`]: raw text in, typed
//! [`Classification`]s or an [`EngineError`] out. Framework errors from the
//! tokenizer or the ONNX runtime are converted here and never leak further.

pub mod onnx;

use thiserror::Error;

pub use onnx::OnnxSentimentEngine;

/// Failures raised by an inference engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Model, tokenizer or label table could not be loaded.
    #[error("{0}")]
    Load(String),

    /// Input could not be tokenized.
    #[error("{0}")]
    Tokenization(String),

    /// The model failed while running.
    #[error("{0}")]
    Inference(String),

    /// The model ran but produced something unusable.
    #[error("{0}")]
    InvalidOutput(String),
}

/// A sentiment label and the model's confidence in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    label: String,
    score: f64,
}

impl Classification {
    /// Builds a classification, rejecting an empty label or a score outside `[0, 1]`.
    pub fn new(label: impl Into<String>, score: f64) -> Result<Self, EngineError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(EngineError::InvalidOutput(
                "classifier returned an empty label".into(),
            ));
        }
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(EngineError::InvalidOutput(format!(
                "classifier returned score {score} for '{label}', expected a value in [0, 1]"
            )));
        }
        Ok(Self { label, score })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

/// Text classification capability shared by every request.
///
/// Implementations are called concurrently from the blocking pool without
/// any external locking.
pub trait InferenceEngine: Send + Sync {
    /// Classifies `text`, most likely label first.
    fn classify(&self, text: &str) -> Result<Vec<Classification>, EngineError>;
}
