//! Configuration module

use std::env;
use std::path::PathBuf;

/// Identifier of the model served by this process.
pub const MODEL_NAME: &str = "distilbert-base-uncased-finetuned-sst-2-english";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Directory holding `model.onnx`, `tokenizer.json` and `config.json`
    pub model_dir: PathBuf,

    /// Token limit applied by the tokenizer before inference
    pub max_sequence_length: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            model_dir: lookup("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("models").join(MODEL_NAME)),

            max_sequence_length: lookup("MAX_SEQUENCE_LENGTH")
                .and_then(|n| n.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(512),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(
            config.model_dir,
            PathBuf::from("models/distilbert-base-uncased-finetuned-sst-2-english")
        );
        assert_eq!(config.max_sequence_length, 512);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9100"),
            ("MODEL_DIR", "/srv/models/sst2"),
            ("MAX_SEQUENCE_LENGTH", "256"),
        ]);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9100);
        assert_eq!(config.model_dir, PathBuf::from("/srv/models/sst2"));
        assert_eq!(config.max_sequence_length, 256);
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = config_from(&[("PORT", "http"), ("MAX_SEQUENCE_LENGTH", "0")]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_sequence_length, 512);
    }
}
