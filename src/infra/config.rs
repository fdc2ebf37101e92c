// ============================================================
// Layer 6 — Pipeline Configuration
// ============================================================
// Loads and validates config/config.yaml plus the environment
// pre-check that gates the whole run.
//
// Required keys:
//   optimizer.learning_rate   — Adam learning rate
//   training.epochs           — number of training passes
//
// Optional keys (with defaults):
//   training.batch_size       — images per batch (32)
//   data.audio_path           — directory of .wav files to
//                               transcribe (datasets/audio)
//   speech.model              — pretrained speech model name or
//                               local directory (base)

use std::{env, fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// The environment variable that must be present before any stage
/// runs. Presence-only: the value is never read.
pub const REQUIRED_ENV: &str = "REQUIRED_ENV_VAR";

/// Verify that a required environment variable is set.
///
/// Logs the failure before returning it so the precondition shows
/// up in the log even though the top-level boundary reports the
/// error again.
pub fn require_env(name: &str) -> Result<()> {
    if env::var_os(name).is_none() {
        tracing::error!("Required environment variable '{}' is not set.", name);
        bail!("required environment variable '{}' is not set", name);
    }
    Ok(())
}

// ─── Config sections ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerSettings {
    /// Learning rate handed to the Adam optimizer unchanged
    pub learning_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSettings {
    /// Number of full passes over the training feed
    pub epochs: usize,

    /// Images per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Directory holding the .wav files to transcribe
    #[serde(default = "default_audio_path")]
    pub audio_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { audio_path: default_audio_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Pretrained speech model: a bare size name ("base"), a full
    /// hub repo id ("openai/whisper-small"), or a local directory
    #[serde(default = "default_speech_model")]
    pub model: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self { model: default_speech_model() }
    }
}

fn default_batch_size() -> usize {
    32
}

fn default_audio_path() -> String {
    "datasets/audio".to_string()
}

fn default_speech_model() -> String {
    "base".to_string()
}

// ─── PipelineConfig ───────────────────────────────────────────────────────────

/// Everything config/config.yaml can express.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub optimizer: OptimizerSettings,
    pub training:  TrainingSettings,

    #[serde(default)]
    pub data: DataSettings,

    #[serde(default)]
    pub speech: SpeechSettings,
}

impl PipelineConfig {
    /// Load and validate the configuration document.
    /// A missing or malformed file is fatal for the whole run.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{}'", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Cannot parse config file '{}'", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make training meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.optimizer.learning_rate <= 0.0 {
            bail!(
                "optimizer.learning_rate must be positive, got {}",
                self.optimizer.learning_rate
            );
        }
        if self.training.epochs == 0 {
            bail!("training.epochs must be at least 1");
        }
        if self.training.batch_size == 0 {
            bail!("training.batch_size must be at least 1");
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const FULL_YAML: &str = "\
optimizer:
  learning_rate: 0.001
training:
  epochs: 10
  batch_size: 16
data:
  audio_path: sounds
speech:
  model: small
";

    const MINIMAL_YAML: &str = "\
optimizer:
  learning_rate: 0.01
training:
  epochs: 3
";

    #[test]
    fn test_parse_full_config() {
        let cfg: PipelineConfig = serde_yaml::from_str(FULL_YAML).unwrap();
        assert_eq!(cfg.optimizer.learning_rate, 0.001);
        assert_eq!(cfg.training.epochs, 10);
        assert_eq!(cfg.training.batch_size, 16);
        assert_eq!(cfg.data.audio_path, "sounds");
        assert_eq!(cfg.speech.model, "small");
    }

    #[test]
    fn test_optional_sections_default() {
        let cfg: PipelineConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        assert_eq!(cfg.training.batch_size, 32);
        assert_eq!(cfg.data.audio_path, "datasets/audio");
        assert_eq!(cfg.speech.model, "base");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_missing_required_section_fails() {
        let err = serde_yaml::from_str::<PipelineConfig>("training:\n  epochs: 1\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg: PipelineConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        cfg.optimizer.learning_rate = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg: PipelineConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        cfg.training.epochs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_file_missing_is_error() {
        let err = PipelineConfig::from_file("definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("Cannot read config file"));
    }

    #[test]
    fn test_require_env() {
        // Unique names so parallel tests never race on shared state
        env::set_var("VVP_TEST_ENV_PRESENT", "1");
        assert!(require_env("VVP_TEST_ENV_PRESENT").is_ok());

        env::remove_var("VVP_TEST_ENV_ABSENT");
        let err = require_env("VVP_TEST_ENV_ABSENT").unwrap_err();
        assert!(err.to_string().contains("VVP_TEST_ENV_ABSENT"));
    }
}
