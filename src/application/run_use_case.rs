// ============================================================
// Layer 2 — RunUseCase
// ============================================================
// The default end-to-end pipeline, strictly in order:
//
//   Step 1: Environment + configuration   (Layer 6 - infra)
//   Step 2: Model architecture            (Layer 5 - ml)
//   Step 3: Train the classifier          (Layer 2/5)
//   Step 4: Transcribe the audio files    (Layer 2/7)
//
// Each step must succeed before the next one starts. A missing
// required environment variable aborts the run before any file
// is touched.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::{TrainSettings, TrainUseCase};
use crate::application::transcribe_use_case::TranscribeUseCase;
use crate::infra::config::{require_env, PipelineConfig, REQUIRED_ENV};
use crate::ml::model::ModelArchitecture;
use crate::speech::recognizer::WhisperRecognizer;

// ─── Run Settings ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Environment variable that must be set for the run to start
    pub required_env: String,

    pub config_path:       String,
    pub architecture_path: String,

    pub train: TrainSettings,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            required_env:      REQUIRED_ENV.to_string(),
            config_path:       "config/config.yaml".to_string(),
            architecture_path: "models/model_architecture.json".to_string(),
            train:             TrainSettings::default(),
        }
    }
}

// ─── RunUseCase ───────────────────────────────────────────────────────────────
pub struct RunUseCase {
    settings: RunSettings,
}

impl RunUseCase {
    pub fn new(settings: RunSettings) -> Self {
        Self { settings }
    }

    /// Execute the whole pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let s = &self.settings;

        // ── Step 1: Environment and configuration ─────────────────────────────
        require_env(&s.required_env)?;

        let cfg = PipelineConfig::from_file(&s.config_path)?;
        tracing::info!(
            "Configuration loaded: learning_rate={}, epochs={}",
            cfg.optimizer.learning_rate,
            cfg.training.epochs,
        );

        // ── Step 2: Model architecture ────────────────────────────────────────
        let architecture = ModelArchitecture::from_file(&s.architecture_path)?;

        // ── Step 3: Training ──────────────────────────────────────────────────
        let report = TrainUseCase::new(s.train.clone()).execute(&cfg, &architecture)?;
        tracing::info!(
            "Training finished: {} epochs, best validation loss {:?}",
            report.epochs_completed,
            report.best_val_loss,
        );

        // ── Step 4: Transcription ─────────────────────────────────────────────
        let mut recognizer = WhisperRecognizer::load(&cfg.speech.model)?;
        let transcripts =
            TranscribeUseCase::new(&cfg.data.audio_path).execute(&mut recognizer)?;
        tracing::info!("Transcribed {} audio files", transcripts.len());

        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vvp-run-uc-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_env_aborts_before_anything_else() {
        // Nothing else exists either, so if the precondition were
        // checked out of order this would fail with a config error.
        std::env::remove_var("VVP_RUN_TEST_ABSENT");
        let settings = RunSettings {
            required_env:      "VVP_RUN_TEST_ABSENT".to_string(),
            config_path:       "/nonexistent/config.yaml".to_string(),
            architecture_path: "/nonexistent/arch.json".to_string(),
            train:             TrainSettings::default(),
        };

        let err = RunUseCase::new(settings).execute().unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("environment variable"));
        assert!(!msg.contains("config file"));
    }

    #[test]
    fn test_missing_architecture_has_its_own_error() {
        std::env::set_var("VVP_RUN_TEST_PRESENT", "1");

        let dir = temp_dir("arch");
        let config_path = dir.join("config.yaml");
        fs::write(
            &config_path,
            "optimizer:\n  learning_rate: 0.001\ntraining:\n  epochs: 1\n",
        )
        .unwrap();

        let settings = RunSettings {
            required_env:      "VVP_RUN_TEST_PRESENT".to_string(),
            config_path:       config_path.to_string_lossy().into_owned(),
            architecture_path: dir.join("missing.json").to_string_lossy().into_owned(),
            train:             TrainSettings::default(),
        };

        let err = RunUseCase::new(settings).execute().unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("model architecture file not found"));
        assert!(!msg.contains("environment variable"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_broken_config_stops_before_architecture() {
        std::env::set_var("VVP_RUN_TEST_CFG", "1");

        let dir = temp_dir("cfg");
        let config_path = dir.join("config.yaml");
        fs::write(&config_path, "optimizer: [not, a, mapping]\n").unwrap();

        let settings = RunSettings {
            required_env:      "VVP_RUN_TEST_CFG".to_string(),
            config_path:       config_path.to_string_lossy().into_owned(),
            architecture_path: dir.join("missing.json").to_string_lossy().into_owned(),
            train:             TrainSettings::default(),
        };

        let err = RunUseCase::new(settings).execute().unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("Cannot parse config file"));
        assert!(!msg.contains("architecture"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
