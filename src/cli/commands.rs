// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `run`, `train`, `transcribe`,
// and all their configurable flags. With no subcommand the full
// `run` pipeline executes with its defaults.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::run_use_case::RunSettings;
use crate::application::train_use_case::TrainSettings;
use crate::infra::config::REQUIRED_ENV;

pub const DEFAULT_CONFIG:       &str = "config/config.yaml";
pub const DEFAULT_ARCHITECTURE: &str = "models/model_architecture.json";
pub const DEFAULT_TRAIN_DIR:    &str = "datasets/train";
pub const DEFAULT_VAL_DIR:      &str = "datasets/validation";
pub const DEFAULT_MODELS_DIR:   &str = "models";

/// The three top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline: train the classifier, then transcribe audio
    Run(RunArgs),

    /// Train the image classifier only
    Train(TrainArgs),

    /// Transcribe the audio directory only
    Transcribe(TranscribeArgs),
}

/// All arguments for the `run` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline configuration file (learning rate, epochs, ...)
    #[arg(long, default_value = DEFAULT_CONFIG)]
    pub config: String,

    /// Model architecture document
    #[arg(long, default_value = DEFAULT_ARCHITECTURE)]
    pub architecture: String,

    /// Training image tree (one subdirectory per class)
    #[arg(long, default_value = DEFAULT_TRAIN_DIR)]
    pub train_dir: String,

    /// Validation image tree (one subdirectory per class)
    #[arg(long, default_value = DEFAULT_VAL_DIR)]
    pub val_dir: String,

    /// Directory for checkpoints, the final model, and metrics
    #[arg(long, default_value = DEFAULT_MODELS_DIR)]
    pub models_dir: String,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            config:       DEFAULT_CONFIG.to_string(),
            architecture: DEFAULT_ARCHITECTURE.to_string(),
            train_dir:    DEFAULT_TRAIN_DIR.to_string(),
            val_dir:      DEFAULT_VAL_DIR.to_string(),
            models_dir:   DEFAULT_MODELS_DIR.to_string(),
        }
    }
}

/// Convert CLI RunArgs into the application-layer RunSettings.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<RunArgs> for RunSettings {
    fn from(a: RunArgs) -> Self {
        RunSettings {
            required_env:      REQUIRED_ENV.to_string(),
            config_path:       a.config,
            architecture_path: a.architecture,
            train: TrainSettings {
                train_dir:  a.train_dir,
                val_dir:    a.val_dir,
                models_dir: a.models_dir,
            },
        }
    }
}

/// All arguments for the `train` command
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Pipeline configuration file (learning rate, epochs, ...)
    #[arg(long, default_value = DEFAULT_CONFIG)]
    pub config: String,

    /// Model architecture document
    #[arg(long, default_value = DEFAULT_ARCHITECTURE)]
    pub architecture: String,

    /// Training image tree (one subdirectory per class)
    #[arg(long, default_value = DEFAULT_TRAIN_DIR)]
    pub train_dir: String,

    /// Validation image tree (one subdirectory per class)
    #[arg(long, default_value = DEFAULT_VAL_DIR)]
    pub val_dir: String,

    /// Directory for checkpoints, the final model, and metrics
    #[arg(long, default_value = DEFAULT_MODELS_DIR)]
    pub models_dir: String,
}

impl From<TrainArgs> for TrainSettings {
    fn from(a: TrainArgs) -> Self {
        TrainSettings {
            train_dir:  a.train_dir,
            val_dir:    a.val_dir,
            models_dir: a.models_dir,
        }
    }
}

/// All arguments for the `transcribe` command
#[derive(Args, Debug)]
pub struct TranscribeArgs {
    /// Pipeline configuration file
    #[arg(long, default_value = DEFAULT_CONFIG)]
    pub config: String,

    /// Directory of .wav files (overrides the configured path)
    #[arg(long)]
    pub audio_dir: Option<String>,

    /// Pretrained speech model (overrides the configured name)
    #[arg(long)]
    pub model: Option<String>,
}
