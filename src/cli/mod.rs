// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `run`        — the full pipeline (also the default)
//   2. `train`      — train the image classifier only
//   3. `transcribe` — transcribe the audio directory only
//
// Every command checks the required environment variable before
// touching any file.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, RunArgs, TrainArgs, TranscribeArgs};

use crate::infra::config::{require_env, PipelineConfig, REQUIRED_ENV};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "vision-voice-pipeline",
    version = "0.1.0",
    about = "Train an image classifier from a JSON architecture, then transcribe a directory of WAV files."
)]
pub struct Cli {
    /// Logging configuration document (dictConfig-style YAML)
    #[arg(long, global = true, default_value = "config/logging.yaml")]
    pub logging_config: String,

    /// The subcommand to run; the full pipeline when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Some(Commands::Run(args))        => Self::run_pipeline(args),
            Some(Commands::Train(args))      => Self::run_train(args),
            Some(Commands::Transcribe(args)) => Self::run_transcribe(args),
            None                             => Self::run_pipeline(RunArgs::default()),
        }
    }

    /// Handles the `run` subcommand: the whole pipeline in order.
    fn run_pipeline(args: RunArgs) -> Result<()> {
        use crate::application::run_use_case::RunUseCase;

        let use_case = RunUseCase::new(args.into());
        use_case.execute()?;

        println!("Pipeline complete.");
        Ok(())
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into TrainSettings and hands off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        require_env(REQUIRED_ENV)?;
        let cfg = PipelineConfig::from_file(&args.config)?;
        let architecture = crate::ml::model::ModelArchitecture::from_file(&args.architecture)?;

        tracing::info!("Starting training on images in: {}", args.train_dir);

        let use_case = TrainUseCase::new(args.into());
        let report = use_case.execute(&cfg, &architecture)?;

        println!(
            "Training complete after {} epochs. Final model saved.",
            report.epochs_completed
        );
        Ok(())
    }

    /// Handles the `transcribe` subcommand.
    /// Loads the pretrained speech model and walks the audio directory.
    fn run_transcribe(args: TranscribeArgs) -> Result<()> {
        use crate::application::transcribe_use_case::TranscribeUseCase;
        use crate::speech::recognizer::WhisperRecognizer;

        require_env(REQUIRED_ENV)?;
        let cfg = PipelineConfig::from_file(&args.config)?;

        let model     = args.model.unwrap_or_else(|| cfg.speech.model.clone());
        let audio_dir = args.audio_dir.unwrap_or_else(|| cfg.data.audio_path.clone());

        let mut recognizer = WhisperRecognizer::load(&model)?;
        let transcripts = TranscribeUseCase::new(&audio_dir).execute(&mut recognizer)?;

        println!("Transcribed {} file(s).", transcripts.len());
        Ok(())
    }
}
