// ============================================================
// Layer 7 — Whisper Speech Recognizer (Candle)
// ============================================================
// Loads a pretrained Whisper checkpoint and greedily decodes
// 30 second audio windows into text.
//
// Model resolution:
//   "base"                 → hub repo "openai/whisper-base"
//   "openai/whisper-small" → hub repo as given
//   "./models/whisper"     → local directory with the three files
//
// Decode loop per window:
//   encoder.forward(mel)           once
//   decoder.forward(prefix, ...)   per step, KV cache flushed
//   final_linear(last position)    → greedy argmax
//   stop on <|endoftext|> or the model's position limit

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use candle_core::{Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use tokenizers::Tokenizer;

use crate::domain::traits::SpeechToText;
use crate::domain::transcript::Transcript;
use crate::speech::audio::{self, MelFrontend};

// ─── Model File Resolution ────────────────────────────────────────────────────

struct ModelFiles {
    config:    PathBuf,
    tokenizer: PathBuf,
    weights:   PathBuf,
}

/// Map a model name from the configuration to a hub repo id.
/// Bare size names ("tiny", "base", ...) resolve to the official
/// openai checkpoints; anything with a '/' is already a repo id.
fn repo_for(name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        format!("openai/whisper-{name}")
    }
}

fn locate_files(name: &str) -> Result<ModelFiles> {
    let local = Path::new(name);
    if local.is_dir() {
        tracing::info!("Loading speech model from local directory '{}'", local.display());
        return Ok(ModelFiles {
            config:    local.join("config.json"),
            tokenizer: local.join("tokenizer.json"),
            weights:   local.join("model.safetensors"),
        });
    }

    let repo_id = repo_for(name);
    tracing::info!("Fetching speech model '{}' from the Hugging Face hub", repo_id);

    let api = hf_hub::api::sync::Api::new()
        .context("Cannot initialize the Hugging Face hub client")?;
    let repo = api.model(repo_id.clone());

    let fetch = |file: &str| {
        repo.get(file)
            .with_context(|| format!("Cannot fetch '{}' from '{}'", file, repo_id))
    };

    Ok(ModelFiles {
        config:    fetch("config.json")?,
        tokenizer: fetch("tokenizer.json")?,
        weights:   fetch("model.safetensors")?,
    })
}

// ─── WhisperRecognizer ────────────────────────────────────────────────────────

/// Pretrained Whisper model plus its tokenizer and mel front end.
pub struct WhisperRecognizer {
    model:     m::model::Whisper,
    tokenizer: Tokenizer,
    config:    Config,
    mel:       MelFrontend,
    device:    Device,
}

impl WhisperRecognizer {
    /// Load the named pretrained model. Any failure is logged here
    /// so the pipeline log shows which stage broke the run.
    pub fn load(name: &str) -> Result<Self> {
        Self::load_inner(name).map_err(|e| {
            tracing::error!("Failed to load pretrained speech model '{}'.", name);
            e
        })
    }

    fn load_inner(name: &str) -> Result<Self> {
        let files = locate_files(name)?;
        let device = Device::Cpu;

        let config: Config = serde_json::from_str(
            &std::fs::read_to_string(&files.config)
                .with_context(|| format!("Cannot read '{}'", files.config.display()))?,
        )
        .context("Cannot parse the speech model config")?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| anyhow!("Cannot load tokenizer '{}': {}", files.tokenizer.display(), e))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights.clone()], m::DTYPE, &device)
                .with_context(|| format!("Cannot map weights '{}'", files.weights.display()))?
        };
        let model = m::model::Whisper::load(&vb, config.clone())
            .context("Cannot initialize the speech model from its weights")?;

        let mel = MelFrontend::new(config.num_mel_bins);

        tracing::info!(
            "Speech model ready: {} mel bins, {} decoder positions",
            config.num_mel_bins,
            config.max_target_positions,
        );

        Ok(Self { model, tokenizer, config, mel, device })
    }

    fn token_id(&self, token: &str) -> Result<u32> {
        self.tokenizer
            .token_to_id(token)
            .ok_or_else(|| anyhow!("tokenizer has no '{}' token", token))
    }

    /// Greedily decode one 30 second mel window.
    fn decode_segment(&mut self, mel: &Tensor) -> Result<String> {
        let audio_features = self.model.encoder.forward(mel, true)?;

        let sot        = self.token_id(m::SOT_TOKEN)?;
        let eot        = self.token_id(m::EOT_TOKEN)?;
        let transcribe = self.token_id(m::TRANSCRIBE_TOKEN)?;
        let no_ts      = self.token_id(m::NO_TIMESTAMPS_TOKEN)?;

        let mut tokens = vec![sot];
        // Multilingual checkpoints put a language token between SOT
        // and the task token; English-only checkpoints have none.
        if let Some(lang) = self.tokenizer.token_to_id("<|en|>") {
            tokens.push(lang);
        }
        tokens.push(transcribe);
        tokens.push(no_ts);
        let prompt_len = tokens.len();

        while tokens.len() < self.config.max_target_positions {
            let prefix = Tensor::new(tokens.as_slice(), &self.device)?.unsqueeze(0)?;

            // The KV cache is flushed every step; prefixes stay short
            // and no cache state can leak between files.
            let ys = self.model.decoder.forward(&prefix, &audio_features, true)?;

            let (_, seq_len, _) = ys.dims3()?;
            let logits = self
                .model
                .decoder
                .final_linear(&ys.i((..1, seq_len - 1..))?)?
                .i(0)?
                .i(0)?;

            let logits: Vec<f32> = logits.to_vec1()?;
            let next = logits
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(i, _)| i as u32)
                .ok_or_else(|| anyhow!("speech model produced empty logits"))?;

            if next == eot {
                break;
            }
            tokens.push(next);
        }

        let text = self
            .tokenizer
            .decode(&tokens[prompt_len..], true)
            .map_err(|e| anyhow!("Cannot decode predicted tokens: {}", e))?;
        Ok(text.trim().to_string())
    }
}

impl SpeechToText for WhisperRecognizer {
    fn transcribe_file(&mut self, path: &Path) -> Result<Transcript> {
        let (samples, sample_rate) = audio::load_wav(path)?;
        let samples = audio::resample(&samples, sample_rate, audio::SAMPLE_RATE)?;

        let mut pieces = Vec::new();
        for chunk in samples.chunks(audio::SEGMENT_SAMPLES) {
            let padded = audio::pad_segment(chunk);
            let (mel, n_frames) = self.mel.log_mel(&padded)?;
            let mel = Tensor::from_vec(
                mel,
                (1, self.config.num_mel_bins, n_frames),
                &self.device,
            )?;

            let text = self.decode_segment(&mel)?;
            if !text.is_empty() {
                pieces.push(text);
            }
        }

        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Transcript::new(source, pieces.join(" ")))
    }
}
