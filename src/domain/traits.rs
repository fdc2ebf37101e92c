// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams of the pipeline. By programming against these traits
// instead of concrete types, the application layer can swap
// implementations without changing the orchestration code —
// in particular, tests drive the transcription use case with an
// in-memory fake instead of a real speech model.

use std::path::Path;

use anyhow::Result;

use crate::domain::image::ImageFolder;
use crate::domain::transcript::Transcript;

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Any component that can load a labelled image dataset.
///
/// Implementations:
///   - ImageFolderLoader → class-per-subdirectory tree on disk
pub trait ImageSource {
    /// Load every image this source provides, together with the
    /// discovered class names.
    fn load_all(&self) -> Result<ImageFolder>;
}

// ─── SpeechToText ─────────────────────────────────────────────────────────────
/// Any component that can transcribe an audio file.
///
/// Implementations:
///   - WhisperRecognizer → pretrained Whisper weights via candle
///   - test fakes that record calls and return canned text
pub trait SpeechToText {
    /// Transcribe a single audio file. Takes &mut self because
    /// real recognizers keep decoder state between calls.
    fn transcribe_file(&mut self, path: &Path) -> Result<Transcript>;
}
