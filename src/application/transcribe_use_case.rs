// ============================================================
// Layer 2 — TranscribeUseCase
// ============================================================
// Walks the audio directory and transcribes every .wav file in
// sorted filename order. Non-wav entries are ignored. The first
// transcription failure aborts the remaining files; the error
// carries the failed filename up to the top-level boundary.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::domain::traits::SpeechToText;
use crate::domain::transcript::Transcript;

pub struct TranscribeUseCase {
    audio_dir: PathBuf,
}

impl TranscribeUseCase {
    pub fn new(audio_dir: impl Into<PathBuf>) -> Self {
        Self { audio_dir: audio_dir.into() }
    }

    /// Transcribe every .wav file under the audio directory.
    ///
    /// Only files with the exact extension "wav" are picked up.
    /// Each result is logged as it arrives, so a failure partway
    /// through still leaves the earlier transcriptions in the log.
    pub fn execute<S: SpeechToText>(&self, recognizer: &mut S) -> Result<Vec<Transcript>> {
        let entries = fs::read_dir(&self.audio_dir).with_context(|| {
            format!("Cannot read audio directory '{}'", self.audio_dir.display())
        })?;

        let mut wav_files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "wav") {
                wav_files.push(path);
            }
        }
        wav_files.sort();

        if wav_files.is_empty() {
            tracing::warn!("No .wav files found under '{}'", self.audio_dir.display());
        }

        let mut transcripts = Vec::with_capacity(wav_files.len());
        for path in &wav_files {
            let transcript = recognizer
                .transcribe_file(path)
                .with_context(|| format!("Transcription failed for '{}'", path.display()))?;

            tracing::info!("Transcription for {}: {}", transcript.source, transcript.text);
            transcripts.push(transcript);
        }

        Ok(transcripts)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::path::Path;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vvp-transcribe-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Records every file it is asked about; optionally fails on one.
    struct RecordingFake {
        calls:   Vec<String>,
        fail_on: Option<String>,
    }

    impl RecordingFake {
        fn new() -> Self {
            Self { calls: Vec::new(), fail_on: None }
        }

        fn failing_on(name: &str) -> Self {
            Self { calls: Vec::new(), fail_on: Some(name.to_string()) }
        }
    }

    impl SpeechToText for RecordingFake {
        fn transcribe_file(&mut self, path: &Path) -> Result<Transcript> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.calls.push(name.clone());
            if self.fail_on.as_deref() == Some(name.as_str()) {
                bail!("decode failed for {}", name);
            }
            Ok(Transcript::new(name, "hello world"))
        }
    }

    #[test]
    fn test_only_wav_files_in_sorted_order() {
        let dir = temp_dir("filter");
        for name in ["c.wav", "b.txt", "a.wav", "d.WAV"] {
            fs::write(dir.join(name), b"not real audio").unwrap();
        }

        let mut fake = RecordingFake::new();
        let transcripts = TranscribeUseCase::new(&dir).execute(&mut fake).unwrap();

        assert_eq!(fake.calls, vec!["a.wav".to_string(), "c.wav".to_string()]);
        assert_eq!(transcripts.len(), 2);
        assert_eq!(transcripts[0].text, "hello world");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_failure_aborts_remaining_files() {
        let dir = temp_dir("abort");
        for name in ["a.wav", "b.wav", "c.wav"] {
            fs::write(dir.join(name), b"not real audio").unwrap();
        }

        let mut fake = RecordingFake::failing_on("b.wav");
        let err = TranscribeUseCase::new(&dir).execute(&mut fake).unwrap_err();

        // a.wav succeeded, b.wav failed, c.wav was never attempted
        assert_eq!(fake.calls, vec!["a.wav".to_string(), "b.wav".to_string()]);
        assert!(format!("{:#}", err).contains("Transcription failed for"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_directory_yields_no_transcripts() {
        let dir = temp_dir("empty");

        let mut fake = RecordingFake::new();
        let transcripts = TranscribeUseCase::new(&dir).execute(&mut fake).unwrap();

        assert!(fake.calls.is_empty());
        assert!(transcripts.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let mut fake = RecordingFake::new();
        let err = TranscribeUseCase::new("/nonexistent/audio")
            .execute(&mut fake)
            .unwrap_err();

        assert!(err.to_string().contains("Cannot read audio directory"));
        assert!(fake.calls.is_empty());
    }
}
