// ============================================================
// Layer 7 — Speech Layer (Candle)
// ============================================================
// Everything needed to turn a WAV file into text:
//
//   audio.rs      — WAV decoding, resampling to 16 kHz, and the
//                   log-mel spectrogram front end
//
//   recognizer.rs — Pretrained Whisper checkpoint loading (local
//                   directory or Hugging Face hub) and greedy
//                   decoding; implements the SpeechToText trait
//
// This is the only layer that imports candle. The application
// layer talks to it through domain::traits::SpeechToText so the
// transcription flow is testable without model weights.

/// WAV decoding, resampling, and log-mel spectrograms
pub mod audio;

/// Whisper checkpoint loading and greedy decoding
pub mod recognizer;
