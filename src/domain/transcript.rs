// ============================================================
// Layer 3 — Transcript Domain Type
// ============================================================
// Represents the result of transcribing a single audio file.
// Ephemeral: the pipeline logs each transcript and moves on,
// nothing beyond the log line is persisted.

use serde::{Deserialize, Serialize};

/// The recognized text for one audio file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// The audio filename — kept so log lines and callers can
    /// key results by file
    pub source: String,

    /// The recognized text, whitespace-trimmed
    pub text: String,
}

impl Transcript {
    /// Create a new Transcript. Uses impl Into<String> so callers
    /// can pass &str or String.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_new() {
        let t = Transcript::new("a.wav", "hello world");
        assert_eq!(t.source, "a.wav");
        assert_eq!(t.text, "hello world");
    }
}
