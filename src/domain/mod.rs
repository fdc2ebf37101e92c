// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits that define the core concepts
// of the pipeline.
//
// Rules for this layer:
//   - NO Burn or candle framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs and traits

// A labelled image and a loaded class-per-subdirectory folder
pub mod image;

// A per-file transcription result
pub mod transcript;

// Core abstractions (traits) that other layers implement
pub mod traits;
