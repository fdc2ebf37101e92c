// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (the full pipeline, training alone, or
// transcription alone).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct tensor or codec work (Layers 4, 5, 7)
//   - Only workflow coordination
//
// Think of this layer as the "director" — it tells other
// layers what to do but doesn't do the work itself.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The default end-to-end workflow: train, then transcribe
pub mod run_use_case;

// The classifier training workflow
pub mod train_use_case;

// The audio transcription workflow
pub mod transcribe_use_case;
