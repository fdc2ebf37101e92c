// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   config.rs     — Runtime configuration
//                   Loads config/config.yaml into typed
//                   settings structs (optimizer, training,
//                   data, speech) and checks the required
//                   environment variable before anything
//                   else is allowed to run.
//
//   logging.rs    — Logging bootstrap
//                   Parses config/logging.yaml and installs
//                   the tracing subscriber with the level
//                   and format the file asks for. Must run
//                   once, before the first log line.
//
//   checkpoint.rs — Saving and loading model weights
//                   Uses Burn's NamedMpkGzFileRecorder to serialise
//                   model parameters to disk. Keeps the
//                   best-so-far checkpoint separate from the
//                   unconditional end-of-training save, and
//                   stores the architecture/class-name side
//                   files inference needs to rebuild the
//                   model.
//
//   metrics.rs    — Training metrics logging
//                   Writes epoch-level metrics (loss,
//                   accuracy) to a CSV file for later
//                   analysis and plotting.
//
// Why is this a separate layer?
//   These concerns are used by multiple other layers but
//   don't belong to any one of them. Keeping them here:
//   - Prevents duplication across layers
//   - Makes it easy to swap implementations
//     (e.g. swap file checkpoints for S3 cloud storage)
//   - Keeps other layers focused on their core logic
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Typed runtime configuration loaded from YAML
pub mod config;

/// Logging bootstrap from config/logging.yaml
pub mod logging;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
