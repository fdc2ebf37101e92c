// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw image files to model-ready tensor batches.
//
// The pipeline flows in this order:
//
//   class-per-subdirectory image tree
//       │
//       ▼
//   ImageFolderLoader → decodes, resizes, rescales to CHW f32
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher      → stacks samples into tensor batches,
//       │               warping each training image with the
//       │               augmentation recipe (validation images
//       ▼               pass through untouched)
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.

/// Loads class-per-subdirectory image trees
pub mod loader;

/// The fixed augmentation recipe (train feed only)
pub mod augment;

/// Implements Burn's Dataset trait for labelled images
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
