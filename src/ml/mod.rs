// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one
// and the data batcher that feeds it.
//
// What's in this layer:
//
//   model.rs     — The convolutional classifier architecture
//                  Built from the architecture document with:
//                  • Conv2d blocks (same padding, ReLU, 2x2 max-pool)
//                  • Flatten + hidden dense layer
//                  • Dropout
//                  • Class logits head
//
//   trainer.rs   — The training loop
//                  Handles forward pass, loss computation,
//                  backward pass, optimiser step, per-epoch
//                  best checkpointing and the final save
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Convolutional image classifier built from a JSON architecture document
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;
