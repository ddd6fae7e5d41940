// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches Burn tensors lives here.
//
//   model.rs      — dual-input LSTM with attention pooling
//                   • pitch + duration embeddings, concatenated
//                   • two stacked LSTMs, dropout
//                   • tanh attention scores, softmax over time
//                   • pitch and duration softmax heads
//
//   trainer.rs    — Adam training loop, early stopping on the
//                   training loss, best-weights checkpoints
//
//   generator.rs  — autoregressive lick generation with
//                   per-stream randomness
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Hochreiter & Schmidhuber (1997) Long Short-Term Memory

use burn::backend::{Autodiff, Wgpu};

/// Backend used by `train`.
pub type TrainBackend = Autodiff<Wgpu>;

/// Backend used by `generate`.
pub type InferBackend = Wgpu;

/// LSTM lick model architecture
pub mod model;

/// Training loop with validation, early stopping and checkpointing
pub mod trainer;

/// Autoregressive generation with temperature-style sampling
pub mod generator;
