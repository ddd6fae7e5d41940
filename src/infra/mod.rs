// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches disk on behalf of the other layers:
//
//   checkpoint.rs    — model weights (gzip MessagePack) and the
//                      TrainConfig JSON, one folder per scale
//
//   corpus_store.rs  — flattened corpus and windowed samples,
//                      so generation and auditing reuse the
//                      training-time vocabulary
//
//   metrics.rs       — per-epoch CSV log
//
//   midi_writer.rs   — generated licks → .mid files
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Corpus and window persistence
pub mod corpus_store;

/// Training metrics CSV logger
pub mod metrics;

/// MIDI rendering of generated licks
pub mod midi_writer;
