// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between .mid files and model-ready tensor batches,
// plus the novelty audit that compares licks back to the corpus.
//
//   .mid files
//       │
//       ▼
//   MidiScoreLoader   → one Score of (pitch, duration) per file
//       │
//       ▼
//   Corpus            → flat stream with sentinel runs
//       │
//       ▼
//   Vocabulary        → symbol ↔ code codebooks
//       │
//       ▼
//   WindowEncoder     → sliding-window samples, one-hot targets
//       │
//       ▼
//   split_validation  → train / validation halves
//       │
//       ▼
//   LickDataset       → Burn's Dataset trait
//       │
//       ▼
//   LickBatcher       → tensor batches for the DataLoader
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads .mid files into scores using midly
pub mod loader;

/// Flattens scores into one sentinel-delimited stream
pub mod corpus;

/// Sorted, bidirectional symbol codebooks
pub mod vocab;

/// Sliding-window example construction
pub mod windowing;

/// Implements Burn's Dataset trait for windowed samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Tail split into train/validation sets
pub mod splitter;

/// Generated-vs-training pitch sequence comparison
pub mod overfitting;
