// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits shared by every other layer:
//   - no burn types
//   - no file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Pitch / duration symbols and the sentinel event
pub mod symbol;

// Scores, licks and scale partitions
pub mod score;

// Collaborator seams (score source, lick sink)
pub mod traits;
