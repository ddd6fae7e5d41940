// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the core and its external collaborators:
//
//   ScoreSource → produces parsed scores (MIDI reader)
//   LickSink    → consumes generated licks (MIDI writer)
//
// The application layer only talks to these traits, so the
// file format on either side can change without touching the
// training or generation code.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::score::{Scale, Score};
use crate::domain::symbol::Event;

// ─── ScoreSource ──────────────────────────────────────────────────────────────
/// Anything that can enumerate and parse the scores of a scale.
pub trait ScoreSource {
    /// All scores of `scale`, in a stable order.
    fn load_scores(&self, scale: Scale) -> Result<Vec<Score>>;

    /// All scores found directly in `dir`.
    fn load_dir(&self, dir: &Path) -> Result<Vec<Score>>;
}

// ─── LickSink ─────────────────────────────────────────────────────────────────
/// Anything that can render a generated lick.
pub trait LickSink {
    /// Render lick number `index` (0-based) of `scale`.
    /// Returns where it was written.
    fn write_lick(&self, events: &[Event], scale: Scale, index: usize) -> Result<PathBuf>;
}
