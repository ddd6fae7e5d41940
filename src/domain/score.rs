// ============================================================
// Layer 3 — Scores, Licks and Scales
// ============================================================
// A Score is what the symbolic-music collaborator hands us:
// one named file flattened into (pitch, duration) events.
// A Lick is the unit of generation and comparison — a named
// run of events with no sentinels inside.
//
// Reference: Rust Book §5 (Structs and Methods)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::symbol::{Event, Pitch};

// ─── Scale ────────────────────────────────────────────────────────────────────
/// Partition of the training corpus. Also the key of every store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Diatonic,
    Alterated,
    Both,
}

impl Scale {
    /// Folder / store key
    pub fn key(&self) -> &'static str {
        match self {
            Scale::Diatonic  => "diatonic",
            Scale::Alterated => "alterated",
            Scale::Both      => "both",
        }
    }

    /// Data sub-folders whose scores make up this scale, in load order
    pub fn source_folders(&self) -> &'static [&'static str] {
        match self {
            Scale::Diatonic  => &["diatonic"],
            Scale::Alterated => &["alterated"],
            Scale::Both      => &["diatonic", "alterated"],
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ─── Score ────────────────────────────────────────────────────────────────────
/// One parsed score file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// File name, kept so licks can be traced back to their source
    pub name:   String,
    pub events: Vec<Event>,
}

impl Score {
    pub fn new(name: impl Into<String>, events: Vec<Event>) -> Self {
        Self { name: name.into(), events }
    }
}

// ─── Lick ─────────────────────────────────────────────────────────────────────
/// A melodic fragment without sentinels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lick {
    pub name:   String,
    pub events: Vec<Event>,
}

impl Lick {
    pub fn new(name: impl Into<String>, events: Vec<Event>) -> Self {
        Self { name: name.into(), events }
    }

    /// Sentinels are dropped so a score and a generated sequence compare alike.
    pub fn from_score(score: &Score) -> Self {
        let events = score.events.iter().copied().filter(|e| !e.is_sentinel()).collect();
        Self::new(score.name.clone(), events)
    }

    pub fn pitches(&self) -> Vec<Pitch> {
        self.events.iter().map(|e| e.pitch).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Split a flat stream on sentinel events. Empty groups are dropped.
pub fn split_licks(events: &[Event]) -> Vec<Vec<Event>> {
    events
        .split(|e| e.is_sentinel())
        .filter(|group| !group.is_empty())
        .map(|group| group.to_vec())
        .collect()
}
