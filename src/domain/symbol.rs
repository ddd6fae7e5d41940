// ============================================================
// Layer 3 — Musical Symbols
// ============================================================
// The two parallel categorical vocabularies of the system:
//
//   Pitch      → START sentinel, a rest, or a MIDI key number
//   NoteLength → a quarter-note length held as integer ticks
//
// Lengths are kept as ticks (480 per quarter) instead of floats
// so triplet values stay exact and every symbol is Eq + Ord + Hash.
// The derived ordering is what the vocabulary sorts by.
//
// Reference: Rust Book §6 (Enums), §10 (Derive Macros)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ticks per quarter note shared by the reader, the vocabulary and the writer.
pub const TICKS_PER_QUARTER: u32 = 480;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// ─── Pitch ────────────────────────────────────────────────────────────────────
/// A pitch-or-rest symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pitch {
    /// Fragment boundary marker
    Start,
    Rest,
    /// MIDI key number, 60 = C4
    Note(u8),
}

impl Pitch {
    pub fn is_start(&self) -> bool {
        matches!(self, Pitch::Start)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pitch::Start => write!(f, "START"),
            Pitch::Rest  => write!(f, "rest"),
            Pitch::Note(key) => {
                let name   = NOTE_NAMES[(*key % 12) as usize];
                let octave = (*key / 12) as i32 - 1;
                write!(f, "{name}{octave}")
            }
        }
    }
}

// ─── NoteLength ───────────────────────────────────────────────────────────────
/// A duration symbol in ticks. `NoteLength(0)` is the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteLength(pub u32);

impl NoteLength {
    pub const SENTINEL: NoteLength = NoteLength(0);

    pub fn ticks(&self) -> u32 {
        self.0
    }

    pub fn quarter_length(&self) -> f64 {
        self.0 as f64 / TICKS_PER_QUARTER as f64
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NoteLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ql = self.quarter_length();
        if ql.fract() == 0.0 {
            write!(f, "{}", ql as u64)
        } else {
            let s = format!("{ql:.4}");
            write!(f, "{}", s.trim_end_matches('0'))
        }
    }
}

// ─── Event ────────────────────────────────────────────────────────────────────
/// One (pitch, duration) pair of a melodic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub pitch:  Pitch,
    pub length: NoteLength,
}

impl Event {
    pub const SENTINEL: Event = Event { pitch: Pitch::Start, length: NoteLength::SENTINEL };

    pub fn new(pitch: Pitch, length: NoteLength) -> Self {
        Self { pitch, length }
    }

    /// A sentinel on either stream marks a fragment boundary.
    pub fn is_sentinel(&self) -> bool {
        self.pitch.is_start() || self.length.is_sentinel()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pitch, self.length)
    }
}

// Fixture constructors for tests across the crate.
#[cfg(test)]
impl NoteLength {
    pub fn from_quarters(quarters: f64) -> Self {
        NoteLength((quarters * TICKS_PER_QUARTER as f64).round().max(0.0) as u32)
    }
}

#[cfg(test)]
impl Event {
    pub fn note(key: u8, quarters: f64) -> Self {
        Self::new(Pitch::Note(key), NoteLength::from_quarters(quarters))
    }

    pub fn rest(quarters: f64) -> Self {
        Self::new(Pitch::Rest, NoteLength::from_quarters(quarters))
    }
}
