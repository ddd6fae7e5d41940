// ============================================================
// Layer 4 — Windowing Encoder
// ============================================================
// Turns the flat event stream into fixed-length training examples
// by sliding a window of `length` events one step at a time:
//
//   stream:  S S S C D E S S S          (length = 3)
//   window 0: [S S S] → C
//   window 1: [S S C] → D
//   window 2: [S C D] → E
//   window 3: [C D E] → S
//   ...
//
// A stream of N events yields max(0, N - length) examples. Windows
// are not stopped at lick boundaries; the sentinel runs are long
// enough that the model sees every lick start from, and end into,
// a pure-sentinel context.
//
// Targets are one-hot over the training-time vocabulary, pitch
// and duration independently.
//
// Reference: Rust Book §8 (Slices)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::dataset::LickSample;
use crate::data::vocab::Vocabulary;
use crate::domain::symbol::Event;

/// Window length used throughout: one eighth-note jazz lick.
pub const DEFAULT_WINDOW: usize = 17;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowEncoder {
    length: usize,
}

impl WindowEncoder {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Number of examples `encode` produces for a stream of `n` events.
    pub fn num_windows(&self, n: usize) -> usize {
        n.saturating_sub(self.length)
    }

    /// Encode every window of `events`.
    /// Fails only if an event is missing from `vocab`.
    pub fn encode(&self, events: &[Event], vocab: &Vocabulary) -> Result<Vec<LickSample>> {
        // Encode the stream once; windows are slices of it
        let codes: Vec<(usize, usize)> = events
            .iter()
            .map(|e| vocab.encode(e))
            .collect::<Result<_>>()?;

        let pitch_classes  = vocab.pitches.len();
        let length_classes = vocab.lengths.len();

        let samples: Vec<LickSample> = (0..self.num_windows(codes.len()))
            .map(|i| {
                let window = &codes[i..i + self.length];
                let (pitch_next, length_next) = codes[i + self.length];
                LickSample {
                    pitch_context:  window.iter().map(|&(p, _)| p as u32).collect(),
                    length_context: window.iter().map(|&(_, d)| d as u32).collect(),
                    pitch_target:   one_hot(pitch_next, pitch_classes),
                    length_target:  one_hot(length_next, length_classes),
                }
            })
            .collect();

        tracing::debug!(
            "Encoded {} windows of length {} from {} events",
            samples.len(),
            self.length,
            events.len()
        );
        Ok(samples)
    }
}

impl Default for WindowEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

fn one_hot(class: usize, num_classes: usize) -> Vec<f32> {
    let mut v = vec![0.0; num_classes];
    v[class] = 1.0;
    v
}
