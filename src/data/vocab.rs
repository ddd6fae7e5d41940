// ============================================================
// Layer 4 — Vocabulary Builder
// ============================================================
// Maps pitch and duration symbols to dense integer codes and back.
//
// Codes are assigned after sorting the unique symbols, so the same
// symbol set always produces the same codebook no matter what
// order the symbols were seen in. Codes cover exactly [0, len).
//
// A symbol missing from the codebook is a hard error: the model's
// output layers are sized to the training-time vocabulary.
//
// Reference: Rust Book §8 (Hash Maps)

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::hash::Hash;

use anyhow::{Result, anyhow};

use crate::domain::symbol::{Event, NoteLength, Pitch};

/// A bidirectional symbol ↔ code mapping.
#[derive(Debug, Clone)]
pub struct Codebook<T> {
    to_code:   HashMap<T, usize>,
    from_code: Vec<T>,
}

// `to_code` is derived from `from_code`, so the ordered list decides equality.
impl<T: PartialEq> PartialEq for Codebook<T> {
    fn eq(&self, other: &Self) -> bool {
        self.from_code == other.from_code
    }
}

impl<T: Eq> Eq for Codebook<T> {}

impl<T> Codebook<T>
where
    T: Ord + Hash + Clone + Display,
{
    pub fn build<I>(symbols: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        // BTreeSet both de-duplicates and sorts
        let from_code: Vec<T> = symbols.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let to_code = from_code
            .iter()
            .enumerate()
            .map(|(code, sym)| (sym.clone(), code))
            .collect();
        Self { to_code, from_code }
    }

    pub fn encode(&self, symbol: &T) -> Result<usize> {
        self.to_code
            .get(symbol)
            .copied()
            .ok_or_else(|| anyhow!("symbol '{symbol}' is not in the trained vocabulary"))
    }

    pub fn decode(&self, code: usize) -> Result<T> {
        self.from_code.get(code).cloned().ok_or_else(|| {
            anyhow!("code {code} is outside the vocabulary (size {})", self.from_code.len())
        })
    }

    pub fn len(&self) -> usize {
        self.from_code.len()
    }
}

#[cfg(test)]
impl<T> Codebook<T> {
    fn symbols(&self) -> &[T] {
        &self.from_code
    }
}

/// The two parallel codebooks of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub pitches: Codebook<Pitch>,
    pub lengths: Codebook<NoteLength>,
}

impl Vocabulary {
    pub fn from_events(events: &[Event]) -> Self {
        let pitches = Codebook::build(events.iter().map(|e| e.pitch));
        let lengths = Codebook::build(events.iter().map(|e| e.length));
        tracing::debug!(
            "Vocabulary built: {} pitches, {} durations",
            pitches.len(),
            lengths.len()
        );
        Self { pitches, lengths }
    }

    pub fn encode(&self, event: &Event) -> Result<(usize, usize)> {
        Ok((self.pitches.encode(&event.pitch)?, self.lengths.encode(&event.length)?))
    }

    pub fn decode(&self, pitch_code: usize, length_code: usize) -> Result<Event> {
        Ok(Event::new(self.pitches.decode(pitch_code)?, self.lengths.decode(length_code)?))
    }

    /// Codes of the sentinel event. Fails if the corpus never contained one.
    pub fn sentinel_codes(&self) -> Result<(usize, usize)> {
        self.encode(&Event::SENTINEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events() -> Vec<Event> {
        vec![
            Event::SENTINEL,
            Event::note(64, 0.5),
            Event::note(60, 1.0),
            Event::rest(0.5),
            Event::note(60, 0.5),
        ]
    }

    #[test]
    fn test_codes_are_contiguous() {
        let vocab = Vocabulary::from_events(&sample_events());
        assert_eq!(vocab.pitches.len(), 4);
        assert_eq!(vocab.lengths.len(), 3);
        let mut codes: Vec<usize> = vocab
            .pitches
            .symbols()
            .iter()
            .map(|p| vocab.pitches.encode(p).unwrap())
            .collect();
        codes.sort();
        assert_eq!(codes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_encode_decode_identity() {
        let vocab = Vocabulary::from_events(&sample_events());
        for event in sample_events() {
            let (p, d) = vocab.encode(&event).unwrap();
            assert_eq!(vocab.decode(p, d).unwrap(), event);
        }
    }

    #[test]
    fn test_order_independent() {
        let mut reversed = sample_events();
        reversed.reverse();
        assert_eq!(Vocabulary::from_events(&sample_events()), Vocabulary::from_events(&reversed));
    }

    #[test]
    fn test_codebooks_compare_by_code_order() {
        let a = Codebook::build([Pitch::Note(64), Pitch::Rest, Pitch::Note(60)]);
        let b = Codebook::build([Pitch::Note(60), Pitch::Note(64), Pitch::Rest, Pitch::Rest]);
        let c = Codebook::build([Pitch::Note(60), Pitch::Rest]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.symbols(), &[Pitch::Rest, Pitch::Note(60), Pitch::Note(64)]);
    }

    #[test]
    fn test_sentinel_gets_code_zero() {
        let vocab = Vocabulary::from_events(&sample_events());
        assert_eq!(vocab.sentinel_codes().unwrap(), (0, 0));
    }

    #[test]
    fn test_unknown_symbol_is_error() {
        let vocab = Vocabulary::from_events(&sample_events());
        let err   = vocab.encode(&Event::note(72, 0.5)).unwrap_err();
        assert!(err.to_string().contains("C5"));
        assert!(vocab.pitches.decode(99).is_err());
    }
}
