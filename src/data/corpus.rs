// ============================================================
// Layer 4 — Corpus Flattening
// ============================================================
// Concatenates every score into one flat event stream, with a run
// of `length` sentinel events in front of each score and one
// closing run after the last:
//
//   S S S  a b c  S S S  d e  S S S
//   └run┘  lick1  └run┘ lick2 └run┘
//
// The runs separate licks, teach the model that a lick ends with
// START, and seed generation with a pure-sentinel context.
//
// Reference: Rust Book §8 (Vectors), §13 (Iterators)

use serde::{Deserialize, Serialize};

use crate::domain::score::{Lick, Score, split_licks};
use crate::domain::symbol::Event;

/// The flattened training stream plus the names of its licks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub events: Vec<Event>,
    /// One name per non-empty score, in stream order
    pub names:  Vec<String>,
}

impl Corpus {
    pub fn from_scores(scores: &[Score], length: usize) -> Self {
        let mut events = Vec::new();
        let mut names  = Vec::new();

        for score in scores {
            events.extend(std::iter::repeat_n(Event::SENTINEL, length));
            let lick = Lick::from_score(score);
            if !lick.is_empty() {
                names.push(score.name.clone());
            }
            events.extend(lick.events);
        }

        if !scores.is_empty() {
            events.extend(std::iter::repeat_n(Event::SENTINEL, length));
        }

        tracing::debug!("Flattened {} scores into {} events", scores.len(), events.len());
        Self { events, names }
    }

    /// Segment the stream back into named licks.
    pub fn licks(&self) -> Vec<Lick> {
        split_licks(&self.events)
            .into_iter()
            .enumerate()
            .map(|(idx, events)| {
                let name = self.names.get(idx).cloned().unwrap_or_else(|| format!("lick_{}", idx + 1));
                Lick::new(name, events)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbol::{NoteLength, Pitch};

    #[test]
    fn test_sentinel_runs_surround_every_score() {
        let scores = vec![
            Score::new("a.mid", vec![Event::note(60, 0.5), Event::note(62, 0.5)]),
            Score::new("b.mid", vec![Event::note(64, 1.0)]),
        ];
        let corpus = Corpus::from_scores(&scores, 3);

        let s = Event::SENTINEL;
        assert_eq!(
            corpus.events,
            vec![
                s, s, s, Event::note(60, 0.5), Event::note(62, 0.5),
                s, s, s, Event::note(64, 1.0),
                s, s, s,
            ]
        );
        assert_eq!(corpus.names, vec!["a.mid", "b.mid"]);
    }

    #[test]
    fn test_licks_keep_names() {
        let scores = vec![
            Score::new("a.mid", vec![Event::note(60, 0.5)]),
            Score::new("b.mid", vec![Event::rest(0.5), Event::note(67, 0.5)]),
        ];
        let licks = Corpus::from_scores(&scores, 2).licks();
        assert_eq!(licks.len(), 2);
        assert_eq!(licks[1].name, "b.mid");
        assert_eq!(licks[1].pitches(), vec![Pitch::Rest, Pitch::Note(67)]);
    }

    #[test]
    fn test_no_scores_no_events() {
        let corpus = Corpus::from_scores(&[], 17);
        assert!(corpus.events.is_empty());
        assert!(corpus.licks().is_empty());
    }

    #[test]
    fn test_leading_run_is_sentinel_on_both_streams() {
        let scores = vec![Score::new("a.mid", vec![Event::note(60, 0.5)])];
        let corpus = Corpus::from_scores(&scores, 4);
        assert_eq!(corpus.events.len(), 9);
        assert!(corpus.events[..4].iter().all(|e| e.pitch == Pitch::Start && e.length == NoteLength::SENTINEL));
    }
}
