// ============================================================
// Layer 4 — Overfitting Auditor
// ============================================================
// Measures how many generated licks are new rather than copies
// of training licks.
//
// A generated lick is overfit when its pitch sequence equals the
// pitch sequence of any training lick. Durations are ignored:
// the same rhythms recur across many distinct licks.
//
//   viable_fraction = |viable| / |generated|     (0 if none generated)
//
// Reference: Rust Book §8 (Hash Sets)

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::score::Lick;
use crate::domain::symbol::Pitch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverfittingReport {
    /// Indices into the generated list that are not copies
    pub viable:          Vec<usize>,
    pub viable_fraction: f64,
    pub viable_names:    Vec<String>,
}

/// Compare every generated lick against every training lick.
pub fn audit(generated: &[Lick], training: &[Lick]) -> OverfittingReport {
    let seen: HashSet<Vec<Pitch>> = training.iter().map(Lick::pitches).collect();

    let viable: Vec<usize> = generated
        .iter()
        .enumerate()
        .filter(|(_, lick)| !seen.contains(&lick.pitches()))
        .map(|(idx, _)| idx)
        .collect();

    let viable_fraction = if generated.is_empty() {
        0.0
    } else {
        viable.len() as f64 / generated.len() as f64
    };

    let viable_names = viable.iter().map(|&idx| generated[idx].name.clone()).collect();

    tracing::debug!(
        "Audit: {}/{} generated licks are new",
        viable.len(),
        generated.len()
    );

    OverfittingReport { viable, viable_fraction, viable_names }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbol::Event;

    fn lick(name: &str, keys: &[u8], quarters: f64) -> Lick {
        Lick::new(name, keys.iter().map(|&k| Event::note(k, quarters)).collect())
    }

    fn training() -> Vec<Lick> {
        vec![
            lick("t1.mid", &[60, 62, 64], 0.5),
            lick("t2.mid", &[67, 65, 64, 62], 0.5),
            lick("t3.mid", &[60, 64, 67], 1.0),
        ]
    }

    #[test]
    fn test_all_copies_score_zero() {
        // same pitches, different rhythm — still a copy
        let generated = vec![lick("g1", &[60, 62, 64], 1.0), lick("g2", &[60, 64, 67], 1.0)];
        let report    = audit(&generated, &training());
        assert!(report.viable.is_empty());
        assert_eq!(report.viable_fraction, 0.0);
    }

    #[test]
    fn test_all_new_scores_one() {
        let generated = vec![lick("g1", &[61, 63], 0.5), lick("g2", &[70], 0.5)];
        let report    = audit(&generated, &training());
        assert_eq!(report.viable, vec![0, 1]);
        assert_eq!(report.viable_fraction, 1.0);
        assert_eq!(report.viable_names, vec!["g1", "g2"]);
    }

    #[test]
    fn test_mixed_and_duplicates_counted_once() {
        let generated = vec![
            lick("g1", &[60, 62, 64], 0.5),
            lick("g2", &[60, 62], 0.5),
            lick("g3", &[60, 62, 64], 0.5),
            lick("g4", &[72], 0.5),
        ];
        let report = audit(&generated, &training());
        assert_eq!(report.viable, vec![1, 3]);
        assert_eq!(report.viable_fraction, 0.5);
        assert_eq!(report.viable_names, vec!["g2", "g4"]);
    }

    #[test]
    fn test_training_order_does_not_matter() {
        let generated = vec![lick("g1", &[60, 62, 64], 0.5), lick("g2", &[59], 0.5)];
        let mut reversed = training();
        reversed.reverse();
        assert_eq!(audit(&generated, &training()), audit(&generated, &reversed));
    }

    #[test]
    fn test_nothing_generated() {
        let report = audit(&[], &training());
        assert!(report.viable.is_empty());
        assert_eq!(report.viable_fraction, 0.0);
    }
}
