// ============================================================
// Layer 4 — MIDI Score Loader
// ============================================================
// Loads monophonic .mid files using the midly crate and turns
// each file into one Score of (pitch, duration) events.
//
// How a file becomes events:
//   1. NoteOn / NoteOff pairs from every track become
//      (start, end, key) spans in absolute ticks
//   2. Spans are sorted by start time
//   3. Positions are rescaled to 480 ticks per quarter and
//      snapped to a 1/12-quarter grid (sixteenths and triplets)
//   4. A gap before a span becomes a rest; an overlap with the
//      previous span is clipped away so the line stays monophonic
//
// Directory layout:
//   <data_dir>/diatonic/*.mid
//   <data_dir>/alterated/*.mid
//
// Reference: midly crate documentation
//            Rust Book §9 (Error Handling)

use std::collections::HashMap;
use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result, bail};
use midly::{MidiMessage, Smf, Timing, TrackEventKind};

use crate::domain::score::{Scale, Score};
use crate::domain::symbol::{Event, NoteLength, Pitch, TICKS_PER_QUARTER};
use crate::domain::traits::ScoreSource;

/// Snap grid in ticks: 1/12 of a quarter note.
const QUANTIZE_TICKS: u64 = TICKS_PER_QUARTER as u64 / 12;

/// Loads every .mid file of a scale from a data directory.
/// Implements the ScoreSource trait from Layer 3.
pub struct MidiScoreLoader {
    data_dir: PathBuf,
}

impl MidiScoreLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }
}

impl ScoreSource for MidiScoreLoader {
    fn load_scores(&self, scale: Scale) -> Result<Vec<Score>> {
        let mut scores = Vec::new();
        for folder in scale.source_folders() {
            scores.extend(self.load_dir(&self.data_dir.join(folder))?);
        }
        tracing::info!("Loaded {} scores for scale '{}'", scores.len(), scale);
        Ok(scores)
    }

    fn load_dir(&self, dir: &Path) -> Result<Vec<Score>> {
        // A missing folder is an empty corpus, not a failure
        if !dir.exists() {
            tracing::warn!("Score directory '{}' does not exist — returning no scores", dir.display());
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("mid") | Some("midi")))
            .collect();
        // read_dir order is platform dependent
        paths.sort();

        let mut scores = Vec::with_capacity(paths.len());
        for path in paths {
            match load_single_midi(&path) {
                Ok(score) => {
                    tracing::debug!("Loaded: {} ({} events)", score.name, score.events.len());
                    scores.push(score);
                }
                Err(e) => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
            }
        }
        Ok(scores)
    }
}

/// Parse one .mid file into a Score named after the file.
fn load_single_midi(path: &Path) -> Result<Score> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    let events = parse_midi(&bytes)
        .with_context(|| format!("Cannot parse '{}'", path.display()))?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(Score::new(name, events))
}

/// Parse raw SMF bytes into a monophonic event list.
pub fn parse_midi(bytes: &[u8]) -> Result<Vec<Event>> {
    let smf = Smf::parse(bytes).map_err(|e| anyhow::anyhow!("midly parse error: {e}"))?;

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(tpq) => tpq.as_int() as u64,
        Timing::Timecode(..)  => bail!("timecode-based MIDI timing is not supported"),
    };
    if ticks_per_quarter == 0 {
        bail!("MIDI header declares zero ticks per quarter");
    }

    let mut spans = collect_spans(&smf);
    spans.sort_by_key(|&(start, _, key)| (start, key));

    Ok(spans_to_events(&spans, ticks_per_quarter))
}

/// (start, end, key) in file ticks, across all tracks.
fn collect_spans(smf: &Smf) -> Vec<(u64, u64, u8)> {
    let mut spans = Vec::new();

    for track in &smf.tracks {
        let mut now: u64 = 0;
        let mut open: HashMap<u8, u64> = HashMap::new();

        for event in track {
            now += event.delta.as_int() as u64;
            let TrackEventKind::Midi { message, .. } = event.kind else {
                continue;
            };
            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    // Re-striking a held key ends the held note
                    if let Some(start) = open.insert(key.as_int(), now)
                        && now > start
                    {
                        spans.push((start, now, key.as_int()));
                    }
                }
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    if let Some(start) = open.remove(&key.as_int())
                        && now > start
                    {
                        spans.push((start, now, key.as_int()));
                    }
                }
                _ => {}
            }
        }
    }

    spans
}

fn spans_to_events(spans: &[(u64, u64, u8)], ticks_per_quarter: u64) -> Vec<Event> {
    let mut events = Vec::with_capacity(spans.len() * 2);
    let mut cursor: u64 = 0;

    for &(start, end, key) in spans {
        let start = quantize(start, ticks_per_quarter).max(cursor);
        let end   = quantize(end, ticks_per_quarter);
        if end <= start {
            continue;
        }
        if start > cursor {
            events.push(Event::new(Pitch::Rest, NoteLength((start - cursor) as u32)));
        }
        events.push(Event::new(Pitch::Note(key), NoteLength((end - start) as u32)));
        cursor = end;
    }

    events
}

/// Rescale file ticks to our resolution and snap to the grid.
fn quantize(ticks: u64, ticks_per_quarter: u64) -> u64 {
    let scaled = (ticks as f64) * TICKS_PER_QUARTER as f64 / ticks_per_quarter as f64;
    (scaled / QUANTIZE_TICKS as f64).round() as u64 * QUANTIZE_TICKS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_becomes_rest() {
        // quarter C4, quarter gap, eighth D4 at 480 tpq
        let spans  = [(0, 480, 60), (960, 1200, 62)];
        let events = spans_to_events(&spans, 480);
        assert_eq!(events, vec![Event::note(60, 1.0), Event::rest(1.0), Event::note(62, 0.5)]);
    }

    #[test]
    fn test_leading_silence_is_rest() {
        let events = spans_to_events(&[(240, 480, 60)], 480);
        assert_eq!(events, vec![Event::rest(0.5), Event::note(60, 0.5)]);
    }

    #[test]
    fn test_overlap_is_clipped() {
        let events = spans_to_events(&[(0, 480, 60), (240, 720, 64)], 480);
        assert_eq!(events, vec![Event::note(60, 1.0), Event::note(64, 0.5)]);
    }

    #[test]
    fn test_rescales_resolution() {
        // 96 tpq file: an eighth is 48 ticks
        let events = spans_to_events(&[(0, 48, 60)], 96);
        assert_eq!(events, vec![Event::note(60, 0.5)]);
    }

    #[test]
    fn test_triplets_survive_quantization() {
        let events = spans_to_events(&[(0, 160, 60), (160, 320, 62), (320, 480, 64)], 480);
        assert!(events.iter().all(|e| e.length == NoteLength::from_quarters(1.0 / 3.0)));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let loader = MidiScoreLoader::new("/definitely/not/here");
        assert!(loader.load_scores(Scale::Both).unwrap().is_empty());
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(parse_midi(b"not a midi file").is_err());
    }
}
