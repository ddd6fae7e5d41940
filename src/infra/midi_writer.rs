// ============================================================
// Layer 6 — MIDI Lick Writer
// ============================================================
// Renders a generated event list as a single-track Standard MIDI
// File with the midly crate.
//
//   START / zero-length events → skipped
//   rest                       → advances time only
//   note                       → NoteOn, NoteOff after its length
//
// Output: <out_dir>/<scale>/Generated_Lick_<scale>_<index+1>.mid
// at 120 bpm on an acoustic piano (program 0), 480 ticks per quarter.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};

use crate::domain::score::Scale;
use crate::domain::symbol::{Event, Pitch, TICKS_PER_QUARTER};
use crate::domain::traits::LickSink;

const TEMPO_BPM: u32 = 120;
const PIANO:     u8  = 0;
const VELOCITY:  u8  = 80;

/// Writes generated licks as .mid files.
/// Implements the LickSink trait from Layer 3.
pub struct MidiLickWriter {
    out_dir: PathBuf,
}

impl MidiLickWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }

    pub fn file_name(scale: Scale, index: usize) -> String {
        format!("Generated_Lick_{}_{}.mid", scale.key(), index + 1)
    }
}

impl LickSink for MidiLickWriter {
    fn write_lick(&self, events: &[Event], scale: Scale, index: usize) -> Result<PathBuf> {
        let dir = self.out_dir.join(scale.key());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output folder '{}'", dir.display()))?;

        let path = dir.join(Self::file_name(scale, index));
        let bytes = render(events)?;
        fs::write(&path, &bytes)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Wrote '{}' ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Encode events into SMF bytes.
pub fn render(events: &[Event]) -> Result<Vec<u8>> {
    let smf = events_to_smf(events);
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| anyhow::anyhow!("midly write error: {e}"))?;
    Ok(buf)
}

fn events_to_smf(events: &[Event]) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER as u16)),
    ));

    let channel = u4::new(0);
    let mut track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind:  TrackEventKind::Meta(MetaMessage::Tempo(u24::new(60_000_000 / TEMPO_BPM))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind:  TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange { program: u7::new(PIANO) },
            },
        },
    ];

    // ticks of silence owed to the next event
    let mut pending: u32 = 0;

    for event in events.iter().filter(|e| !e.is_sentinel()) {
        let ticks = event.length.ticks();
        match event.pitch {
            Pitch::Note(key) => {
                track.push(TrackEvent {
                    delta: u28::new(pending),
                    kind:  TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOn { key: u7::new(key), vel: u7::new(VELOCITY) },
                    },
                });
                track.push(TrackEvent {
                    delta: u28::new(ticks),
                    kind:  TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOff { key: u7::new(key), vel: u7::new(0) },
                    },
                });
                pending = 0;
            }
            Pitch::Rest  => pending += ticks,
            Pitch::Start => {}
        }
    }

    // a trailing rest still occupies time
    track.push(TrackEvent {
        delta: u28::new(pending),
        kind:  TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    smf
}
