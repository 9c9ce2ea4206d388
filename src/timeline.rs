use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::notes::{NoteEvent, NoteExtractor, PairingPolicy};
use crate::sequence::Sequence;
use crate::tempo::{TempoChange, TempoMap};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineOptions {
    pub pairing: PairingPolicy,
}

/// Data-integrity problems detected on a timeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// The note stops before it starts in elapsed time
    NegativeDuration,
}

/// A note placed on the absolute time axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub track: usize,
    pub note: u8,
    pub pitch: String,
    pub velocity: u8,
    pub start_ms: f64,
    pub end_ms: f64,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<IntegrityWarning>,
}

impl TimelineEntry {
    fn new(note: NoteEvent, start_ms: f64, end_ms: f64) -> Self {
        let duration_ms = end_ms - start_ms;
        let warning = if duration_ms < 0.0 {
            log::warn!(
                "Track {}: note {} ({}) ends {} ms before it starts",
                note.track,
                note.note,
                note.pitch,
                -duration_ms
            );
            Some(IntegrityWarning::NegativeDuration)
        } else {
            None
        };

        Self {
            track: note.track,
            note: note.note,
            pitch: note.pitch,
            velocity: note.velocity,
            start_ms,
            end_ms,
            duration_ms,
            warning,
        }
    }
}

/// Every note of a sequence with millisecond timing, in extraction order
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub ticks_per_beat: u16,
    pub tempo_changes: Vec<TempoChange>,
    pub entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn build(sequence: &Sequence, options: &TimelineOptions) -> Result<Self> {
        let tempo_map = TempoMap::build(sequence.tempo_track(), sequence.ticks_per_beat())?;
        let tempo_changes = tempo_map.changes().to_vec();
        let mut converter = tempo_map.into_converter();

        let notes = NoteExtractor::new(options.pairing).extract(sequence.note_tracks());

        let entries: Vec<TimelineEntry> = notes
            .into_iter()
            .map(|note| {
                let start_ms = converter.convert(note.start_tick);
                let end_ms = converter.convert(note.end_tick);
                TimelineEntry::new(note, start_ms, end_ms)
            })
            .collect();

        log::debug!(
            "Timeline built: {} note(s), {} tempo change(s), {} time anchor(s)",
            entries.len(),
            tempo_changes.len(),
            converter.anchor_count()
        );

        Ok(Timeline {
            ticks_per_beat: sequence.ticks_per_beat(),
            tempo_changes,
            entries,
        })
    }

    /// End of the last note in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.end_ms)
            .fold(0.0, f64::max)
    }

    pub fn has_warnings(&self) -> bool {
        self.entries.iter().any(|entry| entry.warning.is_some())
    }
}
