//! Tempo map construction from the tempo track
//!
//! The map records, for every tempo change, the absolute time in
//! milliseconds at which it takes effect. Those anchors are the ground truth
//! that [`TickConverter`](crate::TickConverter) interpolates between.

use serde::Serialize;
use std::collections::BTreeMap;
use std::num::NonZeroU32;

use crate::convert::TickConverter;
use crate::error::{Result, TimelineError};
use crate::sequence::{Event, EventKind};

/// Default tempo: 120 BPM = 500000 microseconds per beat
pub const DEFAULT_TEMPO: u32 = 500_000;

/// A tempo change and the absolute time at which it takes effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TempoChange {
    pub tick: u64,
    pub micros_per_beat: u32,
    pub time_ms: f64,
}

impl TempoChange {
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.micros_per_beat as f64
    }
}

/// Tick-ordered time and tempo anchors derived from the tempo track
#[derive(Debug, Clone)]
pub struct TempoMap {
    pub(crate) ticks_per_beat: u16,
    pub(crate) time_anchors: BTreeMap<u64, f64>,
    pub(crate) tempo_anchors: BTreeMap<u64, NonZeroU32>,
    changes: Vec<TempoChange>,
}

impl TempoMap {
    /// Walk the tempo track and anchor every tempo change in time
    pub fn build(tempo_track: &[Event], ticks_per_beat: u16) -> Result<Self> {
        if ticks_per_beat == 0 {
            return Err(TimelineError::InvalidResolution);
        }

        let mut map = Self {
            ticks_per_beat,
            time_anchors: BTreeMap::from([(0, 0.0)]),
            tempo_anchors: BTreeMap::from([(0, default_tempo())]),
            changes: Vec::new(),
        };

        let mut current_tempo = default_tempo();
        let mut current_tick: u64 = 0;
        let mut last_change_tick: u64 = 0;
        let mut last_change_ms = 0.0;

        for event in tempo_track {
            current_tick += event.delta as u64;

            let EventKind::Tempo(micros_per_beat) = event.kind else {
                continue;
            };
            let tempo = NonZeroU32::new(micros_per_beat).ok_or(TimelineError::InvalidTempo {
                tick: current_tick,
                micros_per_beat,
            })?;

            // The interval since the last change ran at the old tempo
            let elapsed_ms = ticks_to_ms(
                current_tick - last_change_tick,
                current_tempo.get(),
                ticks_per_beat,
            );
            let time_ms = last_change_ms + elapsed_ms;

            map.time_anchors.insert(current_tick, time_ms);
            map.tempo_anchors.insert(current_tick, tempo);

            let change = TempoChange {
                tick: current_tick,
                micros_per_beat,
                time_ms,
            };
            log::info!(
                "Tempo Change Event: Tempo={:.2} BPM Time={} ms",
                change.bpm(),
                change.time_ms
            );
            map.changes.push(change);

            last_change_tick = current_tick;
            last_change_ms = time_ms;
            current_tempo = tempo;
        }

        Ok(map)
    }

    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    /// Tempo changes in the order they appear on the tempo track
    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    /// Absolute time anchors, ascending by tick
    pub fn time_anchors(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.time_anchors.iter().map(|(&tick, &ms)| (tick, ms))
    }

    /// Tempo anchors, ascending by tick
    pub fn tempo_anchors(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        self.tempo_anchors.iter().map(|(&tick, tempo)| (tick, tempo.get()))
    }

    /// Freeze the map into a converter
    pub fn into_converter(self) -> TickConverter {
        TickConverter::from(self)
    }
}

fn default_tempo() -> NonZeroU32 {
    NonZeroU32::new(DEFAULT_TEMPO).unwrap_or(NonZeroU32::MIN)
}

/// Milliseconds spanned by `ticks` at a constant tempo
pub(crate) fn ticks_to_ms(ticks: u64, micros_per_beat: u32, ticks_per_beat: u16) -> f64 {
    let beats = ticks as f64 / ticks_per_beat as f64;
    micros_per_beat as f64 * beats / 1000.0
}
