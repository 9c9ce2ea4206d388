//! Tick to millisecond conversion over a finished tempo map
//!
//! Every query looks up the nearest known anchor at or before the tick and
//! extrapolates from it with the tempo governing that interval. Resolved
//! ticks become anchors themselves, so a repeated query is a map hit.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use crate::tempo::{ticks_to_ms, TempoMap, DEFAULT_TEMPO};

#[derive(Debug, Clone)]
pub struct TickConverter {
    ticks_per_beat: u16,
    time_anchors: BTreeMap<u64, f64>,
    tempo_anchors: BTreeMap<u64, NonZeroU32>,
}

impl From<TempoMap> for TickConverter {
    fn from(map: TempoMap) -> Self {
        Self {
            ticks_per_beat: map.ticks_per_beat,
            time_anchors: map.time_anchors,
            tempo_anchors: map.tempo_anchors,
        }
    }
}

impl TickConverter {
    /// Absolute time of `tick` in milliseconds, memoized as a new anchor
    pub fn convert(&mut self, tick: u64) -> f64 {
        let (anchor_tick, anchor_ms) = self.time_anchor(tick);
        if anchor_tick == tick {
            return anchor_ms;
        }

        let ms = anchor_ms + self.elapsed_ms(anchor_tick, tick);
        self.time_anchors.insert(tick, ms);
        ms
    }

    /// Absolute time of `tick` without caching it
    pub fn time_at(&self, tick: u64) -> f64 {
        let (anchor_tick, anchor_ms) = self.time_anchor(tick);
        anchor_ms + self.elapsed_ms(anchor_tick, tick)
    }

    /// Tempo in microseconds per beat governing `tick`
    pub fn tempo_at(&self, tick: u64) -> u32 {
        self.tempo_anchors
            .range(..=tick)
            .next_back()
            .map_or(DEFAULT_TEMPO, |(_, tempo)| tempo.get())
    }

    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    /// Number of known time anchors, tempo-derived and cached
    pub fn anchor_count(&self) -> usize {
        self.time_anchors.len()
    }

    pub fn is_anchored(&self, tick: u64) -> bool {
        self.time_anchors.contains_key(&tick)
    }

    fn time_anchor(&self, tick: u64) -> (u64, f64) {
        // Tick 0 is always anchored, so the fallback is never taken
        self.time_anchors
            .range(..=tick)
            .next_back()
            .map_or((0, 0.0), |(&anchor_tick, &ms)| (anchor_tick, ms))
    }

    fn elapsed_ms(&self, anchor_tick: u64, tick: u64) -> f64 {
        // Time anchors include every tempo change, so one tempo covers the gap
        ticks_to_ms(tick - anchor_tick, self.tempo_at(tick), self.ticks_per_beat)
    }
}
