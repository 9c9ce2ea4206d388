use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::pitch::pitch_name;
use crate::sequence::{Event, EventKind, Track};

/// How a note stop picks among several pending starts of the same note
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairingPolicy {
    /// A new start replaces any pending start of the same note
    #[default]
    LastWins,
    /// A stop closes the most recent start; earlier starts stay pending
    Stack,
    /// A stop closes the oldest pending start
    Fifo,
}

/// A paired note with tick positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEvent {
    pub track: usize,
    pub note: u8,
    pub pitch: String,
    pub velocity: u8,
    pub start_tick: u64,
    pub end_tick: u64,
}

#[derive(Debug, Clone, Copy)]
struct PendingNote {
    velocity: u8,
    start_tick: u64,
}

pub struct NoteExtractor {
    policy: PairingPolicy,
}

impl NoteExtractor {
    pub fn new(policy: PairingPolicy) -> Self {
        Self { policy }
    }

    /// Pair starts and stops on every track, in track order
    pub fn extract(&self, tracks: &[Track]) -> Vec<NoteEvent> {
        let mut notes = Vec::new();

        for (track_idx, track) in tracks.iter().enumerate() {
            self.extract_track(track_idx, track, &mut notes);
        }

        notes
    }

    /// Pair starts and stops on a single track, appending to `notes`
    pub fn extract_track(&self, track_idx: usize, track: &[Event], notes: &mut Vec<NoteEvent>) {
        let mut pending: HashMap<u8, VecDeque<PendingNote>> = HashMap::new();
        let mut current_tick: u64 = 0;
        let mut unmatched = 0usize;

        for event in track {
            current_tick += event.delta as u64;

            match event.kind {
                EventKind::NoteOn { key, velocity } if velocity > 0 => {
                    let starts = pending.entry(key).or_default();
                    if self.policy == PairingPolicy::LastWins {
                        starts.clear();
                    }
                    starts.push_back(PendingNote {
                        velocity,
                        start_tick: current_tick,
                    });
                }
                // Note-on with zero velocity is a note-off
                EventKind::NoteOn { key, .. } | EventKind::NoteOff { key } => {
                    match self.take_pending(&mut pending, key) {
                        Some(start) => notes.push(NoteEvent {
                            track: track_idx,
                            note: key,
                            pitch: pitch_name(key),
                            velocity: start.velocity,
                            start_tick: start.start_tick,
                            end_tick: current_tick,
                        }),
                        None => {
                            log::trace!(
                                "Track {}: note-off for {} at tick {} has no pending note-on",
                                track_idx,
                                key,
                                current_tick
                            );
                            unmatched += 1;
                        }
                    }
                }
                _ => {}
            }
        }

        let dangling: usize = pending.values().map(VecDeque::len).sum();
        if dangling > 0 || unmatched > 0 {
            log::debug!(
                "Track {}: dropped {} note-on(s) without note-off and {} unmatched note-off(s)",
                track_idx,
                dangling,
                unmatched
            );
        }
    }

    fn take_pending(
        &self,
        pending: &mut HashMap<u8, VecDeque<PendingNote>>,
        key: u8,
    ) -> Option<PendingNote> {
        let starts = pending.get_mut(&key)?;
        let start = match self.policy {
            PairingPolicy::LastWins | PairingPolicy::Stack => starts.pop_back(),
            PairingPolicy::Fifo => starts.pop_front(),
        };
        if starts.is_empty() {
            pending.remove(&key);
        }
        start
    }
}

impl Default for NoteExtractor {
    fn default() -> Self {
        Self::new(PairingPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(delta: u32, key: u8, velocity: u8) -> Event {
        Event::new(delta, EventKind::NoteOn { key, velocity })
    }

    fn off(delta: u32, key: u8) -> Event {
        Event::new(delta, EventKind::NoteOff { key })
    }

    fn spans(notes: &[NoteEvent]) -> Vec<(u8, u64, u64)> {
        notes
            .iter()
            .map(|n| (n.note, n.start_tick, n.end_tick))
            .collect()
    }

    #[test]
    fn test_simple_pair() {
        let track = vec![on(0, 60, 100), off(480, 60)];
        let notes = NoteExtractor::default().extract(&[track]);

        assert_eq!(
            notes,
            vec![NoteEvent {
                track: 0,
                note: 60,
                pitch: "C4".to_string(),
                velocity: 100,
                start_tick: 0,
                end_tick: 480,
            }]
        );
    }

    #[test]
    fn test_zero_velocity_note_on_stops_note() {
        let track = vec![on(10, 69, 80), on(90, 69, 0)];
        let notes = NoteExtractor::default().extract(&[track]);

        assert_eq!(spans(&notes), vec![(69, 10, 100)]);
        assert_eq!(notes[0].velocity, 80);
        assert_eq!(notes[0].pitch, "A4");
    }

    #[test]
    fn test_last_wins_overwrites_pending_start() {
        let track = vec![on(0, 64, 90), on(100, 64, 70), off(100, 64)];
        let notes = NoteExtractor::default().extract(&[track]);

        assert_eq!(spans(&notes), vec![(64, 100, 200)]);
        assert_eq!(notes[0].velocity, 70);
    }

    #[test]
    fn test_stack_policy_closes_latest_start_first() {
        let track = vec![on(0, 64, 90), on(100, 64, 70), off(100, 64), off(100, 64)];
        let notes = NoteExtractor::new(PairingPolicy::Stack).extract(&[track]);

        assert_eq!(spans(&notes), vec![(64, 100, 200), (64, 0, 300)]);
    }

    #[test]
    fn test_fifo_policy_closes_oldest_start_first() {
        let track = vec![on(0, 64, 90), on(100, 64, 70), off(100, 64), off(100, 64)];
        let notes = NoteExtractor::new(PairingPolicy::Fifo).extract(&[track]);

        assert_eq!(spans(&notes), vec![(64, 0, 200), (64, 100, 300)]);
        assert_eq!(notes[0].velocity, 90);
    }

    #[test]
    fn test_unmatched_note_off_is_discarded() {
        let track = vec![off(0, 60), on(10, 62, 50), off(10, 62), off(10, 62)];
        let notes = NoteExtractor::default().extract(&[track]);

        assert_eq!(spans(&notes), vec![(62, 10, 20)]);
    }

    #[test]
    fn test_dangling_note_on_is_dropped() {
        let track = vec![on(0, 60, 100), on(0, 62, 100), off(240, 62)];
        let notes = NoteExtractor::default().extract(&[track]);

        assert_eq!(spans(&notes), vec![(62, 0, 240)]);
    }

    #[test]
    fn test_tracks_have_independent_state() {
        let first = vec![on(0, 60, 100), Event::new(1000, EventKind::Other)];
        let second = vec![Event::new(50, EventKind::Other), off(50, 60)];
        let notes = NoteExtractor::default().extract(&[first, second]);

        // The note-off on track 1 does not close track 0's note
        assert!(notes.is_empty());
    }

    #[test]
    fn test_track_index_and_extraction_order() {
        let first = vec![on(0, 60, 100), on(0, 64, 100), off(100, 64), off(0, 60)];
        let second = vec![on(0, 48, 90), off(50, 48)];
        let notes = NoteExtractor::default().extract(&[first, second]);

        let order: Vec<(usize, u8)> = notes.iter().map(|n| (n.track, n.note)).collect();
        assert_eq!(order, vec![(0, 64), (0, 60), (1, 48)]);
    }
}
