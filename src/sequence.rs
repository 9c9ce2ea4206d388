use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::path::Path;

use crate::error::{Result, TimelineError};

/// What a track event means for the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Set tempo, in microseconds per beat
    Tempo(u32),
    /// Note start; a zero velocity acts as a note stop
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8 },
    Other,
}

/// A track event with its delta time in ticks since the previous event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub delta: u32,
    pub kind: EventKind,
}

impl Event {
    pub fn new(delta: u32, kind: EventKind) -> Self {
        Self { delta, kind }
    }
}

pub type Track = Vec<Event>;

/// A decoded MIDI file: its resolution and its tracks of delta-timed events
#[derive(Debug, Clone)]
pub struct Sequence {
    ticks_per_beat: u16,
    tracks: Vec<Track>,
    single_track: bool,
}

impl Sequence {
    /// Build a multi-track sequence; the first track carries the tempo map
    pub fn new(ticks_per_beat: u16, tracks: Vec<Track>) -> Result<Self> {
        if ticks_per_beat == 0 {
            return Err(TimelineError::InvalidResolution);
        }

        Ok(Self {
            ticks_per_beat,
            tracks,
            single_track: false,
        })
    }

    /// Build a format-0 sequence whose only track holds both tempo and notes
    pub fn single_track(ticks_per_beat: u16, track: Track) -> Result<Self> {
        let mut sequence = Self::new(ticks_per_beat, vec![track])?;
        sequence.single_track = true;
        Ok(sequence)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| TimelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&data)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data)?;
        Self::from_smf(&smf)
    }

    pub fn from_smf(smf: &Smf) -> Result<Self> {
        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(fps, subframes) => {
                return Err(TimelineError::UnsupportedTiming {
                    fps: fps.as_int(),
                    subframes,
                })
            }
        };

        let tracks: Vec<Track> = smf
            .tracks
            .iter()
            .map(|track| {
                track
                    .iter()
                    .map(|event| Event::new(event.delta.as_int(), event_kind(&event.kind)))
                    .collect()
            })
            .collect();

        log::debug!(
            "Loaded {} track(s) at {} ticks per beat",
            tracks.len(),
            ticks_per_beat
        );

        match smf.header.format {
            Format::SingleTrack if tracks.len() == 1 => {
                let track = tracks.into_iter().next().unwrap_or_default();
                Self::single_track(ticks_per_beat, track)
            }
            _ => Self::new(ticks_per_beat, tracks),
        }
    }

    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// The track carrying tempo changes (empty for a file without tracks)
    pub fn tempo_track(&self) -> &[Event] {
        self.tracks.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// The tracks scanned for notes: every track after the tempo track, or
    /// the only track of a format-0 file
    pub fn note_tracks(&self) -> &[Track] {
        if self.single_track {
            &self.tracks
        } else {
            self.tracks.get(1..).unwrap_or(&[])
        }
    }
}

fn event_kind(kind: &TrackEventKind) -> EventKind {
    match *kind {
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => EventKind::Tempo(tempo.as_int()),
        TrackEventKind::Midi { message, .. } => match message {
            MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
                key: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, .. } => EventKind::NoteOff { key: key.as_int() },
            _ => EventKind::Other,
        },
        _ => EventKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Fps, Header, TrackEvent};

    fn event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind,
        }
    }

    fn note_on(key: u8, vel: u8) -> TrackEventKind<'static> {
        TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        }
    }

    fn note_off(key: u8) -> TrackEventKind<'static> {
        TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(64),
            },
        }
    }

    fn end_of_track() -> TrackEvent<'static> {
        event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack))
    }

    fn write(smf: &Smf) -> Vec<u8> {
        let mut bytes = Vec::new();
        smf.write_std(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_parse_multi_track_file() {
        let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(u15::new(480))));
        smf.tracks.push(vec![
            event(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(500_000)))),
            end_of_track(),
        ]);
        smf.tracks.push(vec![
            event(0, note_on(60, 100)),
            event(480, note_off(60)),
            event(0, note_on(62, 0)),
            end_of_track(),
        ]);

        let sequence = Sequence::parse(&write(&smf)).unwrap();

        assert_eq!(sequence.ticks_per_beat(), 480);
        assert_eq!(sequence.tracks().len(), 2);
        assert_eq!(sequence.tempo_track()[0].kind, EventKind::Tempo(500_000));
        assert_eq!(sequence.note_tracks().len(), 1);

        let notes = &sequence.note_tracks()[0];
        assert_eq!(notes[0], Event::new(0, EventKind::NoteOn { key: 60, velocity: 100 }));
        assert_eq!(notes[1], Event::new(480, EventKind::NoteOff { key: 60 }));
        assert_eq!(notes[2].kind, EventKind::NoteOn { key: 62, velocity: 0 });
        assert_eq!(notes[3].kind, EventKind::Other);
    }

    #[test]
    fn test_single_track_file_is_tempo_and_note_track() {
        let mut smf = Smf::new(Header::new(Format::SingleTrack, Timing::Metrical(u15::new(96))));
        smf.tracks.push(vec![
            event(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(400_000)))),
            event(0, note_on(64, 90)),
            event(96, note_off(64)),
            end_of_track(),
        ]);

        let sequence = Sequence::parse(&write(&smf)).unwrap();

        assert_eq!(sequence.tempo_track().len(), 4);
        assert_eq!(sequence.note_tracks().len(), 1);
    }

    #[test]
    fn test_timecode_timing_rejected() {
        let smf = Smf::new(Header::new(Format::Parallel, Timing::Timecode(Fps::Fps25, 40)));

        let err = Sequence::from_smf(&smf).unwrap_err();
        assert!(matches!(
            err,
            TimelineError::UnsupportedTiming { fps: 25, subframes: 40 }
        ));
    }

    #[test]
    fn test_zero_resolution_rejected() {
        assert!(matches!(
            Sequence::new(0, Vec::new()),
            Err(TimelineError::InvalidResolution)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Sequence::from_file(Path::new("/nonexistent/song.mid")).unwrap_err();
        assert!(matches!(err, TimelineError::Io { .. }));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = Sequence::parse(b"not a midi file").unwrap_err();
        assert!(matches!(err, TimelineError::Parse(_)));
    }

    #[test]
    fn test_empty_sequence_has_no_tracks() {
        let sequence = Sequence::new(480, Vec::new()).unwrap();
        assert!(sequence.tempo_track().is_empty());
        assert!(sequence.note_tracks().is_empty());
    }
}
