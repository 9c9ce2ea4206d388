//! MIDI to absolute-time timeline converter
//!
//! This library turns a Standard MIDI File into a list of notes with
//! millisecond start and end times. Ticks are mapped to wall-clock time
//! through a tempo map built from the file's first track, so tempo changes
//! anywhere in the piece are honoured.
//!
//! # Examples
//!
//! ```no_run
//! use midi_timeline::{Sequence, Timeline, TimelineOptions};
//! use std::path::Path;
//!
//! let sequence = Sequence::from_file(Path::new("song.mid")).unwrap();
//! let timeline = Timeline::build(&sequence, &TimelineOptions::default()).unwrap();
//!
//! for entry in &timeline.entries {
//!     println!("{} starts at {} ms", entry.pitch, entry.start_ms);
//! }
//! ```
//!
//! # Main Components
//!
//! - **Sequence**: delta-timed events per track, loaded with `midly`
//! - **TempoMap**: tempo changes and their absolute times
//! - **TickConverter**: memoizing tick to millisecond conversion
//! - **NoteExtractor**: note-on/note-off pairing
//! - **Timeline**: the assembled, time-converted note list

pub mod convert;
pub mod error;
pub mod notes;
pub mod output;
pub mod pitch;
pub mod sequence;
pub mod tempo;
pub mod timeline;

pub use convert::TickConverter;
pub use error::{Result, TimelineError};
pub use notes::{NoteEvent, NoteExtractor, PairingPolicy};
pub use output::{OutputFormat, OutputFormatter};
pub use pitch::pitch_name;
pub use sequence::{Event, EventKind, Sequence, Track};
pub use tempo::{TempoChange, TempoMap, DEFAULT_TEMPO};
pub use timeline::{IntegrityWarning, Timeline, TimelineEntry, TimelineOptions};
