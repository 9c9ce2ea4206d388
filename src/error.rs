use std::path::PathBuf;

/// Errors raised while loading a MIDI file or building its timeline
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Failed to read MIDI file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse MIDI file: {0}")]
    Parse(#[from] midly::Error),

    #[error("SMPTE timecode timing is not supported ({fps} fps, {subframes} subframes)")]
    UnsupportedTiming { fps: u8, subframes: u8 },

    #[error("Invalid resolution: ticks per beat must be positive")]
    InvalidResolution,

    #[error("Invalid tempo at tick {tick}: {micros_per_beat} microseconds per beat")]
    InvalidTempo { tick: u64, micros_per_beat: u32 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TimelineError>;
