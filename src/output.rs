use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn build_output(&self, timeline: &Timeline) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.build_output_json(timeline),
            OutputFormat::Text => Ok(self.build_output_text(timeline)),
        }
    }

    /// Build pretty JSON of the whole timeline
    pub fn build_output_json(&self, timeline: &Timeline) -> Result<String> {
        Ok(serde_json::to_string_pretty(timeline)?)
    }

    /// Build a line-per-event report: tempo changes first, then notes
    pub fn build_output_text(&self, timeline: &Timeline) -> String {
        let mut output = Vec::new();

        for change in &timeline.tempo_changes {
            output.push(format!(
                "Tempo Change Event: Tempo={:.2} BPM  Time={} ms",
                change.bpm(),
                change.time_ms
            ));
        }

        for entry in &timeline.entries {
            let mut line = format!(
                "  Note: Track={}  Note={}  Pitch={}  Velocity={}  Duration={}ms  Start={}ms",
                entry.track,
                entry.note,
                entry.pitch,
                entry.velocity,
                entry.duration_ms,
                entry.start_ms
            );
            if entry.warning.is_some() {
                line.push_str("  [negative duration]");
            }
            output.push(line);
        }

        output.join("\n")
    }
}
