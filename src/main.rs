use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};

use midi_timeline::{OutputFormat, OutputFormatter, PairingPolicy, Sequence, Timeline, TimelineOptions};

#[derive(Parser, Debug)]
#[command(name = "midi-timeline")]
#[command(about = "Convert MIDI files to a millisecond note timeline", long_about = None)]
struct Args {
    /// Path to the MIDI file (default: uses first .mid file in current directory)
    #[arg(short, long)]
    midi: Option<PathBuf>,

    /// Output file path (default: `<midi-name>.json` or `<midi-name>.txt`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of file
    #[arg(long)]
    stdout: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: FormatArg,

    /// How a note-off is matched when the same note was started several times
    #[arg(short, long, value_enum, default_value = "last-wins")]
    pairing: PairingArg,

    /// Suppress informational messages (only errors)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show debug messages
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Json,
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PairingArg {
    LastWins,
    Stack,
    Fifo,
}

impl From<PairingArg> for PairingPolicy {
    fn from(arg: PairingArg) -> Self {
        match arg {
            PairingArg::LastWins => PairingPolicy::LastWins,
            PairingArg::Stack => PairingPolicy::Stack,
            PairingArg::Fifo => PairingPolicy::Fifo,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    // Find MIDI file
    let midi_path = if let Some(path) = args.midi {
        if !path.exists() {
            anyhow::bail!("MIDI file not found: {}", path.display());
        }
        path
    } else {
        find_first_midi_file()?
    };

    let format = OutputFormat::from(args.format);
    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&midi_path, format));

    log::info!("Processing MIDI file: {}", midi_path.display());

    let sequence = Sequence::from_file(&midi_path)?;

    let options = TimelineOptions {
        pairing: args.pairing.into(),
    };
    let timeline = Timeline::build(&sequence, &options)
        .with_context(|| format!("Failed to build timeline for {}", midi_path.display()))?;

    if timeline.has_warnings() {
        log::warn!("Timeline contains notes with negative duration");
    }

    let output = OutputFormatter::new(format).build_output(&timeline)?;

    if args.stdout {
        println!("{}", output);
    } else {
        fs::write(&output_path, format!("{}\n", output))
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        log::info!(
            "{} note(s) saved to {}",
            timeline.entries.len(),
            output_path.display()
        );
    }

    Ok(())
}

fn init_logging(args: &Args) {
    let level = if args.quiet {
        LevelFilter::Error
    } else if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .init();
}

fn default_output_path(midi_path: &Path, format: OutputFormat) -> PathBuf {
    let stem = midi_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    PathBuf::from(format!("{}.{}", stem, format.extension()))
}

fn find_first_midi_file() -> Result<PathBuf> {
    let entries = fs::read_dir(".").context("Failed to read current directory")?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if path.extension().and_then(|s| s.to_str()) == Some("mid") {
            return Ok(path);
        }
    }

    anyhow::bail!("No MIDI files found in current directory")
}
