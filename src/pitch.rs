const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert a MIDI note number to scientific pitch notation (e.g., "C4", "G#5")
pub fn pitch_name(note: u8) -> String {
    let name = NOTE_NAMES[(note % 12) as usize];
    let octave = (note / 12) as i32 - 1;

    format!("{}{}", name, octave)
}
