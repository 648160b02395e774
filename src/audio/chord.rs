//! Chord symbol handling for the backing loop. Only the root matters
//! here: the generated bass and picking bed play roots and fifths, so a
//! symbol's quality tail (m, 7, maj7, sus4, ...) is parsed past and
//! ignored.

/// Pitch class of A, the fallback root for unparseable symbols.
const DEFAULT_ROOT: u8 = 9;

/// Lowest MIDI note of the bass register (C2). Roots land in one fixed
/// octave: C2..B2.
const BASS_OCTAVE_BASE: u8 = 36;

/// Parse a chord symbol into its root pitch class (0 = C .. 11 = B).
/// A leading note letter with an optional `#`/`b` accidental decides the
/// root; anything after it is ignored. Unrecognized input defaults to A.
pub fn root_pitch_class(symbol: &str) -> u8 {
    let mut chars = symbol.trim().chars();
    let base: i32 = match chars.next() {
        Some('C' | 'c') => 0,
        Some('D' | 'd') => 2,
        Some('E' | 'e') => 4,
        Some('F' | 'f') => 5,
        Some('G' | 'g') => 7,
        Some('A' | 'a') => 9,
        Some('B' | 'b') => 11,
        _ => return DEFAULT_ROOT,
    };
    let accidental = match chars.next() {
        Some('#') => 1,
        Some('b') => -1,
        _ => 0,
    };
    (base + accidental).rem_euclid(12) as u8
}

/// MIDI note of the root in the fixed bass octave.
pub fn bass_midi(pitch_class: u8) -> u8 {
    BASS_OCTAVE_BASE + pitch_class % 12
}

/// Equal-tempered frequency for a MIDI note, A4 = 440 Hz.
pub fn midi_to_freq(midi: u8) -> f32 {
    440.0 * 2f32.powf((midi as f32 - 69.0) / 12.0)
}
