use serde::{Deserialize, Serialize};

/// Fallback tempo range used whenever a drill ships without one.
/// Shared by every component that reads tempo config so the numbers
/// exist in exactly one place.
pub const DEFAULT_TEMPO: TempoConfig = TempoConfig {
    start: 60,
    target: 120,
    step: 5,
};

/// Hard floor for any practice tempo, in BPM.
pub const MIN_BPM: u32 = 30;

/// Per-drill tempo range supplied by the content catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoConfig {
    pub start: u32,
    pub target: u32,
    pub step: u32,
}

impl TempoConfig {
    /// Repair degenerate catalog data: zero start/step fall back to the
    /// defaults, a target below start collapses to start.
    pub fn sanitized(self) -> TempoConfig {
        let start = if self.start == 0 {
            DEFAULT_TEMPO.start
        } else {
            self.start
        };
        let step = if self.step == 0 {
            DEFAULT_TEMPO.step
        } else {
            self.step
        };
        TempoConfig {
            start,
            target: self.target.max(start),
            step,
        }
    }

    /// Lowest reachable BPM for this range.
    pub fn floor(&self) -> u32 {
        self.start.max(MIN_BPM)
    }

    /// Highest reachable BPM for this range.
    pub fn ceiling(&self) -> u32 {
        self.target.max(self.start)
    }
}

impl Default for TempoConfig {
    fn default() -> Self {
        DEFAULT_TEMPO
    }
}

/// A single practice exercise as described by the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Drill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tempo: Option<TempoConfig>,
}

impl Drill {
    pub fn tempo(&self) -> TempoConfig {
        self.tempo.unwrap_or(DEFAULT_TEMPO).sanitized()
    }
}

/// One chord held for a bar of the backing loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSpan {
    pub chord: String,
    pub beats_per_bar: u32,
}

/// A song entry: a chord timeline plus a free-text style label, and
/// optionally a pre-recorded track to play instead of the generated loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub chords: Vec<ChordSpan>,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub track: Option<Track>,
}

/// A pre-recorded audio track. `url` is a local file path in this
/// rendition; `None` means the track cannot be played.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tempo_bounds() {
        assert_eq!(DEFAULT_TEMPO.floor(), 60);
        assert_eq!(DEFAULT_TEMPO.ceiling(), 120);
    }

    #[test]
    fn test_floor_respects_min_bpm() {
        let low = TempoConfig {
            start: 20,
            target: 80,
            step: 5,
        };
        assert_eq!(low.floor(), MIN_BPM);
    }

    #[test]
    fn test_ceiling_never_below_start() {
        let inverted = TempoConfig {
            start: 100,
            target: 80,
            step: 5,
        };
        assert_eq!(inverted.ceiling(), 100);
    }

    #[test]
    fn test_sanitized_repairs_zero_fields() {
        let broken = TempoConfig {
            start: 0,
            target: 0,
            step: 0,
        };
        let fixed = broken.sanitized();
        assert_eq!(fixed.start, DEFAULT_TEMPO.start);
        assert_eq!(fixed.step, DEFAULT_TEMPO.step);
        assert!(fixed.target >= fixed.start);
    }

    #[test]
    fn test_drill_without_tempo_uses_default() {
        let drill = Drill {
            id: "alt-picking-1".to_string(),
            name: "Alternate picking".to_string(),
            tempo: None,
        };
        assert_eq!(drill.tempo(), DEFAULT_TEMPO);
    }
}
