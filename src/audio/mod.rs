pub mod backing;
pub mod chord;
pub mod engine;
pub mod groove;
pub mod metronome;
pub mod player;
pub mod synth;

use thiserror::Error;

pub use backing::{BackingParams, BackingSequencer};
pub use engine::AudioEngine;
pub use metronome::Metronome;
pub use player::{PlayerStatus, TrackPlayer};

use crate::content::MIN_BPM;

/// Upper clamp for any tempo input; beyond this the click interval floor
/// takes over anyway.
pub(crate) const MAX_BPM: u32 = 999;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available: {0}")]
    Device(#[from] rodio::StreamError),
    #[error("playback failed: {0}")]
    Playback(#[from] rodio::PlayError),
    #[error("could not decode track: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("could not open track: {0}")]
    Io(#[from] std::io::Error),
}

/// Validate a tempo coming from the UI. Non-finite values are rejected
/// outright (a NaN interval would stall the scheduling loop); finite
/// values clamp into the supported range.
pub(crate) fn sanitize_bpm(bpm: f64) -> Option<f64> {
    if !bpm.is_finite() {
        return None;
    }
    Some(bpm.clamp(MIN_BPM as f64, MAX_BPM as f64))
}
