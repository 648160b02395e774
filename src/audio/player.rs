use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rodio::{Decoder, OutputStreamHandle, Sink, Source};

use crate::audio::{AudioEngine, AudioError};
use crate::config::Config;
use crate::content::Track;

/// Read-only snapshot for the UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerStatus {
    pub track_id: Option<String>,
    pub is_playing: bool,
    pub is_loop: bool,
}

/// Selector for pre-recorded tracks. Holds at most one sink; toggling
/// the active track pauses and resumes it, toggling another replaces it.
/// Tracks without a playable url, decode failures and rejected playback
/// all degrade to a non-playing state.
pub struct TrackPlayer {
    handle: Option<OutputStreamHandle>,
    volume: f32,
    sink: Option<Sink>,
    current: Option<String>,
    looping: Arc<AtomicBool>,
}

impl TrackPlayer {
    pub fn new(engine: Option<&AudioEngine>, config: &Config) -> Self {
        let handle = if config.audio_enabled {
            engine.map(AudioEngine::handle)
        } else {
            None
        };
        Self {
            handle,
            volume: config.master_volume,
            sink: None,
            current: None,
            looping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Play the track, pause it if it is already the one playing, resume
    /// it if paused, or switch sources if a different track is given.
    pub fn toggle(&mut self, track: &Track) {
        let Some(handle) = self.handle.clone() else {
            return;
        };

        if self.current.as_deref() == Some(track.id.as_str())
            && let Some(sink) = &self.sink
            && !sink.empty()
        {
            if sink.is_paused() {
                sink.play();
            } else {
                sink.pause();
            }
            return;
        }

        let Some(url) = &track.url else {
            log::debug!("track {} has no playable url", track.id);
            return;
        };

        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.current = Some(track.id.clone());
        match self.open_sink(&handle, url) {
            Ok(sink) => self.sink = Some(sink),
            Err(e) => {
                // The platform refused or the file is unusable; surface
                // only as "not playing".
                log::warn!("cannot play track {}: {e}", track.id);
            }
        }
    }

    /// Pause and rewind, keeping the last-selected track id for display.
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// Live loop toggle: read by the source when it reaches the end of
    /// the decoded buffer, so it applies mid-play.
    pub fn set_loop(&mut self, on: bool) {
        self.looping.store(on, Ordering::Relaxed);
    }

    pub fn status(&self) -> PlayerStatus {
        let is_playing = self
            .sink
            .as_ref()
            .is_some_and(|sink| !sink.is_paused() && !sink.empty());
        PlayerStatus {
            track_id: self.current.clone(),
            is_playing,
            is_loop: self.looping.load(Ordering::Relaxed),
        }
    }

    fn open_sink(&self, handle: &OutputStreamHandle, url: &str) -> Result<Sink, AudioError> {
        let file = File::open(url)?;
        let decoder = Decoder::new(BufReader::new(file))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples().collect();

        let sink = Sink::try_new(handle)?;
        sink.set_volume(self.volume);
        sink.append(ToggleLoopSource {
            samples,
            position: 0,
            channels,
            sample_rate,
            looping: self.looping.clone(),
        });
        Ok(sink)
    }
}

/// A decoded track that restarts itself while the shared loop flag is
/// set and ends normally otherwise.
struct ToggleLoopSource {
    samples: Vec<f32>,
    position: usize,
    channels: u16,
    sample_rate: u32,
    looping: Arc<AtomicBool>,
}

impl Iterator for ToggleLoopSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.position >= self.samples.len() {
            if self.samples.is_empty() || !self.looping.load(Ordering::Relaxed) {
                return None;
            }
            self.position = 0;
        }
        let sample = self.samples[self.position];
        self.position += 1;
        Some(sample)
    }
}

impl Source for ToggleLoopSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, url: Option<&str>) -> Track {
        Track {
            id: id.to_string(),
            title: id.to_string(),
            url: url.map(str::to_string),
        }
    }

    fn silent_player() -> TrackPlayer {
        TrackPlayer::new(None, &Config::default())
    }

    #[test]
    fn test_degraded_player_is_inert() {
        let mut player = silent_player();
        player.toggle(&track("t1", Some("/nonexistent.mp3")));
        let status = player.status();
        assert_eq!(status.track_id, None);
        assert!(!status.is_playing);
    }

    #[test]
    fn test_stop_without_play_is_safe() {
        let mut player = silent_player();
        player.stop();
        player.stop();
        assert!(!player.status().is_playing);
    }

    #[test]
    fn test_set_loop_reflected_in_status() {
        let mut player = silent_player();
        assert!(!player.status().is_loop);
        player.set_loop(true);
        assert!(player.status().is_loop);
        player.set_loop(false);
        assert!(!player.status().is_loop);
    }

    #[test]
    fn test_loop_source_wraps_while_flag_set() {
        let looping = Arc::new(AtomicBool::new(true));
        let mut source = ToggleLoopSource {
            samples: vec![0.1, 0.2, 0.3],
            position: 0,
            channels: 1,
            sample_rate: 44_100,
            looping: looping.clone(),
        };
        let first_pass: Vec<f32> = source.by_ref().take(3).collect();
        assert_eq!(first_pass, vec![0.1, 0.2, 0.3]);
        // Wraps around while looping...
        assert_eq!(source.next(), Some(0.1));
        assert_eq!(source.next(), Some(0.2));
        // ...and ends at the next boundary once the flag clears.
        looping.store(false, Ordering::Relaxed);
        assert_eq!(source.next(), Some(0.3));
        assert_eq!(source.next(), None);
    }

    #[test]
    fn test_loop_source_ends_without_flag() {
        let mut source = ToggleLoopSource {
            samples: vec![0.5, -0.5],
            position: 0,
            channels: 1,
            sample_rate: 44_100,
            looping: Arc::new(AtomicBool::new(false)),
        };
        assert_eq!(source.by_ref().count(), 2);
        assert_eq!(source.next(), None);
    }

    #[test]
    fn test_empty_loop_source_never_spins() {
        let mut source = ToggleLoopSource {
            samples: Vec::new(),
            position: 0,
            channels: 1,
            sample_rate: 44_100,
            looping: Arc::new(AtomicBool::new(true)),
        };
        assert_eq!(source.next(), None);
    }
}
