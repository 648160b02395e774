use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use rodio::OutputStreamHandle;

use crate::audio::{AudioEngine, sanitize_bpm, synth};
use crate::config::Config;
use crate::content::DEFAULT_TEMPO;

/// The click generator. One worker thread re-arms itself after each
/// click; the interval is re-read from the shared tempo every time, so a
/// `set_bpm` takes effect on the next click without touching one already
/// in flight.
///
/// Construct with `None` (or `audio_enabled = false`) for the degraded
/// mode: every operation is a safe no-op and `is_running()` stays false.
pub struct Metronome {
    handle: Option<OutputStreamHandle>,
    volume: f32,
    bpm: Arc<AtomicU32>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Metronome {
    pub fn new(engine: Option<&AudioEngine>, config: &Config) -> Self {
        let handle = if config.audio_enabled {
            engine.map(AudioEngine::handle)
        } else {
            None
        };
        Self {
            handle,
            volume: config.master_volume,
            bpm: Arc::new(AtomicU32::new(DEFAULT_TEMPO.start)),
            cancel: None,
        }
    }

    /// Start clicking, optionally at a new tempo. Calling this while
    /// already running stops the previous loop first — there is never
    /// more than one click loop per instance.
    pub fn start(&mut self, bpm: Option<f64>) {
        if let Some(requested) = bpm
            && let Some(valid) = sanitize_bpm(requested)
        {
            self.bpm.store(valid.round() as u32, Ordering::Relaxed);
        }
        let Some(handle) = self.handle.clone() else {
            return;
        };

        self.halt_worker();
        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Some(cancel.clone());

        let bpm = self.bpm.clone();
        let click = synth::click(self.volume);
        thread::spawn(move || {
            loop {
                // Checked both before sounding and before re-arming: a
                // stopped worker emits nothing further.
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(e) = handle.play_raw(synth::buffer(click.clone())) {
                    log::warn!("metronome click failed: {e}");
                }
                let interval = click_interval_ms(bpm.load(Ordering::Relaxed));
                thread::sleep(Duration::from_millis(interval));
            }
        });
    }

    /// Idempotent; safe to call when never started. The cancellation
    /// flag is set before returning, so no further clicks are scheduled.
    pub fn stop(&mut self) {
        self.halt_worker();
    }

    /// Retune the next interval. The click currently in flight keeps its
    /// old timing — up to one interval of slack, by design of the
    /// self-rearming loop.
    pub fn set_bpm(&mut self, bpm: f64) {
        if let Some(valid) = sanitize_bpm(bpm) {
            self.bpm.store(valid.round() as u32, Ordering::Relaxed);
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| !c.load(Ordering::Relaxed))
    }

    pub fn bpm(&self) -> u32 {
        self.bpm.load(Ordering::Relaxed)
    }

    fn halt_worker(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.halt_worker();
    }
}

/// Milliseconds between clicks, floored at 10 ms so a runaway tempo can
/// never busy-spin the worker.
fn click_interval_ms(bpm: u32) -> u64 {
    ((60_000.0 / bpm.max(1) as f64).round() as u64).max(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_metronome() -> Metronome {
        Metronome::new(None, &Config::default())
    }

    #[test]
    fn test_interval_math() {
        assert_eq!(click_interval_ms(120), 500);
        assert_eq!(click_interval_ms(60), 1000);
        assert_eq!(click_interval_ms(90), 667);
    }

    #[test]
    fn test_interval_floor() {
        assert_eq!(click_interval_ms(999), 60);
        // Degenerate tempos bottom out at the 10ms floor instead of
        // flooding the scheduler.
        assert_eq!(click_interval_ms(u32::MAX), 10);
    }

    #[test]
    fn test_degraded_start_is_a_noop() {
        let mut m = silent_metronome();
        m.start(Some(120.0));
        assert!(!m.is_running());
        // Tempo is still tracked so the UI can render it.
        assert_eq!(m.bpm(), 120);
    }

    #[test]
    fn test_stop_without_start_is_safe() {
        let mut m = silent_metronome();
        m.stop();
        m.stop();
        assert!(!m.is_running());
    }

    #[test]
    fn test_set_bpm_clamps_and_rounds() {
        let mut m = silent_metronome();
        m.set_bpm(80.6);
        assert_eq!(m.bpm(), 81);
        m.set_bpm(5.0);
        assert_eq!(m.bpm(), 30);
    }

    #[test]
    fn test_invalid_bpm_keeps_current_tempo() {
        let mut m = silent_metronome();
        m.set_bpm(100.0);
        m.set_bpm(f64::NAN);
        m.start(Some(f64::INFINITY));
        assert_eq!(m.bpm(), 100);
    }

    #[test]
    fn test_default_tempo_matches_shared_constant() {
        let m = silent_metronome();
        assert_eq!(m.bpm(), DEFAULT_TEMPO.start);
    }
}
