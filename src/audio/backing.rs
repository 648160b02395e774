//! Generated accompaniment: drums, bass and a picking bed sequenced from
//! a chord timeline.
//!
//! Timing uses two clocks. A coarse worker tick (~25 ms) only decides
//! *when to queue*: on each tick, every step whose event time falls
//! within the lookahead window is converted to delayed sources and
//! handed to the output. The event times themselves form a monotonic
//! `Instant` timeline advanced by exactly one sixteenth per step — never
//! recomputed from "now" — so tick jitter can delay how early a step is
//! queued but never shifts when it sounds.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use rodio::{OutputStreamHandle, Source};

use crate::audio::groove::{BassNote, Groove, Hat, StepPlan, plan_step};
use crate::audio::{AudioEngine, chord, sanitize_bpm, synth};
use crate::config::Config;
use crate::content::{ChordSpan, DEFAULT_TEMPO};

const TICK: Duration = Duration::from_millis(25);
/// Must exceed worst-case tick jitter or steps would slip past unqueued.
const LOOKAHEAD: Duration = Duration::from_millis(120);
/// Loop length used when the timeline is empty or degenerate.
const FALLBACK_STEPS: usize = 32;

/// Everything `start` needs: tempo, the chord timeline, and the
/// free-text style label that selects the groove.
#[derive(Clone, Debug)]
pub struct BackingParams {
    pub bpm: f64,
    pub chords: Vec<ChordSpan>,
    pub style: String,
}

struct Update {
    steps: Vec<u8>,
    groove: Groove,
}

/// The backing loop controller. Degrades to silent no-ops without an
/// engine, like the metronome — but unlike the metronome, `start` while
/// running does not restart the worker: the live loop is retuned in
/// place so rapid UI updates never cause an audible glitch.
pub struct BackingSequencer {
    handle: Option<OutputStreamHandle>,
    volume: f32,
    bpm_bits: Arc<AtomicU64>,
    cancel: Option<Arc<AtomicBool>>,
    ctrl: Option<Sender<Update>>,
}

impl BackingSequencer {
    pub fn new(engine: Option<&AudioEngine>, config: &Config) -> Self {
        let handle = if config.audio_enabled {
            engine.map(AudioEngine::handle)
        } else {
            None
        };
        Self {
            handle,
            volume: config.master_volume,
            bpm_bits: Arc::new(AtomicU64::new((DEFAULT_TEMPO.start as f64).to_bits())),
            cancel: None,
            ctrl: None,
        }
    }

    /// Start the loop, or retune it if already running. The expanded
    /// loop is recomputed and the step cursor reset to 0 either way; the
    /// event clock stays continuous across a retune.
    pub fn start(&mut self, params: BackingParams) {
        let Some(handle) = self.handle.clone() else {
            return;
        };
        if let Some(valid) = sanitize_bpm(params.bpm) {
            self.bpm_bits.store(valid.to_bits(), Ordering::Relaxed);
        }

        let mut update = Some(Update {
            steps: expand_timeline(&params.chords),
            groove: Groove::from_style(&params.style),
        });

        if self.is_running()
            && let Some(ctrl) = &self.ctrl
        {
            match ctrl.send(update.take().expect("update set above")) {
                Ok(()) => return,
                // Worker already gone; fall through and spawn a fresh one.
                Err(send_error) => update = Some(send_error.0),
            }
        }

        self.halt_worker();
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        self.cancel = Some(cancel.clone());
        self.ctrl = Some(tx);

        let bpm_bits = self.bpm_bits.clone();
        let volume = self.volume;
        let initial = update.take().expect("update still set");
        thread::spawn(move || run_loop(handle, volume, bpm_bits, cancel, rx, initial));
    }

    /// Idempotent; safe to call when never started. No step is scheduled
    /// after the cancellation flag is set here.
    pub fn stop(&mut self) {
        self.halt_worker();
    }

    /// Retune subsequent step intervals without touching the loop
    /// position.
    pub fn set_bpm(&mut self, bpm: f64) {
        if let Some(valid) = sanitize_bpm(bpm) {
            self.bpm_bits.store(valid.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| !c.load(Ordering::Relaxed))
    }

    fn halt_worker(&mut self) {
        self.ctrl = None;
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }
    }
}

impl Drop for BackingSequencer {
    fn drop(&mut self) {
        self.halt_worker();
    }
}

/// Flatten a chord timeline into one root pitch class per sixteenth
/// step. Empty or degenerate timelines become a 32-step loop on the
/// default root.
fn expand_timeline(chords: &[ChordSpan]) -> Vec<u8> {
    let mut steps = Vec::new();
    for span in chords {
        let root = chord::root_pitch_class(&span.chord);
        for _ in 0..span.beats_per_bar.saturating_mul(4) {
            steps.push(root);
        }
    }
    if steps.is_empty() {
        steps = vec![chord::root_pitch_class(""); FALLBACK_STEPS];
    }
    steps
}

fn run_loop(
    handle: OutputStreamHandle,
    volume: f32,
    bpm_bits: Arc<AtomicU64>,
    cancel: Arc<AtomicBool>,
    ctrl: Receiver<Update>,
    initial: Update,
) {
    let mut steps = initial.steps;
    let mut groove = initial.groove;
    let mut step_index = 0usize;
    // Prime slightly ahead so the first step lands inside the window.
    let mut next_event = Instant::now() + Duration::from_millis(60);

    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        while let Ok(update) = ctrl.try_recv() {
            steps = update.steps;
            groove = update.groove;
            step_index = 0;
        }

        let bpm = f64::from_bits(bpm_bits.load(Ordering::Relaxed));
        let step_dur = Duration::from_secs_f64(60.0 / bpm / 4.0);
        let now = Instant::now();
        let horizon = now + LOOKAHEAD;

        while next_event <= horizon {
            if cancel.load(Ordering::Relaxed) {
                return;
            }
            let plan = plan_step(groove, step_index);
            schedule_step(
                &handle,
                volume,
                &plan,
                steps[step_index],
                next_event,
                now,
                step_dur,
            );
            next_event += step_dur;
            step_index = (step_index + 1) % steps.len();
        }

        thread::sleep(TICK);
    }
}

/// Turn one step plan into delayed sources on the output. `at` is the
/// step's absolute event time; the delay to it is computed against the
/// same `now` the lookahead used.
fn schedule_step(
    handle: &OutputStreamHandle,
    volume: f32,
    plan: &StepPlan,
    root_pc: u8,
    at: Instant,
    now: Instant,
    step_dur: Duration,
) {
    let delay = at.saturating_duration_since(now);

    if plan.kick {
        emit(handle, synth::kick(volume), delay);
    }
    if plan.snare {
        emit(handle, synth::snare(volume * 0.8), delay);
    }
    if let Some(hat) = plan.hat {
        emit(handle, synth::hat(hat == Hat::Open, volume * 0.5), delay);
    }
    if let Some(bass) = plan.bass {
        let midi = match bass {
            BassNote::Root => chord::bass_midi(root_pc),
            BassNote::Fifth => chord::bass_midi(root_pc) + 7,
        };
        emit(
            handle,
            synth::pluck(chord::midi_to_freq(midi), 0.3, volume),
            delay,
        );
    }
    if let Some(offset) = plan.pick_offset {
        // Picking bed rings two octaves above the bass root.
        let midi = chord::bass_midi(root_pc) + 24;
        emit(
            handle,
            synth::pluck(chord::midi_to_freq(midi), 0.12, volume * 0.4),
            delay + step_dur.mul_f32(offset),
        );
    }
}

fn emit(handle: &OutputStreamHandle, samples: Vec<f32>, delay: Duration) {
    if let Err(e) = handle.play_raw(synth::buffer(samples).delay(delay)) {
        log::warn!("backing voice failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(chord: &str, beats: u32) -> ChordSpan {
        ChordSpan {
            chord: chord.to_string(),
            beats_per_bar: beats,
        }
    }

    #[test]
    fn test_two_bars_expand_to_32_steps() {
        let steps = expand_timeline(&[span("A", 4), span("D", 4)]);
        assert_eq!(steps.len(), 32);
        assert!(steps[..16].iter().all(|&pc| pc == 9));
        assert!(steps[16..].iter().all(|&pc| pc == 2));
    }

    #[test]
    fn test_empty_timeline_falls_back() {
        let steps = expand_timeline(&[]);
        assert_eq!(steps.len(), FALLBACK_STEPS);
        assert!(steps.iter().all(|&pc| pc == 9)); // default root A
    }

    #[test]
    fn test_zero_beat_spans_fall_back() {
        let steps = expand_timeline(&[span("C", 0), span("G", 0)]);
        assert_eq!(steps.len(), FALLBACK_STEPS);
    }

    #[test]
    fn test_odd_meter_expansion() {
        let steps = expand_timeline(&[span("Em", 3), span("C", 4)]);
        assert_eq!(steps.len(), 28);
    }

    #[test]
    fn test_cursor_wraps_back_to_zero() {
        let steps = expand_timeline(&[span("A", 4), span("D", 4)]);
        let mut index = 0usize;
        for _ in 0..steps.len() {
            index = (index + 1) % steps.len();
        }
        assert_eq!(index, 0);
    }

    #[test]
    fn test_degraded_sequencer_is_inert() {
        let mut seq = BackingSequencer::new(None, &Config::default());
        seq.start(BackingParams {
            bpm: 100.0,
            chords: vec![span("A", 4)],
            style: "shuffle".to_string(),
        });
        assert!(!seq.is_running());
        seq.set_bpm(140.0);
        seq.stop();
        seq.stop();
        assert!(!seq.is_running());
    }

    #[test]
    fn test_audio_disabled_config_forces_degraded_mode() {
        let config = Config {
            audio_enabled: false,
            ..Config::default()
        };
        let seq = BackingSequencer::new(None, &config);
        assert!(seq.handle.is_none());
    }
}
