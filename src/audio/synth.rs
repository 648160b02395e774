//! Procedural one-shot voices. Everything here renders a short mono
//! buffer at a fixed sample rate: sine bursts for clicks and kick, noise
//! bursts for snare and hats, oscillator envelopes for bass and picking.
//! No sample playback.

use std::f32::consts::TAU;

use rodio::buffer::SamplesBuffer;

pub const SAMPLE_RATE: u32 = 44_100;

/// Deterministic xorshift noise source. Seeded per buffer so repeated
/// renders of the same voice are identical.
struct NoiseRng {
    state: u64,
}

impl NoiseRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next_f32(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        // Map into -1.0..1.0
        (x as f32 / u64::MAX as f32) * 2.0 - 1.0
    }
}

fn frames(duration: f32) -> usize {
    (SAMPLE_RATE as f32 * duration) as usize
}

/// Short attack ramp to keep one-shots from starting with a pop.
fn attack(t: f32) -> f32 {
    (t / 0.002).min(1.0)
}

/// The metronome click: a fixed-pitch sine burst with exponential decay,
/// about 40 ms long.
pub fn click(gain: f32) -> Vec<f32> {
    let n = frames(0.04);
    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f32 / SAMPLE_RATE as f32;
        let envelope = attack(t) * (-t * 90.0).exp();
        samples.push((t * 1000.0 * TAU).sin() * envelope * gain);
    }
    samples
}

/// Kick drum: a sine sweep from 120 Hz down to 50 Hz under a fast decay.
pub fn kick(gain: f32) -> Vec<f32> {
    let dur = 0.12;
    let n = frames(dur);
    let mut samples = Vec::with_capacity(n);
    let mut phase = 0.0f32;
    for i in 0..n {
        let t = i as f32 / SAMPLE_RATE as f32;
        let freq = 120.0 - (120.0 - 50.0) * (t / dur);
        phase += freq * TAU / SAMPLE_RATE as f32;
        let envelope = attack(t) * (-t * 30.0).exp();
        samples.push(phase.sin() * envelope * gain);
    }
    samples
}

/// Snare: white noise shaped by a fast decay, with a low tonal body mixed
/// underneath.
pub fn snare(gain: f32) -> Vec<f32> {
    let n = frames(0.15);
    let mut rng = NoiseRng::new(0x5eed_5a7e);
    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f32 / SAMPLE_RATE as f32;
        let envelope = attack(t) * (-t * 28.0).exp();
        let noise = rng.next_f32() * 0.7;
        let body = (t * 185.0 * TAU).sin() * 0.3;
        samples.push((noise + body) * envelope * gain);
    }
    samples
}

/// Hi-hat: noise high-passed by first-differencing. A closed hat decays
/// in ~35 ms; the open variant rings out for a quarter second.
pub fn hat(open: bool, gain: f32) -> Vec<f32> {
    let (dur, decay) = if open { (0.25, 14.0) } else { (0.035, 120.0) };
    let n = frames(dur);
    let mut rng = NoiseRng::new(0x4a77_ba11);
    let mut samples = Vec::with_capacity(n);
    let mut prev = 0.0f32;
    for i in 0..n {
        let t = i as f32 / SAMPLE_RATE as f32;
        let raw = rng.next_f32();
        let high_passed = raw - prev;
        prev = raw;
        let envelope = attack(t) * (-t * decay).exp();
        samples.push(high_passed * envelope * gain * 0.6);
    }
    samples
}

/// Plucked tone for bass notes and the picking bed: fundamental plus a
/// quieter second harmonic under an exponential decay.
pub fn pluck(freq: f32, duration: f32, gain: f32) -> Vec<f32> {
    let n = frames(duration);
    let decay = 4.0 / duration.max(0.01);
    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f32 / SAMPLE_RATE as f32;
        let envelope = attack(t) * (-t * decay).exp();
        let tone = (t * freq * TAU).sin() + (t * freq * 2.0 * TAU).sin() * 0.35;
        samples.push(tone * envelope * gain * 0.7);
    }
    samples
}

/// Wrap a rendered buffer as a mono rodio source.
pub fn buffer(samples: Vec<f32>) -> SamplesBuffer<f32> {
    SamplesBuffer::new(1, SAMPLE_RATE, samples)
}
