//! Tiny procedural synthesizer
//!
//! Renders one mono buffer per sound from a handful of parameters:
//! oscillator shape, piecewise-linear envelope, frequency slides, a one-shot
//! pitch jump, an optional repeat cycle, noise and a 7 Hz tremolo.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fixed output attenuation applied to every sample
pub const GLOBAL_ATTENUATION: f64 = 0.3;
/// Tremolo rate
pub const TREMOLO_HZ: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Oscillator value for phase `t` (in cycles)
    pub fn sample(self, t: f64) -> f64 {
        use std::f64::consts::TAU;
        match self {
            Waveform::Sine => (t * TAU).sin(),
            Waveform::Square => {
                let s = (t * TAU).sin();
                if s == 0.0 { 0.0 } else { s.signum() }
            }
            Waveform::Sawtooth => 2.0 * (t % 1.0) - 1.0,
            Waveform::Triangle => (1.0 - (t * 2.0 % 2.0)).abs() * 2.0 - 1.0,
        }
    }
}

/// Parameters of one sound. Times are in seconds, frequencies in Hz,
/// slides in Hz per sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundParams {
    pub volume: f32,
    pub frequency: f32,
    pub attack: f32,
    pub sustain: f32,
    pub release: f32,
    /// Replaces `release` when nonzero
    pub decay: f32,
    /// Level the sustain stage ramps towards
    pub sustain_volume: f32,
    pub waveform: Waveform,
    /// Exponent applied to the oscillator output (sign kept)
    pub shape_curve: f32,
    pub slide: f32,
    pub delta_slide: f32,
    pub pitch_jump: f32,
    /// When the pitch jump happens; 0 disables it
    pub pitch_jump_time: f32,
    /// Period after which frequency and slides reset; 0 disables it
    pub repeat_time: f32,
    pub noise: f32,
    pub tremolo: f32,
    /// Playback starts this late
    pub delay: f32,
}

impl Default for SoundParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            frequency: 220.0,
            attack: 0.0,
            sustain: 0.0,
            release: 0.1,
            decay: 0.0,
            sustain_volume: 1.0,
            waveform: Waveform::Sine,
            shape_curve: 1.0,
            slide: 0.0,
            delta_slide: 0.0,
            pitch_jump: 0.0,
            pitch_jump_time: 0.0,
            repeat_time: 0.0,
            noise: 0.0,
            tremolo: 0.0,
            delay: 0.0,
        }
    }
}

impl SoundParams {
    /// Length of the final envelope stage
    pub fn tail(&self) -> f32 {
        if self.decay != 0.0 { self.decay } else { self.release }
    }

    /// Total buffer duration in seconds, including the delay
    pub fn duration(&self) -> f32 {
        self.attack + self.sustain + self.tail() + self.delay
    }

    /// Number of samples rendered at `sample_rate` (at least one)
    pub fn buffer_len(&self, sample_rate: f32) -> usize {
        let len = f64::from(self.duration()) * f64::from(sample_rate);
        (len.max(0.0) as usize).max(1)
    }

    /// Envelope gain for sample `i`
    pub fn envelope(&self, i: usize, sample_rate: f32) -> f64 {
        let i = i as f64;
        let sr = f64::from(sample_rate);
        let attack = f64::from(self.attack) * sr;
        let sustain = f64::from(self.sustain) * sr;
        let tail = f64::from(self.tail()) * sr;
        let sustain_volume = f64::from(self.sustain_volume);

        let gain = if i < attack {
            i / attack
        } else if i < attack + sustain {
            1.0 - (1.0 - sustain_volume) * (i - attack) / sustain
        } else if i < attack + sustain + tail {
            (1.0 - (i - attack - sustain) / tail) * sustain_volume
        } else {
            0.0
        };
        gain.max(0.0)
    }
}

/// Render `params` into mono samples. Noise is drawn from `rng`.
pub fn synthesize(params: &SoundParams, sample_rate: f32, rng: &mut impl Rng) -> Vec<f32> {
    use std::f64::consts::TAU;

    let sr = f64::from(sample_rate);
    let len = params.buffer_len(sample_rate);
    let curve = f64::from(params.shape_curve);
    let tremolo = f64::from(params.tremolo);
    let noise = f64::from(params.noise);
    let gain = f64::from(params.volume) * GLOBAL_ATTENUATION;
    let jump_at = f64::from(params.pitch_jump_time) * sr;
    let repeat_every = f64::from(params.repeat_time) * sr;

    let mut freq = f64::from(params.frequency);
    let mut slide = f64::from(params.slide);
    let mut delta_slide = f64::from(params.delta_slide);
    let mut pitch_jump = f64::from(params.pitch_jump);
    let mut t = 0.0f64;
    let mut since_jump_reset = 0u64;
    let mut since_repeat = 0u64;

    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let mut sample = shape(params.waveform.sample(t), curve);
        sample *= 1.0 + tremolo * (i as f64 / sr * TAU * TREMOLO_HZ).sin();
        if noise != 0.0 {
            sample += rng.random_range(-1.0..1.0) * noise;
        }
        sample *= params.envelope(i, sample_rate) * gain;
        out.push(sample as f32);

        t += freq / sr;
        freq += slide;
        slide += delta_slide;

        since_jump_reset += 1;
        if params.pitch_jump_time != 0.0 && since_jump_reset as f64 > jump_at {
            freq += pitch_jump;
            pitch_jump = 0.0;
        }

        if params.repeat_time != 0.0 {
            since_repeat += 1;
            if since_repeat as f64 > repeat_every {
                freq = f64::from(params.frequency);
                slide = f64::from(params.slide);
                delta_slide = f64::from(params.delta_slide);
                since_jump_reset = 0;
                since_repeat = 0;
            }
        }
    }
    out
}

/// Sign-preserving power, so fractional curves never produce NaN
fn shape(sample: f64, curve: f64) -> f64 {
    if sample == 0.0 {
        0.0
    } else {
        sample.signum() * sample.abs().powf(curve)
    }
}
