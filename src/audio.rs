//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Each effect is a preset for the synthesizer in `synth`; the rendered
//! buffer is handed to a lazily created, process-wide `AudioContext`.
//! Off the web (and when the browser refuses a context) playback is a no-op.

pub mod synth;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::settings::SoundConfig;
use crate::sim::GameEvent;
pub use synth::{SoundParams, Waveform, synthesize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Nut eaten - quick high crunch
    Eat,
    /// Collision - low distorted crunch with noise
    Crash,
    /// Level cleared - ascending arpeggio
    LevelUp,
    /// Rock starts crumbling - gravelly noise
    RockCrumble,
    /// Menu button
    Click,
    /// Pause - descending whoosh
    PauseIn,
    /// Resume - ascending whoosh
    PauseOut,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 7] = [
        SoundEffect::Eat,
        SoundEffect::Crash,
        SoundEffect::LevelUp,
        SoundEffect::RockCrumble,
        SoundEffect::Click,
        SoundEffect::PauseIn,
        SoundEffect::PauseOut,
    ];

    /// Sound cue for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Ate => Some(SoundEffect::Eat),
            GameEvent::RockCrumbled => Some(SoundEffect::RockCrumble),
            GameEvent::LevelUp { .. } => Some(SoundEffect::LevelUp),
            GameEvent::GameOver { .. } => Some(SoundEffect::Crash),
            GameEvent::Paused => Some(SoundEffect::PauseIn),
            GameEvent::Resumed => Some(SoundEffect::PauseOut),
            GameEvent::LevelStarted { .. } | GameEvent::Frame => None,
        }
    }

    /// Synth preset
    pub fn params(self) -> SoundParams {
        let base = SoundParams::default();
        match self {
            SoundEffect::Eat => SoundParams {
                volume: 1.2,
                frequency: 1580.0,
                attack: 0.01,
                sustain: 0.02,
                release: 0.05,
                waveform: Waveform::Triangle,
                shape_curve: 0.1,
                ..base
            },
            SoundEffect::Crash => SoundParams {
                volume: 1.4,
                frequency: 90.0,
                attack: 0.05,
                sustain: 0.1,
                release: 0.3,
                waveform: Waveform::Square,
                shape_curve: 0.2,
                slide: -4.0,
                delta_slide: 0.1,
                noise: 0.6,
                delay: 0.05,
                ..base
            },
            SoundEffect::LevelUp => SoundParams {
                volume: 0.8,
                frequency: 523.0,
                attack: 0.05,
                sustain: 0.1,
                release: 0.4,
                waveform: Waveform::Sine,
                slide: 5.0,
                delta_slide: 0.02,
                pitch_jump: 300.0,
                pitch_jump_time: 0.1,
                repeat_time: 0.15,
                ..base
            },
            SoundEffect::RockCrumble => SoundParams {
                volume: 0.6,
                frequency: 300.0,
                attack: 0.01,
                sustain: 0.05,
                release: 0.15,
                waveform: Waveform::Sawtooth,
                slide: -2.0,
                delta_slide: -1.0,
                noise: 0.7,
                ..base
            },
            SoundEffect::Click => SoundParams {
                volume: 1.3,
                frequency: 1950.0,
                release: 0.06,
                waveform: Waveform::Square,
                shape_curve: 0.1,
                ..base
            },
            SoundEffect::PauseIn => SoundParams {
                frequency: 440.0,
                attack: 0.02,
                sustain: 0.08,
                release: 0.15,
                waveform: Waveform::Square,
                shape_curve: 0.0,
                slide: -12.0,
                ..base
            },
            SoundEffect::PauseOut => SoundParams {
                frequency: 440.0,
                attack: 0.02,
                sustain: 0.08,
                release: 0.15,
                waveform: Waveform::Square,
                shape_curve: 0.0,
                slide: 12.0,
                ..base
            },
        }
    }
}

/// Anything that can play sound effects (the real manager, or a recorder in tests)
pub trait SoundSink {
    fn play(&mut self, effect: SoundEffect);

    /// Pick up a changed sound configuration
    fn apply_config(&mut self, _config: &SoundConfig) {}

    /// Release the output device
    fn shutdown(&mut self) {}
}

/// Audio manager for the game
pub struct AudioManager {
    effects_enabled: bool,
    /// Noise source for the synthesizer
    rng: Pcg32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(&SoundConfig::default())
    }
}

impl AudioManager {
    /// The output context is not created here; browsers only allow it
    /// after a user gesture, so it is created on the first `play`.
    pub fn new(config: &SoundConfig) -> Self {
        Self {
            effects_enabled: config.effects,
            rng: Pcg32::seed_from_u64(0x5EED_A0D10),
        }
    }

    pub fn effects_enabled(&self) -> bool {
        self.effects_enabled
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        output::resume();
    }
}

impl SoundSink for AudioManager {
    /// Play a sound effect (fire-and-forget)
    fn play(&mut self, effect: SoundEffect) {
        if !self.effects_enabled {
            return;
        }
        output::play(&effect.params(), &mut self.rng);
    }

    fn apply_config(&mut self, config: &SoundConfig) {
        self.effects_enabled = config.effects;
    }

    /// Close the output context; the next `play` creates a new one
    fn shutdown(&mut self) {
        output::shutdown();
    }
}

#[cfg(target_arch = "wasm32")]
mod output {
    use std::cell::RefCell;

    use rand::Rng;
    use web_sys::{AudioContext, AudioContextState};

    use super::synth::{SoundParams, synthesize};

    enum Slot {
        Uninit,
        Ready(AudioContext),
        /// Creation failed once; don't keep retrying on every sound
        Unavailable,
    }

    thread_local! {
        static CONTEXT: RefCell<Slot> = const { RefCell::new(Slot::Uninit) };
    }

    fn with_context(f: impl FnOnce(&AudioContext)) {
        CONTEXT.with(|slot| {
            let mut slot = slot.borrow_mut();
            if matches!(*slot, Slot::Uninit) {
                *slot = match AudioContext::new() {
                    Ok(ctx) => {
                        log::info!("AudioContext created ({} Hz)", ctx.sample_rate());
                        Slot::Ready(ctx)
                    }
                    Err(_) => {
                        log::warn!("Failed to create AudioContext - audio disabled");
                        Slot::Unavailable
                    }
                };
            }
            if let Slot::Ready(ctx) = &*slot {
                f(ctx);
            }
        });
    }

    pub fn resume() {
        with_context(|ctx| {
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        });
    }

    pub fn shutdown() {
        CONTEXT.with(|slot| {
            let mut slot = slot.borrow_mut();
            if let Slot::Ready(ctx) = &*slot {
                let _ = ctx.close();
                log::info!("AudioContext closed");
            }
            *slot = Slot::Uninit;
        });
    }

    pub fn play(params: &SoundParams, rng: &mut impl Rng) {
        with_context(|ctx| {
            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let sample_rate = ctx.sample_rate();
            let samples = synthesize(params, sample_rate, rng);

            let Ok(buffer) = ctx.create_buffer(1, samples.len() as u32, sample_rate) else {
                return;
            };
            if buffer.copy_to_channel(&samples, 0).is_err() {
                return;
            }
            let Ok(source) = ctx.create_buffer_source() else {
                return;
            };
            source.set_buffer(Some(&buffer));
            if source.connect_with_audio_node(&ctx.destination()).is_err() {
                return;
            }
            let when = if params.delay > 0.0 {
                ctx.current_time() + f64::from(params.delay)
            } else {
                0.0
            };
            let _ = source.start_with_when(when);
        });
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod output {
    use rand::Rng;

    use super::synth::SoundParams;

    // No audio device natively

    pub fn resume() {}

    pub fn shutdown() {}

    pub fn play(params: &SoundParams, _rng: &mut impl Rng) {
        log::trace!("Sound skipped (no audio output): {:.2}s", params.duration());
    }
}
