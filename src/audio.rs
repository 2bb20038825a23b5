//! Sound cues
//!
//! Engines emit cues as events; playback is fire-and-forget and never feeds
//! back into game state. The browser sink synthesizes every cue with Web Audio
//! oscillators, so no sound files are needed.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Reaction stimulus turned green
    Stimulus,
    /// Clicked before the stimulus
    TooEarly,
    /// One symbol of the memory sequence (0-3)
    Tone(u8),
    /// Wrong symbol entered
    Mistake,
    /// Memory round completed
    RoundClear,
    /// Tap Frenzy tap
    Tap,
    /// Snake ate food
    Eat,
    /// Target hit
    Shoot,
    /// Cookie clicked
    Click,
    /// Upgrade bought
    Purchase,
    /// Session ended
    GameOver,
    /// New personal best
    HighScore,
}

/// Playback side of the cue stream
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    /// Output level in `0.0..=1.0`; sinks without volume control ignore it
    fn set_volume(&mut self, _volume: f32) {}
}

/// Discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Logs cues at trace level (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        log::trace!("sound: {:?}", effect);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web_audio::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web_audio {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect};

    /// Sequence symbol pitches (red, blue, green, yellow)
    const TONE_FREQS: [f32; 4] = [329.6, 392.0, 523.3, 659.3];

    /// Audio manager backed by the Web Audio API
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl WebAudio {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx, volume: 1.0 }
        }

        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Play `freqs` one after another, `step` seconds apart
        fn notes(&self, ctx: &AudioContext, freqs: &[f32], step: f64, hold: f64, osc_type: OscillatorType, level: f32) {
            for (i, freq) in freqs.iter().enumerate() {
                let Some((osc, gain)) = Self::create_osc(ctx, *freq, osc_type) else {
                    continue;
                };
                let t = ctx.current_time() + i as f64 * step;
                gain.gain().set_value_at_time(self.volume * level, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + hold)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + hold + 0.05).ok();
            }
        }
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioSink for WebAudio {
        fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }

        fn play(&mut self, effect: SoundEffect) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Browsers suspend the context until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            use OscillatorType::{Sawtooth, Sine, Square, Triangle};
            match effect {
                SoundEffect::Stimulus => self.notes(ctx, &[880.0], 0.0, 0.12, Square, 0.2),
                SoundEffect::TooEarly => self.notes(ctx, &[220.0, 160.0], 0.1, 0.15, Sawtooth, 0.25),
                SoundEffect::Tone(i) => {
                    let freq = TONE_FREQS[usize::from(i) % TONE_FREQS.len()];
                    self.notes(ctx, &[freq], 0.0, 0.35, Sine, 0.3)
                }
                SoundEffect::Mistake => self.notes(ctx, &[200.0, 150.0], 0.12, 0.2, Sawtooth, 0.3),
                SoundEffect::RoundClear => self.notes(ctx, &[600.0, 800.0, 1000.0], 0.08, 0.15, Sine, 0.25),
                SoundEffect::Tap => self.notes(ctx, &[500.0], 0.0, 0.05, Triangle, 0.2),
                SoundEffect::Eat => self.notes(ctx, &[700.0, 900.0], 0.05, 0.08, Square, 0.2),
                SoundEffect::Shoot => self.notes(ctx, &[150.0], 0.0, 0.1, Sawtooth, 0.3),
                SoundEffect::Click => self.notes(ctx, &[400.0], 0.0, 0.06, Sine, 0.2),
                SoundEffect::Purchase => self.notes(ctx, &[500.0, 750.0], 0.06, 0.12, Triangle, 0.25),
                SoundEffect::GameOver => self.notes(ctx, &[400.0, 350.0, 300.0, 200.0], 0.2, 0.3, Sine, 0.3),
                SoundEffect::HighScore => {
                    self.notes(ctx, &[500.0, 600.0, 700.0, 800.0, 1000.0], 0.08, 0.25, Triangle, 0.25)
                }
            }
        }
    }
}
