//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Each effect is a short list of tones; the browser backend turns them into
//! oscillators, everything else just records or drops them.

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Landed on a stair (pitch climbs with the floor)
    Step { floor: u64 },
    /// Facing flipped (also the shield save)
    DirectionChange,
    /// Fall or monster: sad descending
    GameOver,
    /// Every 100 floors and every coin burst
    Milestone,
    /// Item picked up
    ItemPickup,
    /// Run started or revived
    StartGame,
    /// New character unlocked
    Unlock,
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator blip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    /// Seconds
    pub duration: f64,
    pub wave: Wave,
    pub volume: f32,
    /// Seconds after the effect starts
    pub delay: f64,
}

const fn tone(freq: f32, duration: f64, wave: Wave, volume: f32, delay: f64) -> Tone {
    Tone {
        freq,
        duration,
        wave,
        volume,
        delay,
    }
}

impl SoundEffect {
    /// The tones that make up this effect
    pub fn tones(self) -> Vec<Tone> {
        match self {
            SoundEffect::Step { floor } => {
                let base = 400.0 + (floor % 8) as f32 * 50.0;
                vec![
                    tone(base, 0.08, Wave::Square, 0.15, 0.0),
                    tone(base * 1.5, 0.06, Wave::Square, 0.1, 0.03),
                ]
            }
            SoundEffect::DirectionChange => vec![
                tone(600.0, 0.06, Wave::Triangle, 0.2, 0.0),
                tone(800.0, 0.06, Wave::Triangle, 0.15, 0.04),
            ],
            SoundEffect::GameOver => [400.0, 350.0, 300.0, 200.0]
                .iter()
                .enumerate()
                .map(|(i, &f)| tone(f, 0.2, Wave::Sawtooth, 0.2, i as f64 * 0.12))
                .collect(),
            SoundEffect::Milestone => {
                let mut tones: Vec<Tone> = [523.0, 659.0, 784.0, 1047.0]
                    .iter()
                    .enumerate()
                    .map(|(i, &f)| tone(f, 0.15, Wave::Sine, 0.25, i as f64 * 0.1))
                    .collect();
                // Sparkle
                tones.push(tone(1200.0, 0.3, Wave::Sine, 0.15, 0.4));
                tones.push(tone(1500.0, 0.3, Wave::Sine, 0.1, 0.4));
                tones
            }
            SoundEffect::ItemPickup => vec![
                tone(800.0, 0.1, Wave::Sine, 0.2, 0.0),
                tone(1200.0, 0.15, Wave::Sine, 0.15, 0.05),
            ],
            SoundEffect::StartGame => vec![
                tone(440.0, 0.1, Wave::Square, 0.15, 0.0),
                tone(660.0, 0.1, Wave::Square, 0.15, 0.1),
                tone(880.0, 0.15, Wave::Square, 0.2, 0.2),
            ],
            SoundEffect::Unlock => [440.0, 554.0, 659.0, 880.0, 1047.0]
                .iter()
                .enumerate()
                .map(|(i, &f)| tone(f, 0.2, Wave::Sine, 0.3, i as f64 * 0.08))
                .collect(),
        }
    }
}

/// Where the engine sends its sounds
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    /// Pick up volume and mute preferences
    fn apply_settings(&mut self, _settings: &Settings) {}
}

/// Silent sink (headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Sink that remembers what was played. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    played: std::rc::Rc<std::cell::RefCell<Vec<SoundEffect>>>,
}

impl RecordingAudio {
    pub fn played(&self) -> Vec<SoundEffect> {
        self.played.borrow().clone()
    }

    pub fn count(&self, effect: SoundEffect) -> usize {
        self.played.borrow().iter().filter(|e| **e == effect).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, effect: SoundEffect) {
        self.played.borrow_mut().push(effect);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect, Tone, Wave};
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                muted: false,
            }
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.master_volume * self.sfx_volume
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            wave: Wave,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(match wave {
                Wave::Sine => OscillatorType::Sine,
                Wave::Square => OscillatorType::Square,
                Wave::Triangle => OscillatorType::Triangle,
                Wave::Sawtooth => OscillatorType::Sawtooth,
            });
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_tone(&self, ctx: &AudioContext, tone: &Tone, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, tone.freq, tone.wave) else {
                return;
            };
            let t = ctx.current_time() + tone.delay;

            gain.gain().set_value_at_time(tone.volume * vol, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + tone.duration)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + tone.duration).ok();
        }
    }

    impl AudioSink for AudioManager {
        fn play(&mut self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            for tone in effect.tones() {
                self.play_tone(ctx, &tone, vol);
            }
        }

        fn apply_settings(&mut self, settings: &Settings) {
            self.master_volume = settings.master_volume.clamp(0.0, 1.0);
            self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
            self.muted = settings.muted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_pitch_cycles_every_eight_floors() {
        let low = SoundEffect::Step { floor: 8 }.tones();
        let high = SoundEffect::Step { floor: 7 }.tones();
        assert_eq!(low[0].freq, 400.0);
        assert_eq!(high[0].freq, 750.0);
        assert_eq!(high[1].freq, 1125.0);
        assert!((high[1].delay - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_game_over_descends() {
        let tones = SoundEffect::GameOver.tones();
        assert_eq!(tones.len(), 4);
        assert!(tones.windows(2).all(|w| w[0].freq > w[1].freq && w[0].delay < w[1].delay));
    }

    #[test]
    fn test_recording_sink_shares_log() {
        let recorder = RecordingAudio::default();
        let mut sink: Box<dyn AudioSink> = Box::new(recorder.clone());
        sink.play(SoundEffect::StartGame);
        sink.play(SoundEffect::Milestone);
        assert_eq!(
            recorder.played(),
            vec![SoundEffect::StartGame, SoundEffect::Milestone]
        );
        assert_eq!(recorder.count(SoundEffect::Milestone), 1);
    }
}
