use super::fixed::UNITY;
use super::{GeneratorState, SignalGenerator};
use crate::catalog::EnvelopeShape;

/// DAHDSR (Delay-Attack-Hold-Decay-Sustain-Release) envelope generator
///
/// Produces a Q16 gain per sample, moving through the stages in order:
/// 1. Delay: holds at zero
/// 2. Attack: ramps linearly from zero to full scale
/// 3. Hold: holds at full scale
/// 4. Decay: ramps from full scale to the sustain level
/// 5. Sustain: holds at the sustain level until note_off
/// 6. Release: ramps from the current level to zero, then goes Idle
///
/// Any stage may have a zero duration; it is skipped within the same sample.
#[derive(Debug, Clone)]
pub struct Envelope {
    shape: EnvelopeShape,
    stage: EnvelopeStage,
    multiplier: i32,
    increment: i32,
    remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Delay,
    Attack,
    Hold,
    Decay,
    Sustain,
    Release,
}

impl Envelope {
    /// Create an idle envelope
    pub fn new(shape: EnvelopeShape) -> Self {
        Self {
            shape,
            stage: EnvelopeStage::Idle,
            multiplier: 0,
            increment: 0,
            remaining: 0,
        }
    }

    /// Start a new note with the given shape
    ///
    /// The envelope restarts from zero gain in the Delay stage, whatever
    /// stage it was in.
    pub fn note_on(&mut self, shape: EnvelopeShape) {
        self.shape = shape;
        self.stage = EnvelopeStage::Delay;
        self.multiplier = 0;
        self.increment = 0;
        self.remaining = shape.delay;
    }

    /// Enter the Release stage from the current gain
    ///
    /// Ignored when the envelope is idle.
    pub fn note_off(&mut self) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }
        self.stage = EnvelopeStage::Release;
        self.remaining = self.shape.release;
        self.increment = if self.remaining > 0 {
            -((self.multiplier as i64 / self.remaining as i64) as i32)
        } else {
            0
        };
    }

    /// Gain for the next sample, or `None` once the envelope has ended
    ///
    /// After the last Release sample the envelope is already Idle, so callers
    /// can stop the voice right after using the returned gain.
    #[inline]
    pub fn next_gain(&mut self) -> Option<i32> {
        while self.remaining == 0 {
            if !self.enter_next_stage() {
                return None;
            }
        }

        let gain = self.multiplier;
        self.multiplier += self.increment;
        self.remaining -= 1;

        if self.stage == EnvelopeStage::Release && self.remaining == 0 {
            self.finish();
        }

        Some(gain)
    }

    /// Move past a stage whose count has run out
    ///
    /// Returns false when there is no next stage.
    fn enter_next_stage(&mut self) -> bool {
        let shape = self.shape;
        match self.stage {
            EnvelopeStage::Idle => return false,
            EnvelopeStage::Delay => {
                self.stage = EnvelopeStage::Attack;
                self.remaining = shape.attack;
                self.increment = if shape.attack > 0 {
                    UNITY / shape.attack as i32
                } else {
                    0
                };
            }
            EnvelopeStage::Attack => {
                self.stage = EnvelopeStage::Hold;
                self.remaining = shape.hold;
                self.multiplier = UNITY;
                self.increment = 0;
            }
            EnvelopeStage::Hold => {
                self.stage = EnvelopeStage::Decay;
                self.remaining = shape.decay;
                self.multiplier = UNITY;
                self.increment = if shape.decay > 0 {
                    (shape.sustain_level - UNITY) / shape.decay as i32
                } else {
                    0
                };
            }
            EnvelopeStage::Decay => {
                self.stage = EnvelopeStage::Sustain;
                self.remaining = u32::MAX;
                self.multiplier = shape.sustain_level;
                self.increment = 0;
            }
            EnvelopeStage::Sustain => {
                self.remaining = u32::MAX;
            }
            EnvelopeStage::Release => {
                self.finish();
                return false;
            }
        }
        true
    }

    fn finish(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.multiplier = 0;
        self.increment = 0;
        self.remaining = 0;
    }

    /// Current stage
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Gain the next sample will use if no stage change happens first
    pub fn multiplier(&self) -> i32 {
        self.multiplier
    }

    /// Samples left in the current stage
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn shape(&self) -> &EnvelopeShape {
        &self.shape
    }

    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }
}

impl SignalGenerator for Envelope {
    type Sample = i32;

    fn process(&mut self, buffer: &mut [i32]) -> GeneratorState {
        for sample in buffer.iter_mut() {
            *sample = self.next_gain().unwrap_or(0);
        }
        if self.is_idle() {
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn is_complete(&self) -> bool {
        self.is_idle()
    }

    fn reset(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(delay: u32, attack: u32, hold: u32, decay: u32, sustain: i32, release: u32) -> EnvelopeShape {
        EnvelopeShape {
            delay,
            attack,
            hold,
            decay,
            release,
            sustain_level: sustain,
        }
    }

    fn triggered(shape: EnvelopeShape) -> Envelope {
        let mut env = Envelope::new(shape);
        env.note_on(shape);
        env
    }

    #[test]
    fn test_full_envelope() {
        let mut env = triggered(shape(2, 4, 2, 4, 0x8000, 4));
        let mut buffer = [0i32; 12];

        let state = env.process(&mut buffer);
        assert_eq!(state, GeneratorState::Running);
        assert_eq!(
            buffer,
            [
                0, 0, // delay
                0, 0x4000, 0x8000, 0xC000, // attack
                0x10000, 0x10000, // hold
                0x10000, 0xE000, 0xC000, 0xA000, // decay
            ]
        );

        // Sustain holds
        let mut sustain = [0i32; 5];
        env.process(&mut sustain);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!(sustain.iter().all(|&g| g == 0x8000));

        env.note_off();
        let mut release = [0i32; 4];
        let state = env.process(&mut release);
        assert_eq!(release, [0x8000, 0x6000, 0x4000, 0x2000]);
        assert_eq!(state, GeneratorState::Complete);
        assert_eq!(env.multiplier(), 0);
        assert!(env.is_idle());
    }

    #[test]
    fn test_zero_delay_and_attack_start_at_full_scale() {
        let mut env = triggered(shape(0, 0, 3, 10, 0x8000, 10));
        assert_eq!(env.next_gain(), Some(UNITY));
        assert_eq!(env.stage(), EnvelopeStage::Hold);
    }

    #[test]
    fn test_all_zero_durations_reach_sustain_first_sample() {
        let mut env = triggered(shape(0, 0, 0, 0, 0x6000, 0));
        assert_eq!(env.next_gain(), Some(0x6000));
        assert_eq!(env.stage(), EnvelopeStage::Sustain);

        // Zero release ends immediately
        env.note_off();
        assert_eq!(env.next_gain(), None);
        assert!(env.is_idle());
    }

    #[test]
    fn test_release_reaches_exact_zero() {
        // Sustain level that does not divide evenly by the release count
        let release = 1323;
        let mut env = triggered(shape(0, 0, 0, 0, 39321, release));
        env.next_gain();
        env.note_off();

        let mut last = i32::MAX;
        for _ in 0..release {
            let gain = env.next_gain().unwrap();
            assert!(gain <= last && gain > 0);
            last = gain;
        }
        assert!(env.is_idle());
        assert_eq!(env.multiplier(), 0);
        assert_eq!(env.next_gain(), None);
    }

    #[test]
    fn test_early_release_during_attack() {
        let mut env = triggered(shape(0, 100, 10, 10, 0x8000, 50));
        let mut buffer = [0i32; 50];
        env.process(&mut buffer);
        let level = env.multiplier();
        assert!(level > 0 && level < UNITY);

        env.note_off();
        assert_eq!(env.stage(), EnvelopeStage::Release);
        assert_eq!(env.next_gain(), Some(level));
    }

    #[test]
    fn test_note_off_during_delay_stays_silent() {
        let mut env = triggered(shape(100, 10, 10, 10, 0x8000, 5));
        env.next_gain();
        env.note_off();
        let mut buffer = [1i32; 8];
        let state = env.process(&mut buffer);
        assert_eq!(state, GeneratorState::Complete);
        assert!(buffer.iter().all(|&g| g == 0));
    }

    #[test]
    fn test_idle_envelope_ignores_note_off() {
        let mut env = Envelope::new(shape(1, 1, 1, 1, 0x8000, 1));
        env.note_off();
        assert!(env.is_idle());
        assert_eq!(env.next_gain(), None);
    }

    #[test]
    fn test_gain_bounds() {
        let mut env = triggered(shape(3, 7, 5, 11, 0x9999, 13));
        let mut buffer = [0i32; 16];
        for _ in 0..4 {
            env.process(&mut buffer);
            assert!(buffer.iter().all(|&g| (0..=UNITY).contains(&g)));
        }
        env.note_off();
        while env.process(&mut buffer) == GeneratorState::Running {}
        assert!(buffer.iter().all(|&g| (0..=UNITY).contains(&g)));
    }

    #[test]
    fn test_retrigger_restarts_from_delay() {
        let s = shape(2, 2, 2, 2, 0x8000, 2);
        let mut env = triggered(s);
        let mut buffer = [0i32; 10];
        env.process(&mut buffer);
        env.note_on(s);
        assert_eq!(env.stage(), EnvelopeStage::Delay);
        assert_eq!(env.multiplier(), 0);
        assert_eq!(env.remaining(), 2);
    }

    #[test]
    fn test_reset() {
        let mut env = triggered(shape(0, 10, 10, 10, 0x8000, 10));
        env.next_gain();
        env.reset();
        assert!(env.is_complete());
        assert_eq!(env.multiplier(), 0);
    }
}
