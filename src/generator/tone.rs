//! Tone generator: one voice of the synthesizer
//!
//! Phase accumulator layout (31 bits, bit 31 always clear):
//! - melodic:    `0 iiiiiiii ffffffffffffffff xxxxxxx` (8-bit index, 16-bit fraction)
//! - percussion: `0 iiiiiiiiiiiiii ffffffffffffffff x` (14-bit index, 16-bit fraction)
//!
//! Melodic waveforms wrap at 256 points; percussion strikes play once and
//! stop at their last point.

use super::envelope::{Envelope, EnvelopeStage};
use super::fixed::{mul_32x16, volume_fraction, UNITY};
use super::SignalGenerator;
use crate::catalog::tables::note_freq4096;
use crate::catalog::{EnvelopeShape, Instrument, Percussion, WAVEFORM_POINTS};

const PHASE_MASK: u32 = 0x7FFF_FFFF;

/// Phase increment for a melodic note at `sample_rate`
///
/// One waveform cycle spans 2^31, so the increment is `freq * 2^31 / rate`.
pub fn melodic_increment(note: u8, sample_rate: u32) -> u32 {
    (note_freq4096(note) as u64 * 0x80000 / sample_rate as u64) as u32
}

/// Phase increment for a percussion strike recorded at `rate`
pub fn percussion_increment(rate: u32, sample_rate: u32) -> u32 {
    (rate as u64 * 0x20000 / sample_rate as u64) as u32
}

/// Linear interpolation between two table points, `frac` in 0..=0xFFFF
#[inline(always)]
fn interpolate(a: i16, b: i16, frac: i32) -> i32 {
    (a as i32 * (0xFFFF - frac) + b as i32 * frac) >> 16
}

#[derive(Debug, Clone, Copy)]
enum Waveform<'a> {
    Silent,
    Looped(&'a [i16; WAVEFORM_POINTS]),
    OneShot { table: &'a [i16], ending_index: usize },
}

/// One tone generator
///
/// Owns the phase accumulator, the note's envelope and its velocity gain.
/// The instrument assignment survives from note to note.
#[derive(Debug, Clone)]
pub struct Voice<'a> {
    waveform: Waveform<'a>,
    phase: u32,
    phase_increment: u32,
    volume_fraction: i32,
    instrument: u8,
    active: bool,
    envelope: Envelope,
    shaped: bool,
}

impl<'a> Voice<'a> {
    pub fn new(instrument: u8) -> Self {
        Self {
            waveform: Waveform::Silent,
            phase: 0,
            phase_increment: 0,
            volume_fraction: 0,
            instrument,
            active: false,
            envelope: Envelope::new(EnvelopeShape::default()),
            shaped: false,
        }
    }

    /// Start a melodic note, overwriting whatever was playing
    ///
    /// # Arguments
    /// * `instrument` - catalog entry for this voice's instrument
    /// * `note` - MIDI note, clamped into the playable range
    /// * `start_phase` - initial phase, randomised by the caller
    /// * `shaped` - apply the DAHDSR envelope (otherwise unity gain)
    pub fn start_melodic(
        &mut self,
        instrument: &'a Instrument,
        note: u8,
        velocity: u8,
        sample_rate: u32,
        start_phase: u32,
        shaped: bool,
    ) {
        self.waveform = Waveform::Looped(&instrument.waveform);
        self.phase = start_phase & PHASE_MASK;
        self.phase_increment = melodic_increment(note, sample_rate);
        self.volume_fraction = volume_fraction(velocity);
        self.shaped = shaped;
        if shaped {
            self.envelope.note_on(instrument.envelope);
        } else {
            self.envelope.reset();
        }
        self.active = true;
    }

    /// Start a percussion strike from its first point
    pub fn start_percussion(&mut self, strike: &'a Percussion, velocity: u8, sample_rate: u32) {
        self.waveform = Waveform::OneShot {
            table: &strike.waveform,
            ending_index: strike.ending_index(),
        };
        self.phase = 0;
        self.phase_increment = percussion_increment(strike.rate, sample_rate);
        self.volume_fraction = volume_fraction(velocity);
        self.shaped = false;
        self.envelope.reset();
        self.active = true;
    }

    /// Release the note
    ///
    /// Shaped melodic notes fade out through the Release stage and stay
    /// active until it ends; everything else stops at once.
    pub fn release(&mut self) {
        if !self.active {
            return;
        }
        if self.shaped {
            self.envelope.note_off();
        } else {
            self.active = false;
        }
    }

    /// Stop immediately, without a release
    pub fn silence(&mut self) {
        self.active = false;
        self.envelope.reset();
    }

    /// Produce the next sample, enveloped but before velocity and mixer gain
    ///
    /// Inactive voices return 0. A voice that reaches the end of its strike
    /// or of its release still produces this sample and is inactive
    /// afterwards.
    #[inline]
    pub fn next_sample(&mut self) -> i32 {
        if !self.active {
            return 0;
        }

        let level = match self.waveform {
            Waveform::Silent => {
                self.active = false;
                return 0;
            }
            Waveform::Looped(table) => {
                let gain = if self.shaped {
                    match self.envelope.next_gain() {
                        Some(gain) => gain,
                        None => {
                            self.active = false;
                            return 0;
                        }
                    }
                } else {
                    UNITY
                };
                let index1 = (self.phase >> 23) as usize & 0xFF;
                let index2 = (index1 + 1) & 0xFF;
                let frac = ((self.phase >> 7) & 0xFFFF) as i32;
                let raw = interpolate(table[index1], table[index2], frac);
                if self.shaped && self.envelope.is_idle() {
                    self.active = false;
                }
                if gain == UNITY {
                    raw
                } else {
                    mul_32x16(gain, raw)
                }
            }
            Waveform::OneShot {
                table,
                ending_index,
            } => {
                let index1 = (self.phase >> 17) as usize;
                let index2 = index1 + 1;
                if index2 >= ending_index {
                    self.active = false;
                }
                let frac = ((self.phase >> 1) & 0xFFFF) as i32;
                interpolate(
                    table[index1.min(ending_index)],
                    table[index2.min(ending_index)],
                    frac,
                )
            }
        };

        self.phase = self.phase.wrapping_add(self.phase_increment) & PHASE_MASK;
        level
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_percussion(&self) -> bool {
        matches!(self.waveform, Waveform::OneShot { .. })
    }

    pub fn instrument(&self) -> u8 {
        self.instrument
    }

    pub fn set_instrument(&mut self, instrument: u8) {
        self.instrument = instrument;
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn phase_increment(&self) -> u32 {
        self.phase_increment
    }

    pub fn volume_fraction(&self) -> i32 {
        self.volume_fraction
    }

    pub fn envelope_stage(&self) -> EnvelopeStage {
        self.envelope.stage()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Last valid waveform index for percussion voices
    pub fn ending_index(&self) -> Option<usize> {
        match self.waveform {
            Waveform::OneShot { ending_index, .. } => Some(ending_index),
            _ => None,
        }
    }
}
