//! Voice bank and mixer
//!
//! Owns the fixed array of tone generators, routes note commands to them
//! and sums their output into one saturated i16 sample.

use tracing::trace;

use crate::catalog::tables::{attenuation_for, clamp_note, MAX_GENERATORS};
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::generator::fixed::{mul_32x16, saturate_i16};
use crate::generator::{Voice, XorShift8};

/// The 16 tone generators and the catalog they play from
pub struct VoiceBank<'a> {
    catalog: &'a Catalog,
    voices: [Voice<'a>; MAX_GENERATORS],
    rng: XorShift8,
    sample_rate: u32,
    percussion_enabled: bool,
    boost_percussion: bool,
    envelope_enabled: bool,
    dynamic_volume: bool,
    /// Voices that were active on the last mixed sample
    sounding: usize,
}

impl<'a> VoiceBank<'a> {
    pub fn new(config: &EngineConfig, catalog: &'a Catalog) -> Self {
        let default_instrument = catalog.default_instrument();
        Self {
            catalog,
            voices: std::array::from_fn(|_| Voice::new(default_instrument)),
            rng: XorShift8::new(config.seed),
            sample_rate: config.sample_rate,
            percussion_enabled: config.percussion_enabled,
            boost_percussion: config.boost_percussion,
            envelope_enabled: config.envelope_enabled,
            dynamic_volume: config.dynamic_volume,
            sounding: 0,
        }
    }

    /// Start a note on a generator, replacing whatever it was playing
    ///
    /// Notes >= 128 are percussion keys. Generators past the last one are
    /// ignored.
    pub fn note_on(&mut self, generator: u8, note: u8, velocity: u8) {
        let catalog = self.catalog;
        let Some(voice) = self.voices.get_mut(generator as usize) else {
            return;
        };

        if note >= 128 {
            if !self.percussion_enabled {
                return;
            }
            let Some(strike) = catalog.percussion_for_key(note - 128) else {
                return;
            };
            let velocity = if !self.boost_percussion {
                velocity
            } else if velocity > 63 {
                127
            } else {
                velocity << 1
            };
            trace!(generator, key = note - 128, strike = strike.name, velocity, "percussion on");
            voice.start_percussion(strike, velocity, self.sample_rate);
            return;
        }

        let Some(instrument) = catalog.instrument(voice.instrument()) else {
            return;
        };
        let note = clamp_note(note);
        let start_phase = (self.rng.next_byte() as u32) << 23;
        trace!(generator, note, velocity, instrument = instrument.name, "note on");
        voice.start_melodic(
            instrument,
            note,
            velocity,
            self.sample_rate,
            start_phase,
            self.envelope_enabled,
        );
    }

    /// Release the note on a generator
    pub fn note_off(&mut self, generator: u8) {
        if let Some(voice) = self.voices.get_mut(generator as usize) {
            if voice.is_active() {
                trace!(generator, "note off");
            }
            voice.release();
        }
    }

    /// Select an instrument through the catalog's patch map
    pub fn change_patch(&mut self, generator: u8, patch: u8) {
        let instrument = self.catalog.instrument_for_patch(patch);
        if let Some(voice) = self.voices.get_mut(generator as usize) {
            trace!(generator, patch, instrument, "instrument change");
            voice.set_instrument(instrument);
        }
    }

    /// Assign a catalog instrument directly; out-of-range indexes are ignored
    pub fn set_instrument(&mut self, generator: u8, instrument: u8) {
        if (instrument as usize) >= self.catalog.instrument_count() {
            return;
        }
        if let Some(voice) = self.voices.get_mut(generator as usize) {
            voice.set_instrument(instrument);
        }
    }

    /// Give every generator the catalog's default instrument
    pub fn reset_instruments(&mut self) {
        let default_instrument = self.catalog.default_instrument();
        for voice in self.voices.iter_mut() {
            voice.set_instrument(default_instrument);
        }
    }

    /// Stop every voice immediately
    pub fn silence_all(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.silence();
        }
        self.sounding = 0;
    }

    /// Mix one output sample from the first `generator_count` voices
    ///
    /// # Arguments
    /// * `generator_count` - voices taking part in the mix
    /// * `attenuation` - Q16 gain applied to every voice before summing;
    ///   replaced by the load-dependent gain when dynamic volume is on
    #[inline]
    pub fn mix_sample(&mut self, generator_count: usize, attenuation: i32) -> i16 {
        let attenuation = if self.dynamic_volume {
            attenuation_for(self.sounding)
        } else {
            attenuation
        };

        let mut level = 0i32;
        let mut sounding = 0;
        for voice in self.voices[..generator_count.min(MAX_GENERATORS)].iter_mut() {
            if !voice.is_active() {
                continue;
            }
            sounding += 1;
            let sample = voice.next_sample();
            level += mul_32x16(voice.volume_fraction(), mul_32x16(attenuation, sample));
        }
        self.sounding = sounding;

        saturate_i16(level)
    }

    /// Number of voices currently active among the first `generator_count`
    pub fn active_count(&self, generator_count: usize) -> usize {
        self.voices[..generator_count.min(MAX_GENERATORS)]
            .iter()
            .filter(|voice| voice.is_active())
            .count()
    }

    pub fn voice(&self, generator: u8) -> Option<&Voice<'a>> {
        self.voices.get(generator as usize)
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EnvelopeShape, Instrument, Percussion, PATCH_MAP_SIZE, WAVEFORM_POINTS};
    use crate::generator::fixed::{volume_fraction, UNITY};
    use crate::generator::EnvelopeStage;

    /// Two flat instruments at full envelope gain plus one flat strike
    fn flat_catalog(level: i16) -> Catalog {
        let envelope = EnvelopeShape {
            sustain_level: UNITY,
            release: 10,
            ..EnvelopeShape::default()
        };
        let instrument = |name| Instrument {
            name,
            waveform: [level; WAVEFORM_POINTS],
            envelope,
        };
        let mut patches = [0u8; PATCH_MAP_SIZE];
        patches[40] = 1;
        Catalog::new(
            vec![instrument("flat a"), instrument("flat b")],
            vec![Percussion {
                name: "flat strike",
                waveform: vec![level; 1000],
                rate: 8000,
            }],
            patches,
            [0; PATCH_MAP_SIZE],
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_voices_saturate_instead_of_wrapping() {
        let catalog = flat_catalog(30000);
        let mut bank = VoiceBank::new(&EngineConfig::default(), &catalog);
        bank.note_on(0, 60, 127);
        bank.note_on(1, 67, 127);

        // Each voice contributes about 18000 after the two-generator attenuation
        assert_eq!(bank.mix_sample(2, attenuation_for(2)), i16::MAX);

        let catalog = flat_catalog(-30000);
        let mut bank = VoiceBank::new(&EngineConfig::default(), &catalog);
        for generator in 0..16 {
            bank.note_on(generator, 60, 127);
        }
        assert_eq!(bank.mix_sample(16, UNITY), i16::MIN);
    }

    #[test]
    fn test_single_voice_level() {
        let catalog = flat_catalog(20000);
        let mut bank = VoiceBank::new(&EngineConfig::default(), &catalog);
        bank.note_on(0, 60, 127);
        // Interpolation of two equal points loses one step
        let expected = (20000 * 0xFFFF) >> 16;
        assert_eq!(bank.mix_sample(1, attenuation_for(1)) as i32, expected);

        bank.note_on(0, 60, 63);
        let quiet = bank.mix_sample(1, attenuation_for(1)) as i32;
        assert_eq!(quiet, mul_32x16(volume_fraction(63), expected));
    }

    #[test]
    fn test_only_configured_generators_are_mixed() {
        let catalog = flat_catalog(1000);
        let mut bank = VoiceBank::new(&EngineConfig::default(), &catalog);
        bank.note_on(3, 60, 127);
        assert_eq!(bank.mix_sample(2, UNITY), 0);
        assert_eq!(bank.active_count(2), 0);
        assert_eq!(bank.active_count(4), 1);
    }

    #[test]
    fn test_out_of_range_generator_ignored() {
        let catalog = flat_catalog(1000);
        let mut bank = VoiceBank::new(&EngineConfig::default(), &catalog);
        bank.note_on(16, 60, 127);
        bank.note_off(200);
        bank.change_patch(17, 40);
        bank.set_instrument(16, 1);
        assert_eq!(bank.active_count(16), 0);
        assert!(bank.voice(16).is_none());
    }

    #[test]
    fn test_patch_change_and_direct_instrument() {
        let catalog = flat_catalog(1000);
        let mut bank = VoiceBank::new(&EngineConfig::default(), &catalog);
        bank.change_patch(2, 40);
        assert_eq!(bank.voice(2).unwrap().instrument(), 1);
        bank.change_patch(2, 40 | 0x80);
        assert_eq!(bank.voice(2).unwrap().instrument(), 1);

        bank.set_instrument(5, 1);
        assert_eq!(bank.voice(5).unwrap().instrument(), 1);
        bank.set_instrument(5, 9);
        assert_eq!(bank.voice(5).unwrap().instrument(), 1);

        bank.reset_instruments();
        assert_eq!(bank.voice(2).unwrap().instrument(), 0);
        assert_eq!(bank.voice(5).unwrap().instrument(), 0);
    }

    #[test]
    fn test_note_off_releases_melodic_voice() {
        let catalog = flat_catalog(1000);
        let mut bank = VoiceBank::new(&EngineConfig::default(), &catalog);
        bank.note_on(0, 60, 127);
        bank.mix_sample(1, UNITY);
        bank.note_off(0);
        let voice = bank.voice(0).unwrap();
        assert!(voice.is_active());
        assert_eq!(voice.envelope_stage(), EnvelopeStage::Release);

        for _ in 0..10 {
            bank.mix_sample(1, UNITY);
        }
        assert!(!bank.voice(0).unwrap().is_active());
        assert_eq!(bank.mix_sample(1, UNITY), 0);
    }

    #[test]
    fn test_envelope_disabled_stops_at_note_off() {
        let catalog = flat_catalog(1000);
        let config = EngineConfig {
            envelope_enabled: false,
            ..EngineConfig::default()
        };
        let mut bank = VoiceBank::new(&config, &catalog);
        bank.note_on(0, 60, 127);
        assert_eq!(bank.mix_sample(1, UNITY) as i32, (1000 * 0xFFFF) >> 16);
        bank.note_off(0);
        assert!(!bank.voice(0).unwrap().is_active());
    }

    #[test]
    fn test_percussion_routing() {
        let catalog = flat_catalog(1000);
        let mut bank = VoiceBank::new(&EngineConfig::default(), &catalog);
        bank.note_on(9, 128 + 36, 100);
        let voice = bank.voice(9).unwrap();
        assert!(voice.is_percussion());
        assert_eq!(voice.ending_index(), Some(999));
        assert_eq!(voice.volume_fraction(), volume_fraction(100));

        // Percussion ignores note-off envelopes and stops at once
        bank.note_off(9);
        assert!(!bank.voice(9).unwrap().is_active());
    }

    #[test]
    fn test_percussion_disabled() {
        let catalog = flat_catalog(1000);
        let config = EngineConfig {
            percussion_enabled: false,
            ..EngineConfig::default()
        };
        let mut bank = VoiceBank::new(&config, &catalog);
        bank.note_on(9, 128 + 36, 100);
        assert!(!bank.voice(9).unwrap().is_active());
    }

    #[test]
    fn test_percussion_boost_saturates() {
        let catalog = flat_catalog(1000);
        let config = EngineConfig {
            boost_percussion: true,
            ..EngineConfig::default()
        };
        let mut bank = VoiceBank::new(&config, &catalog);
        bank.note_on(9, 128 + 36, 40);
        assert_eq!(bank.voice(9).unwrap().volume_fraction(), volume_fraction(80));
        bank.note_on(9, 128 + 36, 100);
        assert_eq!(bank.voice(9).unwrap().volume_fraction(), UNITY);
        bank.note_on(9, 128 + 36, 63);
        assert_eq!(bank.voice(9).unwrap().volume_fraction(), volume_fraction(126));
        // Velocity bytes with bit 7 set still saturate
        bank.note_on(9, 128 + 36, 0x85);
        assert_eq!(bank.voice(9).unwrap().volume_fraction(), UNITY);
    }

    #[test]
    fn test_melodic_start_phase_is_random_byte() {
        let catalog = flat_catalog(1000);
        let mut bank = VoiceBank::new(&EngineConfig::default(), &catalog);
        let mut rng = XorShift8::new(23);
        for generator in 0..4 {
            bank.note_on(generator, 60, 127);
            let phase = bank.voice(generator).unwrap().phase();
            assert_eq!(phase, (rng.next_byte() as u32) << 23);
        }
    }

    #[test]
    fn test_dynamic_volume_follows_previous_sample() {
        let catalog = flat_catalog(10000);
        let config = EngineConfig {
            dynamic_volume: true,
            ..EngineConfig::default()
        };
        let mut bank = VoiceBank::new(&config, &catalog);
        bank.note_on(0, 60, 127);
        bank.note_on(1, 60, 127);

        let raw = (10000 * 0xFFFF) >> 16;
        // Nothing sounded before, so the first sample is at unity
        assert_eq!(bank.mix_sample(16, 0) as i32, 2 * raw);
        // Two voices sounded on the previous sample
        let attenuated = mul_32x16(attenuation_for(2), raw);
        assert_eq!(bank.mix_sample(16, 0) as i32, 2 * attenuated);
    }

    #[test]
    fn test_silence_all() {
        let catalog = flat_catalog(1000);
        let mut bank = VoiceBank::new(&EngineConfig::default(), &catalog);
        bank.note_on(0, 60, 127);
        bank.note_on(9, 128 + 36, 127);
        bank.silence_all();
        assert_eq!(bank.active_count(16), 0);
        assert_eq!(bank.mix_sample(16, UNITY), 0);
    }
}
