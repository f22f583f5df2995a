//! Built-in General MIDI catalog
//!
//! Waveforms are synthesised once at construction: melodic cycles from
//! additive harmonic recipes, percussion strikes from decaying partials and
//! seeded noise.

use super::{Catalog, EnvelopeShape, Instrument, Percussion, PATCH_MAP_SIZE, WAVEFORM_POINTS};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::TAU;

/// Peak amplitude of generated tables, leaving headroom for interpolation
const TABLE_PEAK: f64 = 30000.0;

/// Default envelope in ms: delay, attack, hold, decay, release
const DEFAULT_ENVELOPE_MS: [u32; 5] = [0, 10, 2, 30, 30];
const DEFAULT_SUSTAIN: f64 = 0.60;
const PIANO_RELEASE_MS: u32 = 60;

/// Built-in melodic instruments, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InstrumentId {
    AcousticGuitar,
    AltoSax,
    Birds,
    Cello,
    Clarinet,
    Clavinet,
    DoubleBass,
    ElectricBass,
    ElectricGuitar,
    Organ,
    ElectricPiano,
    Flute,
    Oboe,
    Piano,
    Violin,
}

impl InstrumentId {
    pub const ALL: [InstrumentId; 15] = [
        InstrumentId::AcousticGuitar,
        InstrumentId::AltoSax,
        InstrumentId::Birds,
        InstrumentId::Cello,
        InstrumentId::Clarinet,
        InstrumentId::Clavinet,
        InstrumentId::DoubleBass,
        InstrumentId::ElectricBass,
        InstrumentId::ElectricGuitar,
        InstrumentId::Organ,
        InstrumentId::ElectricPiano,
        InstrumentId::Flute,
        InstrumentId::Oboe,
        InstrumentId::Piano,
        InstrumentId::Violin,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InstrumentId::AcousticGuitar => "acoustic guitar",
            InstrumentId::AltoSax => "alto sax",
            InstrumentId::Birds => "birds",
            InstrumentId::Cello => "cello",
            InstrumentId::Clarinet => "clarinet",
            InstrumentId::Clavinet => "clavinet",
            InstrumentId::DoubleBass => "double bass",
            InstrumentId::ElectricBass => "electric bass",
            InstrumentId::ElectricGuitar => "electric guitar",
            InstrumentId::Organ => "organ",
            InstrumentId::ElectricPiano => "electric piano",
            InstrumentId::Flute => "flute",
            InstrumentId::Oboe => "oboe",
            InstrumentId::Piano => "piano",
            InstrumentId::Violin => "violin",
        }
    }

    /// Relative amplitudes of harmonics 1, 2, 3, ...
    fn harmonics(self) -> &'static [f64] {
        match self {
            InstrumentId::AcousticGuitar => &[1.0, 0.6, 0.45, 0.3, 0.2, 0.12, 0.08],
            InstrumentId::AltoSax => &[1.0, 0.8, 0.7, 0.5, 0.45, 0.3, 0.2, 0.15],
            InstrumentId::Birds => &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.25],
            InstrumentId::Cello => &[
                1.0, 0.5, 0.33, 0.25, 0.2, 0.17, 0.14, 0.12, 0.11, 0.1, 0.09, 0.08,
            ],
            InstrumentId::Clarinet => &[1.0, 0.0, 0.75, 0.0, 0.5, 0.0, 0.14, 0.0, 0.5, 0.0, 0.12],
            InstrumentId::Clavinet => &[1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2],
            InstrumentId::DoubleBass => &[1.0, 0.5, 0.2, 0.1],
            InstrumentId::ElectricBass => &[1.0, 0.7, 0.3, 0.15, 0.05],
            InstrumentId::ElectricGuitar => &[1.0, 0.5, 0.8, 0.3, 0.5, 0.2, 0.3, 0.1],
            InstrumentId::Organ => &[1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            InstrumentId::ElectricPiano => &[1.0, 0.3, 0.05, 0.15, 0.02, 0.05],
            InstrumentId::Flute => &[1.0, 0.4, 0.1, 0.05],
            InstrumentId::Oboe => &[0.4, 1.0, 0.8, 0.5, 0.35, 0.3, 0.2, 0.15],
            InstrumentId::Piano => &[1.0, 0.55, 0.35, 0.25, 0.15, 0.1, 0.08, 0.05],
            InstrumentId::Violin => &[
                1.0, 0.5, 0.33, 0.25, 0.2, 0.17, 0.14, 0.12, 0.11, 0.1, 0.09, 0.08, 0.08, 0.07,
                0.07, 0.06,
            ],
        }
    }

    fn envelope_ms(self) -> [u32; 5] {
        match self {
            InstrumentId::Piano => {
                let mut ms = DEFAULT_ENVELOPE_MS;
                ms[4] = PIANO_RELEASE_MS;
                ms
            }
            _ => DEFAULT_ENVELOPE_MS,
        }
    }
}

/// Built-in percussion strikes, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PercussionId {
    BassDrum,
    Snare,
    Tom,
    Cymbal,
    Bongo,
    Bell,
}

impl PercussionId {
    pub const ALL: [PercussionId; 6] = [
        PercussionId::BassDrum,
        PercussionId::Snare,
        PercussionId::Tom,
        PercussionId::Cymbal,
        PercussionId::Bongo,
        PercussionId::Bell,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PercussionId::BassDrum => "bass drum",
            PercussionId::Snare => "snare drum",
            PercussionId::Tom => "mid-high tom",
            PercussionId::Cymbal => "cymbal",
            PercussionId::Bongo => "high bongo",
            PercussionId::Bell => "steel bell",
        }
    }

    /// Native sample rate in Hz
    pub fn rate(self) -> u32 {
        match self {
            PercussionId::BassDrum | PercussionId::Bongo | PercussionId::Bell => 4000,
            PercussionId::Snare | PercussionId::Tom | PercussionId::Cymbal => 8000,
        }
    }

    /// Strike length in milliseconds
    fn duration_ms(self) -> u32 {
        match self {
            PercussionId::BassDrum => 500,
            PercussionId::Snare => 250,
            PercussionId::Tom => 400,
            PercussionId::Cymbal => 900,
            PercussionId::Bongo => 200,
            PercussionId::Bell => 1000,
        }
    }
}

use InstrumentId as I;

/// GM program (0-based) to instrument
#[rustfmt::skip]
const INSTRUMENT_PATCH_MAP: [InstrumentId; PATCH_MAP_SIZE] = [
    // 1-8: piano, played on the basses
    I::DoubleBass, I::DoubleBass, I::ElectricBass, I::DoubleBass,
    I::ElectricBass, I::ElectricBass, I::ElectricBass, I::ElectricBass,
    // 9-16: chromatic percussion
    I::Clavinet, I::Clavinet, I::Clavinet, I::Clavinet,
    I::Clavinet, I::Clavinet, I::Clavinet, I::Clavinet,
    // 17-24: organ
    I::Organ, I::Organ, I::Organ, I::Organ, I::Organ, I::Organ, I::Organ, I::Organ,
    // 25-32: guitar
    I::AcousticGuitar, I::ElectricGuitar, I::ElectricGuitar, I::ElectricGuitar,
    I::ElectricGuitar, I::ElectricGuitar, I::ElectricGuitar, I::AcousticGuitar,
    // 33-40: bass
    I::DoubleBass, I::ElectricBass, I::ElectricBass, I::DoubleBass,
    I::DoubleBass, I::DoubleBass, I::ElectricBass, I::ElectricBass,
    // 41-48: strings
    I::Violin, I::Violin, I::Cello, I::Cello, I::Violin, I::Violin, I::Violin, I::Violin,
    // 49-56: ensemble
    I::Violin, I::Violin, I::Violin, I::Violin, I::Violin, I::Violin, I::Violin, I::Violin,
    // 57-64: brass
    I::DoubleBass, I::DoubleBass, I::DoubleBass, I::DoubleBass,
    I::DoubleBass, I::DoubleBass, I::DoubleBass, I::DoubleBass,
    // 65-72: reed
    I::AltoSax, I::AltoSax, I::AltoSax, I::Oboe, I::Oboe, I::AltoSax, I::AltoSax, I::Oboe,
    // 73-80: pipe
    I::Flute, I::Flute, I::Flute, I::Flute, I::Flute, I::Flute, I::Flute, I::Flute,
    // 81-88: synth lead
    I::ElectricGuitar, I::ElectricGuitar, I::ElectricGuitar, I::ElectricGuitar,
    I::ElectricGuitar, I::ElectricGuitar, I::ElectricGuitar, I::ElectricGuitar,
    // 89-96: synth pad
    I::Violin, I::Violin, I::Violin, I::Violin, I::Violin, I::Violin, I::Violin, I::Violin,
    // 97-104: synth effects
    I::Birds, I::Birds, I::Birds, I::Birds, I::Birds, I::Birds, I::Birds, I::Birds,
    // 105-112: ethnic
    I::Organ, I::Organ, I::Organ, I::Organ, I::Organ, I::Organ, I::Organ, I::Organ,
    // 113-120: percussive
    I::ElectricBass, I::ElectricBass, I::ElectricBass, I::ElectricBass,
    I::ElectricBass, I::ElectricBass, I::ElectricBass, I::ElectricBass,
    // 121-128: sound effects
    I::Birds, I::Birds, I::Birds, I::Birds, I::Birds, I::Birds, I::Birds, I::Birds,
];

use PercussionId as D;

/// GM percussion key (0-based) to strike
#[rustfmt::skip]
const PERCUSSION_PATCH_MAP: [PercussionId; PATCH_MAP_SIZE] = [
    // 1-16
    D::BassDrum, D::Snare, D::Tom, D::Cymbal, D::Bongo, D::Bell, D::BassDrum, D::BassDrum,
    D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum,
    // 17-32
    D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum,
    D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum,
    // 33-48
    D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::Snare, D::Snare, D::Snare,
    D::Tom, D::Cymbal, D::Tom, D::Cymbal, D::Tom, D::Cymbal, D::Tom, D::Tom,
    // 49-64
    D::Cymbal, D::Tom, D::Cymbal, D::Cymbal, D::Bell, D::Snare, D::Cymbal, D::Bell,
    D::Cymbal, D::Cymbal, D::Cymbal, D::Bongo, D::Bongo, D::Bongo, D::Bongo, D::Bongo,
    // 65-80
    D::Tom, D::Tom, D::Bell, D::Bell, D::Cymbal, D::Cymbal, D::Bell, D::Bell,
    D::Bongo, D::Bongo, D::Bongo, D::Bongo, D::Bongo, D::Tom, D::Tom, D::Bell,
    // 81-96
    D::Bell, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum,
    D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum,
    // 97-112
    D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum,
    D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum,
    // 113-128
    D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum,
    D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum, D::BassDrum,
];

/// Scale samples so the largest magnitude becomes `TABLE_PEAK`
fn normalise(samples: &[f64]) -> Vec<i16> {
    let peak = samples.iter().fold(0.0f64, |m, s| m.max(s.abs()));
    let gain = if peak > 0.0 { TABLE_PEAK / peak } else { 0.0 };
    samples.iter().map(|s| (s * gain).round() as i16).collect()
}

/// One waveform cycle as a sum of harmonics
pub fn additive_cycle(harmonics: &[f64]) -> [i16; WAVEFORM_POINTS] {
    let raw: Vec<f64> = (0..WAVEFORM_POINTS)
        .map(|i| {
            let x = TAU * i as f64 / WAVEFORM_POINTS as f64;
            harmonics
                .iter()
                .enumerate()
                .map(|(k, amp)| amp * (x * (k + 1) as f64).sin())
                .sum()
        })
        .collect();

    let mut cycle = [0i16; WAVEFORM_POINTS];
    cycle.copy_from_slice(&normalise(&raw));
    cycle
}

/// Sine with an exponential pitch glide, as used by drum bodies
fn swept_sine(t: &[f64], rate: f64, start_hz: f64, end_hz: f64, sweep: f64) -> Vec<f64> {
    let mut phase = 0.0;
    t.iter()
        .map(|&t| {
            let freq = end_hz + (start_hz - end_hz) * (-t * sweep).exp();
            phase += TAU * freq / rate;
            phase.sin()
        })
        .collect()
}

/// Synthesise one percussion strike at its native rate
pub fn strike(id: PercussionId) -> Vec<i16> {
    let rate = id.rate() as f64;
    let len = (id.rate() * id.duration_ms() / 1000) as usize;
    let t: Vec<f64> = (0..len).map(|i| i as f64 / rate).collect();
    let mut rng = StdRng::seed_from_u64(id as u64 + 1);
    let mut noise = || rng.gen_range(-1.0..1.0);

    let raw: Vec<f64> = match id {
        PercussionId::BassDrum => swept_sine(&t, rate, 120.0, 50.0, 30.0)
            .iter()
            .zip(&t)
            .map(|(s, t)| s * (-t * 8.0).exp())
            .collect(),
        PercussionId::Snare => t
            .iter()
            .map(|t| {
                0.6 * noise() * (-t * 18.0).exp()
                    + 0.4 * (TAU * 180.0 * t).sin() * (-t * 25.0).exp()
            })
            .collect(),
        PercussionId::Tom => swept_sine(&t, rate, 200.0, 140.0, 12.0)
            .iter()
            .zip(&t)
            .map(|(s, t)| s * (-t * 9.0).exp())
            .collect(),
        PercussionId::Cymbal => {
            let mut previous = 0.0;
            t.iter()
                .map(|t| {
                    let n = noise();
                    let bright = n - previous;
                    previous = n;
                    bright * (-t * 4.0).exp()
                })
                .collect()
        }
        PercussionId::Bongo => t
            .iter()
            .map(|t| (TAU * 400.0 * t).sin() * (-t * 20.0).exp())
            .collect(),
        PercussionId::Bell => t
            .iter()
            .map(|t| {
                ((TAU * 300.0 * t).sin()
                    + 0.6 * (TAU * 828.0 * t).sin()
                    + 0.3 * (TAU * 1620.0 * t).sin())
                    * (-t * 3.0).exp()
            })
            .collect(),
    };

    normalise(&raw)
}

impl Catalog {
    /// The built-in catalog: 15 melodic instruments and 6 percussion strikes
    ///
    /// Envelope durations are converted to samples at `sample_rate`.
    /// Every generator starts on the piano.
    pub fn builtin(sample_rate: u32) -> Catalog {
        let instruments = InstrumentId::ALL
            .iter()
            .map(|&id| Instrument {
                name: id.name(),
                waveform: additive_cycle(id.harmonics()),
                envelope: EnvelopeShape::from_ms(id.envelope_ms(), DEFAULT_SUSTAIN, sample_rate),
            })
            .collect();

        let percussion = PercussionId::ALL
            .iter()
            .map(|&id| Percussion {
                name: id.name(),
                waveform: strike(id),
                rate: id.rate(),
            })
            .collect();

        Catalog {
            instruments,
            percussion,
            instrument_patches: INSTRUMENT_PATCH_MAP.map(|id| id as u8),
            percussion_patches: PERCUSSION_PATCH_MAP.map(|id| id as u8),
            default_instrument: InstrumentId::Piano as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MAX_PERCUSSION_POINTS;

    #[test]
    fn test_builtin_is_valid() {
        let catalog = Catalog::builtin(44100);
        let validated = Catalog::new(
            catalog.instruments.clone(),
            catalog.percussion.clone(),
            catalog.instrument_patches,
            catalog.percussion_patches,
            catalog.default_instrument,
        );
        assert!(validated.is_ok());
        assert_eq!(catalog.instrument_count(), 15);
        assert_eq!(catalog.percussion_count(), 6);
        assert_eq!(catalog.default_instrument(), InstrumentId::Piano as u8);
    }

    #[test]
    fn test_piano_release_longer() {
        let catalog = Catalog::builtin(44100);
        let piano = catalog.instrument(InstrumentId::Piano as u8).unwrap();
        let flute = catalog.instrument(InstrumentId::Flute as u8).unwrap();
        assert_eq!(piano.envelope.release, 2646);
        assert_eq!(flute.envelope.release, 1323);
        assert_eq!(piano.name, "piano");
    }

    #[test]
    fn test_cycle_peak_and_shape() {
        let sine = additive_cycle(&[1.0]);
        let peak = sine.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert_eq!(peak, TABLE_PEAK as u16);
        assert_eq!(sine[0], 0);
        assert_eq!(sine[64], TABLE_PEAK as i16);
        assert_eq!(sine[192], -(TABLE_PEAK as i16));
    }

    #[test]
    fn test_strikes_fit_phase_index() {
        for id in PercussionId::ALL {
            let table = strike(id);
            assert!(table.len() >= 2 && table.len() <= MAX_PERCUSSION_POINTS);
            assert_eq!(table.len() as u32, id.rate() * id.duration_ms() / 1000);
        }
    }

    #[test]
    fn test_strikes_deterministic() {
        assert_eq!(strike(PercussionId::Snare), strike(PercussionId::Snare));
    }

    #[test]
    fn test_gm_mappings() {
        let catalog = Catalog::builtin(44100);
        // GM 1-8 pianos play on the basses
        assert_eq!(catalog.instrument_for_patch(0), InstrumentId::DoubleBass as u8);
        assert_eq!(catalog.instrument_for_patch(2), InstrumentId::ElectricBass as u8);
        assert_eq!(catalog.instrument_for_patch(7), InstrumentId::ElectricBass as u8);
        assert_ne!(catalog.instrument_for_patch(0), catalog.default_instrument());
        // GM 41 violin, 74 flute (1-based)
        assert_eq!(catalog.instrument_for_patch(40), InstrumentId::Violin as u8);
        assert_eq!(catalog.instrument_for_patch(73), InstrumentId::Flute as u8);
        // GM key 38 acoustic snare (1-based)
        assert_eq!(
            catalog.percussion_for_key(37).unwrap().name,
            PercussionId::Snare.name()
        );
    }
}
