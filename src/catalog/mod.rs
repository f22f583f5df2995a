//! Waveform and instrument catalog
//!
//! Read-only data the voices play from: single-cycle melodic waveforms with
//! their DAHDSR envelopes, one-shot percussion strikes with their native
//! sample rates, and the patch maps that translate score numbers into
//! catalog indexes. The catalog is built once, before playback, and only
//! borrowed by the engine afterwards.

pub mod builtin;
pub mod tables;

pub use builtin::{InstrumentId, PercussionId};

/// Points in one melodic waveform cycle
pub const WAVEFORM_POINTS: usize = 256;
/// Longest percussion waveform addressable by the 14-bit phase index
pub const MAX_PERCUSSION_POINTS: usize = 1 << 14;
/// Entries in each patch map
pub const PATCH_MAP_SIZE: usize = 128;

/// DAHDSR envelope timing, in samples, and sustain level as a Q16 fraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvelopeShape {
    pub delay: u32,
    pub attack: u32,
    pub hold: u32,
    pub decay: u32,
    pub release: u32,
    pub sustain_level: i32,
}

impl EnvelopeShape {
    /// Build an envelope from phase durations in milliseconds
    ///
    /// # Arguments
    /// * `durations_ms` - delay, attack, hold, decay and release in ms
    /// * `sustain` - sustain level, 0.0 to 1.0
    /// * `sample_rate` - sample rate in Hz
    pub fn from_ms(durations_ms: [u32; 5], sustain: f64, sample_rate: u32) -> Self {
        let samples = |ms: u32| (ms as u64 * sample_rate as u64 / 1000) as u32;
        let [delay, attack, hold, decay, release] = durations_ms;
        Self {
            delay: samples(delay),
            attack: samples(attack),
            hold: samples(hold),
            decay: samples(decay),
            release: samples(release),
            sustain_level: crate::generator::fixed::fract16(sustain.clamp(0.0, 1.0)),
        }
    }

    /// Whether every count fits the envelope's signed step arithmetic and
    /// the sustain level is between 0 and unity
    pub fn is_valid(&self) -> bool {
        let limit = i32::MAX as u32;
        [self.delay, self.attack, self.hold, self.decay, self.release]
            .iter()
            .all(|&count| count <= limit)
            && (0..=crate::generator::fixed::UNITY).contains(&self.sustain_level)
    }
}

/// A melodic instrument: one looped waveform cycle plus its envelope
#[derive(Debug, Clone)]
pub struct Instrument {
    pub name: &'static str,
    pub waveform: [i16; WAVEFORM_POINTS],
    pub envelope: EnvelopeShape,
}

/// A percussion instrument: a complete strike played once
#[derive(Debug, Clone)]
pub struct Percussion {
    pub name: &'static str,
    pub waveform: Vec<i16>,
    /// Sample rate the strike was recorded at, in Hz
    pub rate: u32,
}

impl Percussion {
    /// Index of the last valid waveform point
    pub fn ending_index(&self) -> usize {
        self.waveform.len().saturating_sub(1)
    }
}

/// Catalog validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    NoInstruments,
    DefaultInstrumentOutOfRange(u8),
    InvalidEnvelope { name: &'static str },
    InstrumentPatchOutOfRange { patch: usize, index: u8 },
    PercussionPatchOutOfRange { note: usize, index: u8 },
    PercussionLength { name: &'static str, len: usize },
    PercussionRate { name: &'static str },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NoInstruments => write!(f, "Catalog has no instruments"),
            CatalogError::DefaultInstrumentOutOfRange(i) => {
                write!(f, "Default instrument {} out of range", i)
            }
            CatalogError::InvalidEnvelope { name } => {
                write!(f, "Instrument {} has an out-of-range envelope", name)
            }
            CatalogError::InstrumentPatchOutOfRange { patch, index } => {
                write!(f, "Patch {} maps to missing instrument {}", patch, index)
            }
            CatalogError::PercussionPatchOutOfRange { note, index } => {
                write!(f, "Percussion note {} maps to missing strike {}", note, index)
            }
            CatalogError::PercussionLength { name, len } => write!(
                f,
                "Percussion {} has {} points (expected 2..={})",
                name, len, MAX_PERCUSSION_POINTS
            ),
            CatalogError::PercussionRate { name } => {
                write!(f, "Percussion {} has a zero sample rate", name)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Immutable set of instruments, percussion strikes and patch maps
#[derive(Debug, Clone)]
pub struct Catalog {
    instruments: Vec<Instrument>,
    percussion: Vec<Percussion>,
    instrument_patches: [u8; PATCH_MAP_SIZE],
    percussion_patches: [u8; PATCH_MAP_SIZE],
    default_instrument: u8,
}

impl Catalog {
    /// Create a validated catalog
    ///
    /// Every instrument patch entry must name an existing instrument. If any
    /// percussion strikes are given, every percussion patch entry must name
    /// one of them; with no strikes, percussion notes are silently ignored.
    pub fn new(
        instruments: Vec<Instrument>,
        percussion: Vec<Percussion>,
        instrument_patches: [u8; PATCH_MAP_SIZE],
        percussion_patches: [u8; PATCH_MAP_SIZE],
        default_instrument: u8,
    ) -> Result<Self, CatalogError> {
        if instruments.is_empty() {
            return Err(CatalogError::NoInstruments);
        }
        if default_instrument as usize >= instruments.len() {
            return Err(CatalogError::DefaultInstrumentOutOfRange(default_instrument));
        }
        if let Some(instrument) = instruments.iter().find(|i| !i.envelope.is_valid()) {
            return Err(CatalogError::InvalidEnvelope {
                name: instrument.name,
            });
        }
        for (patch, &index) in instrument_patches.iter().enumerate() {
            if index as usize >= instruments.len() {
                return Err(CatalogError::InstrumentPatchOutOfRange { patch, index });
            }
        }
        for strike in &percussion {
            let len = strike.waveform.len();
            if !(2..=MAX_PERCUSSION_POINTS).contains(&len) {
                return Err(CatalogError::PercussionLength {
                    name: strike.name,
                    len,
                });
            }
            if strike.rate == 0 {
                return Err(CatalogError::PercussionRate { name: strike.name });
            }
        }
        if !percussion.is_empty() {
            for (note, &index) in percussion_patches.iter().enumerate() {
                if index as usize >= percussion.len() {
                    return Err(CatalogError::PercussionPatchOutOfRange { note, index });
                }
            }
        }

        Ok(Self {
            instruments,
            percussion,
            instrument_patches,
            percussion_patches,
            default_instrument,
        })
    }

    pub fn instrument(&self, index: u8) -> Option<&Instrument> {
        self.instruments.get(index as usize)
    }

    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }

    pub fn percussion_count(&self) -> usize {
        self.percussion.len()
    }

    /// Instrument every generator starts with
    pub fn default_instrument(&self) -> u8 {
        self.default_instrument
    }

    /// Catalog instrument index for a score patch number (bit 7 ignored)
    pub fn instrument_for_patch(&self, patch: u8) -> u8 {
        self.instrument_patches[(patch & 0x7F) as usize]
    }

    /// Percussion strike for a percussion key (score note minus 128)
    pub fn percussion_for_key(&self, key: u8) -> Option<&Percussion> {
        let index = self.percussion_patches[(key & 0x7F) as usize];
        self.percussion.get(index as usize)
    }
}
