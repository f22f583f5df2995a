//! Host-facing engine
//!
//! Ties the sequencer to the voice bank and renders blocks of mixed
//! samples. Rendering never allocates.

use crate::catalog::Catalog;
use crate::config::{ConfigError, EngineConfig};
use crate::generator::{GeneratorState, SignalGenerator};
use crate::pipeline::mixer::VoiceBank;
use crate::pipeline::score::ScoreHeader;
use crate::pipeline::sequencer::Sequencer;

/// Playtune score player and 16-voice synthesizer
///
/// Borrows the score and catalog for `'a`; all playback state lives here.
pub struct Playtune<'a> {
    config: EngineConfig,
    sequencer: Sequencer<'a>,
    bank: VoiceBank<'a>,
}

impl<'a> Playtune<'a> {
    /// Create an idle engine
    ///
    /// # Arguments
    /// * `config` - engine settings; the sample rate must match the host's
    /// * `catalog` - instruments and percussion the scores play with
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a zero sample rate or seed.
    pub fn new(config: EngineConfig, catalog: &'a Catalog) -> Result<Self, ConfigError> {
        config.validate()?;
        let sequencer = Sequencer::new(&config);
        let bank = VoiceBank::new(&config, catalog);
        Ok(Self {
            config,
            sequencer,
            bank,
        })
    }

    /// Start playing a score with the generator count from its header
    /// (16 without one)
    pub fn play(&mut self, score: &'a [u8]) {
        self.start(score, None);
    }

    /// Start playing a score, stopping whatever was playing
    ///
    /// Commands before the first wait take effect before the next rendered
    /// sample.
    pub fn start(&mut self, score: &'a [u8], generator_count: Option<u8>) {
        self.sequencer.start(score, generator_count, &mut self.bank);
    }

    /// Whether the score is still being played
    ///
    /// Voices may still be sounding after the score stopped; see
    /// [`SignalGenerator::is_complete`].
    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    /// Stop the score; every voice is silent from the next sample
    pub fn stop(&mut self) {
        self.sequencer.stop(&mut self.bank);
    }

    /// Fill `block` with mixed output
    pub fn render(&mut self, block: &mut [i16]) {
        let generator_count = self.sequencer.generator_count();
        for sample in block.iter_mut() {
            self.sequencer.tick(&mut self.bank);
            *sample = self
                .bank
                .mix_sample(generator_count, self.sequencer.attenuation());
            self.sequencer.elapse();
        }
    }

    /// Start a note outside of any score
    pub fn note_on(&mut self, generator: u8, note: u8, velocity: u8) {
        self.bank.note_on(generator, note, velocity);
    }

    pub fn note_off(&mut self, generator: u8) {
        self.bank.note_off(generator);
    }

    /// Assign a catalog instrument index to a generator
    pub fn set_instrument(&mut self, generator: u8, instrument: u8) {
        self.bank.set_instrument(generator, instrument);
    }

    /// Generators mixed for the current score
    pub fn generator_count(&self) -> usize {
        self.sequencer.generator_count()
    }

    /// Voices currently sounding among the mixed generators
    pub fn active_voices(&self) -> usize {
        self.bank.active_count(self.sequencer.generator_count())
    }

    pub fn header(&self) -> Option<&ScoreHeader> {
        self.sequencer.header()
    }

    pub fn voices(&self) -> &VoiceBank<'a> {
        &self.bank
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl SignalGenerator for Playtune<'_> {
    type Sample = i16;

    fn process(&mut self, buffer: &mut [i16]) -> GeneratorState {
        self.render(buffer);
        if self.is_complete() {
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn is_complete(&self) -> bool {
        !self.is_playing() && self.active_voices() == 0
    }

    fn reset(&mut self) {
        self.stop();
    }
}
