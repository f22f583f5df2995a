//! Score sequencer
//!
//! Walks the score one command at a time, dispatching notes to the voice
//! bank, and counts down waits in rendered samples.

use tracing::{debug, trace};

use crate::catalog::tables::{attenuation_for, MAX_GENERATORS};
use crate::config::EngineConfig;
use crate::pipeline::mixer::VoiceBank;
use crate::pipeline::score::{Event, ScoreHeader, ScoreReader};

/// Playback state for one score
#[derive(Debug, Clone)]
pub struct Sequencer<'a> {
    reader: ScoreReader<'a>,
    sample_rate: u32,
    assume_velocity: bool,
    /// Samples left before decoding resumes
    wait_remaining: u32,
    playing: bool,
    generator_count: usize,
    attenuation: i32,
}

impl<'a> Sequencer<'a> {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            reader: ScoreReader::new(&[], config.assume_velocity),
            sample_rate: config.sample_rate,
            assume_velocity: config.assume_velocity,
            wait_remaining: 0,
            playing: false,
            generator_count: MAX_GENERATORS,
            attenuation: attenuation_for(MAX_GENERATORS),
        }
    }

    /// Begin playing `score` from its first command
    ///
    /// Silences the bank, gives every generator the default instrument and
    /// runs every command up to the first wait.
    ///
    /// # Arguments
    /// * `score` - complete bytestream, optional header included
    /// * `generator_count` - overrides the header's generator count
    pub fn start(&mut self, score: &'a [u8], generator_count: Option<u8>, bank: &mut VoiceBank<'a>) {
        if self.playing {
            self.stop(bank);
        }
        bank.silence_all();
        bank.reset_instruments();

        self.reader = ScoreReader::new(score, self.assume_velocity);
        let header = self.reader.header().copied();
        if let Some(ScoreHeader {
            header_length,
            flags1,
            generator_count: declared,
            ..
        }) = header
        {
            debug!(header_length, flags1, declared, "score header");
        }

        let requested = generator_count
            .or(header.map(|h| h.generator_count))
            .unwrap_or(MAX_GENERATORS as u8);
        self.generator_count = (requested as usize).clamp(1, MAX_GENERATORS);
        self.attenuation = attenuation_for(self.generator_count);
        self.wait_remaining = 0;
        self.playing = true;

        debug!(
            bytes = score.len(),
            generators = self.generator_count,
            velocity = self.reader.velocity_present(),
            "score started"
        );
        self.advance_events(bank);
    }

    /// Stop playback and silence every voice
    pub fn stop(&mut self, bank: &mut VoiceBank<'a>) {
        if self.playing {
            debug!(position = self.reader.position(), "score stopped");
        }
        self.playing = false;
        self.wait_remaining = 0;
        bank.silence_all();
    }

    /// Run commands until a non-zero wait or the end of playback
    ///
    /// A stream that restarts without ever waiting never returns.
    pub fn advance_events(&mut self, bank: &mut VoiceBank<'a>) {
        while self.playing {
            let event = match self.reader.next_event() {
                Ok(event) => event,
                Err(err) => {
                    debug!(%err, "score ended without a stop command");
                    self.stop(bank);
                    return;
                }
            };

            match event {
                Event::Wait { millis } => {
                    let samples = (millis as u64 * self.sample_rate as u64 / 1000) as u32;
                    if samples > 0 {
                        self.wait_remaining = samples;
                        return;
                    }
                }
                Event::NoteOn {
                    generator,
                    note,
                    velocity,
                } => bank.note_on(generator, note, velocity),
                Event::NoteOff { generator } => bank.note_off(generator),
                Event::SetInstrument { generator, patch } => bank.change_patch(generator, patch),
                Event::Restart => {
                    trace!(position = self.reader.start_position(), "score restart");
                    self.reader.rewind();
                }
                Event::Stop => self.stop(bank),
                Event::Reserved { opcode } => trace!(opcode, "reserved command ignored"),
            }
        }
    }

    /// Account for one rendered sample, decoding more commands when the
    /// current wait has elapsed
    #[inline]
    pub fn tick(&mut self, bank: &mut VoiceBank<'a>) {
        if self.playing && self.wait_remaining == 0 {
            self.advance_events(bank);
        }
    }

    /// Consume one sample of the current wait
    #[inline]
    pub fn elapse(&mut self) {
        self.wait_remaining = self.wait_remaining.saturating_sub(1);
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn generator_count(&self) -> usize {
        self.generator_count
    }

    /// Q16 gain applied to every voice before mixing
    pub fn attenuation(&self) -> i32 {
        self.attenuation
    }

    pub fn wait_remaining(&self) -> u32 {
        self.wait_remaining
    }

    pub fn header(&self) -> Option<&ScoreHeader> {
        self.reader.header()
    }

    /// Offset of the next command in the score
    pub fn position(&self) -> usize {
        self.reader.position()
    }
}
