//! Score playback pipeline
//!
//! - Score: decode the Playtune bytestream into events
//! - Sequencer: run events against the clock of rendered samples
//! - Mixer: the 16-voice bank and its saturating mix
//! - Engine: the host-facing render entry

pub mod engine;
pub mod mixer;
pub mod score;
pub mod sequencer;

pub use engine::Playtune;
pub use mixer::VoiceBank;
pub use score::{DecodeError, Event, ScoreHeader, ScoreReader};
pub use sequencer::Sequencer;
