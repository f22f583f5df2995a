//! Playtune score player
//!
//! Renders Playtune bytestreams into 16-bit mono audio with a 16-voice
//! fixed-point wavetable synthesizer.
//!
//! ```
//! use playtune::{Catalog, EngineConfig, Playtune};
//!
//! # fn main() -> Result<(), playtune::ConfigError> {
//! let catalog = Catalog::builtin(44100);
//! let score = [0x90, 69, 0x01, 0xF4, 0x80, 0xF0]; // A4 for 500 ms
//! let mut engine = Playtune::new(EngineConfig::default(), &catalog)?;
//! engine.play(&score);
//!
//! let mut block = [0i16; 128];
//! while engine.is_playing() {
//!     engine.render(&mut block);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod generator;
pub mod pipeline;
pub mod wav;

pub use catalog::{Catalog, CatalogError, EnvelopeShape, Instrument, Percussion};
pub use config::{ConfigError, EngineConfig};
pub use generator::{GeneratorState, SignalGenerator};
pub use pipeline::{DecodeError, Playtune};
