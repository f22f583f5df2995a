//! Engine configuration
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//! ```toml
//! sample_rate = 48000
//! dynamic_volume = true
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::generator::XorShift8;

/// Settings read when the engine is created and at every score start
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Play percussion notes (note >= 128); ignored otherwise
    pub percussion_enabled: bool,
    /// Double percussion velocities, saturating at 127
    pub boost_percussion: bool,
    /// Shape melodic notes with their DAHDSR envelope
    pub envelope_enabled: bool,
    /// Attenuate by the number of voices sounding on the previous sample
    /// instead of by the score's generator count
    pub dynamic_volume: bool,
    /// Whether note-ons carry a velocity byte in scores without a header
    pub assume_velocity: bool,
    /// Seed of the phase randomiser (non-zero)
    pub seed: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            percussion_enabled: true,
            boost_percussion: false,
            envelope_enabled: true,
            dynamic_volume: false,
            assume_velocity: false,
            seed: XorShift8::DEFAULT_SEED,
        }
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid config file: {}", e),
            ConfigError::Invalid(s) => write!(f, "Invalid config value: {}", s),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be non-zero".to_string()));
        }
        if self.seed == 0 {
            return Err(ConfigError::Invalid("seed must be non-zero".to_string()));
        }
        Ok(())
    }
}
