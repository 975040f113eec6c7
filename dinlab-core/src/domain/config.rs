//! Test configuration — the fixed parameters of one DIN test variant.

use crate::domain::ConfigId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The SRT tail average uses the last 20 presented levels plus the one
/// level the staircase would present next. Runs shorter than the window
/// plus that projected level have no defined SRT, so configuration
/// validation rejects them up front.
pub const SRT_TAIL_WINDOW: usize = 20;

/// Minimum run length for which the SRT estimate is defined.
pub const MIN_TOTAL_PRESENTATIONS: u32 = SRT_TAIL_WINDOW as u32 + 1;

/// Errors from validating a [`TestConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("increment must be positive, got {0}")]
    NonPositiveIncrement(i32),

    #[error("min_level {min} must be below max_level {max}")]
    EmptyLevelRange { min: i32, max: i32 },

    #[error("starting_level {starting} outside [{min}, {max}]")]
    StartingLevelOutOfRange { starting: i32, min: i32, max: i32 },

    #[error(
        "total_presentations {0} below minimum {MIN_TOTAL_PRESENTATIONS} \
         required by the SRT tail average"
    )]
    TooFewPresentations(u32),

    #[error("level range [{min}, {max}] is not a whole number of increments of {increment}")]
    MisalignedRange { min: i32, max: i32, increment: i32 },
}

/// Parameters of a single DIN test variant.
///
/// Serializable to/from TOML so deployments can ship test definitions as
/// config files. Defaults match the reference Dutch 24-trial test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Human-readable test name, also the persistence key prefix.
    pub name: String,
    /// ISO 639-1 language code of the spoken material.
    pub language: String,
    /// Fixed run length; the staircase has no other termination condition.
    pub total_presentations: u32,
    /// SNR of the very first presentation, in dB.
    pub starting_level: i32,
    /// Staircase step size, in dB.
    pub increment: i32,
    /// Hardest (lowest SNR) level the staircase may reach.
    pub min_level: i32,
    /// Easiest (highest SNR) level the staircase may reach.
    pub max_level: i32,
    /// Expected number of recordings per level; used by catalogue
    /// coverage checks, not by the staircase itself.
    pub stimuli_per_level: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            name: "din".to_string(),
            language: "nl".to_string(),
            total_presentations: 24,
            starting_level: 0,
            increment: 2,
            min_level: -20,
            max_level: 10,
            stimuli_per_level: 128,
        }
    }
}

impl TestConfig {
    /// Validate the parameter set.
    ///
    /// Called by `RunState::new`, so an invalid config can never start a
    /// run; hosts loading configs from files should also call it directly
    /// to fail at load time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.increment <= 0 {
            return Err(ConfigError::NonPositiveIncrement(self.increment));
        }
        if self.min_level >= self.max_level {
            return Err(ConfigError::EmptyLevelRange {
                min: self.min_level,
                max: self.max_level,
            });
        }
        if self.starting_level < self.min_level || self.starting_level > self.max_level {
            return Err(ConfigError::StartingLevelOutOfRange {
                starting: self.starting_level,
                min: self.min_level,
                max: self.max_level,
            });
        }
        if self.total_presentations < MIN_TOTAL_PRESENTATIONS {
            return Err(ConfigError::TooFewPresentations(self.total_presentations));
        }
        if (self.max_level - self.min_level) % self.increment != 0 {
            return Err(ConfigError::MisalignedRange {
                min: self.min_level,
                max: self.max_level,
                increment: self.increment,
            });
        }
        Ok(())
    }

    /// All levels the staircase can visit, hardest first.
    pub fn levels(&self) -> impl Iterator<Item = i32> + '_ {
        (0..).map(|i| self.min_level + i * self.increment)
            .take_while(|&l| l <= self.max_level)
    }

    /// Computes a deterministic content-address for this configuration.
    ///
    /// Two deployments running byte-identical parameters get the same ID,
    /// which makes stored sessions comparable across sites.
    pub fn config_id(&self) -> ConfigId {
        let json = serde_json::json!({
            "name": &self.name,
            "language": &self.language,
            "total_presentations": self.total_presentations,
            "starting_level": self.starting_level,
            "increment": self.increment,
            "min_level": self.min_level,
            "max_level": self.max_level,
            "stimuli_per_level": self.stimuli_per_level,
        });
        let hash = blake3::hash(json.to_string().as_bytes());
        ConfigId::from_hash(&hash.to_hex().to_string())
    }
}
