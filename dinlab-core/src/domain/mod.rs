//! Domain types for the DIN test engine.

pub mod config;
pub mod digits;
pub mod ids;
pub mod trial;

pub use config::{ConfigError, TestConfig, MIN_TOTAL_PRESENTATIONS, SRT_TAIL_WINDOW};
pub use digits::{Digits, DigitsError, PartialDigits, TRIPLET_LEN};
pub use ids::{ConfigId, RunId, StimulusId};
pub use trial::TrialRecord;
