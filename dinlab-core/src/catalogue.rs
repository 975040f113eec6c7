//! Stimulus catalogue — the engine's read-only view of the recorded material.
//!
//! The catalogue is owned by the host (filesystem tree, database, bundle);
//! the engine only queries it. A level with no stimuli is a content error,
//! not a transient fault, and is surfaced as
//! [`CatalogueError::NoStimulusAvailable`].

use crate::domain::{Digits, StimulusId, TestConfig};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from catalogue queries and coverage checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogueError {
    /// No recording exists at the requested level. Fatal to the run: the
    /// stimulus set does not cover the test's level range.
    #[error("no stimulus available at level {level} dB")]
    NoStimulusAvailable { level: i32 },

    #[error("unknown stimulus {0}")]
    UnknownStimulus(StimulusId),

    /// Coverage check failure: a level in the configured range holds fewer
    /// recordings than the test expects.
    #[error("level {level} dB has {found} stimuli, expected {expected}")]
    IncompleteLevel { level: i32, found: usize, expected: usize },
}

/// Read-only stimulus lookup supplied by the host.
///
/// Implementations must be cheap to query and safe to share across
/// concurrently executing runs (`Sync`).
pub trait StimulusCatalogue: Sync {
    /// All stimulus ids available at the given level.
    fn stimuli_at(&self, level: i32) -> Vec<StimulusId>;

    /// Ground-truth digit triplet for a stimulus.
    fn label_of(&self, id: &StimulusId) -> Result<Digits, CatalogueError>;
}

/// Catalogue held entirely in memory.
///
/// The canonical implementation for tests, simulations, and hosts that
/// scan their audio tree at startup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogue {
    by_level: HashMap<i32, Vec<StimulusId>>,
    labels: HashMap<StimulusId, Digits>,
}

impl InMemoryCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one stimulus at a level.
    pub fn insert(&mut self, level: i32, id: StimulusId, label: Digits) {
        self.by_level.entry(level).or_default().push(id.clone());
        self.labels.insert(id, label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Verify that every level in the config's range holds the expected
    /// number of recordings.
    ///
    /// Mirrors the content-loading check of the reference deployment: a
    /// test must never go live over a partially populated stimulus set.
    pub fn check_coverage(&self, config: &TestConfig) -> Result<(), CatalogueError> {
        let expected = config.stimuli_per_level as usize;
        for level in config.levels() {
            let found = self.by_level.get(&level).map_or(0, Vec::len);
            if found != expected {
                return Err(CatalogueError::IncompleteLevel { level, found, expected });
            }
        }
        Ok(())
    }
}

impl StimulusCatalogue for InMemoryCatalogue {
    fn stimuli_at(&self, level: i32) -> Vec<StimulusId> {
        self.by_level.get(&level).cloned().unwrap_or_default()
    }

    fn label_of(&self, id: &StimulusId) -> Result<Digits, CatalogueError> {
        self.labels
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogueError::UnknownStimulus(id.clone()))
    }
}
