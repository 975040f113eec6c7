//! 1-up/1-down adaptive staircase — the run's state machine.
//!
//! Each correct answer lowers the SNR by one increment (harder), each
//! wrong answer raises it by one increment (easier), clamped to the
//! configured range. The track converges on the ~50%-correct point. A run
//! is a fixed number of scored presentations; there is no early stopping
//! and no reversal-count termination.
//!
//! The state machine is an append-only event log plus derived fields:
//! [`RunState::replay`] rebuilds a run from its history, verifying that
//! every recorded level obeys the staircase rule.

use crate::catalogue::{CatalogueError, StimulusCatalogue};
use crate::domain::{
    ConfigError, Digits, PartialDigits, StimulusId, TestConfig, TrialRecord,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from driving a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StaircaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error("run already has all {0} presentations")]
    RunComplete(u32),

    #[error("no stimulus has been presented for this trial")]
    NoStimulusPresented,

    #[error("current stimulus is still awaiting a response")]
    ResponsePending,

    #[error("partial keypad entry in progress; batch entry requires an empty buffer")]
    EntryInProgress,

    #[error("'{0}' is not a digit")]
    InvalidDigit(char),

    #[error("history is not a valid staircase log at sequence_index {sequence_index}")]
    ReplayMismatch { sequence_index: u32 },
}

/// The stimulus chosen for the trial currently awaiting a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentedStimulus {
    pub id: StimulusId,
    pub label: Digits,
    pub level: i32,
}

/// Always-safe progress read path for hosts (progress bars, session UIs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub presentations_done: u32,
    pub total_presentations: u32,
    pub done: bool,
}

/// The level the staircase presents after a scored trial.
///
/// Correct answers step down (harder), wrong answers step up (easier),
/// clamped to `[min_level, max_level]`. Saturation at the clamps is
/// intentional: a listener far outside the normal range sticks at an
/// extreme rather than erroring.
pub fn next_level(config: &TestConfig, previous: &TrialRecord) -> i32 {
    if previous.is_fully_correct {
        (previous.level - config.increment).max(config.min_level)
    } else {
        (previous.level + config.increment).min(config.max_level)
    }
}

/// Uniformly random stimulus choice at a level.
///
/// An empty level is a content-configuration error and is surfaced, never
/// skipped.
pub fn select_stimulus<R: Rng>(
    level: i32,
    catalogue: &dyn StimulusCatalogue,
    rng: &mut R,
) -> Result<StimulusId, CatalogueError> {
    let ids = catalogue.stimuli_at(level);
    ids.choose(rng)
        .cloned()
        .ok_or(CatalogueError::NoStimulusAvailable { level })
}

/// Mutable state of one run.
///
/// Mutations happen only through `present` and the `record_*` methods;
/// `history` is append-only. After `total_presentations` scored trials the
/// state is terminal and both mutating paths error.
#[derive(Debug, Clone)]
pub struct RunState {
    config: TestConfig,
    current_level: i32,
    presentations_done: u32,
    pending_response: PartialDigits,
    current_stimulus: Option<PresentedStimulus>,
    history: Vec<TrialRecord>,
}

impl RunState {
    /// Start a run at `starting_level`. Validates the config.
    pub fn new(config: TestConfig) -> Result<Self, StaircaseError> {
        config.validate()?;
        let current_level = config.starting_level;
        Ok(Self {
            config,
            current_level,
            presentations_done: 0,
            pending_response: PartialDigits::new(),
            current_stimulus: None,
            history: Vec::new(),
        })
    }

    /// Rebuild a run from a persisted trial log.
    ///
    /// Verifies the log is a valid staircase trace: contiguous 1-based
    /// sequence indices, first level equal to `starting_level`, and every
    /// subsequent level produced by the 1-up/1-down rule. A log that fails
    /// verification was not produced by this config and is rejected.
    pub fn replay(config: TestConfig, history: Vec<TrialRecord>) -> Result<Self, StaircaseError> {
        config.validate()?;
        if history.len() > config.total_presentations as usize {
            return Err(StaircaseError::RunComplete(config.total_presentations));
        }

        let mut expected_level = config.starting_level;
        for (i, trial) in history.iter().enumerate() {
            let expected_index = i as u32 + 1;
            if trial.sequence_index != expected_index || trial.level != expected_level {
                return Err(StaircaseError::ReplayMismatch {
                    sequence_index: trial.sequence_index,
                });
            }
            expected_level = next_level(&config, trial);
        }

        Ok(Self {
            current_level: expected_level,
            presentations_done: history.len() as u32,
            pending_response: PartialDigits::new(),
            current_stimulus: None,
            history,
            config,
        })
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// SNR of the next (or pending) presentation.
    pub fn current_level(&self) -> i32 {
        self.current_level
    }

    pub fn history(&self) -> &[TrialRecord] {
        &self.history
    }

    pub fn presentations_done(&self) -> u32 {
        self.presentations_done
    }

    /// The stimulus awaiting a response, if one has been presented.
    pub fn current_stimulus(&self) -> Option<&PresentedStimulus> {
        self.current_stimulus.as_ref()
    }

    /// Digits entered so far for the pending trial.
    pub fn pending_response(&self) -> &PartialDigits {
        &self.pending_response
    }

    pub fn done(&self) -> bool {
        self.presentations_done >= self.config.total_presentations
    }

    pub fn progress(&self) -> Progress {
        Progress {
            presentations_done: self.presentations_done,
            total_presentations: self.config.total_presentations,
            done: self.done(),
        }
    }

    /// Select and present the next stimulus at the current level.
    ///
    /// Errors if the run is complete or a presented stimulus is still
    /// awaiting its response.
    pub fn present<R: Rng>(
        &mut self,
        catalogue: &dyn StimulusCatalogue,
        rng: &mut R,
    ) -> Result<&PresentedStimulus, StaircaseError> {
        if self.done() {
            return Err(StaircaseError::RunComplete(self.config.total_presentations));
        }
        if self.current_stimulus.is_some() {
            return Err(StaircaseError::ResponsePending);
        }

        let id = select_stimulus(self.current_level, catalogue, rng)?;
        let label = catalogue.label_of(&id)?;
        self.current_stimulus = Some(PresentedStimulus {
            id,
            label,
            level: self.current_level,
        });
        Ok(self.current_stimulus.as_ref().expect("just presented"))
    }

    /// Record one keypad digit for the pending trial.
    ///
    /// Returns the scored record once the third digit lands, `None` while
    /// the entry is still partial. Invalid keystrokes are rejected before
    /// any state changes.
    pub fn record_digit(&mut self, digit: char) -> Result<Option<&TrialRecord>, StaircaseError> {
        if self.current_stimulus.is_none() {
            return Err(StaircaseError::NoStimulusPresented);
        }
        if !digit.is_ascii_digit() {
            return Err(StaircaseError::InvalidDigit(digit));
        }
        // Cannot fail: digit validated, buffer cannot be full because a
        // complete buffer is scored and cleared immediately below.
        self.pending_response
            .push(digit)
            .map_err(|_| StaircaseError::InvalidDigit(digit))?;

        if self.pending_response.is_complete() {
            let response = self
                .pending_response
                .complete()
                .expect("buffer is complete");
            self.score(response)?;
            return Ok(self.history.last());
        }
        Ok(None)
    }

    /// Record a complete 3-digit response at once.
    ///
    /// Produces a record identical to entering the same digits one at a
    /// time. Rejected while a partial keypad entry is in progress.
    pub fn record_triplet(&mut self, response: Digits) -> Result<&TrialRecord, StaircaseError> {
        if self.current_stimulus.is_none() {
            return Err(StaircaseError::NoStimulusPresented);
        }
        if !self.pending_response.is_empty() {
            return Err(StaircaseError::EntryInProgress);
        }
        self.score(response)?;
        Ok(self.history.last().expect("score appends a record"))
    }

    /// Clear a partial keypad entry (the keypad's "X" key).
    pub fn clear_entry(&mut self) {
        self.pending_response.clear();
    }

    fn score(&mut self, response: Digits) -> Result<(), StaircaseError> {
        let presented = self
            .current_stimulus
            .take()
            .ok_or(StaircaseError::NoStimulusPresented)?;

        let record = TrialRecord::score(
            presented.level,
            self.presentations_done + 1,
            presented.label,
            response,
        );
        self.current_level = next_level(&self.config, &record);
        self.history.push(record);
        self.presentations_done += 1;
        self.pending_response.clear();
        Ok(())
    }
}
