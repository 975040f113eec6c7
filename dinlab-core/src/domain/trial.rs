//! Trial record — one scored presentation in a run's append-only history.

use crate::domain::Digits;
use serde::{Deserialize, Serialize};

/// One completed presentation: what was played, what was answered, and how
/// the answer scored.
///
/// Records are immutable once appended; correctness fields are computed at
/// construction so a persisted history never needs re-scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// SNR at which the triplet was presented, in dB.
    pub level: i32,
    /// 1-based position within the run.
    pub sequence_index: u32,
    /// Ground-truth triplet of the presented stimulus.
    pub target: Digits,
    /// The listener's complete response.
    pub response: Digits,
    /// Positionwise matches, 0..=3. Partial credit per digit, used by the
    /// per-digit psychometric fit.
    pub correct_count: u8,
    /// Exact match. Drives the staircase and the per-triplet fit.
    pub is_fully_correct: bool,
}

impl TrialRecord {
    /// Score a completed response against the presented target.
    pub fn score(level: i32, sequence_index: u32, target: Digits, response: Digits) -> Self {
        let correct_count = target.matching_positions(&response);
        let is_fully_correct = target == response;
        Self {
            level,
            sequence_index,
            target,
            response,
            correct_count,
            is_fully_correct,
        }
    }
}
