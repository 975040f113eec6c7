//! SRT tail average — the clinically reported point estimate.

use crate::analysis::{require_complete, EstimateError};
use dinlab_core::domain::{TestConfig, TrialRecord, SRT_TAIL_WINDOW};
use dinlab_core::staircase::next_level;

/// Speech reception threshold from a completed run.
///
/// Averages the levels of the last [`SRT_TAIL_WINDOW`] presentations plus
/// the one level the staircase would present next, 21 values in total. By
/// the end of a run the track oscillates around threshold, and folding in
/// the projected next level weights the final reversal the same as every
/// other. The windowing is fixed: prior-study baselines were computed
/// with exactly this average, so changing it would break comparability.
///
/// The computation is integer arithmetic until the final division, hence
/// bit-reproducible for a given history.
pub fn compute_srt(config: &TestConfig, history: &[TrialRecord]) -> Result<f64, EstimateError> {
    require_complete(history.len(), config.total_presentations)?;
    // A config that slipped past validation with fewer trials than the
    // window has no defined SRT.
    require_complete(history.len(), dinlab_core::domain::MIN_TOTAL_PRESENTATIONS)?;

    let last = history.last().expect("completed run is non-empty");
    let tail = &history[history.len() - SRT_TAIL_WINDOW..];

    let mut sum: i64 = tail.iter().map(|t| i64::from(t.level)).sum();
    sum += i64::from(next_level(config, last));

    Ok(sum as f64 / (SRT_TAIL_WINDOW as f64 + 1.0))
}
