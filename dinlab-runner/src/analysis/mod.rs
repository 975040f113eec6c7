//! Threshold estimation — pure functions over a completed trial log.
//!
//! Two estimators, kept deliberately independent:
//! - [`srt::compute_srt`] — the tail-average SRT used for clinical
//!   comparability with prior studies
//! - [`psychometric::fit_psychometric`] — binned accuracy fitted with a
//!   4-parameter logistic via bounded least squares
//!
//! Both reject runs that have not reached their configured length;
//! partial-progress inspection goes through `RunState::progress`, never
//! through here.

pub mod binning;
pub mod lsq;
pub mod psychometric;
pub mod srt;

pub use binning::{AccuracyMode, BinnedAccuracy, BinnedProportions, Binning, BinningError};
pub use lsq::{fit_bounded, Bounds, CurveModel, FitError};
pub use psychometric::{fit_binned, fit_psychometric, FourParamLogistic, PsychometricFit};
pub use srt::compute_srt;

use thiserror::Error;

/// Errors from requesting final estimates.
#[derive(Debug, Error, PartialEq)]
pub enum EstimateError {
    /// Estimate requested before the run reached its fixed length.
    /// Callers must check `RunState::done` first.
    #[error("run has {have} of {need} presentations; estimates need a completed run")]
    IncompleteHistory { have: usize, need: u32 },

    #[error(transparent)]
    Fit(#[from] FitError),
}

pub(crate) fn require_complete(
    have: usize,
    need: u32,
) -> Result<(), EstimateError> {
    if have < need as usize {
        return Err(EstimateError::IncompleteHistory { have, need });
    }
    Ok(())
}
