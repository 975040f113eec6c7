//! Psychometric curve fitting — binned accuracy to a 4-parameter logistic.
//!
//! The model is `f(x) = gamma + (1 - gamma - lambda) * sigmoid((x - alpha) / beta)`:
//! `alpha` locates the curve, `beta` sets its width, `gamma` is the
//! guess-rate floor and `lambda` the lapse-rate ceiling. The reported
//! threshold is the SNR at which the fitted curve crosses 50% accuracy.

use crate::analysis::binning::{AccuracyMode, BinnedAccuracy, Binning};
use crate::analysis::lsq::{fit_bounded, Bounds, CurveModel, FitError};
use crate::analysis::{require_complete, EstimateError};
use dinlab_core::domain::{TestConfig, TrialRecord};
use serde::{Deserialize, Serialize};

/// Initial guess `(alpha, beta, gamma, lambda)`, from the reference
/// deployment's calibration against normal-hearing pilot data.
pub const INITIAL_GUESS: [f64; 4] = [-11.0, 0.65, 0.15, -0.0033];

/// Box bounds for `(alpha, beta, gamma, lambda)`.
pub const PARAM_BOUNDS: Bounds = Bounds {
    lower: [-30.0, 0.001, 1e-10, -0.1],
    upper: [0.0, 5.0, 1.0, 0.1],
};

/// The 4-parameter logistic psychometric function.
#[derive(Debug, Clone, Copy, Default)]
pub struct FourParamLogistic;

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl CurveModel for FourParamLogistic {
    fn value(&self, x: f64, p: &[f64; 4]) -> f64 {
        let [alpha, beta, gamma, lambda_] = *p;
        gamma + (1.0 - gamma - lambda_) * sigmoid((x - alpha) / beta)
    }

    fn gradient(&self, x: f64, p: &[f64; 4]) -> [f64; 4] {
        let [alpha, beta, gamma, lambda_] = *p;
        let z = (x - alpha) / beta;
        let s = sigmoid(z);
        let ds = s * (1.0 - s);
        let span = 1.0 - gamma - lambda_;
        [
            -span * ds / beta,
            -span * ds * z / beta,
            1.0 - s,
            -s,
        ]
    }
}

/// Fitted psychometric parameters for one accuracy definition.
///
/// Immutable once computed; one per run per [`AccuracyMode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsychometricFit {
    pub mode: AccuracyMode,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub lambda_: f64,
    /// SNR at which the fitted curve crosses 50% accuracy. `None` when
    /// the fitted floor or ceiling makes the curve never reach 50%.
    pub threshold_50: Option<f64>,
}

impl PsychometricFit {
    fn from_params(mode: AccuracyMode, p: [f64; 4]) -> Self {
        let [alpha, beta, gamma, lambda_] = p;
        // f(x) = 0.5  =>  x = alpha + beta * ln((0.5 - gamma) / (0.5 - lambda)).
        let ratio = (0.5 - gamma) / (0.5 - lambda_);
        let threshold_50 = (ratio.is_finite() && ratio > 0.0)
            .then(|| alpha + beta * ratio.ln());
        Self { mode, alpha, beta, gamma, lambda_, threshold_50 }
    }

    /// Evaluate the fitted curve.
    pub fn value(&self, x: f64) -> f64 {
        FourParamLogistic.value(x, &[self.alpha, self.beta, self.gamma, self.lambda_])
    }
}

/// Fit the psychometric function to a completed run.
///
/// Bins the trial log, fills the sparse extremes, and runs the bounded
/// least-squares fit. A non-converging fit is surfaced as
/// [`EstimateError::Fit`]; callers report it as a missing threshold next
/// to the raw binned data rather than substituting a default.
pub fn fit_psychometric(
    config: &TestConfig,
    history: &[TrialRecord],
    mode: AccuracyMode,
    binning: Binning,
) -> Result<PsychometricFit, EstimateError> {
    require_complete(history.len(), config.total_presentations)?;

    let binned = BinnedAccuracy::accumulate(binning, history);
    fit_binned(&binned, mode).map_err(EstimateError::from)
}

/// Fit directly from binned tallies (the pure tail of the pipeline).
pub fn fit_binned(binned: &BinnedAccuracy, mode: AccuracyMode) -> Result<PsychometricFit, FitError> {
    let xs = binned.binning.centers();
    let ys = binned.filled_proportions(mode);
    let params = fit_bounded(&FourParamLogistic, &xs, &ys, INITIAL_GUESS, PARAM_BOUNDS)?;
    Ok(PsychometricFit::from_params(mode, params))
}
