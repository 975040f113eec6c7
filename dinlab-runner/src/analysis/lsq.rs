//! Box-constrained nonlinear least squares.
//!
//! Levenberg–Marquardt with projection onto the bound box: each damped
//! Gauss–Newton step is clamped to the box before evaluation, and
//! convergence is judged on the clamped step, so a parameter riding a
//! bound terminates cleanly instead of oscillating against it.
//!
//! Four parameters is all the psychometric model needs, so the normal
//! equations are a fixed 4x4 solve via Cholesky.

use nalgebra::{Matrix4, Vector4};
use thiserror::Error;

/// Number of parameters the solver handles.
pub const N_PARAMS: usize = 4;

const MAX_ITERATIONS: usize = 200;
const MAX_LAMBDA: f64 = 1e12;
const MIN_LAMBDA: f64 = 1e-12;
/// Relative step-size tolerance.
const XTOL: f64 = 1e-12;
/// Relative cost-decrease tolerance.
const FTOL: f64 = 1e-14;
/// Gradient infinity-norm tolerance.
const GTOL: f64 = 1e-12;
/// Floor for the Marquardt diagonal scaling.
const DIAG_FLOOR: f64 = 1e-12;

/// Errors from the bounded fit.
#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    /// The optimizer exhausted its iteration or damping budget without
    /// meeting tolerances. Surfaced to the caller; never silently
    /// replaced by a default parameter set.
    #[error("fit did not converge after {iterations} iterations (cost {cost:.6e})")]
    DidNotConverge { iterations: usize, cost: f64 },

    #[error("fit needs at least {N_PARAMS} data points, got {points}")]
    InsufficientData { points: usize },

    #[error("x and y lengths differ: {xs} vs {ys}")]
    MismatchedData { xs: usize, ys: usize },
}

/// A parametric curve the solver can fit: value and parameter gradient
/// at a point.
///
/// Keeping the optimizer behind this seam makes it swappable — any
/// box-constrained least-squares implementation can stand in without the
/// fitting pipeline noticing.
pub trait CurveModel {
    fn value(&self, x: f64, params: &[f64; N_PARAMS]) -> f64;
    fn gradient(&self, x: f64, params: &[f64; N_PARAMS]) -> [f64; N_PARAMS];
}

/// Box constraints, one closed interval per parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: [f64; N_PARAMS],
    pub upper: [f64; N_PARAMS],
}

impl Bounds {
    fn clamp(&self, p: Vector4<f64>) -> Vector4<f64> {
        Vector4::from_fn(|i, _| p[i].clamp(self.lower[i], self.upper[i]))
    }
}

/// Fit `model` to `(xs, ys)` by projected Levenberg–Marquardt.
///
/// The initial guess is clamped into the box before the first iteration.
/// Returns the parameter vector at convergence or
/// [`FitError::DidNotConverge`].
pub fn fit_bounded<M: CurveModel>(
    model: &M,
    xs: &[f64],
    ys: &[f64],
    initial: [f64; N_PARAMS],
    bounds: Bounds,
) -> Result<[f64; N_PARAMS], FitError> {
    if xs.len() != ys.len() {
        return Err(FitError::MismatchedData { xs: xs.len(), ys: ys.len() });
    }
    if xs.len() < N_PARAMS {
        return Err(FitError::InsufficientData { points: xs.len() });
    }

    let mut params = bounds.clamp(Vector4::from(initial));
    let mut cost = cost_of(model, xs, ys, &params);
    let mut lambda = 1e-3;

    for iteration in 0..MAX_ITERATIONS {
        let (jtj, jtr) = normal_equations(model, xs, ys, &params);

        if jtr.amax() < GTOL {
            return Ok(into_array(params));
        }

        // Inner loop: escalate damping until a step improves the cost or
        // the clamped step collapses to nothing.
        loop {
            let mut damped = jtj;
            for i in 0..N_PARAMS {
                damped[(i, i)] += lambda * jtj[(i, i)].max(DIAG_FLOOR);
            }

            let Some(chol) = damped.cholesky() else {
                lambda *= 10.0;
                if lambda > MAX_LAMBDA {
                    return Err(FitError::DidNotConverge { iterations: iteration, cost });
                }
                continue;
            };
            let delta = chol.solve(&jtr);
            let candidate = bounds.clamp(params + delta);
            let step = candidate - params;

            if step.norm() <= XTOL * (params.norm() + XTOL) {
                // Nothing left to move, possibly because the solution sits
                // on a bound. Converged.
                return Ok(into_array(candidate));
            }

            let new_cost = cost_of(model, xs, ys, &candidate);
            if new_cost < cost {
                let decrease = cost - new_cost;
                params = candidate;
                cost = new_cost;
                lambda = (lambda * 0.25).max(MIN_LAMBDA);
                if decrease <= FTOL * cost.max(f64::MIN_POSITIVE) {
                    return Ok(into_array(params));
                }
                break;
            }

            lambda *= 4.0;
            if lambda > MAX_LAMBDA {
                return Err(FitError::DidNotConverge { iterations: iteration, cost });
            }
        }
    }

    Err(FitError::DidNotConverge { iterations: MAX_ITERATIONS, cost })
}

fn into_array(v: Vector4<f64>) -> [f64; N_PARAMS] {
    [v[0], v[1], v[2], v[3]]
}

fn cost_of<M: CurveModel>(model: &M, xs: &[f64], ys: &[f64], params: &Vector4<f64>) -> f64 {
    let p = into_array(*params);
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| {
            let r = y - model.value(x, &p);
            r * r
        })
        .sum()
}

/// Accumulate JᵀJ and Jᵀr over all data points, where J is the Jacobian
/// of the model values and r the residual vector y - f(x).
fn normal_equations<M: CurveModel>(
    model: &M,
    xs: &[f64],
    ys: &[f64],
    params: &Vector4<f64>,
) -> (Matrix4<f64>, Vector4<f64>) {
    let p = into_array(*params);
    let mut jtj = Matrix4::zeros();
    let mut jtr = Vector4::zeros();

    for (&x, &y) in xs.iter().zip(ys) {
        let g = Vector4::from(model.gradient(x, &p));
        let r = y - model.value(x, &p);
        jtj += g * g.transpose();
        jtr += g * r;
    }
    (jtj, jtr)
}
