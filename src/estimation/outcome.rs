//! Normalized result of a likelihood maximization.
use crate::estimation::{
    errors::{EstimError, EstimResult},
    types::{FnEvalMap, Grad, Theta},
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;

/// Result returned by [`fit`](crate::estimation::fit).
///
/// - `theta_hat`: best parameter vector found (model layout).
/// - `value`: log-likelihood `LLH(θ̂)` over the whole sample.
/// - `converged`: `true` for any termination other than `NotTerminated`.
/// - `status`: termination status as text.
/// - `iterations`: optimizer iterations performed.
/// - `fn_evals`: argmin evaluation counters.
/// - `grad_norm`: `‖∇LLH(θ̂)‖₂` from the last stored gradient, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build an outcome from raw solver state.
    ///
    /// `grad` is the log-likelihood gradient (already rescaled to the whole
    /// sample).
    ///
    /// # Errors
    /// - [`EstimError::MissingThetaHat`] / [`EstimError::InvalidThetaHat`] for
    ///   an absent or non-finite estimate.
    /// - [`EstimError::NonFiniteCost`] for a non-finite value.
    pub fn new(
        theta_hat: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> EstimResult<Self> {
        let theta_hat = theta_hat.ok_or(EstimError::MissingThetaHat)?;
        if let Some((index, &value)) = theta_hat.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(EstimError::InvalidThetaHat { index, value });
        }
        if !value.is_finite() {
            return Err(EstimError::NonFiniteCost { value });
        }
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm: grad.map(|g| g.l2_norm()),
        })
    }
}
