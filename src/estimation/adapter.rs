//! Adapter that exposes a RegArch likelihood as an `argmin` problem.
//!
//! The solver minimizes `c(θ) = −LLH(θ)/n`. Each evaluation loads `θ` into a
//! clone of the template model, refilters a clone of the data, and returns the
//! scaled negative log-likelihood or its analytic gradient. Averaging keeps the
//! objective and gradient O(1) in the sample size, which keeps the first unit
//! step of L-BFGS inside the region where variances stay positive.
use crate::{
    estimation::{
        errors::{EstimError, EstimResult},
        types::{Cost, Grad, Theta},
    },
    regarch::{
        core::RegArchValue,
        models::{RegArchModel, grad_llh, llh},
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Bridges a [`RegArchModel`] and its data to argmin's `CostFunction` and
/// `Gradient`.
#[derive(Debug, Clone)]
pub struct RegArchProblem<'a> {
    model: &'a RegArchModel,
    value: &'a RegArchValue,
    scale: f64,
}

impl<'a> RegArchProblem<'a> {
    pub fn new(model: &'a RegArchModel, value: &'a RegArchValue) -> Self {
        let scale = 1.0 / value.len().max(1) as f64;
        Self { model, value, scale }
    }

    /// `1/n`, the factor between the log-likelihood and the solver objective.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Whole-sample log-likelihood at `theta`.
    ///
    /// # Errors
    /// - [`EstimError::Model`] if `theta` has the wrong length or the data
    ///   fail the model's checks.
    /// - [`EstimError::NonFiniteCost`] if the likelihood is not finite.
    pub fn llh(&self, theta: &Theta) -> EstimResult<f64> {
        let model = self.load(theta)?;
        let value = llh(&model, &mut self.value.clone())?;
        if !value.is_finite() {
            return Err(EstimError::NonFiniteCost { value });
        }
        Ok(value)
    }

    /// Whole-sample analytic gradient at `theta`.
    ///
    /// # Errors
    /// - [`EstimError::Model`] as for [`RegArchProblem::llh`].
    /// - [`EstimError::GradientDimMismatch`] / [`EstimError::InvalidGradient`]
    ///   for a malformed gradient.
    pub fn grad_llh(&self, theta: &Theta) -> EstimResult<Grad> {
        let model = self.load(theta)?;
        let grad = grad_llh(&model, &mut self.value.clone())?;
        validate_grad(&grad, theta.len())?;
        Ok(grad)
    }

    fn load(&self, theta: &Theta) -> EstimResult<RegArchModel> {
        let mut model = self.model.clone();
        model.vector_to_param(theta, 0)?;
        Ok(model)
    }
}

impl CostFunction for RegArchProblem<'_> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(-self.llh(theta)? * self.scale)
    }
}

impl Gradient for RegArchProblem<'_> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let scale = self.scale;
        Ok(self.grad_llh(theta)?.mapv(|g| -g * scale))
    }
}

/// Reject gradients of the wrong length or with non-finite entries.
pub fn validate_grad(grad: &Grad, dim: usize) -> EstimResult<()> {
    if grad.len() != dim {
        return Err(EstimError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match grad.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(EstimError::InvalidGradient { index, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regarch::{
        mean::{CondMean, ConstMean},
        models::llh_and_grad_llh,
        residuals::Residuals,
        variance::{CondVar, ConstVar},
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Sign and scale conventions of the argmin bridge and its error paths.
    // -------------------------------------------------------------------------

    fn const_model() -> (RegArchModel, RegArchValue) {
        let model = RegArchModel::with_means(
            vec![CondMean::Const(ConstMean::new(0.0))],
            CondVar::Const(ConstVar::new(1.0)),
            Residuals::default(),
        )
        .unwrap();
        let value = RegArchValue::from_data(array![0.5, -1.0, 2.0, 0.25]).unwrap();
        (model, value)
    }

    #[test]
    // Purpose
    // -------
    // Cost and gradient are the averaged negatives of LLH and ∇LLH.
    //
    // Given
    // -----
    // - Const mean + const variance, 4 observations, θ = (0.3, 1.5).
    //
    // Expect
    // ------
    // - `cost = −LLH/4` and `gradient = −∇LLH/4`; the template model is
    //   unchanged.
    fn cost_and_gradient_are_scaled_negatives() {
        let (model, value) = const_model();
        let theta = array![0.3, 1.5];
        let problem = RegArchProblem::new(&model, &value);

        let mut reference = model.clone();
        reference.vector_to_param(&theta, 0).unwrap();
        let (l, g) = llh_and_grad_llh(&reference, &mut value.clone()).unwrap();

        assert_relative_eq!(problem.cost(&theta).unwrap(), -l / 4.0, epsilon = 1e-12);
        let cg = problem.gradient(&theta).unwrap();
        for k in 0..2 {
            assert_relative_eq!(cg[k], -g[k] / 4.0, epsilon = 1e-12);
        }
        assert_eq!(model.to_vector().unwrap(), array![0.0, 1.0]);
    }

    #[test]
    // Purpose
    // -------
    // Evaluation failures are reported, not swallowed.
    //
    // Expect
    // ------
    // - A negative variance gives a non-finite LLH → `NonFiniteCost`.
    // - A wrong-length θ → `Model(ParamLengthMismatch)`.
    fn invalid_points_are_errors() {
        let (model, value) = const_model();
        let problem = RegArchProblem::new(&model, &value);
        assert!(matches!(
            problem.llh(&array![0.0, -1.0]),
            Err(EstimError::NonFiniteCost { .. })
        ));
        assert!(matches!(problem.llh(&array![0.0]), Err(EstimError::Model(_))));
        assert!(problem.cost(&array![0.0, -1.0]).is_err());
    }
}
