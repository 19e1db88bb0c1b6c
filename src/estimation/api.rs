//! High-level entry point: fit a [`RegArchModel`] by maximum likelihood.
//!
//! [`fit`] starts from the model's current parameters, runs L-BFGS with the
//! analytic gradient on `−LLH/n`, loads the best parameters back into the model
//! and returns a normalized [`OptimOutcome`].
use crate::{
    estimation::{
        adapter::RegArchProblem,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        errors::{EstimError, EstimResult},
        options::{LineSearcher, MLEOptions},
        outcome::OptimOutcome,
        types::{Grad, Theta},
    },
    regarch::{core::RegArchValue, models::RegArchModel},
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Maximize the log-likelihood of `model` on `value`.
///
/// On success the model holds `θ̂`; on error it is left untouched.
///
/// # Errors
/// - [`EstimError::Model`] if the data fail the model's checks.
/// - [`EstimError::InvalidStartingPoint`] for non-finite starting parameters.
/// - [`EstimError::NonFiniteCost`] if the likelihood is not finite at the
///   start or at a point visited by the line search.
/// - Solver and outcome errors from [`run_lbfgs`].
pub fn fit(
    model: &mut RegArchModel, value: &RegArchValue, opts: &MLEOptions,
) -> EstimResult<OptimOutcome> {
    model.check_data(value)?;
    let theta0 = model.to_vector()?;
    if let Some((index, &v)) = theta0.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(EstimError::InvalidStartingPoint { index, value: v });
    }

    let outcome = {
        let problem = RegArchProblem::new(model, value);
        problem.llh(&theta0)?;
        match opts.line_searcher {
            LineSearcher::MoreThuente => {
                run_lbfgs(theta0, opts, problem, build_optimizer_more_thuente(opts)?)?
            }
            LineSearcher::HagerZhang => {
                run_lbfgs(theta0, opts, problem, build_optimizer_hager_zhang(opts)?)?
            }
        }
    };
    model.vector_to_param(&outcome.theta_hat, 0)?;
    Ok(outcome)
}

/// Fit from the components' default starting point for `value`.
///
/// Data-sized blocks (variance-regressor coefficients) are synced to `value`
/// first.
///
/// # Errors
/// As for [`fit`].
pub fn fit_from_default_init(
    model: &mut RegArchModel, value: &RegArchValue, opts: &MLEOptions,
) -> EstimResult<OptimOutcome> {
    model.sync_size_param(value)?;
    model.set_default_init_point(value)?;
    fit(model, value, opts)
}

/// Run an L-BFGS solver on a [`RegArchProblem`].
///
/// With the `obs_slog` feature and `opts.verbose`, the starting log-likelihood
/// is printed and a terminal slog observer is attached.
///
/// # Errors
/// - argmin runtime errors, including errors raised by the objective.
/// - Outcome validation errors.
pub fn run_lbfgs<'a, S>(
    theta0: Theta, opts: &MLEOptions, problem: RegArchProblem<'a>, solver: S,
) -> EstimResult<OptimOutcome>
where
    S: argmin::core::Solver<
            RegArchProblem<'a>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    let scale = problem.scale();
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver).configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient().map(|g| g.mapv(|x| -x / scale));
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost() / scale,
        termination,
        iterations,
        function_counts,
        grad,
    )
}

#[cfg(feature = "obs_slog")]
fn log_initial_state(theta0: &Theta, problem: &RegArchProblem<'_>) -> EstimResult<()> {
    let llh0 = -problem.cost(theta0)? / problem.scale();
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm() / problem.scale());
    eprintln!(
        "init: llh(theta0) = {:.6}{}",
        llh0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        estimation::options::Tolerances,
        regarch::{
            mean::{Ar, CondMean, ConstMean},
            models::simulate,
            residuals::Residuals,
            variance::{CondVar, ConstVar},
        },
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // End-to-end maximization on models whose MLE is known or well
    // identified: closed-form Gaussian location/scale, and AR(1) with constant
    // variance on a simulated path.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Gaussian location/scale MLE is the sample mean and population variance.
    //
    // Given
    // -----
    // - Const mean + const variance, Normal residuals, fixed data; start at
    //   (0, 1); More–Thuente with a tight gradient tolerance.
    //
    // Expect
    // ------
    // - θ̂ matches the closed form; the model holds θ̂; converged.
    fn location_scale_matches_closed_form() {
        let y = array![0.8, -0.3, 1.6, 0.2, 0.9, -0.7, 1.1, 0.4, 0.0, 1.3];
        let value = RegArchValue::from_data(y.clone()).unwrap();
        let (mu, var) = value.compute_mean_and_var().unwrap();
        let mut model = RegArchModel::with_means(
            vec![CondMean::Const(ConstMean::new(0.0))],
            CondVar::Const(ConstVar::new(1.0)),
            Residuals::default(),
        )
        .unwrap();

        let tols = Tolerances::new(Some(1e-9), None, Some(500)).unwrap();
        let opts = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None).unwrap();
        let out = fit(&mut model, &value, &opts).unwrap();

        assert!(out.converged);
        assert_abs_diff_eq!(out.theta_hat[0], mu, epsilon = 1e-5);
        assert_abs_diff_eq!(out.theta_hat[1], var, epsilon = 1e-5);
        assert_eq!(model.to_vector().unwrap(), out.theta_hat);
    }

    #[test]
    // Purpose
    // -------
    // AR(1) recovered from a simulated path with More–Thuente.
    //
    // Given
    // -----
    // - AR(1) φ = 0.5, const variance 1, Normal; 2 000 draws; fit from the
    //   default starting point.
    //
    // Expect
    // ------
    // - |φ̂ − 0.5| < 0.08 and |σ̂² − 1| < 0.15; LLH(θ̂) ≥ LLH at the start.
    fn ar_one_is_recovered() {
        let truth = RegArchModel::with_means(
            vec![CondMean::Ar(Ar::with_coefficients(array![0.5]))],
            CondVar::Const(ConstVar::new(1.0)),
            Residuals::default(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let sim = simulate(&truth, 2000, &mut rng).unwrap();
        let value = RegArchValue::from_data(sim.yt).unwrap();

        let mut model = truth.clone();
        model.set_default_init_point(&value).unwrap();
        let start = RegArchProblem::new(&model, &value).llh(&model.to_vector().unwrap()).unwrap();
        let out = fit_from_default_init(&mut model, &value, &MLEOptions::default()).unwrap();

        assert!((out.theta_hat[0] - 0.5).abs() < 0.08, "phi = {}", out.theta_hat[0]);
        assert!((out.theta_hat[1] - 1.0).abs() < 0.15, "var = {}", out.theta_hat[1]);
        assert!(out.value >= start);
    }

    #[test]
    // Purpose
    // -------
    // Invalid inputs are rejected before the solver runs.
    //
    // Expect
    // ------
    // - NaN starting parameter → `InvalidStartingPoint`, model untouched.
    // - Negative starting variance → `NonFiniteCost`.
    fn invalid_starts_are_rejected() {
        let value = RegArchValue::from_data(array![0.1, 0.2, -0.3]).unwrap();
        let mut model = RegArchModel::with_means(
            vec![CondMean::Const(ConstMean::new(f64::NAN))],
            CondVar::Const(ConstVar::new(1.0)),
            Residuals::default(),
        )
        .unwrap();
        assert!(matches!(
            fit(&mut model, &value, &MLEOptions::default()),
            Err(EstimError::InvalidStartingPoint { index: 0, .. })
        ));
        assert!(model.to_vector().unwrap()[0].is_nan());

        model.vector_to_param(&array![0.0, -1.0], 0).unwrap();
        assert!(matches!(
            fit(&mut model, &value, &MLEOptions::default()),
            Err(EstimError::NonFiniteCost { .. })
        ));
    }
}
