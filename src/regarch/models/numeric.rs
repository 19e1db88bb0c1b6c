//! numeric — finite-difference counterparts of the model-level derivatives.
//!
//! Purpose
//! -------
//! Provide `finitediff`-based gradients and Hessians of the log-likelihood so
//! the analytic chain-rule drivers in [`compute`](super::compute) can be
//! cross-checked, or substituted while a new component is being derived.
//!
//! Key behaviors
//! -------------
//! - Each evaluation perturbs a cloned model through
//!   [`RegArchModel::vector_to_param`] and refilters a cloned value store, so
//!   the caller's model and data are never mutated.
//! - Failures inside the perturbed evaluation map to `NaN` entries rather than
//!   aborting the difference scheme.
//! - The numeric Hessians differentiate the analytic gradients (central
//!   scheme), matching how the residual module cross-checks its laws. The
//!   per-date version refilters and re-derives dates `0..=date` at every
//!   perturbed point.
use crate::regarch::{
    core::RegArchValue,
    errors::RegArchResult,
    models::{RegArchModel, compute},
};
use finitediff::FiniteDiff;
use ndarray::{Array1, Array2};

/// Central-difference `∂LLH/∂θ`.
pub fn numeric_grad_llh(model: &RegArchModel, value: &RegArchValue) -> RegArchResult<Array1<f64>> {
    model.check_data(value)?;
    let theta = model.to_vector()?;
    let f = |t: &Array1<f64>| {
        perturbed(model, t)
            .and_then(|m| compute::llh(&m, &mut value.clone()))
            .unwrap_or(f64::NAN)
    };
    Ok(theta.central_diff(&f))
}

/// Central-difference Hessian of the LLH from the analytic gradient.
pub fn numeric_hess_llh(model: &RegArchModel, value: &RegArchValue) -> RegArchResult<Array2<f64>> {
    model.check_data(value)?;
    let theta = model.to_vector()?;
    let n = theta.len();
    let g = |t: &Array1<f64>| {
        perturbed(model, t)
            .and_then(|m| compute::grad_llh(&m, &mut value.clone()))
            .unwrap_or_else(|_| Array1::from_elem(n, f64::NAN))
    };
    Ok(theta.central_hessian(&g))
}

/// Central-difference `∂l_t/∂θ`, refiltering dates `0..=date`.
pub fn numeric_grad_lt(
    model: &RegArchModel, value: &RegArchValue, date: usize,
) -> RegArchResult<Array1<f64>> {
    model.check_data(value)?;
    let theta = model.to_vector()?;
    let f = |t: &Array1<f64>| lt_through(model, value, date, t).unwrap_or(f64::NAN);
    Ok(theta.central_diff(&f))
}

/// Central-difference `∂²l_t/∂θ∂θᵀ` from the analytic `∂l_t`, refiltering
/// dates `0..=date`.
pub fn numeric_hess_lt(
    model: &RegArchModel, value: &RegArchValue, date: usize,
) -> RegArchResult<Array2<f64>> {
    model.check_data(value)?;
    let theta = model.to_vector()?;
    let n = theta.len();
    let g = |t: &Array1<f64>| {
        grad_lt_through(model, value, date, t).unwrap_or_else(|_| Array1::from_elem(n, f64::NAN))
    };
    Ok(theta.central_hessian(&g))
}

// ---- Helper methods ----

fn perturbed(model: &RegArchModel, theta: &Array1<f64>) -> RegArchResult<RegArchModel> {
    let mut copy = model.clone();
    copy.vector_to_param(theta, 0)?;
    Ok(copy)
}

fn lt_through(
    model: &RegArchModel, value: &RegArchValue, date: usize, theta: &Array1<f64>,
) -> RegArchResult<f64> {
    let m = perturbed(model, theta)?;
    let mut v = value.clone();
    let mut lt = 0.0;
    for t in 0..=date {
        lt = compute::compute_lt(&m, &mut v, t)?;
    }
    Ok(lt)
}

fn grad_lt_through(
    model: &RegArchModel, value: &RegArchValue, date: usize, theta: &Array1<f64>,
) -> RegArchResult<Array1<f64>> {
    let m = perturbed(model, theta)?;
    let mut v = value.clone();
    let mut grad = m.gradient_state();
    for t in 0..date {
        compute::lt_and_grad_lt(&m, &mut v, t, &mut grad)?;
    }
    compute::grad_lt(&m, &mut v, date, &mut grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regarch::{
        mean::{Ar, Arfima, CondMean, ConstMean, LinReg, Ma, StdDevInMean, VarInMean},
        models::compute::{grad_lt, hess_lt, llh_grad_and_hess},
        residuals::{Ged, MixNorm, Residuals, Student},
        variance::{
            Aparch, Arch, CondVar, Egarch, Figarch, Garch, Gtarch, Nagarch, Ngarch, Sqrgarch,
            Tarch, Tsgarch, Ugarch,
        },
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Analytic LLH gradients and Hessians of full models against central
    // differences, one model per variance family, with mean and distribution
    // blocks mixed in so the cross-block chain-rule terms are exercised.
    //
    // Tolerances are relative to the entry magnitude with an absolute floor;
    // the sample is short and deterministic so the check is cheap.
    // -------------------------------------------------------------------------

    fn sample() -> Array1<f64> {
        array![
            0.31, -0.52, 1.05, -0.23, 0.11, 0.87, -1.32, 0.45, 0.02, -0.66, 0.74, 0.19, -0.41,
            1.21, -0.08, 0.35, -0.95, 0.58, 0.27, -0.12
        ]
    }

    fn set_theta(model: &mut RegArchModel, theta: Array1<f64>) {
        assert_eq!(theta.len(), model.n_param());
        model.vector_to_param(&theta, 0).unwrap();
    }

    fn assert_close(analytic: &[f64], numeric: &[f64], tol: f64) {
        assert_eq!(analytic.len(), numeric.len());
        for (k, (a, n)) in analytic.iter().zip(numeric).enumerate() {
            let scale = a.abs().max(n.abs()).max(1.0);
            assert!(
                (a - n).abs() <= tol * scale,
                "entry {k}: analytic {a} vs numeric {n}"
            );
        }
    }

    fn check_model(model: &RegArchModel, value: &RegArchValue) {
        let mut v = value.clone();
        let (_, g, h) = llh_grad_and_hess(model, &mut v).unwrap();
        let ng = numeric_grad_llh(model, value).unwrap();
        assert_close(g.as_slice().unwrap(), ng.as_slice().unwrap(), 1e-5);
        let nh = numeric_hess_llh(model, value).unwrap();
        let h_flat: Vec<f64> = h.iter().copied().collect();
        let nh_flat: Vec<f64> = nh.iter().copied().collect();
        assert_close(&h_flat, &nh_flat, 1e-4);
    }

    #[test]
    // Purpose
    // -------
    // Const + AR(1) + MA(1) mean with GARCH(1,1) and Student residuals.
    fn arma_garch_student_derivatives() {
        let mut model = RegArchModel::with_means(
            vec![
                CondMean::Const(ConstMean::new(0.0)),
                CondMean::Ar(Ar::new(1)),
                CondMean::Ma(Ma::new(1)),
            ],
            CondVar::Garch(Garch::new(1, 1)),
            Residuals::Student(Student::new(6.0)),
        )
        .unwrap();
        set_theta(&mut model, array![0.05, 0.3, -0.2, 0.1, 0.15, 0.7, 6.0]);
        check_model(&model, &RegArchValue::from_data(sample()).unwrap());
    }

    #[test]
    // Purpose
    // -------
    // ARCH(2) with GED residuals and a StdDevInMean term (same-date feedback).
    fn arch_in_mean_ged_derivatives() {
        let mut model = RegArchModel::with_means(
            vec![
                CondMean::Const(ConstMean::new(0.0)),
                CondMean::StdDevInMean(StdDevInMean::new(0.0)),
            ],
            CondVar::Arch(Arch::new(2)),
            Residuals::Ged(Ged::new(2.5)),
        )
        .unwrap();
        set_theta(&mut model, array![0.02, 0.1, 0.2, 0.15, 0.1, 2.5]);
        check_model(&model, &RegArchValue::from_data(sample()).unwrap());
    }

    #[test]
    // Purpose
    // -------
    // EGARCH(1,1) couples E|ε| of the Student law into the variance.
    fn egarch_student_derivatives() {
        let mut model = RegArchModel::with_means(
            vec![CondMean::Const(ConstMean::new(0.0))],
            CondVar::Egarch(Egarch::new(1, 1)),
            Residuals::Student(Student::new(7.0)),
        )
        .unwrap();
        set_theta(&mut model, array![0.03, -0.3, 0.2, 0.6, -0.1, 0.25, 7.0]);
        check_model(&model, &RegArchValue::from_data(sample()).unwrap());
    }

    #[test]
    // Purpose
    // -------
    // APARCH(1,1) including the δ and γ derivatives, with a VarInMean term.
    fn aparch_var_in_mean_derivatives() {
        let mut model = RegArchModel::with_means(
            vec![CondMean::VarInMean(VarInMean::new(0.0))],
            CondVar::Aparch(Aparch::new(1, 1)),
            Residuals::default(),
        )
        .unwrap();
        set_theta(&mut model, array![0.1, 0.08, 1.6, 0.12, 0.3, 0.75]);
        check_model(&model, &RegArchValue::from_data(sample()).unwrap());
    }

    #[test]
    // Purpose
    // -------
    // TARCH(1) and TSGARCH(1,1) with an AR mean.
    fn tarch_and_tsgarch_derivatives() {
        let value = RegArchValue::from_data(sample()).unwrap();
        let mut tarch = RegArchModel::with_means(
            vec![CondMean::Ar(Ar::new(1))],
            CondVar::Tarch(Tarch::new(1)),
            Residuals::default(),
        )
        .unwrap();
        set_theta(&mut tarch, array![0.2, 0.15, 0.1, 0.3]);
        check_model(&tarch, &value);

        let mut ts = RegArchModel::with_means(
            vec![CondMean::Ar(Ar::new(1))],
            CondVar::Tsgarch(Tsgarch::new(1, 1)),
            Residuals::default(),
        )
        .unwrap();
        set_theta(&mut ts, array![0.2, 0.1, 0.15, 0.7]);
        check_model(&ts, &value);
    }

    #[test]
    // Purpose
    // -------
    // NAGARCH(1,1) reads lagged σ inside the ARCH term; MixNorm residuals.
    fn nagarch_mixnorm_derivatives() {
        let mut model = RegArchModel::with_means(
            vec![CondMean::Const(ConstMean::new(0.0))],
            CondVar::Nagarch(Nagarch::new(1, 1)),
            Residuals::MixNorm(MixNorm::new(0.6, 0.8, 1.3)),
        )
        .unwrap();
        set_theta(&mut model, array![0.01, 0.05, 0.1, 0.75, 0.3, 0.6, 0.8, 1.3]);
        check_model(&model, &RegArchValue::from_data(sample()).unwrap());
    }

    #[test]
    // Purpose
    // -------
    // Fractional recursions: ARFIMA(1,d,1) mean with FIGARCH(1,d,1) variance,
    // both at a short truncation.
    fn arfima_figarch_derivatives() {
        let mut arfima = Arfima::new(1, 1);
        arfima.resize_poly(6).unwrap();
        let mut figarch = Figarch::new(1, 1);
        figarch.resize_poly(6).unwrap();
        let mut model = RegArchModel::with_means(
            vec![CondMean::Arfima(arfima)],
            CondVar::Figarch(figarch),
            Residuals::default(),
        )
        .unwrap();
        set_theta(&mut model, array![0.2, 0.1, 0.15, 0.1, 0.3, 0.2, 0.4]);
        check_model(&model, &RegArchValue::from_data(sample()).unwrap());
    }

    #[test]
    // Purpose
    // -------
    // LinReg reads regressors; the per-date numeric gradient matches the
    // per-date analytic one at the last date.
    fn linreg_per_date_gradient() {
        let n = sample().len();
        let x = Array2::from_shape_fn((n, 2), |(t, j)| ((t + 1) as f64 * (j + 1) as f64).sin());
        let value = RegArchValue::with_regressors(sample(), Some(x), None).unwrap();
        let mut model = RegArchModel::with_means(
            vec![CondMean::LinReg(LinReg::new(2))],
            CondVar::Garch(Garch::new(1, 1)),
            Residuals::default(),
        )
        .unwrap();
        set_theta(&mut model, array![0.3, -0.2, 0.1, 0.1, 0.8]);
        check_model(&model, &value);

        let mut v = value.clone();
        let mut grad = model.gradient_state();
        for t in 0..n - 1 {
            grad_lt(&model, &mut v, t, &mut grad).unwrap();
        }
        let last = grad_lt(&model, &mut v, n - 1, &mut grad).unwrap();
        let numeric = numeric_grad_lt(&model, &value, n - 1).unwrap();
        assert_close(last.as_slice().unwrap(), numeric.as_slice().unwrap(), 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // UGARCH(1,1) with two variance regressors and an AR mean: the regressor
    // block is linear, the ARCH and GARCH blocks chain through the mean.
    fn ugarch_variance_regressor_derivatives() {
        let n = sample().len();
        let xv = Array2::from_shape_fn((n, 2), |(t, j)| 0.2 + 0.1 * ((t * (j + 2)) as f64).cos());
        let value = RegArchValue::with_regressors(sample(), None, Some(xv)).unwrap();
        let mut model = RegArchModel::with_means(
            vec![CondMean::Ar(Ar::new(1))],
            CondVar::Ugarch(Ugarch::new(true, 2, 1, 1)),
            Residuals::default(),
        )
        .unwrap();
        set_theta(&mut model, array![0.2, 0.05, 0.3, 0.2, 0.12, 0.6]);
        check_model(&model, &value);
    }

    #[test]
    // Purpose
    // -------
    // NGARCH(1,1) level shift and GTARCH(1,1) sign-switched σ recursion,
    // each with an AR mean so the residual derivatives are non-trivial.
    fn ngarch_and_gtarch_derivatives() {
        let value = RegArchValue::from_data(sample()).unwrap();
        let mut ng = RegArchModel::with_means(
            vec![CondMean::Ar(Ar::new(1))],
            CondVar::Ngarch(Ngarch::new(1, 1)),
            Residuals::Student(Student::new(8.0)),
        )
        .unwrap();
        set_theta(&mut ng, array![0.2, 0.05, 0.1, 0.7, 0.2, 8.0]);
        check_model(&ng, &value);

        let mut gt = RegArchModel::with_means(
            vec![CondMean::Ar(Ar::new(1))],
            CondVar::Gtarch(Gtarch::new(1, 1)),
            Residuals::default(),
        )
        .unwrap();
        set_theta(&mut gt, array![0.2, 0.3, 0.08, 0.2, 0.6]);
        check_model(&gt, &value);
    }

    #[test]
    // Purpose
    // -------
    // SQRGARCH(1,1) standardizes the lagged residual by the lagged σ, so
    // second derivatives mix the mean and variance windows.
    fn sqrgarch_derivatives() {
        let mut model = RegArchModel::with_means(
            vec![CondMean::Const(ConstMean::new(0.0)), CondMean::Ar(Ar::new(1))],
            CondVar::Sqrgarch(Sqrgarch::new(1, 1)),
            Residuals::Ged(Ged::new(1.8)),
        )
        .unwrap();
        set_theta(&mut model, array![0.02, 0.15, 0.05, 0.04, 0.75, 0.3, 1.8]);
        check_model(&model, &RegArchValue::from_data(sample()).unwrap());
    }

    #[test]
    // Purpose
    // -------
    // The per-date analytic Hessian matches the differenced per-date
    // gradient at an interior and at the last date.
    //
    // Given
    // -----
    // - Const + AR(1) mean, NAGARCH(1,1), Student residuals.
    //
    // Expect
    // ------
    // - Entries agree to 1e-4 relative (floor 1).
    fn per_date_hessian_matches_numeric() {
        let value = RegArchValue::from_data(sample()).unwrap();
        let mut model = RegArchModel::with_means(
            vec![CondMean::Const(ConstMean::new(0.0)), CondMean::Ar(Ar::new(1))],
            CondVar::Nagarch(Nagarch::new(1, 1)),
            Residuals::Student(Student::new(7.0)),
        )
        .unwrap();
        set_theta(&mut model, array![0.03, 0.25, 0.05, 0.1, 0.75, 0.2, 7.0]);

        let n = value.len();
        let mut v = value.clone();
        let mut grad = model.gradient_state();
        let mut hess = model.hessian_state();
        for t in 0..n {
            let h = hess_lt(&model, &mut v, t, &mut grad, &mut hess).unwrap();
            if t == 7 || t == n - 1 {
                let nh = numeric_hess_lt(&model, &value, t).unwrap();
                let h_flat: Vec<f64> = h.iter().copied().collect();
                let nh_flat: Vec<f64> = nh.iter().copied().collect();
                assert_close(&h_flat, &nh_flat, 1e-4);
            }
        }
    }
}
