//! Integration tests for the RegArch pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path: model construction from kind tags,
//!   simulation, refiltering, analytic derivatives, maximum-likelihood
//!   fitting and covariance / standard errors.
//! - Use a realistic GARCH(1,1) regime rather than toy edge cases.
//!
//! Coverage
//! --------
//! - `utils::build_model` and the component kind tags.
//! - `regarch::models`: `simulate`, `fill_value`, `llh`, `grad_llh`,
//!   `hess_llh` and their finite-difference counterparts; the per-date
//!   Hessian window against `numeric_hess_lt` with variance regressors.
//! - `estimation`: `fit_from_default_init` with More–Thuente L-BFGS.
//! - `inference`: classical and sandwich covariance, standard errors and the
//!   Wald table.
//!
//! Exclusions
//! ----------
//! - Per-component formulas and hand-computed derivative entries; those are
//!   covered by unit tests next to each component.
//! - Python bindings.
use approx::assert_relative_eq;
use ndarray::{Array2, array};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rust_regarch::{
    estimation::{LineSearcher, MLEOptions, Tolerances, fit_from_default_init},
    inference::{CovarianceKind, compute_cov, stat_table, standard_errors},
    regarch::{
        RegArchModel, RegArchValue,
        models::{
            fill_value, grad_llh, hess_llh, hess_lt, llh, numeric_grad_llh, numeric_hess_llh,
            numeric_hess_lt, simulate, simulate_with_regressors,
        },
    },
    utils::build_model,
};

/// Const mean 0.5, GARCH(1,1) with ω = 0.1, α = 0.1, β = 0.8 (unit
/// unconditional variance), Normal residuals.
///
/// Panics if construction fails; that is a test configuration error.
fn garch_truth() -> RegArchModel {
    let mut model = build_model(&[("const", 0, 0)], ("garch", 1, 1), "normal")
        .expect("tags should build a model");
    model
        .vector_to_param(&array![0.5, 0.1, 0.1, 0.8], 0)
        .expect("parameter vector should match the layout");
    model
}

fn simulated_value(model: &RegArchModel, n: usize, seed: u64) -> RegArchValue {
    let mut rng = StdRng::seed_from_u64(seed);
    let sim = simulate(model, n, &mut rng).expect("simulation should succeed");
    RegArchValue::from_data(sim.yt).expect("simulated data are non-empty")
}

fn assert_matrix_close(a: &ndarray::Array2<f64>, b: &ndarray::Array2<f64>, tol: f64) {
    assert_eq!(a.dim(), b.dim());
    for ((idx, x), y) in a.indexed_iter().zip(b.iter()) {
        let scale = x.abs().max(y.abs()).max(1.0);
        assert!((x - y).abs() / scale < tol, "entry {idx:?}: {x} vs {y}");
    }
}

#[test]
// Purpose
// -------
// Simulated paths are a fixed point of the filter.
//
// Given
// -----
// - The GARCH truth, 500 draws.
//
// Expect
// ------
// - Refiltering the simulated `y` reproduces the simulated `h` and `m`.
fn simulation_refilters_exactly() {
    let model = garch_truth();
    let mut rng = StdRng::seed_from_u64(11);
    let sim = simulate(&model, 500, &mut rng).unwrap();
    let mut value = RegArchValue::from_data(sim.yt.clone()).unwrap();
    fill_value(&model, &mut value).unwrap();
    for t in 0..500 {
        assert_relative_eq!(value.ht[t], sim.ht[t], max_relative = 1e-12);
        assert_relative_eq!(value.mt[t], sim.mt[t], max_relative = 1e-12);
    }
}

#[test]
// Purpose
// -------
// Analytic gradient and Hessian of a tag-built model agree with finite
// differences away from the truth.
//
// Given
// -----
// - AR(1) + const mean, ARCH(1), Student residuals; 300 draws; parameters
//   perturbed from the simulating values.
//
// Expect
// ------
// - Gradient within 1e-5 and Hessian within 1e-4 (relative, floor 1).
fn analytic_derivatives_match_numeric() {
    let mut model = build_model(&[("const", 0, 0), ("ar", 1, 0)], ("arch", 1, 0), "student")
        .unwrap();
    model.vector_to_param(&array![0.1, 0.3, 0.5, 0.3, 7.0], 0).unwrap();
    let value = simulated_value(&model, 300, 5);
    model.vector_to_param(&array![0.05, 0.25, 0.6, 0.2, 6.0], 0).unwrap();

    let g = grad_llh(&model, &mut value.clone()).unwrap();
    let g_num = numeric_grad_llh(&model, &value).unwrap();
    for (a, b) in g.iter().zip(g_num.iter()) {
        let scale = a.abs().max(b.abs()).max(1.0);
        assert!((a - b).abs() / scale < 1e-5, "{a} vs {b}");
    }

    let h = hess_llh(&model, &mut value.clone()).unwrap();
    let h_num = numeric_hess_llh(&model, &value).unwrap();
    assert_matrix_close(&h, &h_num, 1e-4);
}

#[test]
// Purpose
// -------
// Full simulate → fit → inference pipeline on GARCH(1,1).
//
// Given
// -----
// - 3 000 draws from the GARCH truth; fit from the default starting point
//   with More–Thuente and a gradient tolerance of 1e-6.
//
// Expect
// ------
// - The fit improves on the starting log-likelihood and lands near the
//   truth (loose bounds).
// - Classical and sandwich standard errors are finite and positive; the
//   covariance is symmetric.
fn garch_fit_and_standard_errors() {
    let truth = garch_truth();
    let value = simulated_value(&truth, 3000, 2024);

    let mut model = truth.clone();
    model.set_default_init_point(&value).unwrap();
    let llh_start = llh(&model, &mut value.clone()).unwrap();

    let tols = Tolerances::new(Some(1e-6), None, Some(500)).unwrap();
    let opts = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None).unwrap();
    let out = fit_from_default_init(&mut model, &value, &opts).unwrap();

    assert!(out.value >= llh_start);
    let theta = &out.theta_hat;
    assert!((theta[0] - 0.5).abs() < 0.1, "mu = {}", theta[0]);
    assert!((theta[2] - 0.1).abs() < 0.08, "alpha = {}", theta[2]);
    assert!((theta[3] - 0.8).abs() < 0.15, "beta = {}", theta[3]);
    assert_relative_eq!(llh(&model, &mut value.clone()).unwrap(), out.value, max_relative = 1e-9);

    let cov = compute_cov(&model, &value, CovarianceKind::Classical).unwrap();
    assert_matrix_close(&cov, &cov.t().to_owned(), 1e-10);
    for kind in [CovarianceKind::Classical, CovarianceKind::Sandwich] {
        let se = standard_errors(&model, &value, kind).unwrap();
        assert_eq!(se.len(), 4);
        assert!(se.iter().all(|s| s.is_finite() && *s > 0.0), "{kind:?}: {se}");
    }

    let table = stat_table(&model, &value, CovarianceKind::Sandwich).unwrap();
    assert_eq!(table.labels, vec!["Const.const", "Garch.const", "Garch.arch[1]", "Garch.garch[1]"]);
    for (e, t) in table.estimate.iter().zip(out.theta_hat.iter()) {
        assert_relative_eq!(*e, *t, epsilon = 1e-12);
    }
    assert!(table.p_value[3] < 1e-3, "beta p-value {}", table.p_value[3]);
    assert!(table.p_value.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
// Purpose
// -------
// Variance regressors flow through simulation and the per-date Hessian
// window.
//
// Given
// -----
// - Const mean, UGARCH(1,1) with a constant and one variance regressor
//   drawn uniformly on [0, 1]; 200 draws.
//
// Expect
// ------
// - The coefficient block is sized from the regressor width.
// - The analytic Hessian of `l_t` at dates 10 and n − 1 matches the
//   finite-difference Hessian within 1e-4.
fn ugarch_per_date_hessian_matches_numeric() {
    let n = 200;
    let mut rng = StdRng::seed_from_u64(11);
    let xvt = Array2::from_shape_fn((n, 1), |_| rng.gen::<f64>());
    let mut model = build_model(&[("const", 0, 0)], ("ugarch", 1, 1), "normal").unwrap();
    let mut value = RegArchValue::new(n);
    value.set_xvt(xvt.clone()).unwrap();
    model.sync_size_param(&value).unwrap();
    assert_eq!(model.block_sizes(), (1, 4, 0));
    model.vector_to_param(&array![0.1, 0.2, 0.3, 0.1, 0.6], 0).unwrap();

    let sim = simulate_with_regressors(&model, n, None, Some(xvt), &mut rng).unwrap();
    let mut work = sim.clone();
    let mut grad = model.gradient_state();
    let mut hess = model.hessian_state();
    for t in 0..n {
        let h = hess_lt(&model, &mut work, t, &mut grad, &mut hess).unwrap();
        if t == 10 || t == n - 1 {
            let h_num = numeric_hess_lt(&model, &sim, t).unwrap();
            assert_matrix_close(&h, &h_num, 1e-4);
        }
    }
}
