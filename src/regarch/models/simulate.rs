//! simulate — draw a sample path from a fully specified model.
//!
//! For each date the variance is computed first, then the means, then a
//! standardized innovation `ε_t` is drawn from the model's residual law and
//! `y_t = m_t + √h_t ε_t`. The returned store is fully filtered, so it can be
//! passed straight to the likelihood drivers.
use crate::regarch::{
    core::RegArchValue,
    errors::{RegArchError, RegArchResult},
    models::RegArchModel,
};
use ndarray::Array2;
use rand::RngCore;

/// Simulate `n` observations without regressors.
///
/// # Errors
/// - [`RegArchError::EmptySeries`] if `n == 0`.
/// - [`RegArchError::MissingRegressors`] if a component reads `X` or `XV`.
pub fn simulate<R: RngCore>(
    model: &RegArchModel, n: usize, rng: &mut R,
) -> RegArchResult<RegArchValue> {
    simulate_with_regressors(model, n, None, None, rng)
}

/// Simulate `n` observations, attaching the mean regressors `xt` and the
/// variance regressors `xvt` first.
///
/// # Errors
/// - [`RegArchError::EmptySeries`] if `n == 0`.
/// - [`RegArchError::RegressorShapeMismatch`] if a matrix does not have `n` rows.
/// - Any regressor check raised by the components.
pub fn simulate_with_regressors<R: RngCore>(
    model: &RegArchModel, n: usize, xt: Option<Array2<f64>>, xvt: Option<Array2<f64>>,
    rng: &mut R,
) -> RegArchResult<RegArchValue> {
    if n == 0 {
        return Err(RegArchError::EmptySeries);
    }
    let mut value = RegArchValue::new(n);
    if let Some(x) = xt {
        value.set_xt(x)?;
    }
    if let Some(x) = xvt {
        value.set_xvt(x)?;
    }
    model.check_data(&value)?;

    let eps = model.distr().generate(n, rng);
    for t in 0..n {
        let h = model.var().compute_var(t, &value, model.distr());
        value.ht[t] = h;
        let m: f64 = model.means().iter().map(|c| c.compute_mean(t, &value)).sum();
        value.mt[t] = m;
        let u = h.sqrt() * eps[t];
        value.ut[t] = u;
        value.epst[t] = eps[t];
        value.yt[t] = m + u;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regarch::{
        mean::{Ar, CondMean, ConstMean, LinReg},
        models::compute::fill_value,
        residuals::{Residuals, Student},
        variance::{CondVar, CondVarComponent, Garch, Ugarch},
    };
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Simulation fills a consistent store: refiltering the simulated `Y`
    // reproduces the simulated `H`, `M`, `U`, `Eps`; long GARCH paths have a
    // sample variance near the stationary one; argument validation.
    // -------------------------------------------------------------------------

    fn ar_garch() -> RegArchModel {
        RegArchModel::with_means(
            vec![
                CondMean::Const(ConstMean::new(0.1)),
                CondMean::Ar(Ar::with_coefficients(array![0.4])),
            ],
            CondVar::Garch(Garch::with_coefficients(0.1, array![0.1], array![0.8])),
            Residuals::Student(Student::new(8.0)),
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // A simulated path is a fixed point of the filter.
    //
    // Given
    // -----
    // - Const + AR(1) mean, GARCH(1,1), Student(8); 200 draws with a fixed seed.
    //
    // Expect
    // ------
    // - `fill_value` on a copy of the simulated `Y` reproduces every column.
    fn simulated_path_refilters_to_itself() {
        let model = ar_garch();
        let mut rng = StdRng::seed_from_u64(17);
        let sim = simulate(&model, 200, &mut rng).unwrap();

        let mut refit = RegArchValue::from_data(sim.yt.clone()).unwrap();
        fill_value(&model, &mut refit).unwrap();
        for t in 0..200 {
            assert_relative_eq!(refit.ht[t], sim.ht[t], max_relative = 1e-10);
            assert_relative_eq!(refit.mt[t], sim.mt[t], epsilon = 1e-10);
            assert_relative_eq!(refit.epst[t], sim.epst[t], epsilon = 1e-8);
        }
    }

    #[test]
    // Purpose
    // -------
    // Long-run variance of a GARCH path.
    //
    // Given
    // -----
    // - Zero mean, ω = 0.1, α = 0.1, β = 0.8 (stationary variance 1.0),
    //   Gaussian innovations, 20 000 draws.
    //
    // Expect
    // ------
    // - Sample variance of `U` within 15% of 1.0.
    fn garch_path_matches_stationary_variance() {
        let model = RegArchModel::new(
            CondVar::Garch(Garch::with_coefficients(0.1, array![0.1], array![0.8])),
            Residuals::default(),
        );
        let mut rng = StdRng::seed_from_u64(2024);
        let sim = simulate(&model, 20_000, &mut rng).unwrap();
        let var = sim.ut.mapv(|u| u * u).mean().unwrap();
        assert!((var - 1.0).abs() < 0.15, "sample variance {var}");
    }

    #[test]
    // Purpose
    // -------
    // Validation of the requested length and of regressors.
    //
    // Expect
    // ------
    // - `n == 0` → `EmptySeries`.
    // - LinReg without `X` → `MissingRegressors`; with `X` the mean is `Xβ`.
    fn simulation_argument_checks() {
        let mut rng = StdRng::seed_from_u64(1);
        let model = ar_garch();
        assert!(matches!(simulate(&model, 0, &mut rng), Err(RegArchError::EmptySeries)));

        let mut lin = CondMean::LinReg(LinReg::new(1));
        lin.params_mut().from_vector(&array![2.0], 0).unwrap();
        let model = RegArchModel::with_means(
            vec![lin],
            CondVar::Garch(Garch::with_coefficients(0.1, array![0.1], array![0.8])),
            Residuals::default(),
        )
        .unwrap();
        assert!(matches!(
            simulate(&model, 5, &mut rng),
            Err(RegArchError::MissingRegressors { .. })
        ));

        let x = Array2::from_shape_fn((5, 1), |(t, _)| t as f64);
        let sim = simulate_with_regressors(&model, 5, Some(x), None, &mut rng).unwrap();
        for t in 0..5 {
            assert_relative_eq!(sim.mt[t], 2.0 * t as f64, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Variance regressors drive a simulated UGARCH path and survive the
    // refilter.
    //
    // Given
    // -----
    // - UGARCH(1, 1) with one variance regressor XV_t = 1{t ≥ 100}, b = 2,
    //   ω = 0.1, α = 0.1, β = 0.5; 200 draws.
    //
    // Expect
    // ------
    // - Missing `XV` is rejected.
    // - The mean conditional variance is larger after the switch.
    // - Refiltering with the same `XV` reproduces `H`.
    fn variance_regressors_drive_ugarch_paths() {
        let mut ug = Ugarch::new(true, 1, 1, 1);
        ug.params_mut().from_vector(&array![0.1, 2.0, 0.1, 0.5], 0).unwrap();
        let model = RegArchModel::new(CondVar::Ugarch(ug), Residuals::default());
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            simulate(&model, 200, &mut rng),
            Err(RegArchError::MissingRegressors { component: "Ugarch" })
        ));

        let xv = Array2::from_shape_fn((200, 1), |(t, _)| if t >= 100 { 1.0 } else { 0.0 });
        let sim = simulate_with_regressors(&model, 200, None, Some(xv.clone()), &mut rng).unwrap();
        let before = sim.ht.slice(ndarray::s![..100]).mean().unwrap();
        let after = sim.ht.slice(ndarray::s![100..]).mean().unwrap();
        assert!(after > before + 1.0, "{before} vs {after}");

        let mut refit = RegArchValue::with_regressors(sim.yt.clone(), None, Some(xv)).unwrap();
        fill_value(&model, &mut refit).unwrap();
        for t in 0..200 {
            assert_relative_eq!(refit.ht[t], sim.ht[t], max_relative = 1e-10);
        }
    }
}
