//! inference::stat_table — Wald table of a fitted RegArch model.
//!
//! Purpose
//! -------
//! Summarize `θ̂` parameter by parameter: estimate, standard error, t-stat
//! and two-sided asymptotic p-value.
//!
//! Key behaviors
//! -------------
//! - [`stat_table`] reads `θ̂` from the model, takes standard errors from
//!   [`standard_errors`] under the requested [`CovarianceKind`], and labels
//!   each row with [`RegArchModel::param_labels`].
//! - `t = θ̂ / se` and `p = 2(1 − Φ(|t|)) = erfc(|t|/√2)` against the
//!   standard normal.
//!
//! Invariants & assumptions
//! ------------------------
//! - A zero standard error (a direction dropped by the pseudo-inverse)
//!   yields a non-finite t-stat and a NaN p-value instead of an error.
//! - Rows follow the `[means | variance | distribution]` layout.
//!
//! Conventions
//! -----------
//! - The p-value is the normal tail from `statrs`, never a Student-t
//!   correction: the estimator is asymptotically normal.
use crate::{
    inference::{
        covariance::{CovarianceKind, standard_errors},
        errors::InferenceResult,
    },
    regarch::{core::RegArchValue, models::RegArchModel},
};
use ndarray::Array1;
use statrs::function::erf::erfc;
use std::fmt;

/// Column-wise Wald table; entry `k` of every column describes parameter `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    pub labels: Vec<String>,
    pub estimate: Array1<f64>,
    pub std_err: Array1<f64>,
    pub t_stat: Array1<f64>,
    pub p_value: Array1<f64>,
}

impl StatTable {
    /// Table from estimates and standard errors of equal length.
    pub fn from_estimates(labels: Vec<String>, estimate: Array1<f64>, std_err: Array1<f64>) -> Self {
        let t_stat: Array1<f64> =
            estimate.iter().zip(std_err.iter()).map(|(&e, &s)| e / s).collect();
        let p_value = t_stat.mapv(two_sided_p_value);
        StatTable { labels, estimate, std_err, t_stat, p_value }
    }

    pub fn len(&self) -> usize {
        self.estimate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimate.is_empty()
    }
}

impl fmt::Display for StatTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.labels.iter().map(String::len).max().unwrap_or(0).max(9);
        writeln!(
            f,
            "{:<width$} {:>12} {:>12} {:>10} {:>10}",
            "parameter", "estimate", "std. err.", "t-stat", "p-value"
        )?;
        for k in 0..self.len() {
            let label = self.labels.get(k).map_or("", String::as_str);
            writeln!(
                f,
                "{:<width$} {:>12.6} {:>12.6} {:>10.3} {:>10.4}",
                label, self.estimate[k], self.std_err[k], self.t_stat[k], self.p_value[k]
            )?;
        }
        Ok(())
    }
}

/// Wald table at the model's current parameters.
///
/// # Errors
/// As for [`standard_errors`].
pub fn stat_table(
    model: &RegArchModel, value: &RegArchValue, kind: CovarianceKind,
) -> InferenceResult<StatTable> {
    let estimate = model.to_vector()?;
    let std_err = standard_errors(model, value, kind)?;
    Ok(StatTable::from_estimates(model.param_labels(), estimate, std_err))
}

/// `P(|Z| > |t|)` for a standard normal `Z`.
pub fn two_sided_p_value(t: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    erfc(t.abs() / std::f64::consts::SQRT_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regarch::{
        mean::{CondMean, ConstMean},
        residuals::Residuals,
        variance::{CondVar, ConstVar},
    };
    use approx::assert_relative_eq;
    use ndarray::array;
    use statrs::distribution::{ContinuousCDF, Normal};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Normal tail probabilities against statrs' normal CDF and textbook
    //   critical values.
    // - The table at the Gaussian MLE, where the classical standard errors
    //   are `√(v/n)` and `√(2v²/n)` in closed form.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Two-sided p-values match the normal CDF.
    //
    // Expect
    // ------
    // - p(1.959964) ≈ 0.05, p(0) = 1, symmetric in t, 2(1 − Φ(|t|)) at
    //   t = 2.7; p(±∞) = 0 and NaN stays NaN.
    fn p_values_match_normal_cdf() {
        let phi = Normal::new(0.0, 1.0).unwrap();
        assert_relative_eq!(two_sided_p_value(1.959_963_984_540_054), 0.05, epsilon = 1e-10);
        assert_relative_eq!(two_sided_p_value(0.0), 1.0, epsilon = 1e-15);
        assert_relative_eq!(two_sided_p_value(-1.3), two_sided_p_value(1.3), epsilon = 1e-15);
        assert_relative_eq!(
            two_sided_p_value(2.7),
            2.0 * (1.0 - phi.cdf(2.7)),
            epsilon = 1e-10
        );
        assert_eq!(two_sided_p_value(f64::INFINITY), 0.0);
        assert!(two_sided_p_value(f64::NAN).is_nan());
    }

    #[test]
    // Purpose
    // -------
    // The table is built from the model's estimates and standard errors.
    //
    // Given
    // -----
    // - Const mean + const variance at the Gaussian MLE of ten points.
    //
    // Expect
    // ------
    // - Labels `Const.const` for both components; estimates (ȳ, v).
    // - se = (√(v/n), √(2v²/n)); t = estimate/se; p from the normal tail.
    // - The rendered table has a header and one line per parameter.
    fn table_at_gaussian_mle() {
        let y = array![0.8, -0.3, 1.6, 0.2, 0.9, -0.7, 1.1, 0.4, 0.0, 1.3];
        let value = RegArchValue::from_data(y).unwrap();
        let (mu, v) = value.compute_mean_and_var().unwrap();
        let n = value.len() as f64;
        let model = RegArchModel::with_means(
            vec![CondMean::Const(ConstMean::new(mu))],
            CondVar::Const(ConstVar::new(v)),
            Residuals::default(),
        )
        .unwrap();

        let table = stat_table(&model, &value, CovarianceKind::Classical).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.labels, vec!["Const.const", "Const.const"]);
        assert_relative_eq!(table.estimate[0], mu);
        assert_relative_eq!(table.std_err[0], (v / n).sqrt(), max_relative = 1e-8);
        assert_relative_eq!(table.std_err[1], (2.0 * v * v / n).sqrt(), max_relative = 1e-8);
        for k in 0..2 {
            assert_relative_eq!(table.t_stat[k], table.estimate[k] / table.std_err[k]);
            assert_relative_eq!(table.p_value[k], two_sided_p_value(table.t_stat[k]));
            assert!((0.0..=1.0).contains(&table.p_value[k]));
        }
        assert_eq!(table.to_string().lines().count(), 3);
    }

    #[test]
    // Purpose
    // -------
    // A zero standard error does not abort the table.
    fn zero_standard_error_gives_nan_p_value() {
        let table = StatTable::from_estimates(
            vec!["a".into(), "b".into()],
            array![0.0, 1.5],
            array![0.0, 0.5],
        );
        assert!(table.t_stat[0].is_nan());
        assert!(table.p_value[0].is_nan());
        assert_relative_eq!(table.t_stat[1], 3.0);
    }
}
