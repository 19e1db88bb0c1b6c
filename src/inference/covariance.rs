//! inference::covariance — information matrices and parameter covariance.
//!
//! Purpose
//! -------
//! Turn a fitted [`RegArchModel`] and its data into the information matrices
//! of the average log-likelihood and the asymptotic covariance of `θ̂`.
//!
//! Key behaviors
//! -------------
//! - [`compute_i`]: outer product of per-date scores,
//!   `I = (1/n) Σ_t s_t s_tᵀ` with `s_t = ∂l_t/∂θ`.
//! - [`compute_i_and_j`]: `I` together with the observed information
//!   `J = −(1/n) ∂²LLH/∂θ∂θᵀ`.
//! - [`compute_cov`]: `J⁺/n` (classical) or `J⁺ I J⁺ / n` (sandwich).
//! - [`standard_errors`]: square roots of the covariance diagonal.
//!
//! Invariants & assumptions
//! ------------------------
//! - `J` is symmetrized before the eigendecomposition.
//! - Eigenvalues at or below [`EIGEN_EPS`] are dropped from the
//!   pseudo-inverse; weakly identified directions therefore get no variance
//!   contribution from those eigenvectors rather than an error.
//!
//! Conventions
//! -----------
//! - Matrices follow the model parameter layout
//!   `[means | variance | distribution]`.
//! - The caller's data are not modified; each pass refilters a clone.
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    regarch::{
        core::RegArchValue,
        models::{RegArchModel, calculate_scores, hess_llh},
    },
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use std::str::FromStr;

/// Eigenvalues at or below this are treated as zero by [`pseudo_inverse`].
pub const EIGEN_EPS: f64 = 1e-10;

/// Covariance estimator.
///
/// Parses case-insensitively from `"classical"` or `"sandwich"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CovarianceKind {
    /// `J⁻¹/n`.
    #[default]
    Classical,
    /// `J⁻¹ I J⁻¹ / n`.
    Sandwich,
}

impl FromStr for CovarianceKind {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classical" => Ok(CovarianceKind::Classical),
            "sandwich" | "robust" => Ok(CovarianceKind::Sandwich),
            _ => Err(InferenceError::InvalidCovarianceKind {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'classical' or 'sandwich'.",
            }),
        }
    }
}

/// Outer-product-of-gradients information `I`.
///
/// # Errors
/// Model errors from the score pass.
pub fn compute_i(model: &RegArchModel, value: &RegArchValue) -> InferenceResult<Array2<f64>> {
    let scores = calculate_scores(model, &mut value.clone())?;
    Ok(outer_product_of_gradients(&scores))
}

/// `(I, J)` on the average log-likelihood scale.
///
/// # Errors
/// Model errors from the score or Hessian pass.
pub fn compute_i_and_j(
    model: &RegArchModel, value: &RegArchValue,
) -> InferenceResult<(Array2<f64>, Array2<f64>)> {
    let mut work = value.clone();
    let scores = calculate_scores(model, &mut work)?;
    let i = outer_product_of_gradients(&scores);
    Ok((i, observed_information(model, &mut work)?))
}

/// Asymptotic covariance of `θ̂`.
///
/// # Errors
/// - Model errors from the score or Hessian pass.
/// - [`InferenceError::NonFiniteInformation`] /
///   [`InferenceError::SingularInformation`] from [`pseudo_inverse`].
pub fn compute_cov(
    model: &RegArchModel, value: &RegArchValue, kind: CovarianceKind,
) -> InferenceResult<Array2<f64>> {
    let n = value.len();
    match kind {
        CovarianceKind::Classical => {
            let j = observed_information(model, &mut value.clone())?;
            cov_from_information(&j, None, n)
        }
        CovarianceKind::Sandwich => {
            let (i, j) = compute_i_and_j(model, value)?;
            cov_from_information(&j, Some(&i), n)
        }
    }
}

/// `√diag(cov)`.
///
/// # Errors
/// As for [`compute_cov`].
pub fn standard_errors(
    model: &RegArchModel, value: &RegArchValue, kind: CovarianceKind,
) -> InferenceResult<Array1<f64>> {
    let cov = compute_cov(model, value, kind)?;
    Ok(cov.diag().mapv(f64::sqrt))
}

/// Covariance from average-scale information matrices for a sample of `n`.
///
/// With `i = None` this is `J⁺/n`, otherwise `J⁺ I J⁺ / n`.
///
/// # Errors
/// As for [`pseudo_inverse`].
pub fn cov_from_information(
    j: &Array2<f64>, i: Option<&Array2<f64>>, n: usize,
) -> InferenceResult<Array2<f64>> {
    let j_pinv = pseudo_inverse(j)?;
    let n = n.max(1) as f64;
    let cov = match i {
        Some(i) => j_pinv.dot(i).dot(&j_pinv),
        None => j_pinv,
    };
    Ok(cov / n)
}

/// Moore–Penrose pseudo-inverse of a symmetric matrix by eigendecomposition.
///
/// # Errors
/// - [`InferenceError::NonFiniteInformation`] for a non-finite entry.
/// - [`InferenceError::SingularInformation`] if no eigenvalue exceeds
///   [`EIGEN_EPS`].
pub fn pseudo_inverse(matrix: &Array2<f64>) -> InferenceResult<Array2<f64>> {
    if let Some(((row, col), &value)) = matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(InferenceError::NonFiniteInformation { row, col, value });
    }
    let n = matrix.nrows();
    let eigen = to_dmatrix(matrix).symmetric_eigen();
    let q = eigen.eigenvectors;
    let lambdas = eigen.eigenvalues;

    let max_eigenvalue = lambdas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max_eigenvalue > EIGEN_EPS) {
        return Err(InferenceError::SingularInformation { max_eigenvalue });
    }

    let mut pinv = Array2::<f64>::zeros((n, n));
    for (k, &lambda) in lambdas.iter().enumerate() {
        if lambda <= EIGEN_EPS {
            continue;
        }
        for r in 0..n {
            let coeff = q[(r, k)] / lambda;
            for c in 0..n {
                pinv[[r, c]] += coeff * q[(c, k)];
            }
        }
    }
    Ok(pinv)
}

// ---- Helper methods ----

fn outer_product_of_gradients(scores: &Array2<f64>) -> Array2<f64> {
    let n = scores.nrows().max(1) as f64;
    scores.t().dot(scores) / n
}

fn observed_information(
    model: &RegArchModel, value: &mut RegArchValue,
) -> InferenceResult<Array2<f64>> {
    let n = value.len().max(1) as f64;
    let hess = hess_llh(model, value)?;
    Ok(hess.mapv(|h| -h / n))
}

/// Symmetrized copy into a column-major `DMatrix`.
fn to_dmatrix(matrix: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(matrix.nrows(), matrix.ncols(), |r, c| {
        0.5 * (matrix[[r, c]] + matrix[[c, r]])
    })
}
