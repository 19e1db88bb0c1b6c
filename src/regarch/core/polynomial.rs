//! Truncated fractional-differencing polynomials for ARFIMA and FIGARCH.
//!
//! Purpose
//! -------
//! Expand `(1 − L)^d = Σ_k π_k(d) L^k` up to a caller-chosen truncation lag
//! `T`, together with `∂π_k/∂d` and `∂²π_k/∂d²`, and form the product with an
//! autoregressive polynomial `Φ(L) = 1 − Σ φ_i L^i`:
//!
//! `a(L) = Φ(L)(1 − L)^d`, `a_k = π_k − Σ_{i=1..min(p,k)} φ_i π_{k−i}`.
//!
//! Key behaviors
//! -------------
//! - `π_0 = 1`, `π_k = π_{k−1}(k − 1 − d)/k` and the matching derivative
//!   recursions, all O(T).
//! - `∂a_k/∂φ_i = −π_{k−i}` is read straight off `pi`, so only `a`, `∂a/∂d`
//!   and `∂²a/∂d²` are materialized.
//! - [`ArFracPolyCache`] keeps the last expansion keyed by `(φ, d, T)`, so a
//!   filtering pass that asks for the mean, gradient and Hessian at every
//!   date expands the polynomial once per parameter point.
//!
//! Conventions
//! -----------
//! - Truncation is an explicit approximation: lags beyond `T` are dropped.
//!   `T` is a component setting (`resize_poly`), defaulting to
//!   [`DEFAULT_TRUNCATION_LAG`].
use ndarray::{Array1, ArrayView1};
use std::sync::Mutex;

/// Default truncation lag for fractional polynomials.
pub const DEFAULT_TRUNCATION_LAG: usize = 20;

/// Coefficients of `(1 − L)^d` and their first two `d`-derivatives, lags `0..=T`.
#[derive(Debug, Clone, PartialEq)]
pub struct FracDiffCoeffs {
    pub pi: Array1<f64>,
    pub d_pi: Array1<f64>,
    pub d2_pi: Array1<f64>,
}

impl FracDiffCoeffs {
    pub fn new(d: f64, trunc: usize) -> Self {
        let mut pi = Array1::zeros(trunc + 1);
        let mut d_pi = Array1::zeros(trunc + 1);
        let mut d2_pi = Array1::zeros(trunc + 1);
        pi[0] = 1.0;
        for k in 1..=trunc {
            let kf = k as f64;
            let ratio = (kf - 1.0 - d) / kf;
            pi[k] = pi[k - 1] * ratio;
            d_pi[k] = d_pi[k - 1] * ratio - pi[k - 1] / kf;
            d2_pi[k] = d2_pi[k - 1] * ratio - 2.0 * d_pi[k - 1] / kf;
        }
        FracDiffCoeffs { pi, d_pi, d2_pi }
    }

    pub fn trunc(&self) -> usize {
        self.pi.len() - 1
    }
}

/// `a(L) = Φ(L)(1 − L)^d` truncated at `T`, with its `d`-derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct ArFracPoly {
    pub coeffs: FracDiffCoeffs,
    pub a: Array1<f64>,
    pub d_a: Array1<f64>,
    pub d2_a: Array1<f64>,
}

impl ArFracPoly {
    pub fn new(phi: ArrayView1<'_, f64>, d: f64, trunc: usize) -> Self {
        let coeffs = FracDiffCoeffs::new(d, trunc);
        let mut a = coeffs.pi.clone();
        let mut d_a = coeffs.d_pi.clone();
        let mut d2_a = coeffs.d2_pi.clone();
        for k in 1..=trunc {
            for (i, &phi_i) in phi.iter().enumerate().take(k) {
                let lag = k - (i + 1);
                a[k] -= phi_i * coeffs.pi[lag];
                d_a[k] -= phi_i * coeffs.d_pi[lag];
                d2_a[k] -= phi_i * coeffs.d2_pi[lag];
            }
        }
        ArFracPoly { coeffs, a, d_a, d2_a }
    }

    pub fn trunc(&self) -> usize {
        self.coeffs.trunc()
    }

    /// `π_{k−i}` for `k ≥ i`, else 0 (φ_i does not reach lag `k`).
    #[inline]
    pub fn pi_shift(&self, k: usize, i: usize) -> f64 {
        if k >= i { self.coeffs.pi[k - i] } else { 0.0 }
    }

    /// `∂π_{k−i}/∂d` for `k ≥ i`, else 0.
    #[inline]
    pub fn d_pi_shift(&self, k: usize, i: usize) -> f64 {
        if k >= i { self.coeffs.d_pi[k - i] } else { 0.0 }
    }
}

/// Last [`ArFracPoly`] built by a component, keyed by `(φ, d, T)`.
///
/// The memo is not part of the owner's value: equality ignores it and a
/// clone starts empty. A component shared across threads stays usable; a
/// caller that finds the memo busy expands the polynomial itself.
#[derive(Debug, Default)]
pub struct ArFracPolyCache {
    slot: Mutex<Option<CachedPoly>>,
}

#[derive(Debug, Clone)]
struct CachedPoly {
    phi: Array1<f64>,
    d: f64,
    trunc: usize,
    poly: ArFracPoly,
}

impl CachedPoly {
    fn matches(&self, phi: ArrayView1<'_, f64>, d: f64, trunc: usize) -> bool {
        self.trunc == trunc
            && self.d.to_bits() == d.to_bits()
            && self.phi.len() == phi.len()
            && self.phi.iter().zip(phi.iter()).all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Clone for ArFracPolyCache {
    fn clone(&self) -> Self {
        ArFracPolyCache::default()
    }
}

impl PartialEq for ArFracPolyCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl ArFracPolyCache {
    /// Run `f` on the expansion of `(φ, d)` at depth `trunc`, rebuilding the
    /// memo only when the key changed.
    pub fn with<R>(
        &self, phi: ArrayView1<'_, f64>, d: f64, trunc: usize, f: impl FnOnce(&ArFracPoly) -> R,
    ) -> R {
        if let Ok(mut slot) = self.slot.try_lock() {
            let stale = !matches!(&*slot, Some(c) if c.matches(phi, d, trunc));
            if stale {
                *slot = Some(CachedPoly {
                    phi: phi.to_owned(),
                    d,
                    trunc,
                    poly: ArFracPoly::new(phi, d, trunc),
                });
            }
            if let Some(cached) = slot.as_ref() {
                return f(&cached.poly);
            }
        }
        f(&ArFracPoly::new(phi, d, trunc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Closed-form coefficients for d = 0, 1, 0.5, the AR product, and the
    // d-derivatives against central differences.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Integer orders reproduce the finite difference operator.
    //
    // Expect
    // ------
    // - d = 0 → [1, 0, 0, …]; d = 1 → [1, −1, 0, …].
    fn integer_orders_give_finite_difference_operator() {
        let zero = FracDiffCoeffs::new(0.0, 4);
        assert_eq!(zero.pi, array![1.0, 0.0, 0.0, 0.0, 0.0]);
        let one = FracDiffCoeffs::new(1.0, 4);
        assert_eq!(one.pi, array![1.0, -1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    // Purpose
    // -------
    // Half-integer order against hand-expanded binomial coefficients.
    //
    // Expect
    // ------
    // - π_1 = −0.5, π_2 = −0.125, π_3 = −0.0625.
    fn half_order_matches_binomial_series() {
        let c = FracDiffCoeffs::new(0.5, 3);
        assert_relative_eq!(c.pi[1], -0.5);
        assert_relative_eq!(c.pi[2], -0.125);
        assert_relative_eq!(c.pi[3], -0.0625);
    }

    #[test]
    // Purpose
    // -------
    // The d-derivatives agree with central differences of the coefficients.
    //
    // Given
    // -----
    // - d = 0.3, T = 8, step 1e-5.
    //
    // Expect
    // ------
    // - |analytic − numeric| < 1e-7 for first, < 1e-4 for second derivatives.
    fn d_derivatives_match_central_differences() {
        let (d, h) = (0.3, 1e-5);
        let c = FracDiffCoeffs::new(d, 8);
        let up = FracDiffCoeffs::new(d + h, 8);
        let dn = FracDiffCoeffs::new(d - h, 8);
        for k in 0..=8 {
            let num_d = (up.pi[k] - dn.pi[k]) / (2.0 * h);
            let num_d2 = (up.pi[k] - 2.0 * c.pi[k] + dn.pi[k]) / (h * h);
            assert!((c.d_pi[k] - num_d).abs() < 1e-7, "lag {k}");
            assert!((c.d2_pi[k] - num_d2).abs() < 1e-4, "lag {k}");
        }
    }

    #[test]
    // Purpose
    // -------
    // With d = 0 the product collapses to the AR polynomial.
    //
    // Given
    // -----
    // - φ = [0.5, 0.2], T = 4.
    //
    // Expect
    // ------
    // - a = [1, −0.5, −0.2, 0, 0].
    fn ar_product_without_differencing_is_ar_polynomial() {
        let poly = ArFracPoly::new(array![0.5, 0.2].view(), 0.0, 4);
        assert_eq!(poly.a, array![1.0, -0.5, -0.2, 0.0, 0.0]);
        assert_eq!(poly.pi_shift(1, 2), 0.0);
        assert_eq!(poly.pi_shift(2, 2), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // The memo serves repeated requests for the same key without re-expanding
    // and tracks parameter changes.
    //
    // Given
    // -----
    // - φ = [0.4], d = 0.2, T = 6; then d = 0.25.
    //
    // Expect
    // ------
    // - Two requests for the same key see the same stored expansion.
    // - A new d yields the fresh expansion, equal to a direct build.
    fn cache_reuses_expansion_until_key_changes() {
        let cache = ArFracPolyCache::default();
        let phi = array![0.4];
        let first = cache.with(phi.view(), 0.2, 6, |p| p as *const ArFracPoly);
        let second = cache.with(phi.view(), 0.2, 6, |p| p as *const ArFracPoly);
        assert_eq!(first, second);
        assert_eq!(
            cache.with(phi.view(), 0.2, 6, |p| p.clone()),
            ArFracPoly::new(phi.view(), 0.2, 6)
        );
        let fresh = cache.with(phi.view(), 0.25, 6, |p| p.clone());
        assert_eq!(fresh, ArFracPoly::new(phi.view(), 0.25, 6));
        assert_eq!(cache.with(phi.view(), 0.25, 8, |p| p.trunc()), 8);
    }
}
