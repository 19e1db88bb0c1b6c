//! Unit-variance generalized error distribution (GED).
//!
//! `f(x) = β / (2λ Γ(1/β)) · exp(−(|x|/λ)^β)` with `λ = √(Γ(1/β)/Γ(3/β))`, so
//! that `Var(ε) = 1`. β = 2 recovers the standard normal, β = 1 the Laplace
//! law. Derivatives in β are taken through `ln λ`, whose first two
//! derivatives are `λ1` and `λ2` below.
use crate::regarch::{
    core::{
        ParamBlocks,
        special::{digamma, ln_gamma, trigamma},
    },
    residuals::ResidualDistribution,
};
use ndarray::{Array1, Array2, array};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Gamma};

const BETA: usize = 0;
const DEFAULT_BETA: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Ged {
    params: ParamBlocks,
}

impl Default for Ged {
    fn default() -> Self {
        Ged::new(DEFAULT_BETA)
    }
}

/// `ln λ` and its first two β-derivatives.
struct LogScale {
    ln_lambda: f64,
    d1: f64,
    d2: f64,
}

impl Ged {
    pub fn new(beta: f64) -> Self {
        Ged { params: ParamBlocks::new().with_scalar("beta", beta) }
    }

    pub fn beta(&self) -> f64 {
        self.params.scalar(BETA)
    }

    fn log_scale(&self) -> LogScale {
        let b = self.beta();
        let (i1, i3) = (1.0 / b, 3.0 / b);
        let num = 3.0 * digamma(i3) - digamma(i1);
        LogScale {
            ln_lambda: 0.5 * (ln_gamma(i1) - ln_gamma(i3)),
            d1: num / (2.0 * b * b),
            d2: (-9.0 * trigamma(i3) + trigamma(i1)) / (2.0 * b.powi(4)) - num / b.powi(3),
        }
    }

    /// `K = (|x|/λ)^β` and `k1 = ∂ ln K/∂β`; both 0 at `x = 0`.
    fn kernel(&self, x: f64, ls: &LogScale) -> (f64, f64) {
        if x == 0.0 {
            return (0.0, 0.0);
        }
        let b = self.beta();
        let ln_ratio = x.abs().ln() - ls.ln_lambda;
        ((b * ln_ratio).exp(), ln_ratio - b * ls.d1)
    }

    fn log_esp_derivatives(&self) -> (f64, f64) {
        let b = self.beta();
        let ls = self.log_scale();
        let (i1, i2) = (1.0 / b, 2.0 / b);
        let d1 = ls.d1 - 2.0 * digamma(i2) / (b * b) + digamma(i1) / (b * b);
        let d2 = ls.d2 + 4.0 * trigamma(i2) / b.powi(4) + 4.0 * digamma(i2) / b.powi(3)
            - trigamma(i1) / b.powi(4)
            - 2.0 * digamma(i1) / b.powi(3);
        (d1, d2)
    }
}

impl ResidualDistribution for Ged {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn log_density(&self, x: f64) -> f64 {
        let b = self.beta();
        let ls = self.log_scale();
        let (k, _) = self.kernel(x, &ls);
        b.ln() - 2f64.ln() - ls.ln_lambda - ln_gamma(1.0 / b) - k
    }

    fn diff_log_density(&self, x: f64) -> f64 {
        if x == 0.0 {
            return 0.0;
        }
        let b = self.beta();
        let ls = self.log_scale();
        -b * x.signum() * x.abs().powf(b - 1.0) * (-b * ls.ln_lambda).exp()
    }

    fn diff2_log_density(&self, x: f64) -> f64 {
        let b = self.beta();
        let ls = self.log_scale();
        -b * (b - 1.0) * x.abs().powf(b - 2.0) * (-b * ls.ln_lambda).exp()
    }

    fn grad_log_density(&self, x: f64) -> Array1<f64> {
        let b = self.beta();
        let ls = self.log_scale();
        let (k, k1) = self.kernel(x, &ls);
        array![1.0 / b - ls.d1 + digamma(1.0 / b) / (b * b) - k * k1]
    }

    fn hess_log_density(&self, x: f64) -> Array2<f64> {
        let b = self.beta();
        let ls = self.log_scale();
        let (k, k1) = self.kernel(x, &ls);
        let k2 = -2.0 * ls.d1 - b * ls.d2;
        let h = -1.0 / (b * b) - ls.d2 - 2.0 * digamma(1.0 / b) / b.powi(3)
            - trigamma(1.0 / b) / b.powi(4)
            - k * (k2 + k1 * k1);
        array![[h]]
    }

    fn grad_diff_log_density(&self, x: f64) -> Array1<f64> {
        let ls = self.log_scale();
        let (_, k1) = self.kernel(x, &ls);
        array![self.diff_log_density(x) * (1.0 / self.beta() + k1)]
    }

    fn esp_abs_eps(&self) -> f64 {
        let b = self.beta();
        (self.log_scale().ln_lambda + ln_gamma(2.0 / b) - ln_gamma(1.0 / b)).exp()
    }

    fn grad_esp_abs_eps(&self) -> Array1<f64> {
        let (d1, _) = self.log_esp_derivatives();
        array![self.esp_abs_eps() * d1]
    }

    fn hess_esp_abs_eps(&self) -> Array2<f64> {
        let (d1, d2) = self.log_esp_derivatives();
        array![[self.esp_abs_eps() * (d2 + d1 * d1)]]
    }

    /// `|ε|/λ` raised to β is Gamma(1/β, 1); the sign is symmetric.
    fn draw(&self, rng: &mut dyn RngCore) -> f64 {
        let b = self.beta();
        let lambda = self.log_scale().ln_lambda.exp();
        let magnitude = match Gamma::new(1.0 / b, 1.0) {
            Ok(g) => lambda * g.sample(rng).powf(1.0 / b),
            Err(_) => return f64::NAN,
        };
        if rng.gen_bool(0.5) { magnitude } else { -magnitude }
    }

    fn set_default_init_point(&mut self) {
        self.params.values_mut(BETA).fill(DEFAULT_BETA);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regarch::residuals::normal::Normal;
    use approx::assert_relative_eq;
    use std::f64::consts::{PI, SQRT_2};

    #[test]
    // Purpose
    // -------
    // β = 2 is the standard normal.
    //
    // Expect
    // ------
    // - Same log-density, score, curvature and E|ε| as `Normal`.
    fn beta_two_is_standard_normal() {
        let ged = Ged::new(2.0);
        let n = Normal::new();
        for &x in &[-1.5, 0.0, 0.3, 2.2] {
            assert_relative_eq!(ged.log_density(x), n.log_density(x), epsilon = 1e-12);
            assert_relative_eq!(ged.diff_log_density(x), n.diff_log_density(x), epsilon = 1e-12);
            assert_relative_eq!(ged.diff2_log_density(x), -1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(ged.esp_abs_eps(), (2.0 / PI).sqrt(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // β = 1 is the unit-variance Laplace law with scale 1/√2.
    //
    // Expect
    // ------
    // - log f(x) = −ln √2 − √2 |x| and E|ε| = 1/√2.
    fn beta_one_is_laplace() {
        let ged = Ged::new(1.0);
        assert_relative_eq!(ged.log_density(0.7), -SQRT_2.ln() - SQRT_2 * 0.7, epsilon = 1e-12);
        assert_relative_eq!(ged.esp_abs_eps(), 1.0 / SQRT_2, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // At x = 0 the kernel vanishes: the score in β stays finite.
    fn parameter_score_is_finite_at_zero() {
        let ged = Ged::new(1.3);
        assert!(ged.grad_log_density(0.0)[0].is_finite());
        assert_eq!(ged.grad_diff_log_density(0.0)[0], 0.0);
    }
}
