//! Gamma-family special functions used by the Student and GED densities.
//!
//! `ln Γ` and the digamma function ψ come from `statrs`; the trigamma function
//! ψ′ is not provided there and is evaluated here with the upward recurrence
//! `ψ′(x) = ψ′(x + 1) + 1/x²` followed by the asymptotic series.
pub use statrs::function::gamma::{digamma, ln_gamma};

/// Trigamma function ψ′(x) = d²/dx² ln Γ(x) for x > 0.
///
/// Returns `+∞` for `x ≤ 0`.
pub fn trigamma(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }
    let mut result = 0.0;
    let mut x = x;
    while x < 10.0 {
        result += 1.0 / (x * x);
        x += 1.0;
    }
    // ψ′(x) ≈ 1/x + 1/(2x²) + 1/(6x³) − 1/(30x⁵) + 1/(42x⁷) − 1/(30x⁹)
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    result
        + inv
            * (1.0
                + inv
                    * (0.5
                        + inv
                            * (1.0 / 6.0
                                + inv2 * (-1.0 / 30.0 + inv2 * (1.0 / 42.0 - inv2 / 30.0)))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Known closed forms: ψ′(1) = π²/6, ψ′(1/2) = π²/2.
    fn trigamma_matches_closed_forms() {
        let pi2 = std::f64::consts::PI * std::f64::consts::PI;
        assert_relative_eq!(trigamma(1.0), pi2 / 6.0, epsilon = 1e-10);
        assert_relative_eq!(trigamma(0.5), pi2 / 2.0, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // ψ′ is the derivative of ψ (central difference at x = 3.7).
    fn trigamma_is_derivative_of_digamma() {
        let (x, h) = (3.7, 1e-5);
        let num = (digamma(x + h) - digamma(x - h)) / (2.0 * h);
        assert_relative_eq!(trigamma(x), num, epsilon = 1e-7);
    }
}
