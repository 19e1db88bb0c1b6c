//! estimation::options — optimizer configuration and its validation.
//!
//! Purpose
//! -------
//! Hold the user-facing knobs of [`fit`](crate::estimation::fit): stopping
//! rules ([`Tolerances`]), the L-BFGS line search ([`LineSearcher`]), history
//! size and verbosity ([`MLEOptions`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed [`Tolerances`] has at least one stopping rule; provided
//!   tolerances are finite and strictly positive; `max_iter > 0`.
//! - A constructed [`MLEOptions`] has `lbfgs_mem` either `None` or `> 0`.
//!
//! Conventions
//! -----------
//! - Tolerances apply to the solver's objective `−LLH/n`, so they do not scale
//!   with the sample size.
use crate::estimation::errors::{EstimError, EstimResult};
use std::str::FromStr;

/// Line search used inside L-BFGS.
///
/// Parses case-insensitively from `"MoreThuente"` or `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = EstimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(EstimError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Stopping rules.
///
/// - `tol_grad`: gradient-norm threshold.
/// - `tol_cost`: threshold on the change in objective between iterations.
/// - `max_iter`: hard iteration cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`EstimError::NoTolerancesProvided`] if all three are `None`.
    /// - [`EstimError::InvalidTolGrad`] / [`EstimError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`EstimError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> EstimResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(EstimError::NoTolerancesProvided);
        }
        if let Some(tol) = tol_grad {
            check_tolerance(tol).map_err(|reason| EstimError::InvalidTolGrad { tol, reason })?;
        }
        if let Some(tol) = tol_cost {
            check_tolerance(tol).map_err(|reason| EstimError::InvalidTolCost { tol, reason })?;
        }
        if max_iter == Some(0) {
            return Err(EstimError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Optimizer-level configuration.
///
/// Default: `tol_grad = 1e-6`, no cost tolerance, `max_iter = 500`,
/// More–Thuente line search, silent, L-BFGS memory
/// [`DEFAULT_LBFGS_MEM`](crate::estimation::DEFAULT_LBFGS_MEM).
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// # Errors
    /// - [`EstimError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> EstimResult<Self> {
        if lbfgs_mem == Some(0) {
            return Err(EstimError::InvalidLBFGSMem {
                mem: 0,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(500) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

fn check_tolerance(tol: f64) -> Result<(), &'static str> {
    if !tol.is_finite() {
        return Err("Tolerance must be finite.");
    }
    if tol <= 0.0 {
        return Err("Tolerance must be positive.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Stopping-rule and option validation.
    //
    // Expect
    // ------
    // - No rule at all, a negative or NaN tolerance and `max_iter = 0` are
    //   rejected with the matching variant.
    // - `lbfgs_mem = Some(0)` is rejected; the default options validate.
    fn tolerance_and_option_validation() {
        assert_eq!(Tolerances::new(None, None, None), Err(EstimError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(Some(-1.0), None, None),
            Err(EstimError::InvalidTolGrad { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, Some(f64::NAN), None),
            Err(EstimError::InvalidTolCost { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(EstimError::InvalidMaxIter { .. })
        ));

        let tols = Tolerances::new(Some(1e-8), None, Some(100)).unwrap();
        assert!(matches!(
            MLEOptions::new(tols, LineSearcher::HagerZhang, false, Some(0)),
            Err(EstimError::InvalidLBFGSMem { .. })
        ));
        let d = MLEOptions::default();
        assert!(Tolerances::new(d.tols.tol_grad, d.tols.tol_cost, d.tols.max_iter).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Line-search names parse case-insensitively.
    fn line_searcher_parsing() {
        assert_eq!("hagerZHANG".parse::<LineSearcher>().unwrap(), LineSearcher::HagerZhang);
        assert_eq!("MoreThuente".parse::<LineSearcher>().unwrap(), LineSearcher::MoreThuente);
        assert!(matches!(
            "backtracking".parse::<LineSearcher>(),
            Err(EstimError::InvalidLineSearch { .. })
        ));
    }
}
