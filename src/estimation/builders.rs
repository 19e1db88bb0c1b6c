//! estimation::builders — L-BFGS solver construction.
//!
//! Builders apply the history size and the gradient / cost tolerances from
//! [`MLEOptions`]; the starting point and the iteration cap are runtime
//! concerns applied by the runner in [`api`](crate::estimation::api).
use argmin::solver::quasinewton::LBFGS;

use crate::estimation::{
    errors::EstimResult,
    options::MLEOptions,
    types::{
        Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
        MoreThuenteLS, Theta,
    },
};

/// L-BFGS with the Hager–Zhang line search.
///
/// # Errors
/// Tolerances rejected by argmin, converted through `From<argmin::core::Error>`.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> EstimResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// L-BFGS with the More–Thuente line search.
///
/// # Errors
/// Tolerances rejected by argmin, converted through `From<argmin::core::Error>`.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> EstimResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Apply the optional tolerances; absent ones keep argmin's defaults.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> EstimResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(tol) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(tol)?;
    }
    if let Some(tol) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(tol)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::options::{LineSearcher, Tolerances};

    #[test]
    // Purpose
    // -------
    // Both builders accept validated options with and without a custom
    // history size.
    fn builders_accept_validated_options() {
        let tols = Tolerances::new(Some(1e-8), Some(1e-12), Some(50)).unwrap();
        let opts = MLEOptions::new(tols, LineSearcher::HagerZhang, false, Some(3)).unwrap();
        assert!(build_optimizer_hager_zhang(&opts).is_ok());
        assert!(build_optimizer_more_thuente(&MLEOptions::default()).is_ok());
    }
}
