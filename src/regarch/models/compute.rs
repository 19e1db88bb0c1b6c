//! compute — filtering, log-likelihood and analytic derivative drivers.
//!
//! Purpose
//! -------
//! Walk a [`RegArchValue`] through a [`RegArchModel`] in increasing date order,
//! filling `H`, `M`, `U`, `Eps`, and accumulate the per-date log-density
//! contributions
//!
//! `l_t = −½ ln h_t + ln f(ε_t; θ_d)`, `ε_t = (y_t − m_t)/√h_t`
//!
//! together with `∂l_t/∂θ` and `∂²l_t/∂θ∂θᵀ` through the rolling windows.
//!
//! Key behaviors
//! -------------
//! - Per date the variance is evaluated before the means, so in-mean terms
//!   read `H_t`; the same order is used for derivatives.
//! - `∂ε = ∂u/σ − u ∂σ/σ²` with `∂u = −∂m`, and
//!   `∂²ε = ∂²u/σ − sym(∂u, ∂σ)/σ² + 2u ∂σ∂σᵀ/σ³ − u ∂²σ/σ²`.
//! - `∂l = −∂h/(2h) + g ∂ε + [0 | ∂_d ln f]` with `g = ∂ln f/∂ε`, and
//!   `∂²l = −½(∂²h/h − ∂h∂hᵀ/h²) + g' ∂ε∂εᵀ + g ∂²ε + sym(E, ∂ε) + [0 | ∂²_d ln f]`
//!   where `E = [0 | ∂g/∂θ_d]`.
//! - Per-date entry points (`lt_and_grad_lt`, `grad_and_hess_lt`, …) advance
//!   the windows themselves; callers only reinitialize before a pass.
//!
//! Invariants & assumptions
//! ------------------------
//! - Windows must be sized by the model (block sizes) and at least
//!   [`RegArchModel::n_lags`] deep; every public driver checks this.
//! - Within one pass dates are visited once, in order, starting at 0.
//!
//! Conventions
//! -----------
//! - Whole-sample drivers build their own windows; per-date drivers take the
//!   caller's.
use crate::regarch::{
    core::{
        GradientState, HessianState, RegArchValue,
        linalg::{add_outer, add_sym_outer},
    },
    errors::{RegArchError, RegArchResult},
    models::RegArchModel,
};
use ndarray::{Array1, Array2, s};

// ---- Filtering ----

/// Fill `H`, `M`, `U`, `Eps` at `date` from already filled earlier dates.
pub fn compute_date(model: &RegArchModel, value: &mut RegArchValue, date: usize) {
    let h = model.var().compute_var(date, value, model.distr());
    value.ht[date] = h;
    let m: f64 = model.means().iter().map(|c| c.compute_mean(date, value)).sum();
    value.mt[date] = m;
    let u = value.yt[date] - m;
    value.ut[date] = u;
    value.epst[date] = u / h.sqrt();
}

/// Filter the whole sample.
///
/// # Errors
/// - [`RegArchError::EmptySeries`] for an empty store.
/// - [`RegArchError::MissingRegressors`] / [`RegArchError::RegressorShapeMismatch`]
///   when a regression mean has no usable regressors.
pub fn fill_value(model: &RegArchModel, value: &mut RegArchValue) -> RegArchResult<()> {
    model.check_data(value)?;
    for t in 0..value.len() {
        compute_date(model, value, t);
    }
    Ok(())
}

// ---- Log-likelihood ----

/// Fill `date` and return `l_t`.
pub fn compute_lt(model: &RegArchModel, value: &mut RegArchValue, date: usize) -> RegArchResult<f64> {
    check_date(value, date)?;
    compute_date(model, value, date);
    Ok(lt_at(model, value, date))
}

/// `Σ_t l_t` over the sample, filling `value` on the way.
pub fn llh(model: &RegArchModel, value: &mut RegArchValue) -> RegArchResult<f64> {
    model.check_data(value)?;
    let mut total = 0.0;
    for t in 0..value.len() {
        compute_date(model, value, t);
        total += lt_at(model, value, t);
    }
    Ok(total)
}

// ---- Per-date derivatives ----

/// Fill `date`, advance `grad` and return `l_t`; `∂l_t` is left in
/// `grad.current_grad_lt`.
pub fn lt_and_grad_lt(
    model: &RegArchModel, value: &mut RegArchValue, date: usize, grad: &mut GradientState,
) -> RegArchResult<f64> {
    check_date(value, date)?;
    model.check_gradient_state(grad)?;
    compute_date(model, value, date);
    advance_grad(model, value, date, grad);
    Ok(lt_at(model, value, date))
}

/// `∂l_t/∂θ`.
pub fn grad_lt(
    model: &RegArchModel, value: &mut RegArchValue, date: usize, grad: &mut GradientState,
) -> RegArchResult<Array1<f64>> {
    lt_and_grad_lt(model, value, date, grad)?;
    Ok(grad.current_grad_lt.clone())
}

/// Fill `date`, advance both windows and return `l_t`; `∂l_t` and `∂²l_t`
/// are left in `grad.current_grad_lt` and `hess.current_hess_lt`.
pub fn grad_and_hess_lt(
    model: &RegArchModel, value: &mut RegArchValue, date: usize, grad: &mut GradientState,
    hess: &mut HessianState,
) -> RegArchResult<f64> {
    check_date(value, date)?;
    model.check_gradient_state(grad)?;
    model.check_hessian_state(hess)?;
    compute_date(model, value, date);
    advance_grad(model, value, date, grad);
    advance_hess(model, value, date, grad, hess);
    Ok(lt_at(model, value, date))
}

/// `∂²l_t/∂θ∂θᵀ`.
pub fn hess_lt(
    model: &RegArchModel, value: &mut RegArchValue, date: usize, grad: &mut GradientState,
    hess: &mut HessianState,
) -> RegArchResult<Array2<f64>> {
    grad_and_hess_lt(model, value, date, grad, hess)?;
    Ok(hess.current_hess_lt.clone())
}

// ---- Whole-sample derivatives ----

/// `(LLH, ∂LLH)`.
pub fn llh_and_grad_llh(
    model: &RegArchModel, value: &mut RegArchValue,
) -> RegArchResult<(f64, Array1<f64>)> {
    model.check_data(value)?;
    let mut grad = model.gradient_state();
    let mut total = 0.0;
    let mut score = Array1::zeros(model.n_param());
    for t in 0..value.len() {
        compute_date(model, value, t);
        advance_grad(model, value, t, &mut grad);
        total += lt_at(model, value, t);
        score += &grad.current_grad_lt;
    }
    Ok((total, score))
}

pub fn grad_llh(model: &RegArchModel, value: &mut RegArchValue) -> RegArchResult<Array1<f64>> {
    Ok(llh_and_grad_llh(model, value)?.1)
}

/// `(LLH, ∂LLH, ∂²LLH)` in one pass.
pub fn llh_grad_and_hess(
    model: &RegArchModel, value: &mut RegArchValue,
) -> RegArchResult<(f64, Array1<f64>, Array2<f64>)> {
    model.check_data(value)?;
    let n = model.n_param();
    let mut grad = model.gradient_state();
    let mut hess = model.hessian_state();
    let mut total = 0.0;
    let mut score = Array1::zeros(n);
    let mut hessian = Array2::zeros((n, n));
    for t in 0..value.len() {
        compute_date(model, value, t);
        advance_grad(model, value, t, &mut grad);
        advance_hess(model, value, t, &grad, &mut hess);
        total += lt_at(model, value, t);
        score += &grad.current_grad_lt;
        hessian += &hess.current_hess_lt;
    }
    Ok((total, score, hessian))
}

pub fn hess_llh(model: &RegArchModel, value: &mut RegArchValue) -> RegArchResult<Array2<f64>> {
    Ok(llh_grad_and_hess(model, value)?.2)
}

/// Per-date scores `∂l_t/∂θ` stacked as rows, shape `(n_obs, n_param)`.
pub fn calculate_scores(
    model: &RegArchModel, value: &mut RegArchValue,
) -> RegArchResult<Array2<f64>> {
    model.check_data(value)?;
    let mut grad = model.gradient_state();
    let mut scores = Array2::zeros((value.len(), model.n_param()));
    for t in 0..value.len() {
        compute_date(model, value, t);
        advance_grad(model, value, t, &mut grad);
        scores.row_mut(t).assign(&grad.current_grad_lt);
    }
    Ok(scores)
}

// ---- Helper methods ----

fn check_date(value: &RegArchValue, date: usize) -> RegArchResult<()> {
    if date >= value.len() {
        return Err(RegArchError::DateOutOfRange { date, len: value.len() });
    }
    Ok(())
}

fn lt_at(model: &RegArchModel, value: &RegArchValue, date: usize) -> f64 {
    -0.5 * value.ht[date].ln() + model.distr().log_density(value.epst[date])
}

/// Shift the gradient window and fill every current slot for `date`.
fn advance_grad(model: &RegArchModel, value: &RegArchValue, date: usize, grad: &mut GradientState) {
    let (n_mean, n_var, _) = model.block_sizes();
    grad.update();

    model.var().compute_grad(date, value, grad, n_mean, model.distr());
    for (m, offset) in model.means().iter().zip(model.mean_offsets()) {
        m.compute_grad(date, value, grad, offset);
    }
    grad.compute_grad_sigmat_from_grad_vart(date, value);

    let h = value.ht[date];
    let sigma = h.sqrt();
    let u = value.ut[date];
    let mut grad_eps = grad.current_grad_mu().mapv(|g| -g / sigma);
    grad_eps.scaled_add(-u / h, &grad.current_grad_sigma);
    grad.current_grad_eps_mut().assign(&grad_eps);

    model.distr().compute_grad(date, value, grad);

    let mut grad_lt = grad.current_grad_var().mapv(|g| -0.5 * g / h);
    grad_lt.scaled_add(grad.current_diff_log_density, &grad_eps);
    let off = n_mean + n_var;
    let mut distr_block = grad_lt.slice_mut(s![off..]);
    distr_block += &grad.current_grad_dens;
    grad.current_grad_lt = grad_lt;
}

/// Shift the Hessian window and fill every current slot for `date`. The
/// gradient window must already be advanced to `date`.
fn advance_hess(
    model: &RegArchModel, value: &RegArchValue, date: usize, grad: &GradientState,
    hess: &mut HessianState,
) {
    let (n_mean, n_var, _) = model.block_sizes();
    let n = model.n_param();
    hess.update();

    model.var().compute_hess(date, value, grad, hess, n_mean, model.distr());
    for (m, offset) in model.means().iter().zip(model.mean_offsets()) {
        m.compute_hess(date, value, grad, hess, offset);
    }
    hess.compute_hess_sigmat_from_hess_vart(date, value, grad);

    let h = value.ht[date];
    let sigma = h.sqrt();
    let u = value.ut[date];
    let grad_u = grad.current_grad_mu().mapv(|g| -g);
    let grad_sigma = grad.current_grad_sigma.view();
    let mut hess_eps = hess.current_hess_mu().mapv(|x| -x / sigma);
    add_sym_outer(&mut hess_eps, -1.0 / h, grad_u.view(), grad_sigma);
    add_outer(&mut hess_eps, 2.0 * u / (h * sigma), grad_sigma, grad_sigma);
    hess_eps.scaled_add(-u / h, &hess.current_hess_sigma);
    hess.current_hess_eps_mut().assign(&hess_eps);

    model.distr().compute_hess(date, value, hess);

    let eps = value.epst[date];
    let g = grad.current_diff_log_density;
    let g_prime = model.distr().diff2_log_density(eps);
    let grad_h = grad.current_grad_var();
    let grad_eps = grad.current_grad_eps();

    let mut hess_lt = hess.current_hess_var().mapv(|x| -0.5 * x / h);
    add_outer(&mut hess_lt, 0.5 / (h * h), grad_h, grad_h);
    add_outer(&mut hess_lt, g_prime, grad_eps, grad_eps);
    hess_lt.scaled_add(g, &hess_eps);

    let off = n_mean + n_var;
    let mut mixed = Array1::zeros(n);
    mixed.slice_mut(s![off..]).assign(&hess.current_grad_diff_log_density);
    add_sym_outer(&mut hess_lt, 1.0, mixed.view(), grad_eps);
    let mut distr_block = hess_lt.slice_mut(s![off.., off..]);
    distr_block += &hess.current_hess_dens;
    hess.current_hess_lt = hess_lt;
}
