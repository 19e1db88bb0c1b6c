//! UGARCH(p, q): GARCH with exogenous variance regressors.
//!
//! `h_t = ω + Σ_{k=1..K} b_k XV_{t,k} + Σ_{i=1..p} α_i U²_{t−i} + Σ_{j=1..q} β_j H_{t−j}`
//!
//! The regressors are read at the current date from the value store's
//! variance-regressor matrix. The constant is optional: without it the
//! level of the variance is carried by the regressors.
//!
//! The regressor term is linear in `b` and reads no filtered quantity, so it
//! adds `XV_t` to the gradient and nothing to the Hessian.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    errors::{RegArchError, RegArchResult},
    residuals::Residuals,
    variance::{
        CondVarComponent, add_lag_value_grad, add_lag_value_hess, add_sq_resid_grad,
        add_sq_resid_hess, set_current_grad, set_current_hess, zeros_grad, zeros_hess,
    },
};

const CONST: usize = 0;
const BETAS: usize = 1;
const ARCH: usize = 2;
const GARCH: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Ugarch {
    params: ParamBlocks,
    has_const: bool,
}

impl Ugarch {
    /// `n_betas` variance regressors, ARCH order `p`, GARCH order `q`.
    pub fn new(has_const: bool, n_betas: usize, p: usize, q: usize) -> Self {
        let params = if has_const {
            ParamBlocks::new().with_scalar("const", 0.0)
        } else {
            ParamBlocks::new()
        };
        Ugarch {
            params: params.with_vector("betas", n_betas).with_vector("arch", p).with_vector("garch", q),
            has_const,
        }
    }

    pub fn has_const(&self) -> bool {
        self.has_const
    }

    pub fn n_betas(&self) -> usize {
        self.params.block_len(self.block(BETAS))
    }

    pub fn orders(&self) -> (usize, usize) {
        (self.params.block_len(self.block(ARCH)), self.params.block_len(self.block(GARCH)))
    }

    pub fn realloc(&mut self, p: usize, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(p, self.block(ARCH))?;
        self.params.realloc_block(q, self.block(GARCH))
    }

    /// Resize the regressor coefficients; they are reset to zero.
    pub fn realloc_betas(&mut self, n_betas: usize) -> RegArchResult<()> {
        self.params.realloc_block(n_betas, self.block(BETAS))
    }

    /// Block number once the optional constant is accounted for.
    fn block(&self, block: usize) -> usize {
        if self.has_const { block } else { block - 1 }
    }

    fn regressor_term(&self, date: usize, data: &RegArchValue) -> f64 {
        let betas = self.params.values(self.block(BETAS));
        match &data.xvt {
            Some(x) => x.row(date).iter().zip(betas.iter()).map(|(x, b)| x * b).sum(),
            None => 0.0,
        }
    }
}

impl CondVarComponent for Ugarch {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        let (p, q) = self.orders();
        p.max(q)
    }

    fn compute_var(&self, date: usize, data: &RegArchValue, _distr: &Residuals) -> f64 {
        let (p, q) = self.orders();
        let alpha = self.params.values(self.block(ARCH));
        let beta = self.params.values(self.block(GARCH));
        let mut h = if self.has_const { self.params.scalar(CONST) } else { 0.0 };
        h += self.regressor_term(date, data);
        for i in 1..=p.min(date) {
            let u = data.u_lag(date, i);
            h += alpha[i - 1] * u * u;
        }
        for j in 1..=q.min(date) {
            h += beta[j - 1] * data.h_lag(date, j);
        }
        h
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        _distr: &Residuals,
    ) {
        let (p, q) = self.orders();
        let alpha = self.params.values(self.block(ARCH));
        let beta = self.params.values(self.block(GARCH));
        let alpha_off = offset + self.params.block_offset(self.block(ARCH));
        let beta_off = offset + self.params.block_offset(self.block(GARCH));
        let mut local = zeros_grad(grad);
        if self.has_const {
            local[offset + self.params.block_offset(CONST)] = 1.0;
        }
        if let Some(x) = &data.xvt {
            let b_off = offset + self.params.block_offset(self.block(BETAS));
            for (k, &xk) in x.row(date).iter().enumerate().take(self.n_betas()) {
                local[b_off + k] = xk;
            }
        }
        for i in 1..=p.min(date) {
            let gu = grad.grad_u_lag(i);
            add_sq_resid_grad(
                &mut local,
                data.u_lag(date, i),
                gu.as_ref(),
                alpha[i - 1],
                alpha_off + i - 1,
            );
        }
        for j in 1..=q.min(date) {
            add_lag_value_grad(
                &mut local,
                data.h_lag(date, j),
                grad.grad_var_lag(j),
                beta[j - 1],
                beta_off + j - 1,
            );
        }
        set_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, _distr: &Residuals,
    ) {
        let (p, q) = self.orders();
        let alpha = self.params.values(self.block(ARCH));
        let beta = self.params.values(self.block(GARCH));
        let alpha_off = offset + self.params.block_offset(self.block(ARCH));
        let beta_off = offset + self.params.block_offset(self.block(GARCH));
        let mut local = zeros_hess(hess);
        for i in 1..=p.min(date) {
            let gu = grad.grad_u_lag(i);
            add_sq_resid_hess(
                &mut local,
                data.u_lag(date, i),
                gu.as_ref(),
                hess.hess_mu_lag(i),
                alpha[i - 1],
                alpha_off + i - 1,
            );
        }
        for j in 1..=q.min(date) {
            add_lag_value_hess(
                &mut local,
                grad.grad_var_lag(j),
                hess.hess_var_lag(j),
                beta[j - 1],
                beta_off + j - 1,
            );
        }
        set_current_hess(hess, &local);
    }

    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        let (p, q) = self.orders();
        let (arch, garch) = (self.block(ARCH), self.block(GARCH));
        if p > 0 {
            self.params.values_mut(arch).fill(0.1 / p as f64);
        }
        if q > 0 {
            self.params.values_mut(garch).fill(0.8 / q as f64);
        }
        let betas = self.block(BETAS);
        self.params.values_mut(betas).fill(0.0);
        if self.has_const {
            self.params.values_mut(CONST).fill(0.1 * var);
        }
    }

    fn check_data(&self, data: &RegArchValue) -> RegArchResult<()> {
        let k = self.n_betas();
        if k == 0 {
            return Ok(());
        }
        let x = data.xvt.as_ref().ok_or(RegArchError::MissingRegressors { component: "Ugarch" })?;
        if x.ncols() != k {
            return Err(RegArchError::RegressorShapeMismatch {
                expected: (data.len(), k),
                actual: x.dim(),
            });
        }
        Ok(())
    }

    fn sync_size_param(&mut self, data: &RegArchValue) -> RegArchResult<()> {
        let k = data.xvt.as_ref().map_or(0, |x| x.ncols());
        if k != self.n_betas() {
            self.realloc_betas(k)?;
        }
        Ok(())
    }
}
