//! Conjugate Gradient - Krylov Solver for SPD Systems
//!
//! Search directions are kept `A`-conjugate, so in exact arithmetic an
//! `n x n` system is solved in at most `n` steps.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use tracing::{debug, trace};

use gpuplay_tensor::Tensor;

use crate::config::SolverConfig;
use crate::error::SolverResult;
use crate::solver::{has_converged, squared_norm, validate, ConvergenceStatus, Solution, Solver};

// =============================================================================
// Conjugate Gradient
// =============================================================================

/// Conjugate gradient solver.
#[derive(Debug, Clone, Default)]
pub struct ConjugateGradient {
    config: SolverConfig,
}

impl ConjugateGradient {
    /// Creates a solver with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl Solver for ConjugateGradient {
    fn name(&self) -> &'static str {
        "conjugate_gradient"
    }

    fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn solve(&self, a: &Tensor, b: &Tensor, x0: &Tensor) -> SolverResult<Solution> {
        validate(a, b, x0)?;
        let SolverConfig { max_iter, tol, .. } = self.config;

        let mut x = x0.try_clone()?;
        let mut r = b.sub(&a.matmul(&x)?)?;
        let mut p = r.try_clone()?;
        let (mut rr, mut norm) = squared_norm(&r)?;

        for iteration in 0..max_iter {
            trace!(iteration, residual = norm, "conjugate gradient step");
            if has_converged(norm, tol) {
                debug!(iterations = iteration, residual = norm, "conjugate gradient converged");
                return Ok(Solution {
                    x,
                    status: ConvergenceStatus::Converged,
                    iterations: iteration,
                    residual_norm: norm,
                });
            }

            let ap = a.matmul(&p)?;
            let alpha = rr.cdiv(&p.transpose()?.matmul(&ap)?)?;
            x.add_in_place(&p.smul(&alpha)?)?;
            r.sub_in_place(&ap.smul(&alpha)?)?;

            let (rr_new, norm_new) = squared_norm(&r)?;
            let beta = rr_new.cdiv(&rr)?;
            p = r.add(&p.smul(&beta)?)?;
            rr = rr_new;
            norm = norm_new;
        }

        let status = if has_converged(norm, tol) {
            ConvergenceStatus::Converged
        } else {
            ConvergenceStatus::MaxIterations
        };
        debug!(iterations = max_iter, residual = norm, ?status, "conjugate gradient finished");
        Ok(Solution {
            x,
            status,
            iterations: max_iter,
            residual_norm: norm,
        })
    }
}

/// Solves `a x = b` by conjugate gradient from `x0`.
pub fn conjugate_gradient(
    a: &Tensor,
    b: &Tensor,
    x0: &Tensor,
    config: &SolverConfig,
) -> SolverResult<Solution> {
    ConjugateGradient::new(config.clone()).solve(a, b, x0)
}

// =============================================================================
// Tests
// =============================================================================
