//! Solver Trait - Common Solver Interface
//!
//! Defines the trait both iterative solvers implement, the solution they
//! return and the operand checks they share.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use gpuplay_core::{Error, Shape};
use gpuplay_tensor::Tensor;

use crate::config::SolverConfig;
use crate::error::SolverResult;

// =============================================================================
// Solution
// =============================================================================

/// How an iterative solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The residual norm dropped below the tolerance.
    Converged,
    /// The iteration budget ran out first.
    MaxIterations,
}

/// Result of an iterative solve.
#[derive(Debug)]
pub struct Solution {
    /// The final iterate.
    pub x: Tensor,
    /// Whether the tolerance was reached.
    pub status: ConvergenceStatus,
    /// Number of update steps performed.
    pub iterations: usize,
    /// `sqrt(r^T r)` of the final residual.
    pub residual_norm: f32,
}

impl Solution {
    /// Returns true if the solver converged.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

// =============================================================================
// Solver Trait
// =============================================================================

/// Trait for solvers of `A x = b` with symmetric positive-definite `A`.
pub trait Solver {
    /// Returns the solver name.
    fn name(&self) -> &'static str;

    /// Returns the configuration in use.
    fn config(&self) -> &SolverConfig;

    /// Solves `a x = b` starting from `x0`.
    ///
    /// `a` must be `n x n`, `b` and `x0` must be `n x 1`, and all three must
    /// live on the same device.
    fn solve(&self, a: &Tensor, b: &Tensor, x0: &Tensor) -> SolverResult<Solution>;
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Checks that `a` is square and `b`, `x0` are matching column vectors on
/// the same device.
pub(crate) fn validate(a: &Tensor, b: &Tensor, x0: &Tensor) -> SolverResult<()> {
    let n = a.rows();
    let square = Shape::new(n, n);
    if a.shape() != square {
        return Err(Error::shape_mismatch("solve", a.shape(), square).into());
    }
    for v in [b, x0] {
        if !a.same_device(v) {
            return Err(Error::DeviceMismatch {
                expected: a.device_type(),
                actual: v.device_type(),
            }
            .into());
        }
        if v.shape() != Shape::column(n) {
            return Err(Error::shape_mismatch("solve", Shape::column(n), v.shape()).into());
        }
    }
    Ok(())
}

/// Returns `r^T r` as a 1x1 tensor together with `sqrt(r^T r)`.
pub(crate) fn squared_norm(r: &Tensor) -> SolverResult<(Tensor, f32)> {
    let rr = r.transpose()?.matmul(r)?;
    let norm = rr.item()?.sqrt();
    Ok((rr, norm))
}

/// `norm < tol`, with an exact zero residual counting as converged for any
/// tolerance.
pub(crate) fn has_converged(norm: f32, tol: f32) -> bool {
    norm < tol || norm == 0.0
}

// =============================================================================
// Tests
// =============================================================================
