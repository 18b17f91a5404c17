//! Gradient Descent - Steepest Descent for SPD Systems
//!
//! Each step moves along the residual `r = b - A x` with the exact line
//! search step `eta = (r^T r) / (r^T A r)`. All arithmetic runs on the
//! tensors' device.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use tracing::{debug, trace};

use gpuplay_tensor::Tensor;

use crate::config::SolverConfig;
use crate::error::SolverResult;
use crate::solver::{has_converged, squared_norm, validate, ConvergenceStatus, Solution, Solver};

// =============================================================================
// Gradient Descent
// =============================================================================

/// Steepest descent solver.
#[derive(Debug, Clone, Default)]
pub struct GradientDescent {
    config: SolverConfig,
}

impl GradientDescent {
    /// Creates a solver with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl Solver for GradientDescent {
    fn name(&self) -> &'static str {
        "gradient_descent"
    }

    fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn solve(&self, a: &Tensor, b: &Tensor, x0: &Tensor) -> SolverResult<Solution> {
        validate(a, b, x0)?;
        let SolverConfig { max_iter, tol, .. } = self.config;

        let mut x = x0.try_clone()?;
        let mut r = b.sub(&a.matmul(&x)?)?;

        for iteration in 0..max_iter {
            let (rr, norm) = squared_norm(&r)?;
            trace!(iteration, residual = norm, "gradient descent step");
            if has_converged(norm, tol) {
                debug!(iterations = iteration, residual = norm, "gradient descent converged");
                return Ok(Solution {
                    x,
                    status: ConvergenceStatus::Converged,
                    iterations: iteration,
                    residual_norm: norm,
                });
            }

            let ar = a.matmul(&r)?;
            let eta = rr.cdiv(&r.transpose()?.matmul(&ar)?)?;
            x.add_in_place(&r.smul(&eta)?)?;
            r.sub_in_place(&ar.smul(&eta)?)?;
        }

        let (_, norm) = squared_norm(&r)?;
        let status = if has_converged(norm, tol) {
            ConvergenceStatus::Converged
        } else {
            ConvergenceStatus::MaxIterations
        };
        debug!(iterations = max_iter, residual = norm, ?status, "gradient descent finished");
        Ok(Solution {
            x,
            status,
            iterations: max_iter,
            residual_norm: norm,
        })
    }
}

/// Solves `a x = b` by gradient descent from `x0`.
///
/// # Example
/// ```rust
/// use gpuplay_core::backends;
/// use gpuplay_solvers::{gradient_descent, SolverConfig};
/// use gpuplay_tensor::Tensor;
///
/// let device = backends::serial_device().unwrap();
/// let a = Tensor::from_vec(vec![4.0, 1.0, 1.0, 3.0], (2, 2), &device).unwrap();
/// let b = Tensor::from_vec(vec![1.0, 2.0], (2, 1), &device).unwrap();
/// let x0 = Tensor::zeros((2, 1), &device).unwrap();
///
/// let config = SolverConfig::new().with_max_iter(100).with_tol(1e-6);
/// let solution = gradient_descent(&a, &b, &x0, &config).unwrap();
/// let x = solution.x.cpu().unwrap();
/// assert!((x[0] - 1.0 / 11.0).abs() < 1e-4);
/// assert!((x[1] - 7.0 / 11.0).abs() < 1e-4);
/// ```
pub fn gradient_descent(
    a: &Tensor,
    b: &Tensor,
    x0: &Tensor,
    config: &SolverConfig,
) -> SolverResult<Solution> {
    GradientDescent::new(config.clone()).solve(a, b, x0)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gpuplay_core::{backends, DeviceType, Tolerance};

    fn system() -> (Tensor, Tensor, Tensor) {
        let device = backends::serial_device().unwrap();
        (
            Tensor::from_vec(vec![4.0, 1.0, 1.0, 3.0], (2, 2), &device).unwrap(),
            Tensor::from_vec(vec![1.0, 2.0], (2, 1), &device).unwrap(),
            Tensor::zeros((2, 1), &device).unwrap(),
        )
    }

    #[test]
    fn test_solves_small_system() {
        let (a, b, x0) = system();
        let config = SolverConfig::new().with_max_iter(100).with_tol(1e-6);
        let solution = gradient_descent(&a, &b, &x0, &config).unwrap();

        let expected = Tensor::from_vec(vec![1.0 / 11.0, 7.0 / 11.0], (2, 1), a.device()).unwrap();
        assert!(solution.x.all_close(&expected, Tolerance::new(1e-4, 1e-4)).unwrap());
        assert!(solution.iterations <= 100);
    }

    #[test]
    fn test_reports_exhausted_budget() {
        let (a, b, x0) = system();
        let config = SolverConfig::new().with_max_iter(1).with_tol(1e-12);
        let solution = gradient_descent(&a, &b, &x0, &config).unwrap();
        assert_eq!(solution.status, ConvergenceStatus::MaxIterations);
        assert!(!solution.converged());
        assert_eq!(solution.iterations, 1);
        assert!(solution.residual_norm > 0.0);
    }

    #[test]
    fn test_exact_start_converges_immediately() {
        let device = backends::serial_device().unwrap();
        let a = Tensor::from_vec(vec![2.0, 0.0, 0.0, 2.0], (2, 2), &device).unwrap();
        let b = Tensor::from_vec(vec![2.0, 4.0], (2, 1), &device).unwrap();
        let x0 = Tensor::from_vec(vec![1.0, 2.0], (2, 1), &device).unwrap();

        let config = SolverConfig::new().with_tol(0.0);
        let solution = gradient_descent(&a, &b, &x0, &config).unwrap();
        assert!(solution.converged());
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.x.cpu().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_runs_on_operand_device() {
        let blas = backends::blas_device().unwrap();
        let (a, b, x0) = system();
        let (a, b, x0) = (
            a.to_device(&blas).unwrap(),
            b.to_device(&blas).unwrap(),
            x0.to_device(&blas).unwrap(),
        );

        let config = SolverConfig::new()
            .with_max_iter(100)
            .with_tol(1e-6)
            .with_device(DeviceType::Serial);
        let solver = GradientDescent::new(config);
        let solution = solver.solve(&a, &b, &x0).unwrap();
        assert_eq!(solution.x.device_type(), DeviceType::Blas);
        let x = solution.x.cpu().unwrap();
        assert!(Tolerance::new(1e-4, 1e-4).all_close(&x, &[1.0 / 11.0, 7.0 / 11.0]));
        assert_eq!(
            solver.config().device().unwrap().device_type(),
            DeviceType::Serial
        );
    }

    #[test]
    fn test_does_not_touch_x0() {
        let (a, b, x0) = system();
        let _ = gradient_descent(&a, &b, &x0, &SolverConfig::new().with_max_iter(5)).unwrap();
        assert_eq!(x0.cpu().unwrap(), vec![0.0, 0.0]);
    }
}
