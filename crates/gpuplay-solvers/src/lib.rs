//! gpuplay Solvers - Iterative Linear Solvers
//!
//! Gradient descent and conjugate gradient for symmetric positive-definite
//! systems `A x = b`, written purely in terms of tensor operations so they run
//! on whichever backend their operands live on.
//!
//! # Key Features
//! - `Solver` trait implemented by `GradientDescent` and `ConjugateGradient`
//! - Explicit convergence status on every solution
//! - TOML-loadable `SolverConfig`
//!
//! # Example
//! ```rust
//! use gpuplay_solvers::{ConjugateGradient, Solver, SolverConfig};
//! use gpuplay_tensor::Tensor;
//!
//! let config = SolverConfig::new().with_max_iter(100).with_tol(1e-6);
//! let device = config.device().unwrap();
//! let a = Tensor::from_vec(vec![4.0, 1.0, 1.0, 3.0], (2, 2), &device).unwrap();
//! let b = Tensor::from_vec(vec![1.0, 2.0], (2, 1), &device).unwrap();
//! let x0 = Tensor::zeros((2, 1), &device).unwrap();
//!
//! let solution = ConjugateGradient::new(config).solve(&a, &b, &x0).unwrap();
//! assert!(solution.converged());
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]
#![allow(clippy::cast_precision_loss)]

// =============================================================================
// Modules
// =============================================================================

pub mod config;
pub mod conjugate_gradient;
pub mod error;
pub mod gradient_descent;
pub mod solver;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::SolverConfig;
pub use conjugate_gradient::{conjugate_gradient, ConjugateGradient};
pub use error::{SolverError, SolverResult};
pub use gradient_descent::{gradient_descent, GradientDescent};
pub use solver::{ConvergenceStatus, Solution, Solver};

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        conjugate_gradient, gradient_descent, ConjugateGradient, ConvergenceStatus,
        GradientDescent, Solution, Solver, SolverConfig, SolverError, SolverResult,
    };
}
