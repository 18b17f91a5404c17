//! gpuplay Tensor - Backend-Agnostic Matrices
//!
//! This crate provides the `Tensor` type: a 2-D row-major f32 matrix that
//! lives on one of the gpuplay backends. The same program runs unchanged on
//! every backend; only the device handle passed at creation differs.
//!
//! # Key Features
//! - Element-wise arithmetic, scaling, matrix product and transpose
//! - Operator overloads for `+`, `-`, `*`, `+=` and `-=`
//! - Explicit transfer between devices
//! - Zero, constant, identity and random creation helpers
//!
//! # Example
//! ```rust
//! use gpuplay_core::backends;
//! use gpuplay_tensor::Tensor;
//!
//! let device = backends::simd_device().unwrap();
//! let a = Tensor::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], (6, 1), &device).unwrap();
//! let b = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (6, 1), &device).unwrap();
//! let c = &a + &b;
//! assert_eq!(c.cpu().unwrap(), vec![1.0, 3.0, 5.0, 7.0, 9.0, 11.0]);
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]

// =============================================================================
// Modules
// =============================================================================

pub mod creation;
pub mod tensor;

// =============================================================================
// Re-exports
// =============================================================================

pub use creation::{column, eye, full, rand, rand_with, zeros};
pub use tensor::Tensor;

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::creation::{column, eye, full, rand, rand_with, zeros};
    pub use crate::tensor::Tensor;
    pub use gpuplay_core::prelude::*;
}
