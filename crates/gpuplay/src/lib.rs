//! # gpuplay - One Linear Algebra Program, Many Backends
//!
//! gpuplay runs dense 2-D f32 linear algebra on interchangeable compute
//! backends so the same program can be compared for correctness and speed:
//!
//! - **SERIAL**: naive reference loops
//! - **SIMD**: eight-lane `f32x8` loops
//! - **BLAS**: GEMM kernels and a data-parallel thread pool
//! - **WGPU**: WebGPU compute shaders (`wgpu` feature)
//!
//! Tensors support element-wise arithmetic, scaling, matrix products and
//! transposes, and move between backends explicitly. Gradient descent and
//! conjugate gradient solvers are built on top of the tensor operations.
//!
//! # Quick Start
//!
//! ```rust
//! use gpuplay::prelude::*;
//!
//! for device in available_devices() {
//!     let a = Tensor::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], (2, 3), &device).unwrap();
//!     let t = a.transpose().unwrap();
//!     assert_eq!(t.shape(), Shape::new(3, 2));
//!     assert_eq!(t.cpu().unwrap(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
//! }
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]

// =============================================================================
// Re-exports
// =============================================================================

pub use gpuplay_core as core;
pub use gpuplay_solvers as solvers;
pub use gpuplay_tensor as tensor;

pub use gpuplay_core::backends;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for gpuplay programs.
///
/// ```rust
/// use gpuplay::prelude::*;
/// ```
pub mod prelude {
    pub use gpuplay_core::backends::{
        available_devices, blas_device, make_device, serial_device, simd_device, wgpu_device,
    };
    pub use gpuplay_core::{Device, DevicePtr, DeviceType, Error, Result, Shape, Tolerance};

    pub use gpuplay_tensor::{column, eye, full, rand, rand_with, zeros, Tensor};

    pub use gpuplay_solvers::{
        conjugate_gradient, gradient_descent, ConjugateGradient, ConvergenceStatus,
        GradientDescent, Solution, Solver, SolverConfig, SolverError, SolverResult,
    };
}
