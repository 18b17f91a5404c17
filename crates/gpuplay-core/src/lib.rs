//! gpuplay Core - Device and Buffer Layer
//!
//! This crate provides the abstractions every gpuplay tensor operation is
//! routed through: the `Device` contract a compute backend implements, the
//! move-only `Buffer` that owns backend memory, the compatibility checks run
//! before any backend call, and the backends themselves.
//!
//! # Key Features
//! - Object-safe `Device` trait shared through `DevicePtr` handles
//! - Tag-checked, type-erased backend buffers
//! - Serial reference, SIMD, GEMM and WebGPU backends
//! - Backend registry with lazily created singletons
//!
//! # Example
//! ```rust
//! use gpuplay_core::{backends, Device, Shape};
//!
//! let device = backends::serial_device().unwrap();
//! let buffer = device.new_buffer(vec![1.0, 2.0, 3.0, 4.0], Shape::new(2, 2)).unwrap();
//! assert_eq!(device.cpu(&buffer).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]

// =============================================================================
// Modules
// =============================================================================

pub mod backends;
pub mod buffer;
pub mod compat;
pub mod device;
pub mod error;
pub mod shape;
pub mod tolerance;

// =============================================================================
// Re-exports
// =============================================================================

pub use buffer::Buffer;
pub use device::{Device, DevicePtr, DeviceType};
pub use error::{Error, Result};
pub use shape::Shape;
pub use tolerance::Tolerance;

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::backends::{available_devices, make_device};
    pub use crate::buffer::Buffer;
    pub use crate::device::{Device, DevicePtr, DeviceType};
    pub use crate::error::{Error, Result};
    pub use crate::shape::Shape;
    pub use crate::tolerance::Tolerance;
}
