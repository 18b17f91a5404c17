//! Device Abstraction - Backend Contract
//!
//! Every compute backend implements [`Device`]. A tensor operation validates
//! its operands, allocates a result [`Buffer`] through the owning device and
//! delegates the numeric work to it. Devices only ever see buffers, never
//! tensors, and may assume their inputs were validated by [`crate::compat`].
//!
//! # Key Features
//! - `DeviceType` tag identifying each backend
//! - Object-safe `Device` trait shared through `DevicePtr`
//! - Backend-declared numeric tolerance
//!
//! # Example
//! ```rust
//! use gpuplay_core::DeviceType;
//!
//! let device: DeviceType = "simd".parse().unwrap();
//! assert_eq!(device, DeviceType::Simd);
//! assert_eq!(device.to_string(), "SIMD");
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::tolerance::Tolerance;

// =============================================================================
// DeviceType Enum
// =============================================================================

/// Tag naming the backend a buffer or device belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Naive reference backend, plain scalar loops.
    Serial,
    /// Eight-lane SIMD backend.
    Simd,
    /// Vector-math backend built on a GEMM kernel and a thread pool.
    Blas,
    /// WebGPU compute-shader backend.
    Wgpu,
}

impl DeviceType {
    /// Every backend tag, in registry order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Serial, Self::Simd, Self::Blas, Self::Wgpu]
    }

    /// Returns the display name of this backend.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Serial => "SERIAL",
            Self::Simd => "SIMD",
            Self::Blas => "BLAS",
            Self::Wgpu => "WGPU",
        }
    }

    /// Returns true for backends whose buffers live in host memory.
    #[must_use]
    pub const fn is_cpu(self) -> bool {
        !self.is_gpu()
    }

    /// Returns true for GPU backends.
    #[must_use]
    pub const fn is_gpu(self) -> bool {
        matches!(self, Self::Wgpu)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .into_iter()
            .find(|device| device.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownDevice(s.to_string()))
    }
}

// =============================================================================
// Device Trait
// =============================================================================

/// Shared handle to a backend instance.
///
/// Backends are process-wide singletons handed out by
/// [`crate::backends::make_device`], so two handles denote the same device
/// exactly when `Arc::ptr_eq` holds.
pub type DevicePtr = Arc<dyn Device>;

/// The capability set every compute backend provides.
///
/// Operations write into a caller-allocated `out` buffer. Shape and device
/// compatibility are checked by the caller before any method here is invoked.
/// Implementations reinterpret buffers through [`Buffer::handle`], which still
/// rejects buffers allocated by another backend.
pub trait Device: Send + Sync + fmt::Debug {
    /// Returns the tag of this backend.
    fn device_type(&self) -> DeviceType;

    /// Returns the display name of this backend.
    fn name(&self) -> &'static str {
        self.device_type().name()
    }

    /// Tolerance within which this backend's f32 results match the serial
    /// reference.
    fn tolerance(&self) -> Tolerance {
        Tolerance::default()
    }

    /// Allocates a buffer holding a copy of row-major host data.
    fn new_buffer(&self, data: Vec<f32>, shape: Shape) -> Result<Buffer>;

    /// Allocates a zero-filled buffer.
    fn new_buffer_with_shape(&self, shape: Shape) -> Result<Buffer>;

    /// `out = a + b`, element by element.
    fn add(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()>;

    /// `out = a - b`, element by element.
    fn sub(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()>;

    /// `a += b`, element by element.
    fn add_assign(&self, a: &mut Buffer, b: &Buffer) -> Result<()>;

    /// `a -= b`, element by element.
    fn sub_assign(&self, a: &mut Buffer, b: &Buffer) -> Result<()>;

    /// `out = a * b`, element by element.
    fn cmul(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()>;

    /// `out = a / b`, element by element.
    fn cdiv(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()>;

    /// `out = s * a` where `s` is a 1x1 buffer.
    fn smul(&self, a: &Buffer, s: &Buffer, out: &mut Buffer) -> Result<()>;

    /// Dense matrix product `out[i, j] = sum_k a[i, k] * b[k, j]`.
    fn mul(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()>;

    /// `out[j, i] = a[i, j]`.
    fn transpose(&self, a: &Buffer, out: &mut Buffer) -> Result<()>;

    /// Copies the values of `from` into `to`.
    fn copy_buffer(&self, from: &Buffer, to: &mut Buffer) -> Result<()>;

    /// Materializes the buffer in host memory, after all previously issued
    /// work on it has completed.
    fn cpu(&self, buffer: &Buffer) -> Result<Vec<f32>>;

    /// Blocks until deferred work affecting `buffer` has completed.
    fn sync(&self, buffer: &Buffer) -> Result<()>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_names() {
        assert_eq!(DeviceType::Serial.name(), "SERIAL");
        assert_eq!(DeviceType::Wgpu.to_string(), "WGPU");
        assert!(DeviceType::Blas.is_cpu());
        assert!(DeviceType::Wgpu.is_gpu());
    }

    #[test]
    fn test_device_type_from_str() {
        assert_eq!("serial".parse::<DeviceType>().unwrap(), DeviceType::Serial);
        assert_eq!(" BLAS ".parse::<DeviceType>().unwrap(), DeviceType::Blas);
        assert!("cuda".parse::<DeviceType>().is_err());
    }

    #[test]
    fn test_device_type_all() {
        let all = DeviceType::all();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], DeviceType::Serial);
    }
}
