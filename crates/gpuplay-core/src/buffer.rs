//! Buffer - Type-Erased Backend Memory
//!
//! A [`Buffer`] owns one backend allocation. The concrete handle type is
//! private to the backend that created it and is stored behind `dyn Any`
//! together with the backend tag, so a backend can get its own type back
//! without the tensor layer ever naming it. Dropping the buffer drops the
//! handle, which releases the backend memory.
//!
//! Buffers are move-only. Deep copies go through
//! [`Device::copy_buffer`](crate::Device::copy_buffer).
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::any::Any;
use core::fmt;

use crate::device::DeviceType;
use crate::error::{Error, Result};
use crate::shape::Shape;

// =============================================================================
// Buffer Struct
// =============================================================================

/// Backend-owned storage for a 2-D f32 matrix.
pub struct Buffer {
    handle: Box<dyn Any + Send + Sync>,
    shape: Shape,
    device_type: DeviceType,
}

impl Buffer {
    /// Wraps a backend handle.
    ///
    /// Only backends should call this, from their allocation routines, after
    /// [`compat::check_host_data`](crate::compat::check_host_data) has
    /// confirmed the handle holds `shape.numel()` values. The handle's `Drop`
    /// implementation is the buffer's release routine.
    pub fn new<H>(handle: H, shape: Shape, device_type: DeviceType) -> Self
    where
        H: Any + Send + Sync,
    {
        Self {
            handle: Box::new(handle),
            shape,
            device_type,
        }
    }

    /// Number of f32 elements.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.shape.numel()
    }

    /// Returns true if the buffer holds no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Logical shape of the stored matrix.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Backend the buffer was allocated by.
    #[must_use]
    pub const fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Reinterprets the handle as the backend type `H`.
    ///
    /// Fails with `DeviceMismatch` if the buffer belongs to another backend
    /// and with `HandleMismatch` if the tag matches but the handle type does
    /// not.
    pub fn handle<H: Any>(&self, expected: DeviceType) -> Result<&H> {
        self.check_tag(expected)?;
        self.handle
            .downcast_ref::<H>()
            .ok_or(Error::HandleMismatch { device: expected })
    }

    /// Mutable counterpart of [`Buffer::handle`].
    pub fn handle_mut<H: Any>(&mut self, expected: DeviceType) -> Result<&mut H> {
        self.check_tag(expected)?;
        self.handle
            .downcast_mut::<H>()
            .ok_or(Error::HandleMismatch { device: expected })
    }

    fn check_tag(&self, expected: DeviceType) -> Result<()> {
        if self.device_type == expected {
            Ok(())
        } else {
            Err(Error::DeviceMismatch {
                expected,
                actual: self.device_type,
            })
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("shape", &self.shape)
            .field("device_type", &self.device_type)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
