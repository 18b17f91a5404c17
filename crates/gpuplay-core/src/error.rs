//! Error Types - gpuplay Core Error Handling
//!
//! Every compatibility violation is reported as a value of [`Error`] before a
//! backend is touched. Backend availability problems surface when a device is
//! requested from the registry, not when an operation runs.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use thiserror::Error;

use crate::device::DeviceType;
use crate::shape::Shape;

// =============================================================================
// Error Types
// =============================================================================

/// The main error type for gpuplay operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Operand shapes are incompatible with the requested operation.
    #[error("Shape mismatch in {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        /// Operation that rejected the operands.
        op: &'static str,
        /// Shape of the left (or receiving) operand.
        lhs: Shape,
        /// Shape of the offending operand.
        rhs: Shape,
    },

    /// Operands reside on different backends.
    #[error("Device mismatch: expected {expected}, got {actual}")]
    DeviceMismatch {
        /// The device the operation runs on.
        expected: DeviceType,
        /// The device the offending operand lives on.
        actual: DeviceType,
    },

    /// An operand has zero elements.
    #[error("Operation not supported on empty buffer")]
    EmptyBuffer,

    /// The requested backend is not compiled in or not usable on this machine.
    #[error("Backend not available: {device} ({reason})")]
    BackendUnavailable {
        /// The unavailable backend.
        device: DeviceType,
        /// Why the backend could not be created.
        reason: String,
    },

    /// Host data length does not match the requested shape.
    #[error("Host data has {actual} elements, shape requires {expected}")]
    HostDataLength {
        /// Element count implied by the shape.
        expected: usize,
        /// Element count of the host data.
        actual: usize,
    },

    /// A buffer tagged for a backend holds a handle of a foreign type.
    #[error("Buffer handle is not a native {device} handle")]
    HandleMismatch {
        /// Backend that attempted the downcast.
        device: DeviceType,
    },

    /// A backend name that matches no known backend.
    #[error("Unknown backend '{0}'")]
    UnknownDevice(String),

    /// A backend failed while executing an operation.
    #[error("{device} backend error: {message}")]
    Backend {
        /// The failing backend.
        device: DeviceType,
        /// Description of the failure.
        message: String,
    },
}

// =============================================================================
// Result Type
// =============================================================================

/// A specialized Result type for gpuplay operations.
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// Helper Functions
// =============================================================================

impl Error {
    /// Creates a new shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(op: &'static str, lhs: Shape, rhs: Shape) -> Self {
        Self::ShapeMismatch { op, lhs, rhs }
    }

    /// Creates a new backend unavailable error.
    #[must_use]
    pub fn unavailable(device: DeviceType, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            device,
            reason: reason.into(),
        }
    }

    /// Creates a new backend runtime error.
    #[must_use]
    pub fn backend(device: DeviceType, message: impl Into<String>) -> Self {
        Self::Backend {
            device,
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
