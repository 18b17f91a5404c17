//! Compatibility Checks - Operand Validation
//!
//! Run by the tensor layer before any backend call. Each check enforces, in
//! order: every operand is non-empty, every operand lives on the same
//! backend, and the operand shapes fit the operation. The per-operation
//! checks return the shape of the result the caller has to allocate.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::shape::Shape;

// =============================================================================
// Building Blocks
// =============================================================================

/// Fails with `EmptyBuffer` if any operand has zero elements.
pub fn ensure_non_empty(buffers: &[&Buffer]) -> Result<()> {
    if buffers.iter().any(|b| b.is_empty()) {
        return Err(Error::EmptyBuffer);
    }
    Ok(())
}

/// Fails with `DeviceMismatch` unless every operand has the first one's tag.
pub fn ensure_same_device(buffers: &[&Buffer]) -> Result<()> {
    let Some(first) = buffers.first() else {
        return Ok(());
    };
    let expected = first.device_type();
    match buffers.iter().find(|b| b.device_type() != expected) {
        Some(other) => Err(Error::DeviceMismatch {
            expected,
            actual: other.device_type(),
        }),
        None => Ok(()),
    }
}

/// Fails with `ShapeMismatch` unless both shapes are equal.
pub fn ensure_same_shape(op: &'static str, lhs: Shape, rhs: Shape) -> Result<()> {
    if lhs == rhs {
        Ok(())
    } else {
        Err(Error::shape_mismatch(op, lhs, rhs))
    }
}

/// Fails with `HostDataLength` unless `len` host values fill `shape`.
///
/// Every backend runs this from `new_buffer`, so a buffer's storage always
/// holds exactly `shape.numel()` values.
pub fn check_host_data(len: usize, shape: Shape) -> Result<()> {
    if len == shape.numel() {
        Ok(())
    } else {
        Err(Error::HostDataLength {
            expected: shape.numel(),
            actual: len,
        })
    }
}

fn ensure_operands(buffers: &[&Buffer]) -> Result<()> {
    ensure_non_empty(buffers)?;
    ensure_same_device(buffers)
}

// =============================================================================
// Per-Operation Checks
// =============================================================================

/// Checks an elementwise binary operation (`add`, `sub`, `cmul`, `cdiv`).
pub fn check_elementwise(op: &'static str, a: &Buffer, b: &Buffer) -> Result<Shape> {
    ensure_operands(&[a, b])?;
    ensure_same_shape(op, a.shape(), b.shape())?;
    Ok(a.shape())
}

/// Checks an in-place elementwise operation (`add_assign`, `sub_assign`).
pub fn check_in_place(op: &'static str, a: &Buffer, b: &Buffer) -> Result<()> {
    check_elementwise(op, a, b).map(|_| ())
}

/// Checks scaling of `a` by the 1x1 operand `s`.
pub fn check_scale(a: &Buffer, s: &Buffer) -> Result<Shape> {
    ensure_operands(&[a, s])?;
    if !s.shape().is_scalar() {
        return Err(Error::shape_mismatch("smul", a.shape(), s.shape()));
    }
    Ok(a.shape())
}

/// Checks `a (m x k) * b (k x n)`, returning `m x n`.
pub fn check_matmul(a: &Buffer, b: &Buffer) -> Result<Shape> {
    ensure_operands(&[a, b])?;
    let (lhs, rhs) = (a.shape(), b.shape());
    if lhs.cols != rhs.rows {
        return Err(Error::shape_mismatch("matmul", lhs, rhs));
    }
    Ok(Shape::new(lhs.rows, rhs.cols))
}

/// Checks a transpose, returning the reversed shape.
pub fn check_transpose(a: &Buffer) -> Result<Shape> {
    ensure_operands(&[a])?;
    Ok(a.shape().transposed())
}

/// Checks a value copy between two buffers.
pub fn check_copy(from: &Buffer, to: &Buffer) -> Result<()> {
    ensure_operands(&[from, to])?;
    ensure_same_shape("copy", to.shape(), from.shape())
}

// =============================================================================
// Tests
// =============================================================================
