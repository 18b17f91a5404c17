//! Tensor - Backend-Agnostic 2-D Matrix
//!
//! A [`Tensor`] pairs a shared handle to the device that owns its memory with
//! the [`Buffer`] holding the values. Every operation validates its operands
//! once, allocates the result through the owning device and hands the numeric
//! work to that device. Operands must live on the same device instance;
//! moving data between devices is always explicit through [`Tensor::to`].
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::sync::Arc;

use tracing::debug;

use gpuplay_core::compat;
use gpuplay_core::{Buffer, Device, DevicePtr, DeviceType, Error, Result, Shape, Tolerance};

// =============================================================================
// Tensor Struct
// =============================================================================

/// A row-major 2-D f32 matrix resident on one backend.
pub struct Tensor {
    device: DevicePtr,
    buffer: Buffer,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Wraps a buffer allocated by `device`.
    pub fn from_buffer(buffer: Buffer, device: &DevicePtr) -> Result<Self> {
        if buffer.device_type() != device.device_type() {
            return Err(Error::DeviceMismatch {
                expected: device.device_type(),
                actual: buffer.device_type(),
            });
        }
        compat::ensure_non_empty(&[&buffer])?;
        Ok(Self {
            device: Arc::clone(device),
            buffer,
        })
    }

    /// Creates a tensor from row-major host data.
    ///
    /// # Example
    /// ```rust
    /// use gpuplay_core::backends;
    /// use gpuplay_tensor::Tensor;
    ///
    /// let device = backends::serial_device().unwrap();
    /// let t = Tensor::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], (2, 3), &device).unwrap();
    /// assert_eq!(t.shape().to_string(), "2x3");
    /// ```
    pub fn from_vec(data: Vec<f32>, shape: impl Into<Shape>, device: &DevicePtr) -> Result<Self> {
        let shape = shape.into();
        if shape.is_empty() {
            return Err(Error::EmptyBuffer);
        }
        compat::check_host_data(data.len(), shape)?;
        Self::from_buffer(device.new_buffer(data, shape)?, device)
    }

    /// Creates a zero-filled tensor.
    pub fn zeros(shape: impl Into<Shape>, device: &DevicePtr) -> Result<Self> {
        crate::creation::zeros(shape, device)
    }

    /// Creates a tensor with values drawn uniformly from `[1, 2)`.
    pub fn rand(shape: impl Into<Shape>, device: &DevicePtr) -> Result<Self> {
        crate::creation::rand(shape, device)
    }

    /// Creates a tensor with values drawn uniformly from `[1, 2)` using `rng`.
    pub fn rand_with<R: rand::Rng + ?Sized>(
        shape: impl Into<Shape>,
        device: &DevicePtr,
        rng: &mut R,
    ) -> Result<Self> {
        crate::creation::rand_with(shape, device, rng)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the shape of the tensor.
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.buffer.shape()
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.shape().rows
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.shape().cols
    }

    /// Total number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.buffer.size()
    }

    /// The device owning this tensor's memory.
    #[must_use]
    pub fn device(&self) -> &DevicePtr {
        &self.device
    }

    /// Tag of the owning backend.
    #[must_use]
    pub fn device_type(&self) -> DeviceType {
        self.device.device_type()
    }

    /// The underlying buffer.
    #[must_use]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Returns true if `other` lives on the same device instance.
    #[must_use]
    pub fn same_device(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.device, &other.device)
    }

    // =========================================================================
    // Host Access
    // =========================================================================

    /// Copies the values to host memory, waiting for pending device work.
    pub fn cpu(&self) -> Result<Vec<f32>> {
        self.device.cpu(&self.buffer)
    }

    /// Blocks until pending device work on this tensor has completed.
    pub fn sync(&self) -> Result<()> {
        self.device.sync(&self.buffer)
    }

    /// Returns the single value of a 1x1 tensor.
    pub fn item(&self) -> Result<f32> {
        if !self.shape().is_scalar() {
            return Err(Error::shape_mismatch("item", self.shape(), Shape::scalar()));
        }
        Ok(self.cpu()?[0])
    }

    /// Compares host values element by element. The tensors may live on
    /// different devices but must have the same shape.
    pub fn all_close(&self, other: &Self, tolerance: Tolerance) -> Result<bool> {
        compat::ensure_same_shape("all_close", self.shape(), other.shape())?;
        Ok(tolerance.all_close(&self.cpu()?, &other.cpu()?))
    }

    // =========================================================================
    // Copy and Transfer
    // =========================================================================

    /// Deep copy on the same device.
    pub fn try_clone(&self) -> Result<Self> {
        let mut buffer = self.device.new_buffer_with_shape(self.shape())?;
        self.device.copy_buffer(&self.buffer, &mut buffer)?;
        Self::from_buffer(buffer, &self.device)
    }

    /// Copy assignment: takes the values, shape and device of `other`.
    ///
    /// The existing buffer is reused when it already has the right device and
    /// shape, otherwise a new one is allocated.
    pub fn assign(&mut self, other: &Self) -> Result<()> {
        if self.same_device(other) && self.shape() == other.shape() {
            compat::check_copy(&other.buffer, &self.buffer)?;
            self.device.copy_buffer(&other.buffer, &mut self.buffer)
        } else {
            *self = other.try_clone()?;
            Ok(())
        }
    }

    /// Moves this tensor to `device`, going through host memory.
    ///
    /// Does nothing if the tensor already lives there.
    pub fn to(&mut self, device: &DevicePtr) -> Result<()> {
        if Arc::ptr_eq(&self.device, device) {
            return Ok(());
        }
        *self = self.to_device(device)?;
        Ok(())
    }

    /// Returns a copy of this tensor on `device`.
    pub fn to_device(&self, device: &DevicePtr) -> Result<Self> {
        if Arc::ptr_eq(&self.device, device) {
            return self.try_clone();
        }
        debug!(
            from = %self.device_type(),
            to = %device.device_type(),
            shape = %self.shape(),
            "transferring tensor"
        );
        Self::from_vec(self.cpu()?, self.shape(), device)
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    fn ensure_same_device(&self, other: &Self) -> Result<()> {
        compat::ensure_non_empty(&[&self.buffer, &other.buffer])?;
        if self.same_device(other) {
            Ok(())
        } else {
            Err(Error::DeviceMismatch {
                expected: self.device_type(),
                actual: other.device_type(),
            })
        }
    }

    fn produce(
        &self,
        other: &Self,
        shape: Shape,
        kernel: fn(&dyn Device, &Buffer, &Buffer, &mut Buffer) -> Result<()>,
    ) -> Result<Self> {
        let mut out = self.device.new_buffer_with_shape(shape)?;
        kernel(self.device.as_ref(), &self.buffer, &other.buffer, &mut out)?;
        Self::from_buffer(out, &self.device)
    }

    fn elementwise(
        &self,
        other: &Self,
        op: &'static str,
        kernel: fn(&dyn Device, &Buffer, &Buffer, &mut Buffer) -> Result<()>,
    ) -> Result<Self> {
        self.ensure_same_device(other)?;
        let shape = compat::check_elementwise(op, &self.buffer, &other.buffer)?;
        self.produce(other, shape, kernel)
    }

    /// Element-wise sum.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.elementwise(other, "add", |d, a, b, out| d.add(a, b, out))
    }

    /// Element-wise difference.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.elementwise(other, "sub", |d, a, b, out| d.sub(a, b, out))
    }

    /// Element-wise product.
    pub fn cmul(&self, other: &Self) -> Result<Self> {
        self.elementwise(other, "cmul", |d, a, b, out| d.cmul(a, b, out))
    }

    /// Element-wise quotient.
    pub fn cdiv(&self, other: &Self) -> Result<Self> {
        self.elementwise(other, "cdiv", |d, a, b, out| d.cdiv(a, b, out))
    }

    /// Scales every element by the value of the 1x1 tensor `s`.
    pub fn smul(&self, s: &Self) -> Result<Self> {
        self.ensure_same_device(s)?;
        let shape = compat::check_scale(&self.buffer, &s.buffer)?;
        self.produce(s, shape, |d, a, s, out| d.smul(a, s, out))
    }

    /// Matrix product `self (m x k) * other (k x n)`.
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        self.ensure_same_device(other)?;
        let shape = compat::check_matmul(&self.buffer, &other.buffer)?;
        self.produce(other, shape, |d, a, b, out| d.mul(a, b, out))
    }

    /// Returns the transposed matrix.
    pub fn transpose(&self) -> Result<Self> {
        let shape = compat::check_transpose(&self.buffer)?;
        let mut out = self.device.new_buffer_with_shape(shape)?;
        self.device.transpose(&self.buffer, &mut out)?;
        Self::from_buffer(out, &self.device)
    }

    /// `self += other`, element by element.
    pub fn add_in_place(&mut self, other: &Self) -> Result<()> {
        self.ensure_same_device(other)?;
        compat::check_in_place("add_assign", &self.buffer, &other.buffer)?;
        self.device.add_assign(&mut self.buffer, &other.buffer)
    }

    /// `self -= other`, element by element.
    pub fn sub_in_place(&mut self, other: &Self) -> Result<()> {
        self.ensure_same_device(other)?;
        compat::check_in_place("sub_assign", &self.buffer, &other.buffer)?;
        self.device.sub_assign(&mut self.buffer, &other.buffer)
    }
}

// =============================================================================
// Clone Implementation
// =============================================================================

impl Clone for Tensor {
    fn clone(&self) -> Self {
        self.try_clone().expect("Tensor clone failed")
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign(source).expect("Tensor assignment failed");
    }
}

// =============================================================================
// Operator Trait Implementations
// =============================================================================

impl Add for &Tensor {
    type Output = Tensor;

    fn add(self, other: Self) -> Self::Output {
        Tensor::add(self, other).expect("Addition failed")
    }
}

impl Sub for &Tensor {
    type Output = Tensor;

    fn sub(self, other: Self) -> Self::Output {
        Tensor::sub(self, other).expect("Subtraction failed")
    }
}

impl Mul for &Tensor {
    type Output = Tensor;

    fn mul(self, other: Self) -> Self::Output {
        self.matmul(other).expect("Matrix multiplication failed")
    }
}

impl AddAssign<&Tensor> for Tensor {
    fn add_assign(&mut self, other: &Tensor) {
        self.add_in_place(other).expect("In-place addition failed");
    }
}

impl SubAssign<&Tensor> for Tensor {
    fn sub_assign(&mut self, other: &Tensor) {
        self.sub_in_place(other).expect("In-place subtraction failed");
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={}, device={})", self.shape(), self.device_type())
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.cpu().map_err(|_| fmt::Error)?;
        for row in data.chunks(self.cols()) {
            for (j, val) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{val}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
