//! Serial Backend - Reference Implementation
//!
//! Plain scalar loops over host memory. Every other backend is checked
//! against this one.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use crate::buffer::Buffer;
use crate::compat;
use crate::device::{Device, DeviceType};
use crate::error::Result;
use crate::shape::Shape;

const DEVICE: DeviceType = DeviceType::Serial;

// =============================================================================
// Serial Buffer
// =============================================================================

/// Host storage of the serial backend.
#[derive(Debug, Clone)]
pub struct SerialBuffer(Vec<f32>);

fn data(buffer: &Buffer) -> Result<&[f32]> {
    Ok(&buffer.handle::<SerialBuffer>(DEVICE)?.0)
}

fn data_mut(buffer: &mut Buffer) -> Result<&mut [f32]> {
    Ok(&mut buffer.handle_mut::<SerialBuffer>(DEVICE)?.0)
}

// =============================================================================
// Serial Device
// =============================================================================

/// Naive reference backend.
#[derive(Debug, Default)]
pub struct SerialDevice;

impl SerialDevice {
    /// Creates the serial backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn zip_with(
        a: &Buffer,
        b: &Buffer,
        out: &mut Buffer,
        f: impl Fn(f32, f32) -> f32,
    ) -> Result<()> {
        let (a, b) = (data(a)?, data(b)?);
        let out = data_mut(out)?;
        for i in 0..out.len() {
            out[i] = f(a[i], b[i]);
        }
        Ok(())
    }

    fn update_with(a: &mut Buffer, b: &Buffer, f: impl Fn(f32, f32) -> f32) -> Result<()> {
        let b = data(b)?;
        let a = data_mut(a)?;
        for i in 0..a.len() {
            a[i] = f(a[i], b[i]);
        }
        Ok(())
    }
}

impl Device for SerialDevice {
    fn device_type(&self) -> DeviceType {
        DEVICE
    }

    fn new_buffer(&self, data: Vec<f32>, shape: Shape) -> Result<Buffer> {
        compat::check_host_data(data.len(), shape)?;
        Ok(Buffer::new(SerialBuffer(data), shape, DEVICE))
    }

    fn new_buffer_with_shape(&self, shape: Shape) -> Result<Buffer> {
        self.new_buffer(vec![0.0; shape.numel()], shape)
    }

    fn add(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::zip_with(a, b, out, |x, y| x + y)
    }

    fn sub(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::zip_with(a, b, out, |x, y| x - y)
    }

    fn add_assign(&self, a: &mut Buffer, b: &Buffer) -> Result<()> {
        Self::update_with(a, b, |x, y| x + y)
    }

    fn sub_assign(&self, a: &mut Buffer, b: &Buffer) -> Result<()> {
        Self::update_with(a, b, |x, y| x - y)
    }

    fn cmul(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::zip_with(a, b, out, |x, y| x * y)
    }

    fn cdiv(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::zip_with(a, b, out, |x, y| x / y)
    }

    fn smul(&self, a: &Buffer, s: &Buffer, out: &mut Buffer) -> Result<()> {
        let scale = data(s)?[0];
        let a = data(a)?;
        let out = data_mut(out)?;
        for i in 0..out.len() {
            out[i] = scale * a[i];
        }
        Ok(())
    }

    fn mul(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        let (m, k, n) = (a.shape().rows, a.shape().cols, b.shape().cols);
        let (a, b) = (data(a)?, data(b)?);
        let out = data_mut(out)?;
        for i in 0..m {
            for j in 0..n {
                let mut sum = 0.0;
                for p in 0..k {
                    sum += a[i * k + p] * b[p * n + j];
                }
                out[i * n + j] = sum;
            }
        }
        Ok(())
    }

    fn transpose(&self, a: &Buffer, out: &mut Buffer) -> Result<()> {
        let Shape { rows, cols } = a.shape();
        let a = data(a)?;
        let out = data_mut(out)?;
        for i in 0..rows {
            for j in 0..cols {
                out[j * rows + i] = a[i * cols + j];
            }
        }
        Ok(())
    }

    fn copy_buffer(&self, from: &Buffer, to: &mut Buffer) -> Result<()> {
        data_mut(to)?.copy_from_slice(data(from)?);
        Ok(())
    }

    fn cpu(&self, buffer: &Buffer) -> Result<Vec<f32>> {
        Ok(data(buffer)?.to_vec())
    }

    fn sync(&self, _buffer: &Buffer) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
