//! SIMD Backend - Eight-Lane Vector Loops
//!
//! Host storage padded to a multiple of eight floats, processed with
//! `wide::f32x8`. Elementwise operations run whole lanes over the padded
//! storage; matrix multiplication uses an i-k-j loop that broadcasts one
//! element of `a` and streams rows of `b` through the lanes.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use wide::f32x8;

use crate::buffer::Buffer;
use crate::compat;
use crate::device::{Device, DeviceType};
use crate::error::Result;
use crate::shape::Shape;

const DEVICE: DeviceType = DeviceType::Simd;
const LANES: usize = 8;

// =============================================================================
// Lane Helpers
// =============================================================================

#[inline]
fn load(chunk: &[f32]) -> f32x8 {
    let mut lanes = [0.0f32; LANES];
    lanes.copy_from_slice(chunk);
    f32x8::from(lanes)
}

#[inline]
fn store(value: f32x8, chunk: &mut [f32]) {
    chunk.copy_from_slice(&value.to_array());
}

/// `y += alpha * x` over slices of equal length.
fn axpy(y: &mut [f32], alpha: f32, x: &[f32]) {
    let alpha_v = f32x8::splat(alpha);
    let mut y_chunks = y.chunks_exact_mut(LANES);
    let mut x_chunks = x.chunks_exact(LANES);
    for (yc, xc) in (&mut y_chunks).zip(&mut x_chunks) {
        let value = load(yc) + alpha_v * load(xc);
        store(value, yc);
    }
    for (yv, xv) in y_chunks.into_remainder().iter_mut().zip(x_chunks.remainder()) {
        *yv += alpha * xv;
    }
}

const fn padded_len(len: usize) -> usize {
    len.div_ceil(LANES) * LANES
}

// =============================================================================
// SIMD Buffer
// =============================================================================

/// Lane-padded host storage of the SIMD backend.
#[derive(Debug, Clone)]
pub struct SimdBuffer {
    lanes: Vec<f32>,
    len: usize,
}

impl SimdBuffer {
    fn from_vec(mut data: Vec<f32>) -> Self {
        let len = data.len();
        data.resize(padded_len(len), 0.0);
        Self { lanes: data, len }
    }

    fn values(&self) -> &[f32] {
        &self.lanes[..self.len]
    }

    fn values_mut(&mut self) -> &mut [f32] {
        &mut self.lanes[..self.len]
    }
}

fn storage(buffer: &Buffer) -> Result<&SimdBuffer> {
    buffer.handle::<SimdBuffer>(DEVICE)
}

fn storage_mut(buffer: &mut Buffer) -> Result<&mut SimdBuffer> {
    buffer.handle_mut::<SimdBuffer>(DEVICE)
}

// =============================================================================
// SIMD Device
// =============================================================================

/// Backend vectorized with eight-lane f32 SIMD.
#[derive(Debug, Default)]
pub struct SimdDevice;

impl SimdDevice {
    /// Creates the SIMD backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn zip_lanes(
        a: &Buffer,
        b: &Buffer,
        out: &mut Buffer,
        f: impl Fn(f32x8, f32x8) -> f32x8,
    ) -> Result<()> {
        let (a, b) = (storage(a)?, storage(b)?);
        let out = storage_mut(out)?;
        for ((oc, ac), bc) in out
            .lanes
            .chunks_exact_mut(LANES)
            .zip(a.lanes.chunks_exact(LANES))
            .zip(b.lanes.chunks_exact(LANES))
        {
            store(f(load(ac), load(bc)), oc);
        }
        Ok(())
    }

    fn update_lanes(a: &mut Buffer, b: &Buffer, f: impl Fn(f32x8, f32x8) -> f32x8) -> Result<()> {
        let b = storage(b)?;
        let a = storage_mut(a)?;
        for (ac, bc) in a
            .lanes
            .chunks_exact_mut(LANES)
            .zip(b.lanes.chunks_exact(LANES))
        {
            let value = f(load(ac), load(bc));
            store(value, ac);
        }
        Ok(())
    }
}

impl Device for SimdDevice {
    fn device_type(&self) -> DeviceType {
        DEVICE
    }

    fn new_buffer(&self, data: Vec<f32>, shape: Shape) -> Result<Buffer> {
        compat::check_host_data(data.len(), shape)?;
        Ok(Buffer::new(SimdBuffer::from_vec(data), shape, DEVICE))
    }

    fn new_buffer_with_shape(&self, shape: Shape) -> Result<Buffer> {
        self.new_buffer(vec![0.0; shape.numel()], shape)
    }

    fn add(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::zip_lanes(a, b, out, |x, y| x + y)
    }

    fn sub(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::zip_lanes(a, b, out, |x, y| x - y)
    }

    fn add_assign(&self, a: &mut Buffer, b: &Buffer) -> Result<()> {
        Self::update_lanes(a, b, |x, y| x + y)
    }

    fn sub_assign(&self, a: &mut Buffer, b: &Buffer) -> Result<()> {
        Self::update_lanes(a, b, |x, y| x - y)
    }

    fn cmul(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::zip_lanes(a, b, out, |x, y| x * y)
    }

    fn cdiv(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        // Padding lanes become NaN here; they are never read back.
        Self::zip_lanes(a, b, out, |x, y| x / y)
    }

    fn smul(&self, a: &Buffer, s: &Buffer, out: &mut Buffer) -> Result<()> {
        let scale = f32x8::splat(storage(s)?.values()[0]);
        let a = storage(a)?;
        let out = storage_mut(out)?;
        for (oc, ac) in out
            .lanes
            .chunks_exact_mut(LANES)
            .zip(a.lanes.chunks_exact(LANES))
        {
            store(scale * load(ac), oc);
        }
        Ok(())
    }

    fn mul(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        let (m, k, n) = (a.shape().rows, a.shape().cols, b.shape().cols);
        let (a, b) = (storage(a)?.values(), storage(b)?.values());
        let out = storage_mut(out)?.values_mut();
        out.fill(0.0);
        for i in 0..m {
            let out_row = &mut out[i * n..(i + 1) * n];
            for p in 0..k {
                axpy(out_row, a[i * k + p], &b[p * n..(p + 1) * n]);
            }
        }
        Ok(())
    }

    fn transpose(&self, a: &Buffer, out: &mut Buffer) -> Result<()> {
        let Shape { rows, cols } = a.shape();
        let a = storage(a)?.values();
        let out = storage_mut(out)?.values_mut();
        for i in 0..rows {
            for j in 0..cols {
                out[j * rows + i] = a[i * cols + j];
            }
        }
        Ok(())
    }

    fn copy_buffer(&self, from: &Buffer, to: &mut Buffer) -> Result<()> {
        let from = storage(from)?;
        storage_mut(to)?.lanes.copy_from_slice(&from.lanes);
        Ok(())
    }

    fn cpu(&self, buffer: &Buffer) -> Result<Vec<f32>> {
        Ok(storage(buffer)?.values().to_vec())
    }

    fn sync(&self, _buffer: &Buffer) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding() {
        let buffer = SimdBuffer::from_vec(vec![1.0; 9]);
        assert_eq!(buffer.lanes.len(), 16);
        assert_eq!(buffer.values().len(), 9);
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(8), 8);
    }

    #[test]
    fn test_add_odd_length() {
        let device = SimdDevice::new();
        let shape = Shape::row(11);
        let a = device.new_buffer((0..11).map(|x| x as f32).collect(), shape).unwrap();
        let b = device.new_buffer(vec![1.0; 11], shape).unwrap();
        let mut out = device.new_buffer_with_shape(shape).unwrap();
        device.add(&a, &b, &mut out).unwrap();
        let expected: Vec<f32> = (1..12).map(|x| x as f32).collect();
        assert_eq!(device.cpu(&out).unwrap(), expected);
    }

    #[test]
    fn test_axpy_remainder() {
        let mut y = vec![1.0; 10];
        let x: Vec<f32> = (0..10).map(|v| v as f32).collect();
        axpy(&mut y, 2.0, &x);
        let expected: Vec<f32> = (0..10).map(|v| 1.0 + 2.0 * v as f32).collect();
        assert_eq!(y, expected);
    }

    #[test]
    fn test_matmul() {
        let device = SimdDevice::new();
        let a = device
            .new_buffer(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Shape::new(2, 3))
            .unwrap();
        let b = device
            .new_buffer(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], Shape::new(3, 2))
            .unwrap();
        let mut out = device.new_buffer_with_shape(Shape::new(2, 2)).unwrap();
        device.mul(&a, &b, &mut out).unwrap();
        assert_eq!(device.cpu(&out).unwrap(), vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_smul_and_in_place() {
        let device = SimdDevice::new();
        let shape = Shape::column(3);
        let mut a = device.new_buffer(vec![1.0, 2.0, 3.0], shape).unwrap();
        let s = device.new_buffer(vec![0.5], Shape::scalar()).unwrap();
        let mut out = device.new_buffer_with_shape(shape).unwrap();
        device.smul(&a, &s, &mut out).unwrap();
        assert_eq!(device.cpu(&out).unwrap(), vec![0.5, 1.0, 1.5]);

        device.sub_assign(&mut a, &out).unwrap();
        assert_eq!(device.cpu(&a).unwrap(), vec![0.5, 1.0, 1.5]);
    }
}
