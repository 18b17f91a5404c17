//! BLAS Backend - Vector Math Library Kernels
//!
//! Host memory backend that hands matrix multiplication to the
//! `matrixmultiply` GEMM kernels and spreads large elementwise operations
//! over the rayon thread pool.
//!
//! # Key Features
//! - matrixmultiply crate for optimized GEMM operations
//! - Multi-threaded elementwise execution via rayon
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use rayon::prelude::*;

use crate::buffer::Buffer;
use crate::compat;
use crate::device::{Device, DeviceType};
use crate::error::Result;
use crate::shape::Shape;

/// Threshold for using parallel processing (in elements)
const PARALLEL_THRESHOLD: usize = 4096;

const DEVICE: DeviceType = DeviceType::Blas;

// =============================================================================
// BLAS Buffer
// =============================================================================

/// Host storage of the BLAS backend.
#[derive(Debug, Clone)]
pub struct BlasBuffer(Vec<f32>);

fn data(buffer: &Buffer) -> Result<&[f32]> {
    Ok(&buffer.handle::<BlasBuffer>(DEVICE)?.0)
}

fn data_mut(buffer: &mut Buffer) -> Result<&mut [f32]> {
    Ok(&mut buffer.handle_mut::<BlasBuffer>(DEVICE)?.0)
}

// =============================================================================
// Kernels
// =============================================================================

fn zip_into<F>(dst: &mut [f32], a: &[f32], b: &[f32], f: F)
where
    F: Fn(f32, f32) -> f32 + Sync + Send,
{
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), dst.len());

    if dst.len() >= PARALLEL_THRESHOLD {
        dst.par_iter_mut()
            .zip(a.par_iter().zip(b.par_iter()))
            .for_each(|(d, (a_val, b_val))| {
                *d = f(*a_val, *b_val);
            });
    } else {
        for i in 0..dst.len() {
            dst[i] = f(a[i], b[i]);
        }
    }
}

fn update<F>(dst: &mut [f32], b: &[f32], f: F)
where
    F: Fn(f32, f32) -> f32 + Sync + Send,
{
    debug_assert_eq!(dst.len(), b.len());

    if dst.len() >= PARALLEL_THRESHOLD {
        dst.par_iter_mut()
            .zip(b.par_iter())
            .for_each(|(d, b_val)| *d = f(*d, *b_val));
    } else {
        for i in 0..dst.len() {
            dst[i] = f(dst[i], b[i]);
        }
    }
}

/// C = A @ B for row-major A (m x k), B (k x n), C (m x n).
fn sgemm(c: &mut [f32], a: &[f32], b: &[f32], m: usize, n: usize, k: usize) {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), k * n);
    debug_assert_eq!(c.len(), m * n);

    // SAFETY: the slice lengths match the dimensions and strides passed in.
    unsafe {
        matrixmultiply::sgemm(
            m,
            k,
            n,
            1.0,
            a.as_ptr(),
            k as isize,
            1, // A: row-major (m x k)
            b.as_ptr(),
            n as isize,
            1, // B: row-major (k x n)
            0.0,
            c.as_mut_ptr(),
            n as isize,
            1, // C: row-major (m x n)
        );
    }
}

fn transpose_into(dst: &mut [f32], a: &[f32], rows: usize, cols: usize) {
    let fill_row = |(j, out_row): (usize, &mut [f32])| {
        for i in 0..rows {
            out_row[i] = a[i * cols + j];
        }
    };
    if dst.len() >= PARALLEL_THRESHOLD {
        dst.par_chunks_mut(rows).enumerate().for_each(fill_row);
    } else {
        dst.chunks_mut(rows).enumerate().for_each(fill_row);
    }
}

// =============================================================================
// BLAS Device
// =============================================================================

/// Backend built on GEMM kernels and a data-parallel thread pool.
#[derive(Debug, Default)]
pub struct BlasDevice;

impl BlasDevice {
    /// Creates the BLAS backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn binary<F>(a: &Buffer, b: &Buffer, out: &mut Buffer, f: F) -> Result<()>
    where
        F: Fn(f32, f32) -> f32 + Sync + Send,
    {
        let (a, b) = (data(a)?, data(b)?);
        zip_into(data_mut(out)?, a, b, f);
        Ok(())
    }

    fn in_place<F>(a: &mut Buffer, b: &Buffer, f: F) -> Result<()>
    where
        F: Fn(f32, f32) -> f32 + Sync + Send,
    {
        let b = data(b)?;
        update(data_mut(a)?, b, f);
        Ok(())
    }
}

impl Device for BlasDevice {
    fn device_type(&self) -> DeviceType {
        DEVICE
    }

    fn new_buffer(&self, data: Vec<f32>, shape: Shape) -> Result<Buffer> {
        compat::check_host_data(data.len(), shape)?;
        Ok(Buffer::new(BlasBuffer(data), shape, DEVICE))
    }

    fn new_buffer_with_shape(&self, shape: Shape) -> Result<Buffer> {
        self.new_buffer(vec![0.0; shape.numel()], shape)
    }

    fn add(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::binary(a, b, out, |x, y| x + y)
    }

    fn sub(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::binary(a, b, out, |x, y| x - y)
    }

    fn add_assign(&self, a: &mut Buffer, b: &Buffer) -> Result<()> {
        Self::in_place(a, b, |x, y| x + y)
    }

    fn sub_assign(&self, a: &mut Buffer, b: &Buffer) -> Result<()> {
        Self::in_place(a, b, |x, y| x - y)
    }

    fn cmul(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::binary(a, b, out, |x, y| x * y)
    }

    fn cdiv(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        Self::binary(a, b, out, |x, y| x / y)
    }

    fn smul(&self, a: &Buffer, s: &Buffer, out: &mut Buffer) -> Result<()> {
        let scale = data(s)?[0];
        let a = data(a)?;
        let out = data_mut(out)?;
        if out.len() >= PARALLEL_THRESHOLD {
            out.par_iter_mut()
                .zip(a.par_iter())
                .for_each(|(d, a_val)| *d = scale * *a_val);
        } else {
            for i in 0..out.len() {
                out[i] = scale * a[i];
            }
        }
        Ok(())
    }

    fn mul(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        let (m, k, n) = (a.shape().rows, a.shape().cols, b.shape().cols);
        let (a, b) = (data(a)?, data(b)?);
        sgemm(data_mut(out)?, a, b, m, n, k);
        Ok(())
    }

    fn transpose(&self, a: &Buffer, out: &mut Buffer) -> Result<()> {
        let Shape { rows, cols } = a.shape();
        let a = data(a)?;
        transpose_into(data_mut(out)?, a, rows, cols);
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
