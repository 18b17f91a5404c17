//! Tensor Creation Functions
//!
//! Factory functions for zero-filled, constant, identity and random tensors
//! on a given device.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use gpuplay_core::{DevicePtr, Error, Result, Shape};

use crate::tensor::Tensor;

/// Lower bound of the values produced by [`rand`].
pub const RAND_LOW: f32 = 1.0;
/// Exclusive upper bound of the values produced by [`rand`].
pub const RAND_HIGH: f32 = 2.0;

// =============================================================================
// Constant Initialization
// =============================================================================

/// Creates a zero-filled tensor.
///
/// # Example
/// ```rust
/// use gpuplay_core::backends;
/// use gpuplay_tensor::zeros;
///
/// let device = backends::blas_device().unwrap();
/// let t = zeros((2, 3), &device).unwrap();
/// assert_eq!(t.cpu().unwrap(), vec![0.0; 6]);
/// ```
pub fn zeros(shape: impl Into<Shape>, device: &DevicePtr) -> Result<Tensor> {
    let shape = shape.into();
    if shape.is_empty() {
        return Err(Error::EmptyBuffer);
    }
    Tensor::from_buffer(device.new_buffer_with_shape(shape)?, device)
}

/// Creates a tensor filled with `value`.
pub fn full(shape: impl Into<Shape>, value: f32, device: &DevicePtr) -> Result<Tensor> {
    let shape = shape.into();
    Tensor::from_vec(vec![value; shape.numel()], shape, device)
}

/// Creates the `n x n` identity matrix.
pub fn eye(n: usize, device: &DevicePtr) -> Result<Tensor> {
    let mut data = vec![0.0; n * n];
    for i in 0..n {
        data[i * n + i] = 1.0;
    }
    Tensor::from_vec(data, (n, n), device)
}

/// Creates an `n x 1` column vector from host data.
pub fn column(data: Vec<f32>, device: &DevicePtr) -> Result<Tensor> {
    let len = data.len();
    Tensor::from_vec(data, Shape::column(len), device)
}

// =============================================================================
// Random Initialization
// =============================================================================

/// Creates a tensor with values drawn uniformly from `[1, 2)` using the
/// thread-local generator.
pub fn rand(shape: impl Into<Shape>, device: &DevicePtr) -> Result<Tensor> {
    rand_with(shape, device, &mut rand::thread_rng())
}

/// Creates a tensor with values drawn uniformly from `[1, 2)` using `rng`.
pub fn rand_with<R: Rng + ?Sized>(
    shape: impl Into<Shape>,
    device: &DevicePtr,
    rng: &mut R,
) -> Result<Tensor> {
    let shape = shape.into();
    let dist = Uniform::new(RAND_LOW, RAND_HIGH);
    let data: Vec<f32> = (0..shape.numel()).map(|_| dist.sample(rng)).collect();
    Tensor::from_vec(data, shape, device)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gpuplay_core::backends;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zeros_and_full() {
        let device = backends::serial_device().unwrap();
        assert_eq!(zeros((2, 2), &device).unwrap().cpu().unwrap(), vec![0.0; 4]);
        assert_eq!(full((1, 3), 7.0, &device).unwrap().cpu().unwrap(), vec![7.0; 3]);
        assert_eq!(zeros((0, 2), &device).unwrap_err(), Error::EmptyBuffer);
    }

    #[test]
    fn test_eye_and_column() {
        let device = backends::simd_device().unwrap();
        let i = eye(3, &device).unwrap();
        assert_eq!(
            i.cpu().unwrap(),
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
        let v = column(vec![1.0, 2.0], &device).unwrap();
        assert_eq!(v.shape(), Shape::new(2, 1));
    }

    #[test]
    fn test_rand_range() {
        let device = backends::serial_device().unwrap();
        let t = rand((10, 10), &device).unwrap();
        assert!(t
            .cpu()
            .unwrap()
            .iter()
            .all(|&x| (RAND_LOW..RAND_HIGH).contains(&x)));
    }

    #[test]
    fn test_rand_with_seed_is_reproducible() {
        let serial = backends::serial_device().unwrap();
        let blas = backends::blas_device().unwrap();
        let a = rand_with((4, 4), &serial, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = rand_with((4, 4), &blas, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a.cpu().unwrap(), b.cpu().unwrap());
    }
}
