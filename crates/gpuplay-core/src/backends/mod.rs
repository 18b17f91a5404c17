//! Backends - Device Implementations and Registry
//!
//! This module contains the backend implementations and the process-wide
//! registry that hands them out. Every backend is a lazily created singleton,
//! so two `DevicePtr`s refer to the same device exactly when they point to the
//! same allocation.
//!
//! # Available Backends
//! - `serial` - naive reference loops (always available)
//! - `simd` - eight-lane SIMD loops (always available)
//! - `blas` - GEMM kernels plus a thread pool (always available)
//! - `wgpu` - WebGPU compute shaders (requires `wgpu` feature and an adapter)
//!
//! Availability is decided when a device is requested, never when an
//! operation runs.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::device::{Device, DevicePtr, DeviceType};
use crate::error::Result;

// =============================================================================
// Backend Modules
// =============================================================================

pub mod blas;
pub mod serial;
pub mod simd;

#[cfg(feature = "wgpu")]
pub mod wgpu_backend;

// =============================================================================
// Re-exports
// =============================================================================

pub use blas::BlasDevice;
pub use serial::SerialDevice;
pub use simd::SimdDevice;

#[cfg(feature = "wgpu")]
pub use wgpu_backend::WgpuDevice;

// =============================================================================
// Registry
// =============================================================================

static SERIAL: OnceLock<DevicePtr> = OnceLock::new();
static SIMD: OnceLock<DevicePtr> = OnceLock::new();
static BLAS: OnceLock<DevicePtr> = OnceLock::new();
static WGPU: OnceLock<Result<DevicePtr>> = OnceLock::new();

fn host_device<D: Device + 'static>(
    cell: &'static OnceLock<DevicePtr>,
    create: fn() -> D,
) -> DevicePtr {
    cell.get_or_init(|| {
        let device: DevicePtr = Arc::new(create());
        info!(device = %device.device_type(), "backend initialized");
        device
    })
    .clone()
}

/// Returns the serial reference backend.
pub fn serial_device() -> Result<DevicePtr> {
    Ok(host_device(&SERIAL, SerialDevice::new))
}

/// Returns the SIMD backend.
pub fn simd_device() -> Result<DevicePtr> {
    Ok(host_device(&SIMD, SimdDevice::new))
}

/// Returns the BLAS backend.
pub fn blas_device() -> Result<DevicePtr> {
    Ok(host_device(&BLAS, BlasDevice::new))
}

/// Returns the WebGPU backend.
///
/// The adapter probe runs once; a failure is cached and returned to every
/// later caller as `BackendUnavailable`.
pub fn wgpu_device() -> Result<DevicePtr> {
    WGPU.get_or_init(|| {
        let result = probe_wgpu();
        match &result {
            Ok(device) => info!(device = %device.device_type(), "backend initialized"),
            Err(err) => warn!(error = %err, "wgpu backend unavailable"),
        }
        result
    })
    .clone()
}

#[cfg(feature = "wgpu")]
fn probe_wgpu() -> Result<DevicePtr> {
    let device: DevicePtr = Arc::new(WgpuDevice::new()?);
    Ok(device)
}

#[cfg(not(feature = "wgpu"))]
fn probe_wgpu() -> Result<DevicePtr> {
    Err(crate::error::Error::unavailable(
        DeviceType::Wgpu,
        "built without the `wgpu` feature",
    ))
}

/// Returns the backend for `device_type`, or `BackendUnavailable`.
pub fn make_device(device_type: DeviceType) -> Result<DevicePtr> {
    match device_type {
        DeviceType::Serial => serial_device(),
        DeviceType::Simd => simd_device(),
        DeviceType::Blas => blas_device(),
        DeviceType::Wgpu => wgpu_device(),
    }
}

/// Every backend usable in this process, in registry order.
pub fn available_devices() -> Vec<DevicePtr> {
    DeviceType::all()
        .into_iter()
        .filter_map(|device_type| make_device(device_type).ok())
        .collect()
}

/// Returns true if `make_device(device_type)` would succeed.
pub fn is_available(device_type: DeviceType) -> bool {
    make_device(device_type).is_ok()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::shape::Shape;
    use proptest::prelude::*;

    #[test]
    fn test_host_backends_always_available() {
        for device_type in [DeviceType::Serial, DeviceType::Simd, DeviceType::Blas] {
            let device = make_device(device_type).unwrap();
            assert_eq!(device.device_type(), device_type);
            assert!(is_available(device_type));
        }
    }

    #[test]
    fn test_singletons() {
        let a = serial_device().unwrap();
        let b = make_device(DeviceType::Serial).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &simd_device().unwrap()));
    }

    #[test]
    fn test_available_devices_ordered() {
        let devices = available_devices();
        assert!(devices.len() >= 3);
        assert_eq!(devices[0].device_type(), DeviceType::Serial);
        assert_eq!(devices[1].device_type(), DeviceType::Simd);
        assert_eq!(devices[2].device_type(), DeviceType::Blas);
    }

    fn host_devices() -> Vec<DevicePtr> {
        vec![
            serial_device().unwrap(),
            simd_device().unwrap(),
            blas_device().unwrap(),
        ]
    }

    #[test]
    fn test_new_buffer_rejects_short_host_data() {
        for device in available_devices() {
            let err = device.new_buffer(vec![1.0], Shape::new(2, 2)).unwrap_err();
            assert_eq!(
                err,
                Error::HostDataLength {
                    expected: 4,
                    actual: 1,
                }
            );
            assert!(device.new_buffer(vec![1.0; 4], Shape::new(2, 2)).is_ok());
        }
    }

    proptest! {
        #[test]
        fn prop_host_backends_agree_on_matmul(
            m in 1usize..12,
            k in 1usize..12,
            n in 1usize..12,
            seed in proptest::collection::vec(-4i32..=4, 144..=144),
        ) {
            // Small integers keep every product and partial sum exact.
            let seed: Vec<f32> = seed.into_iter().map(|v| v as f32).collect();
            let a_shape = Shape::new(m, k);
            let b_shape = Shape::new(k, n);
            let a_data = seed[..m * k].to_vec();
            let b_data = seed[..k * n].to_vec();

            let mut results = Vec::new();
            for device in host_devices() {
                let a = device.new_buffer(a_data.clone(), a_shape).unwrap();
                let b = device.new_buffer(b_data.clone(), b_shape).unwrap();
                let mut out = device.new_buffer_with_shape(Shape::new(m, n)).unwrap();
                device.mul(&a, &b, &mut out).unwrap();
                results.push(device.cpu(&out).unwrap());
            }
            prop_assert_eq!(&results[0], &results[1]);
            prop_assert_eq!(&results[0], &results[2]);
        }

        #[test]
        fn prop_host_backends_agree_on_elementwise(
            data in proptest::collection::vec(-100.0f32..100.0, 1..64),
        ) {
            let shape = Shape::column(data.len());
            let divisor: Vec<f32> = data.iter().map(|x| x.abs() + 1.0).collect();

            let mut results = Vec::new();
            for device in host_devices() {
                let a = device.new_buffer(data.clone(), shape).unwrap();
                let b = device.new_buffer(divisor.clone(), shape).unwrap();
                let mut out = device.new_buffer_with_shape(shape).unwrap();
                device.cdiv(&a, &b, &mut out).unwrap();
                let mut acc = device.new_buffer_with_shape(shape).unwrap();
                device.add_assign(&mut acc, &out).unwrap();
                device.sub_assign(&mut acc, &a).unwrap();
                results.push(device.cpu(&acc).unwrap());
            }
            prop_assert_eq!(&results[0], &results[1]);
            prop_assert_eq!(&results[0], &results[2]);
        }
    }

    #[test]
    fn test_wgpu_failure_is_unavailable() {
        match wgpu_device() {
            Ok(device) => assert_eq!(device.device_type(), DeviceType::Wgpu),
            Err(err) => assert!(matches!(
                err,
                Error::BackendUnavailable {
                    device: DeviceType::Wgpu,
                    ..
                }
            )),
        }
    }
}
