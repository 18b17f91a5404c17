//! Property tests over randomly shaped tensors on every available backend.

use gpuplay::prelude::*;
use proptest::prelude::*;

fn matrix() -> impl Strategy<Value = (usize, usize, Vec<f32>)> {
    (1usize..20, 1usize..20).prop_flat_map(|(rows, cols)| {
        (
            Just(rows),
            Just(cols),
            proptest::collection::vec(-100.0f32..100.0, rows * cols),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_transpose_is_an_involution((rows, cols, data) in matrix()) {
        for device in available_devices() {
            let t = Tensor::from_vec(data.clone(), (rows, cols), &device).unwrap();
            let back = t.transpose().unwrap().transpose().unwrap();
            prop_assert_eq!(back.shape(), Shape::new(rows, cols));
            prop_assert_eq!(back.cpu().unwrap(), data.clone());
        }
    }

    #[test]
    fn prop_add_then_sub_restores((rows, cols, data) in matrix(), offset in -50.0f32..50.0) {
        for device in available_devices() {
            let a = Tensor::from_vec(data.clone(), (rows, cols), &device).unwrap();
            let b = full((rows, cols), offset, &device).unwrap();
            let restored = &(&a + &b) - &b;
            prop_assert!(restored.all_close(&a, device.tolerance()).unwrap());
        }
    }

    #[test]
    fn prop_transfer_round_trip((rows, cols, data) in matrix()) {
        let serial = serial_device().unwrap();
        let reference = Tensor::from_vec(data, (rows, cols), &serial).unwrap();
        for device in available_devices() {
            let mut t = reference.clone();
            t.to(&device).unwrap();
            prop_assert_eq!(t.device_type(), device.device_type());
            t.to(&serial).unwrap();
            prop_assert_eq!(t.shape(), reference.shape());
            prop_assert!(t.all_close(&reference, device.tolerance()).unwrap());
        }
    }

    #[test]
    fn prop_matmul_shape(m in 1usize..10, k in 1usize..10, n in 1usize..10, k2 in 1usize..10) {
        for device in available_devices() {
            let a = zeros((m, k), &device).unwrap();
            let b = zeros((k, n), &device).unwrap();
            prop_assert_eq!(a.matmul(&b).unwrap().shape(), Shape::new(m, n));

            let c = zeros((k2, n), &device).unwrap();
            if k2 != k {
                let is_shape_mismatch = matches!(a.matmul(&c), Err(Error::ShapeMismatch { .. }));
                prop_assert!(is_shape_mismatch);
            }
        }
    }
}
