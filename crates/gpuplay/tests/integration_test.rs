//! End-to-end tests run against every backend available in this process.
//! Backends that cannot be created here are skipped.

use gpuplay::prelude::*;

fn devices() -> Vec<DevicePtr> {
    let devices = available_devices();
    assert!(!devices.is_empty(), "the serial backend is always available");
    devices
}

/// Test 1: The host backends and the registry
#[test]
fn test_device_creation() {
    for device_type in [DeviceType::Serial, DeviceType::Simd, DeviceType::Blas] {
        let device = make_device(device_type).unwrap();
        assert_eq!(device.device_type(), device_type);
        assert_eq!(device.name(), device_type.name());
    }

    match wgpu_device() {
        Ok(device) => assert_eq!(device.name(), "WGPU"),
        Err(err) => assert!(matches!(err, Error::BackendUnavailable { .. })),
    }
}

/// Test 2: Matrix transpose
#[test]
fn test_matrix_transpose() {
    for device in devices() {
        let a = Tensor::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], (2, 3), &device).unwrap();
        let t = a.transpose().unwrap();
        assert_eq!(t.shape(), Shape::new(3, 2), "{}", device.name());
        assert_eq!(t.cpu().unwrap(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0], "{}", device.name());
    }
}

/// Test 3: Vector transpose flips the orientation
#[test]
fn test_vector_transpose() {
    for device in devices() {
        let data: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let v = Tensor::from_vec(data.clone(), (100, 1), &device).unwrap();
        let t = v.transpose().unwrap();
        assert_eq!(t.shape(), Shape::new(1, 100));
        assert_eq!(t.cpu().unwrap(), data, "{}", device.name());
    }
}

/// Test 4: Vector addition
#[test]
fn test_vector_add() {
    for device in devices() {
        let a = Tensor::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], (6, 1), &device).unwrap();
        let b = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (6, 1), &device).unwrap();
        let c = &a + &b;
        assert_eq!(c.cpu().unwrap(), vec![1.0, 3.0, 5.0, 7.0, 9.0, 11.0], "{}", device.name());
    }
}

/// Test 5: Column times row gives the outer product table
#[test]
fn test_vector_outer_product() {
    for device in devices() {
        let a = Tensor::from_vec(vec![0.0, 1.0, 2.0], (3, 1), &device).unwrap();
        let b = Tensor::from_vec(vec![3.0, 4.0, 5.0], (1, 3), &device).unwrap();
        let c = &a * &b;
        assert_eq!(c.shape(), Shape::new(3, 3));
        assert!(
            device.tolerance().all_close(
                &c.cpu().unwrap(),
                &[0.0, 0.0, 0.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0]
            ),
            "{}",
            device.name()
        );
    }
}

/// Test 6: Matrix subtraction after moving both operands
#[test]
fn test_matrix_sub_after_transfer() {
    let serial = serial_device().unwrap();
    let mut a = Tensor::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], (2, 3), &serial).unwrap();
    let mut b = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3), &serial).unwrap();

    for device in devices() {
        a.to(&device).unwrap();
        b.to(&device).unwrap();
        let c = &a - &b;
        assert_eq!(c.device_type(), device.device_type());
        assert_eq!(c.cpu().unwrap(), vec![-1.0; 6], "{}", device.name());
    }
}

/// Test 7: Every backend agrees with the serial reference
#[test]
fn test_backends_match_reference() {
    let serial = serial_device().unwrap();
    let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(11);
    let a = rand_with((17, 9), &serial, &mut rng).unwrap();
    let b = rand_with((9, 13), &serial, &mut rng).unwrap();
    let c = rand_with((17, 9), &serial, &mut rng).unwrap();
    let s = full((1, 1), 0.5, &serial).unwrap();

    let reference = [
        a.matmul(&b).unwrap(),
        a.add(&c).unwrap(),
        a.sub(&c).unwrap(),
        a.cmul(&c).unwrap(),
        a.cdiv(&c).unwrap(),
        a.smul(&s).unwrap(),
        a.transpose().unwrap(),
    ];

    for device in devices() {
        let (a, b, c, s) = (
            a.to_device(&device).unwrap(),
            b.to_device(&device).unwrap(),
            c.to_device(&device).unwrap(),
            s.to_device(&device).unwrap(),
        );
        let results = [
            a.matmul(&b).unwrap(),
            a.add(&c).unwrap(),
            a.sub(&c).unwrap(),
            a.cmul(&c).unwrap(),
            a.cdiv(&c).unwrap(),
            a.smul(&s).unwrap(),
            a.transpose().unwrap(),
        ];
        for (result, expected) in results.iter().zip(&reference) {
            assert_eq!(result.shape(), expected.shape());
            assert!(
                result.all_close(expected, device.tolerance()).unwrap(),
                "{} disagrees with the reference",
                device.name()
            );
        }
    }
}

/// Test 8: In-place updates and copy assignment
#[test]
fn test_in_place_and_assignment() {
    for device in devices() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], (2, 2), &device).unwrap();
        let mut acc = zeros((2, 2), &device).unwrap();
        acc += &a;
        acc += &a;
        acc -= &a;
        assert_eq!(acc.cpu().unwrap(), vec![1.0, 2.0, 3.0, 4.0], "{}", device.name());

        let mut copy = zeros((2, 2), &device).unwrap();
        copy.assign(&acc).unwrap();
        acc += &a;
        assert_eq!(copy.cpu().unwrap(), vec![1.0, 2.0, 3.0, 4.0], "{}", device.name());
        assert_eq!(acc.cpu().unwrap(), vec![2.0, 4.0, 6.0, 8.0], "{}", device.name());
    }
}

/// Test 9: Operands on different backends are rejected
#[test]
fn test_device_mismatch() {
    let a = Tensor::from_vec(vec![1.0, 2.0], (2, 1), &serial_device().unwrap()).unwrap();
    let b = Tensor::from_vec(vec![1.0, 2.0], (2, 1), &simd_device().unwrap()).unwrap();

    let expected = Error::DeviceMismatch {
        expected: DeviceType::Serial,
        actual: DeviceType::Simd,
    };
    assert_eq!(a.add(&b).unwrap_err(), expected);
    assert_eq!(a.sub(&b).unwrap_err(), expected);
    assert_eq!(a.cmul(&b).unwrap_err(), expected);
    assert_eq!(a.transpose().unwrap().matmul(&b).unwrap_err(), expected);

    let mut c = a.clone();
    assert_eq!(c.add_in_place(&b).unwrap_err(), expected);
}

/// Test 10: Inner dimensions must agree for matrix products
#[test]
fn test_matmul_shape_mismatch() {
    for device in devices() {
        let a = zeros((2, 3), &device).unwrap();
        let b = zeros((2, 3), &device).unwrap();
        assert!(matches!(
            a.matmul(&b),
            Err(Error::ShapeMismatch { op: "matmul", .. })
        ));
        assert_eq!(a.matmul(&b.transpose().unwrap()).unwrap().shape(), Shape::new(2, 2));
    }
}

/// Test 11: Both solvers on every backend
#[test]
fn test_solvers_on_every_backend() {
    let config = SolverConfig::new().with_max_iter(100).with_tol(1e-6);
    let expected = [1.0 / 11.0, 7.0 / 11.0];

    for device in devices() {
        let a = Tensor::from_vec(vec![4.0, 1.0, 1.0, 3.0], (2, 2), &device).unwrap();
        let b = Tensor::from_vec(vec![1.0, 2.0], (2, 1), &device).unwrap();
        let x0 = zeros((2, 1), &device).unwrap();

        let solvers: [Box<dyn Solver>; 2] = [
            Box::new(GradientDescent::new(config.clone())),
            Box::new(ConjugateGradient::new(config.clone())),
        ];
        for solver in &solvers {
            let solution = solver.solve(&a, &b, &x0).unwrap();
            let x = solution.x.cpu().unwrap();
            assert!(
                Tolerance::new(1e-4, 1e-3).all_close(&x, &expected),
                "{} on {}: {:?}",
                solver.name(),
                device.name(),
                x
            );
            assert_eq!(solution.x.device_type(), device.device_type());
        }
    }
}

/// Test 12: Solver configuration drives backend selection
#[test]
fn test_solver_config_device() {
    let config =
        SolverConfig::from_toml_str("max_iter = 50\ntol = 1e-5\ndevice = \"blas\"").unwrap();
    let device = config.device().unwrap();
    assert_eq!(device.device_type(), DeviceType::Blas);

    let a = eye(3, &device).unwrap();
    let b = column(vec![1.0, 2.0, 3.0], &device).unwrap();
    let x0 = zeros((3, 1), &device).unwrap();
    let solution = conjugate_gradient(&a, &b, &x0, &config).unwrap();
    assert!(solution.converged());
    assert_eq!(solution.status, ConvergenceStatus::Converged);
}
