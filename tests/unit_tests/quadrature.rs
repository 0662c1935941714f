use fenris_matfree::quadrature::{gauss, gauss_lobatto};
use fenris_matfree::Error;
use matrixcompare::assert_scalar_eq;

#[test]
fn gauss_points_are_ascending() {
    let (weights, points) = gauss::<f64>(4).unwrap();
    assert_eq!(weights.len(), 4);
    assert!(points.windows(2).all(|pair| pair[0] < pair[1]));
    assert_scalar_eq!(weights.iter().sum::<f64>(), 2.0, comp = abs, tol = 1e-14);
}

#[test]
fn gauss_lobatto_includes_endpoints() {
    let (weights, points) = gauss_lobatto::<f64>(5).unwrap();
    assert_scalar_eq!(points[0], -1.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(points[4], 1.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(points[2], 0.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(weights[0], 0.1, comp = abs, tol = 1e-14);
    assert_scalar_eq!(weights.iter().sum::<f64>(), 2.0, comp = abs, tol = 1e-14);
}

#[test]
fn rules_can_be_requested_in_single_precision() {
    let (weights, points) = gauss::<f32>(2).unwrap();
    assert_scalar_eq!(weights[0], 1.0f32, comp = abs, tol = 1e-6);
    assert_scalar_eq!(points[1], 1.0f32 / 3.0f32.sqrt(), comp = abs, tol = 1e-6);
}

#[test]
fn too_few_points_are_rejected() {
    assert!(matches!(gauss::<f64>(0), Err(Error::DimensionMismatch(_))));
    assert!(matches!(gauss_lobatto::<f64>(1), Err(Error::DimensionMismatch(_))));
}
