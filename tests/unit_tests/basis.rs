use fenris_matfree::basis::Basis;
use fenris_matfree::quadrature::{gauss, gauss_lobatto};
use fenris_matfree::{Error, EvalMode, QuadMode, TransposeMode, Vector};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector};
use proptest::collection::vec;
use proptest::prelude::*;

#[test]
fn linear_lagrange_basis_1d() {
    let basis = Basis::<f64>::tensor_h1_lagrange(1, 1, 2, 2, QuadMode::Gauss).unwrap();
    assert_eq!(basis.dimension(), 1);
    assert_eq!(basis.num_components(), 1);
    assert_eq!(basis.num_nodes(), 2);
    assert_eq!(basis.num_quadrature_points(), 2);
    assert!(!basis.is_collocated());

    let a = 1.0 / 3.0f64.sqrt();
    #[rustfmt::skip]
    let expected_interp = DMatrix::from_row_slice(2, 2, &[
        (1.0 + a) / 2.0, (1.0 - a) / 2.0,
        (1.0 - a) / 2.0, (1.0 + a) / 2.0,
    ]);
    let expected_grad = DMatrix::from_row_slice(2, 2, &[-0.5, 0.5, -0.5, 0.5]);
    assert_matrix_eq!(basis.interp().unwrap(), expected_interp, comp = abs, tol = 1e-14);
    assert_matrix_eq!(basis.grad()[0], expected_grad, comp = abs, tol = 1e-14);
    assert_matrix_eq!(basis.q_weights().unwrap(), DVector::from_element(2, 1.0), comp = abs, tol = 1e-14);
    assert_matrix_eq!(basis.q_ref().unwrap(), DMatrix::from_column_slice(2, 1, &[-a, a]), comp = abs, tol = 1e-14);
}

#[test]
fn lagrange_basis_interpolates_polynomials_exactly() {
    // A cubic is reproduced by 4 nodes, and its derivative too
    let f = |x: f64| x * x * x - 2.0 * x + 0.5;
    let df = |x: f64| 3.0 * x * x - 2.0;
    let basis = Basis::<f64>::tensor_h1_lagrange(1, 1, 4, 5, QuadMode::Gauss).unwrap();
    let (_, nodes) = gauss_lobatto::<f64>(4).unwrap();
    let (_, points) = gauss::<f64>(5).unwrap();

    let u: Vec<f64> = nodes.iter().map(|&x| f(x)).collect();
    let mut values = vec![0.0; 5];
    let mut derivatives = vec![0.0; 5];
    basis
        .apply_slices(1, TransposeMode::NoTranspose, EvalMode::Interp, &u, &mut values)
        .unwrap();
    basis
        .apply_slices(1, TransposeMode::NoTranspose, EvalMode::Grad, &u, &mut derivatives)
        .unwrap();

    for ((&x, value), derivative) in points.iter().zip(&values).zip(&derivatives) {
        assert_scalar_eq!(*value, f(x), comp = abs, tol = 1e-13);
        assert_scalar_eq!(*derivative, df(x), comp = abs, tol = 1e-12);
    }
}

#[test]
fn tensor_basis_2d_layout() {
    let basis = Basis::<f64>::tensor_h1_lagrange(2, 2, 2, 3, QuadMode::GaussLobatto).unwrap();
    assert_eq!(basis.dimension(), 2);
    assert_eq!(basis.num_nodes(), 4);
    assert_eq!(basis.num_quadrature_points(), 9);
    assert_eq!(basis.qcomp(EvalMode::Interp), 2);
    assert_eq!(basis.qcomp(EvalMode::Grad), 4);
    assert_eq!(basis.qcomp(EvalMode::Weight), 1);

    // Weights of a tensor rule integrate 1 over the reference square
    let weight_sum: f64 = basis.q_weights().unwrap().iter().sum();
    assert_scalar_eq!(weight_sum, 4.0, comp = abs, tol = 1e-14);

    // Quadrature points run with x fastest
    let q_ref = basis.q_ref().unwrap();
    assert_matrix_eq!(q_ref.row(1), DMatrix::from_row_slice(1, 2, &[0.0, -1.0]), comp = abs, tol = 1e-14);
    assert_matrix_eq!(q_ref.row(3), DMatrix::from_row_slice(1, 2, &[-1.0, 0.0]), comp = abs, tol = 1e-14);

    // Component 0 holds x, component 1 holds y at the corner nodes (x fastest)
    let u = [-1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0];
    let mut values = vec![0.0; 18];
    basis
        .apply_slices(1, TransposeMode::NoTranspose, EvalMode::Interp, &u, &mut values)
        .unwrap();
    for q in 0..9 {
        assert_scalar_eq!(values[q], q_ref[(q, 0)], comp = abs, tol = 1e-14);
        assert_scalar_eq!(values[9 + q], q_ref[(q, 1)], comp = abs, tol = 1e-14);
    }

    // Gradient slots are ordered by direction, then component: d(x)/dx, d(y)/dx, d(x)/dy, d(y)/dy
    let mut gradients = vec![0.0; 36];
    basis
        .apply_slices(1, TransposeMode::NoTranspose, EvalMode::Grad, &u, &mut gradients)
        .unwrap();
    let expected: Vec<f64> = [1.0, 0.0, 0.0, 1.0]
        .iter()
        .flat_map(|&value| std::iter::repeat(value).take(9))
        .collect();
    util::assert_approx_slice_eq!(gradients, expected, abstol = 1e-13);
}

#[test]
fn weights_are_repeated_for_every_element() {
    let basis = Basis::<f64>::tensor_h1_lagrange(1, 1, 3, 3, QuadMode::Gauss).unwrap();
    let (weights, _) = gauss::<f64>(3).unwrap();
    let v = Vector::<f64>::create(6);
    let unused = Vector::<f64>::create(0);
    basis
        .apply(2, TransposeMode::NoTranspose, EvalMode::Weight, &unused, &v)
        .unwrap();
    let expected: Vec<f64> = weights.iter().chain(&weights).copied().collect();
    util::assert_approx_slice_eq!(v.to_vec().unwrap(), expected, abstol = 1e-15);
}

#[test]
fn collocated_basis_round_trip_is_exact() {
    let basis = Basis::<f64>::collocated(2, 3).unwrap();
    let num_elements = 4;
    let values: Vec<f64> = (0..num_elements * 2 * 3).map(|i| 0.1 * i as f64 - 1.3).collect();
    let u = Vector::from_slice(&values);
    let q = Vector::<f64>::create(values.len());
    let v = Vector::<f64>::create(values.len());
    v.set_value(17.0).unwrap();

    basis
        .apply(num_elements, TransposeMode::NoTranspose, EvalMode::Interp, &u, &q)
        .unwrap();
    basis
        .apply(num_elements, TransposeMode::Transpose, EvalMode::Interp, &q, &v)
        .unwrap();
    assert_eq!(q.to_vec().unwrap(), values);
    assert_eq!(v.to_vec().unwrap(), values);
}

#[test]
fn collocated_basis_copies_values() {
    let basis = Basis::<f64>::collocated(2, 3).unwrap();
    assert!(basis.is_collocated());
    assert_eq!(basis.num_nodes(), 3);
    assert!(basis.interp().is_none());
    assert!(basis.grad().is_empty());

    let u = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let v = Vector::<f64>::create(6);
    basis
        .apply(1, TransposeMode::NoTranspose, EvalMode::Interp, &u, &v)
        .unwrap();
    assert_eq!(v.to_vec().unwrap(), u.to_vec().unwrap());

    let result = basis.apply(1, TransposeMode::NoTranspose, EvalMode::Grad, &u, &v);
    assert!(matches!(result, Err(Error::InvalidEvalMode(_))));
}

#[test]
fn unsupported_transforms_are_rejected() {
    let basis = Basis::<f64>::tensor_h1_lagrange(1, 1, 2, 2, QuadMode::Gauss).unwrap();
    let mut v = vec![0.0; 2];
    let result = basis.apply_slices(1, TransposeMode::Transpose, EvalMode::Weight, &[0.0; 2], &mut v);
    assert!(matches!(result, Err(Error::InvalidEvalMode(_))));
    let result = basis.apply_slices(1, TransposeMode::NoTranspose, EvalMode::None, &[0.0; 2], &mut v);
    assert!(matches!(result, Err(Error::InvalidEvalMode(_))));
    let result = basis.apply_slices(2, TransposeMode::NoTranspose, EvalMode::Interp, &[0.0; 2], &mut v);
    assert!(matches!(result, Err(Error::DimensionMismatch(_))));
}

#[test]
fn invalid_basis_data_is_rejected() {
    let interp = DMatrix::<f64>::zeros(3, 2);
    let q_ref = DMatrix::zeros(3, 1);
    let q_weights = DVector::zeros(3);
    let result = Basis::h1(1, interp.clone(), vec![DMatrix::zeros(2, 2)], q_ref.clone(), q_weights.clone());
    assert!(matches!(result, Err(Error::DimensionMismatch(_))));
    let result = Basis::h1(1, interp.clone(), vec![], q_ref.clone(), q_weights.clone());
    assert!(matches!(result, Err(Error::DimensionMismatch(_))));
    let result = Basis::h1(1, interp, vec![DMatrix::zeros(3, 2)], q_ref, DVector::zeros(2));
    assert!(matches!(result, Err(Error::DimensionMismatch(_))));

    // A single Gauss-Lobatto node cannot span an element
    let result = Basis::<f64>::tensor_h1_lagrange(1, 1, 1, 2, QuadMode::Gauss);
    assert!(matches!(result, Err(Error::DimensionMismatch(_))));
    let result = Basis::<f64>::collocated(1, 0);
    assert!(matches!(result, Err(Error::DimensionMismatch(_))));
}

#[test]
fn tensor_h1_from_user_matrices_matches_lagrange() {
    let lagrange = Basis::<f64>::tensor_h1_lagrange(1, 1, 2, 2, QuadMode::Gauss).unwrap();
    let (weights, points) = gauss::<f64>(2).unwrap();
    let user = Basis::tensor_h1(
        1,
        1,
        lagrange.interp().unwrap(),
        &lagrange.grad()[0],
        &points,
        &weights,
    )
    .unwrap();
    assert_matrix_eq!(user.interp().unwrap(), lagrange.interp().unwrap());
    assert_matrix_eq!(user.grad()[0], lagrange.grad()[0]);
}

#[test]
fn display_describes_basis() {
    let basis = Basis::<f64>::tensor_h1_lagrange(2, 1, 3, 4, QuadMode::Gauss).unwrap();
    assert_eq!(
        format!("{basis}"),
        "H1 basis in 2 dimension(s) with 1 components, 9 nodes and 16 quadrature points"
    );
}

proptest! {
    #[test]
    fn transpose_is_adjoint(
        dim in 1..=3usize,
        num_comp in 1..=2usize,
        p in 2..=3usize,
        q in 1..=3usize,
        grad in any::<bool>(),
        seed in vec(-1.0..1.0f64, 2 * 3 * 3 * 3 * 3 * 3),
    ) {
        let basis = Basis::<f64>::tensor_h1_lagrange(dim, num_comp, p, q, QuadMode::Gauss).unwrap();
        let emode = if grad { EvalMode::Grad } else { EvalMode::Interp };
        let num_elements = 2;
        let nodal_len = num_elements * basis.num_nodes() * num_comp;
        let qpoint_len = num_elements * basis.num_quadrature_points() * basis.qcomp(emode);

        let u = &seed[..nodal_len];
        let w: Vec<f64> = seed.iter().rev().take(qpoint_len).copied().collect();
        let mut bu = vec![0.0; qpoint_len];
        let mut btw = vec![0.0; nodal_len];
        basis.apply_slices(num_elements, TransposeMode::NoTranspose, emode, u, &mut bu).unwrap();
        basis.apply_slices(num_elements, TransposeMode::Transpose, emode, &w, &mut btw).unwrap();

        let lhs: f64 = bu.iter().zip(&w).map(|(a, b)| a * b).sum();
        let rhs: f64 = u.iter().zip(&btw).map(|(a, b)| a * b).sum();
        prop_assert!((lhs - rhs).abs() <= 1e-12 * (1.0 + lhs.abs()));
    }
}
