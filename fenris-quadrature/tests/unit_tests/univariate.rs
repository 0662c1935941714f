use fenris_quadrature::integrate;
use fenris_quadrature::univariate::{gauss, gauss_lobatto, try_gauss_lobatto};

use matrixcompare::assert_scalar_eq;

fn monomial_integral(alpha: i32) -> f64 {
    (1.0 - (-1.0f64).powi(alpha + 1)) / (alpha as f64 + 1.0)
}

fn is_strictly_ascending(points: &[[f64; 1]]) -> bool {
    points.windows(2).all(|pair| pair[0][0] < pair[1][0])
}

#[test]
fn gauss_rules_satisfy_expected_accuracy() {
    for n in 1..=24 {
        let expected_polynomial_degree = 2 * n - 1;
        let rule = gauss(n);

        assert_eq!(rule.0.len(), n);
        assert!(rule.0.iter().all(|&w| w > 0.0));
        assert!(is_strictly_ascending(&rule.1));

        for alpha in 0..=expected_polynomial_degree as i32 {
            let estimated_integral = integrate(&rule, |x| x[0].powi(alpha));
            assert_scalar_eq!(estimated_integral, monomial_integral(alpha), comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn gauss_rules_are_symmetric() {
    for n in 1..=12 {
        let (weights, points) = gauss(n);
        for i in 0..n {
            let j = n - i - 1;
            assert_scalar_eq!(points[i][0], -points[j][0], comp = abs, tol = 1e-15);
            assert_scalar_eq!(weights[i], weights[j], comp = abs, tol = 1e-15);
        }
    }
}

#[test]
fn gauss_lobatto_rules_satisfy_expected_accuracy() {
    assert!(try_gauss_lobatto(0).is_none());
    assert!(try_gauss_lobatto(1).is_none());

    for n in 2..=24 {
        let expected_polynomial_degree = 2 * n - 3;
        let rule = try_gauss_lobatto(n).unwrap();

        assert_eq!(rule.1.first().unwrap(), &[-1.0]);
        assert_eq!(rule.1.last().unwrap(), &[1.0]);
        assert!(rule.0.iter().all(|&w| w > 0.0));
        assert!(is_strictly_ascending(&rule.1));

        for alpha in 0..=expected_polynomial_degree as i32 {
            let estimated_integral = integrate(&rule, |x| x[0].powi(alpha));
            assert_scalar_eq!(estimated_integral, monomial_integral(alpha), comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn gauss_lobatto_three_points_is_simpsons_rule() {
    let (weights, points) = gauss_lobatto(3);
    assert_eq!(points.len(), 3);
    assert_scalar_eq!(points[1][0], 0.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(weights[0], 1.0 / 3.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(weights[1], 4.0 / 3.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(weights[2], 1.0 / 3.0, comp = abs, tol = 1e-15);
}

#[test]
#[should_panic]
fn gauss_lobatto_panics_for_single_point() {
    gauss_lobatto(1);
}
