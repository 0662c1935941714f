//! Quadrature rules for the reference interval `[-1, 1]`.
//!
//! The rules are provided by `fenris-quadrature` in `f64` and converted to the requested
//! scalar type. Points are sorted in ascending order.
use crate::error::{Error, Result};
use crate::Real;
use nalgebra::convert;

/// A one-dimensional quadrature rule, stored as `(weights, points)`.
pub type QuadraturePair1d<T> = (Vec<T>, Vec<T>);

/// Gauss quadrature with the given number of points.
///
/// Fails if no points are requested.
pub fn gauss<T: Real>(num_points: usize) -> Result<QuadraturePair1d<T>> {
    if num_points == 0 {
        return Err(Error::dimension_mismatch("Gauss quadrature requires at least one point"));
    }
    Ok(convert_quadrature_rule_from_1d_f64(fenris_quadrature::univariate::gauss(
        num_points,
    )))
}

/// Gauss-Lobatto quadrature with the given number of points, including both endpoints.
///
/// Fails if fewer than two points are requested.
pub fn gauss_lobatto<T: Real>(num_points: usize) -> Result<QuadraturePair1d<T>> {
    fenris_quadrature::univariate::try_gauss_lobatto(num_points)
        .map(convert_quadrature_rule_from_1d_f64)
        .ok_or_else(|| Error::dimension_mismatch("Gauss-Lobatto quadrature requires at least two points"))
}

fn convert_quadrature_rule_from_1d_f64<T>(quadrature: fenris_quadrature::Rule<1>) -> QuadraturePair1d<T>
where
    T: Real,
{
    let (weights, points) = quadrature;
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(|[x]| convert(x)).collect();
    (weights, points)
}
