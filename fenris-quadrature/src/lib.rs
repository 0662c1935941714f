//! Quadrature rules for the one-dimensional reference element `[-1, 1]`.
//!
//! The main purpose of this crate is to supply the node and quadrature point locations
//! used by the tensor-product bases in `fenris-matfree`. Rules are computed in `f64`
//! and returned with their points sorted in ascending order.

pub mod univariate;

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule, stored as `(weights, points)`.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights
        .iter()
        .zip(points)
        .map(|(w, x)| w * f(x))
        .sum()
}
