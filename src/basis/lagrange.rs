//! Tabulation of one-dimensional Lagrange polynomials.
use crate::Real;
use nalgebra::DMatrix;

/// Evaluates the Lagrange polynomial associated with node `p` at `x`.
fn lagrange_value<T: Real>(nodes: &[T], p: usize, x: T) -> T {
    let x_p = nodes[p];
    nodes
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != p)
        .fold(T::one(), |acc, (_, &x_j)| acc * (x - x_j) / (x_p - x_j))
}

/// Evaluates the derivative of the Lagrange polynomial associated with node `p` at `x`.
///
/// Uses the product rule directly rather than the logarithmic derivative, so that the
/// result is well-defined when `x` coincides with a node.
fn lagrange_derivative<T: Real>(nodes: &[T], p: usize, x: T) -> T {
    let x_p = nodes[p];
    let mut derivative = T::zero();
    for (k, &x_k) in nodes.iter().enumerate().filter(|&(k, _)| k != p) {
        let term = nodes
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != p && j != k)
            .fold(T::one() / (x_p - x_k), |acc, (_, &x_j)| acc * (x - x_j) / (x_p - x_j));
        derivative += term;
    }
    derivative
}

/// Tabulates the Lagrange basis defined by `nodes` at `points`.
///
/// Returns the interpolation and derivative matrices, both of shape
/// `points.len() x nodes.len()`, with entry `(q, p)` holding the value (derivative) of the
/// polynomial of node `p` at point `q`.
pub(crate) fn tabulate_lagrange_1d<T: Real>(nodes: &[T], points: &[T]) -> (DMatrix<T>, DMatrix<T>) {
    let interp = DMatrix::from_fn(points.len(), nodes.len(), |q, p| lagrange_value(nodes, p, points[q]));
    let grad = DMatrix::from_fn(points.len(), nodes.len(), |q, p| lagrange_derivative(nodes, p, points[q]));
    (interp, grad)
}
