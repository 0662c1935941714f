//! Element bases: transforms between nodal values and quadrature point values.
//!
//! A basis holds a small set of dense matrices that are applied independently to every
//! element and every component:
//!
//! - the interpolation matrix `B` of shape `Q x P`,
//! - one gradient matrix `G_d` of shape `Q x P` per reference dimension `d`,
//! - the `Q` quadrature weights.
//!
//! Per element, nodal values are stored component by component (`c * P + i`), interpolated
//! values component by component (`c * Q + q`) and gradients dimension by dimension, then
//! component by component (`(d * num_comp + c) * Q + q`).
//!
//! The transposed transforms `B^T` and `sum_d G_d^T` are the exact adjoints used by operators
//! to map quadrature point values back to element nodes.
use crate::context::ExecutionOptions;
use crate::error::{Error, Result};
use crate::qfunction::EvalMode;
use crate::restriction::TransposeMode;
use crate::vector::Vector;
use crate::{quadrature, Real};
use log::warn;
use nalgebra::{DMatrix, DMatrixView, DMatrixViewMut, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod lagrange;

/// Type of quadrature, also used for the location of nodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadMode {
    Gauss,
    GaussLobatto,
}

#[derive(Debug)]
enum BasisKind<T> {
    H1 {
        interp: DMatrix<T>,
        grad: Vec<DMatrix<T>>,
        q_ref: DMatrix<T>,
        q_weights: DVector<T>,
    },
    /// Identity transform for data that already lives at quadrature points.
    Collocated,
}

#[derive(Debug)]
struct BasisCore<T> {
    dim: usize,
    num_comp: usize,
    num_nodes: usize,
    num_qpoints: usize,
    kind: BasisKind<T>,
}

/// A basis shared by all elements of an operator field.
///
/// Bases are immutable after creation. Cloning is cheap and yields a handle to the same basis.
#[derive(Debug, Clone)]
pub struct Basis<T> {
    core: Arc<BasisCore<T>>,
}

/// A basis, or the collocated sentinel for fields whose data already lives at quadrature points.
#[derive(Debug)]
pub enum BasisOpt<'b, T> {
    Some(&'b Basis<T>),
    Collocated,
}

impl<'b, T> Clone for BasisOpt<'b, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'b, T> Copy for BasisOpt<'b, T> {}

impl<'b, T> From<&'b Basis<T>> for BasisOpt<'b, T> {
    fn from(basis: &'b Basis<T>) -> Self {
        Self::Some(basis)
    }
}

impl<'b, T> BasisOpt<'b, T> {
    pub fn is_some(&self) -> bool {
        matches!(self, Self::Some(_))
    }

    pub fn is_collocated(&self) -> bool {
        matches!(self, Self::Collocated)
    }
}

impl<T: Real> Basis<T> {
    /// Creates a basis from full (not necessarily tensor-product) matrices.
    ///
    /// * `interp` - Interpolation matrix of shape `Q x P`
    /// * `grad` - One `Q x P` gradient matrix per reference dimension
    /// * `q_ref` - Reference quadrature points, one row per point
    /// * `q_weights` - Quadrature weights
    pub fn h1(
        num_comp: usize,
        interp: DMatrix<T>,
        grad: Vec<DMatrix<T>>,
        q_ref: DMatrix<T>,
        q_weights: DVector<T>,
    ) -> Result<Self> {
        let (num_qpoints, num_nodes) = interp.shape();
        let dim = grad.len();
        if num_comp == 0 || num_nodes == 0 || num_qpoints == 0 || dim == 0 {
            return Err(Error::dimension_mismatch(format!(
                "basis needs positive component, node, point and dimension counts, \
                 got {num_comp}, {num_nodes}, {num_qpoints} and {dim}"
            )));
        }
        if let Some(g) = grad.iter().find(|g| g.shape() != interp.shape()) {
            return Err(Error::dimension_mismatch(format!(
                "gradient matrix has shape {:?}, but interpolation matrix has shape {:?}",
                g.shape(),
                interp.shape()
            )));
        }
        if q_ref.shape() != (num_qpoints, dim) || q_weights.len() != num_qpoints {
            return Err(Error::dimension_mismatch(format!(
                "expected {num_qpoints} quadrature points in {dim} dimensions and as many weights"
            )));
        }

        Ok(Self::from_core(BasisCore {
            dim,
            num_comp,
            num_nodes,
            num_qpoints,
            kind: BasisKind::H1 {
                interp,
                grad,
                q_ref,
                q_weights,
            },
        }))
    }

    /// Creates a tensor-product basis from one-dimensional matrices.
    ///
    /// The `dim`-dimensional matrices are Kronecker products of the 1D matrices, with the
    /// x index running fastest for both nodes and quadrature points.
    pub fn tensor_h1(
        dim: usize,
        num_comp: usize,
        interp_1d: &DMatrix<T>,
        grad_1d: &DMatrix<T>,
        q_ref_1d: &[T],
        q_weight_1d: &[T],
    ) -> Result<Self> {
        let q1d = interp_1d.nrows();
        if dim == 0 || grad_1d.shape() != interp_1d.shape() || q_ref_1d.len() != q1d || q_weight_1d.len() != q1d {
            return Err(Error::dimension_mismatch(format!(
                "inconsistent 1D tensor basis data for dimension {dim}: interpolation {:?}, gradient {:?}, \
                 {} points and {} weights",
                interp_1d.shape(),
                grad_1d.shape(),
                q_ref_1d.len(),
                q_weight_1d.len()
            )));
        }

        // M_{dim - 1} (x) ... (x) M_0, where M_k is the gradient for k == d and the
        // interpolation matrix otherwise
        let tensor_product = |d: Option<usize>| {
            let factor = |k: usize| if Some(k) == d { grad_1d } else { interp_1d };
            (0..dim - 1)
                .rev()
                .fold(factor(dim - 1).clone(), |acc, k| acc.kronecker(factor(k)))
        };
        let interp = tensor_product(None);
        let grad = (0..dim).map(|d| tensor_product(Some(d))).collect();

        let num_qpoints = q1d.pow(dim as u32);
        let point_index = |q: usize, d: usize| (q / q1d.pow(d as u32)) % q1d;
        let q_ref = DMatrix::from_fn(num_qpoints, dim, |q, d| q_ref_1d[point_index(q, d)]);
        let q_weights = DVector::from_fn(num_qpoints, |q, _| {
            (0..dim).fold(T::one(), |w, d| w * q_weight_1d[point_index(q, d)])
        });

        Self::h1(num_comp, interp, grad, q_ref, q_weights)
    }

    /// Creates a tensor-product Lagrange basis.
    ///
    /// * `p1d` - Number of Gauss-Lobatto nodes per dimension, so the polynomial degree is `p1d - 1`
    /// * `q1d` - Number of quadrature points per dimension
    /// * `qmode` - Location of the quadrature points
    pub fn tensor_h1_lagrange(dim: usize, num_comp: usize, p1d: usize, q1d: usize, qmode: QuadMode) -> Result<Self> {
        if q1d < p1d {
            warn!("Lagrange basis with {p1d} nodes but only {q1d} quadrature points per dimension is under-integrated");
        }
        let (_, nodes) = quadrature::gauss_lobatto::<T>(p1d)?;
        let (q_weight_1d, q_ref_1d) = match qmode {
            QuadMode::Gauss => quadrature::gauss::<T>(q1d)?,
            QuadMode::GaussLobatto => quadrature::gauss_lobatto::<T>(q1d)?,
        };
        let (interp_1d, grad_1d) = lagrange::tabulate_lagrange_1d(&nodes, &q_ref_1d);
        Self::tensor_h1(dim, num_comp, &interp_1d, &grad_1d, &q_ref_1d, &q_weight_1d)
    }

    /// Creates the identity basis for data given directly at `num_qpoints` quadrature points.
    pub fn collocated(num_comp: usize, num_qpoints: usize) -> Result<Self> {
        if num_comp == 0 || num_qpoints == 0 {
            return Err(Error::dimension_mismatch(
                "collocated basis needs positive component and point counts",
            ));
        }
        Ok(Self::from_core(BasisCore {
            dim: 0,
            num_comp,
            num_nodes: num_qpoints,
            num_qpoints,
            kind: BasisKind::Collocated,
        }))
    }

    fn from_core(core: BasisCore<T>) -> Self {
        Self { core: Arc::new(core) }
    }
}

impl<T> Basis<T> {
    /// Topological dimension of the reference element, zero for collocated bases.
    pub fn dimension(&self) -> usize {
        self.core.dim
    }

    pub fn num_components(&self) -> usize {
        self.core.num_comp
    }

    /// Number of nodes `P` per element.
    pub fn num_nodes(&self) -> usize {
        self.core.num_nodes
    }

    /// Number of quadrature points `Q` per element.
    pub fn num_quadrature_points(&self) -> usize {
        self.core.num_qpoints
    }

    pub fn is_collocated(&self) -> bool {
        matches!(self.core.kind, BasisKind::Collocated)
    }

    pub fn interp(&self) -> Option<&DMatrix<T>> {
        match &self.core.kind {
            BasisKind::H1 { interp, .. } => Some(interp),
            BasisKind::Collocated => None,
        }
    }

    /// Gradient matrices, one per reference dimension.
    pub fn grad(&self) -> &[DMatrix<T>] {
        match &self.core.kind {
            BasisKind::H1 { grad, .. } => grad,
            BasisKind::Collocated => &[],
        }
    }

    pub fn q_weights(&self) -> Option<&DVector<T>> {
        match &self.core.kind {
            BasisKind::H1 { q_weights, .. } => Some(q_weights),
            BasisKind::Collocated => None,
        }
    }

    /// Reference quadrature points, one row per point.
    pub fn q_ref(&self) -> Option<&DMatrix<T>> {
        match &self.core.kind {
            BasisKind::H1 { q_ref, .. } => Some(q_ref),
            BasisKind::Collocated => None,
        }
    }

    /// Number of values per quadrature point produced by the given evaluation mode.
    pub fn qcomp(&self, emode: EvalMode) -> usize {
        match emode {
            EvalMode::None | EvalMode::Interp => self.core.num_comp,
            EvalMode::Grad => self.core.num_comp * self.core.dim,
            EvalMode::Weight => 1,
        }
    }
}

impl<T: Real> Basis<T> {
    /// Applies the basis to vectors holding data for `num_elements` elements.
    ///
    /// With [`TransposeMode::NoTranspose`], `u` holds nodal values and `v` is overwritten with
    /// values at quadrature points. With [`TransposeMode::Transpose`] the roles are swapped and
    /// the adjoint transform is applied. For [`EvalMode::Weight`], `u` is ignored.
    pub fn apply(
        &self,
        num_elements: usize,
        tmode: TransposeMode,
        emode: EvalMode,
        u: &Vector<'_, T>,
        v: &Vector<'_, T>,
    ) -> Result<()> {
        let mut v = v.view_mut()?;
        if emode == EvalMode::Weight {
            return self.apply_slices(num_elements, tmode, emode, &[], &mut v);
        }
        let u = u.view()?;
        self.apply_slices(num_elements, tmode, emode, &u, &mut v)
    }

    /// Slice version of [`Basis::apply`].
    pub fn apply_slices(
        &self,
        num_elements: usize,
        tmode: TransposeMode,
        emode: EvalMode,
        u: &[T],
        v: &mut [T],
    ) -> Result<()> {
        self.apply_slices_with(num_elements, tmode, emode, u, v, &ExecutionOptions::default())
    }

    pub(crate) fn apply_slices_with(
        &self,
        num_elements: usize,
        tmode: TransposeMode,
        emode: EvalMode,
        u: &[T],
        v: &mut [T],
        options: &ExecutionOptions,
    ) -> Result<()> {
        let BasisCore {
            num_comp,
            num_nodes: p,
            num_qpoints: q,
            ..
        } = *self.core;
        let nodal_len = p * num_comp;
        let qpoint_len = q * self.qcomp(emode);

        let check_lengths = |u_len: usize, v_len: usize| {
            if u.len() != num_elements * u_len || v.len() != num_elements * v_len {
                return Err(Error::dimension_mismatch(format!(
                    "basis {emode:?} transform ({tmode:?}) of {num_elements} elements expects input of length {} \
                     and output of length {}, got {} and {}",
                    num_elements * u_len,
                    num_elements * v_len,
                    u.len(),
                    v.len()
                )));
            }
            Ok(())
        };

        match (&self.core.kind, emode, tmode) {
            (BasisKind::Collocated, EvalMode::Interp | EvalMode::None, _) => {
                check_lengths(nodal_len, nodal_len)?;
                v.copy_from_slice(u);
                Ok(())
            }
            (BasisKind::Collocated, _, _) => Err(Error::InvalidEvalMode(format!(
                "collocated basis does not support {emode:?}"
            ))),
            (BasisKind::H1 { .. }, EvalMode::None, _) => Err(Error::InvalidEvalMode(
                "EvalMode::None requires a collocated basis".to_string(),
            )),
            (BasisKind::H1 { q_weights, .. }, EvalMode::Weight, TransposeMode::NoTranspose) => {
                if v.len() != num_elements * q {
                    return Err(Error::dimension_mismatch(format!(
                        "expected output of length {} for quadrature weights, got {}",
                        num_elements * q,
                        v.len()
                    )));
                }
                options.for_each_chunk_mut(v, q, |_, element_weights| {
                    element_weights.copy_from_slice(q_weights.as_slice());
                    Ok(())
                })
            }
            (BasisKind::H1 { .. }, EvalMode::Weight, TransposeMode::Transpose) => Err(Error::InvalidEvalMode(
                "quadrature weights have no transpose".to_string(),
            )),
            (BasisKind::H1 { interp, grad, .. }, _, TransposeMode::NoTranspose) => {
                check_lengths(nodal_len, qpoint_len)?;
                let matrices: &[DMatrix<T>] = if emode == EvalMode::Grad {
                    grad
                } else {
                    std::slice::from_ref(interp)
                };
                options.for_each_chunk_pair(u, nodal_len, v, qpoint_len, |_, u_e, v_e| {
                    let u_e = DMatrixView::from_slice(u_e, p, num_comp);
                    for (matrix, v_block) in matrices.iter().zip(v_e.chunks_mut(q * num_comp)) {
                        let mut v_block = DMatrixViewMut::from_slice(v_block, q, num_comp);
                        v_block.gemm(T::one(), matrix, &u_e, T::zero());
                    }
                    Ok(())
                })
            }
            (BasisKind::H1 { interp, grad, .. }, _, TransposeMode::Transpose) => {
                check_lengths(qpoint_len, nodal_len)?;
                let matrices: &[DMatrix<T>] = if emode == EvalMode::Grad {
                    grad
                } else {
                    std::slice::from_ref(interp)
                };
                options.for_each_chunk_pair(u, qpoint_len, v, nodal_len, |_, u_e, v_e| {
                    let mut v_e = DMatrixViewMut::from_slice(v_e, p, num_comp);
                    for (i, (matrix, u_block)) in matrices.iter().zip(u_e.chunks(q * num_comp)).enumerate() {
                        let u_block = DMatrixView::from_slice(u_block, q, num_comp);
                        let beta = if i == 0 { T::zero() } else { T::one() };
                        v_e.gemm_tr(T::one(), matrix, &u_block, beta);
                    }
                    Ok(())
                })
            }
        }
    }
}

impl<T: Real> Display for Basis<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_collocated() {
            return write!(
                f,
                "Collocated basis with {} components at {} quadrature points",
                self.num_components(),
                self.num_quadrature_points()
            );
        }
        write!(
            f,
            "H1 basis in {} dimension(s) with {} components, {} nodes and {} quadrature points",
            self.dimension(),
            self.num_components(),
            self.num_nodes(),
            self.num_quadrature_points()
        )
    }
}
