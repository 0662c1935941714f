//! Matrix-free evaluation of composable finite element operators.
//!
//! An operator is assembled from four kinds of building blocks:
//!
//! - [`Vector`]s hold mesh-wide (L-vector) or element-wise (E-vector) data,
//! - [`ElemRestriction`]s gather L-vector entries into E-vectors and scatter-add them back,
//! - [`Basis`] objects map element nodal values to values, gradients and weights at
//!   quadrature points (and back with the adjoint),
//! - [`QFunction`]s are point-wise kernels with declared named fields.
//!
//! An [`Operator`] binds the fields of a kernel to restrictions, bases and vectors and
//! evaluates `v = A(u)` without ever forming a matrix.
use nalgebra::RealField;

pub mod basis;
pub mod context;
pub mod error;
pub mod operator;
pub mod qfunction;
pub mod quadrature;
pub mod restriction;
pub mod vector;

pub mod opts {
    //! Sentinel-carrying option types accepted by [`Operator::set_field`](crate::Operator::set_field).
    pub use crate::basis::BasisOpt;
    pub use crate::operator::VectorOpt;
    pub use crate::restriction::ElemRestrictionOpt;
}

pub use basis::{Basis, QuadMode};
pub use context::{Backend, Context, ExecutionOptions};
pub use error::{Error, Result};
pub use operator::{CompositeOperator, Operator};
pub use qfunction::{EvalMode, QFunction, QFunctionInputs, QFunctionOutputs, MAX_QFUNCTION_FIELDS};
pub use restriction::{ElemRestriction, Strides, TransposeMode};
pub use vector::{NormType, Vector};

pub extern crate nalgebra;

/// Scalar type of all operator data.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
