//! Execution context and options.
//!
//! A [`Context`] is the capability through which operator building blocks are created. It
//! carries the [`ExecutionOptions`] that operators created from it use when they run their
//! element loops.
use crate::basis::{Basis, QuadMode};
use crate::error::{Error, Result};
use crate::operator::{CompositeOperator, Operator};
use crate::qfunction::{gallery, QFunction, QFunctionUserClosure};
use crate::restriction::{ElemRestriction, Strides};
use crate::vector::Vector;
use crate::Real;
use log::debug;
use nalgebra::{DMatrix, DVector};
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use rayon::slice::{ParallelSlice, ParallelSliceMut};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The strategy used to run element loops.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Backend {
    /// Elements are processed one after another on the calling thread.
    #[default]
    Serial,
    /// Elements are processed concurrently on the `rayon` thread pool.
    Parallel,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(resource: &str) -> Result<Self> {
        match resource.trim_end_matches('/') {
            "/cpu/self" | "/cpu/self/ref" | "/cpu/self/ref/serial" => Ok(Self::Serial),
            "/cpu/self/ref/parallel" => Ok(Self::Parallel),
            _ => Err(Error::UnsupportedBackend {
                resource: resource.to_string(),
            }),
        }
    }
}

/// Options controlling how element loops are executed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    pub backend: Backend,
    /// Lower bound on the number of elements handled by a single parallel task.
    pub min_elements_per_task: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            backend: Backend::Serial,
            min_elements_per_task: 64,
        }
    }
}

impl ExecutionOptions {
    /// Calls `f(chunk_index, chunk)` for consecutive chunks of `values`.
    pub(crate) fn for_each_chunk_mut<T, F>(&self, values: &mut [T], chunk_size: usize, f: F) -> Result<()>
    where
        T: Send,
        F: Fn(usize, &mut [T]) -> Result<()> + Send + Sync,
    {
        match self.backend {
            Backend::Serial => values
                .chunks_mut(chunk_size)
                .enumerate()
                .try_for_each(|(i, chunk)| f(i, chunk)),
            Backend::Parallel => values
                .par_chunks_mut(chunk_size)
                .with_min_len(self.min_elements_per_task)
                .enumerate()
                .try_for_each(|(i, chunk)| f(i, chunk)),
        }
    }

    /// Calls `f(chunk_index, u_chunk, v_chunk)` for pairs of consecutive chunks.
    pub(crate) fn for_each_chunk_pair<T, F>(
        &self,
        u: &[T],
        u_chunk_size: usize,
        v: &mut [T],
        v_chunk_size: usize,
        f: F,
    ) -> Result<()>
    where
        T: Send + Sync,
        F: Fn(usize, &[T], &mut [T]) -> Result<()> + Send + Sync,
    {
        match self.backend {
            Backend::Serial => u
                .chunks(u_chunk_size)
                .zip(v.chunks_mut(v_chunk_size))
                .enumerate()
                .try_for_each(|(i, (u, v))| f(i, u, v)),
            Backend::Parallel => u
                .par_chunks(u_chunk_size)
                .zip(v.par_chunks_mut(v_chunk_size))
                .with_min_len(self.min_elements_per_task)
                .enumerate()
                .try_for_each(|(i, (u, v))| f(i, u, v)),
        }
    }

    /// Calls `f(i, item)` for every item, consuming the items.
    pub(crate) fn for_each_item<I, F>(&self, items: Vec<I>, f: F) -> Result<()>
    where
        I: Send,
        F: Fn(usize, I) -> Result<()> + Send + Sync,
    {
        match self.backend {
            Backend::Serial => items
                .into_iter()
                .enumerate()
                .try_for_each(|(i, item)| f(i, item)),
            Backend::Parallel => items
                .into_par_iter()
                .with_min_len(self.min_elements_per_task)
                .enumerate()
                .try_for_each(|(i, item)| f(i, item)),
        }
    }
}

/// The capability through which vectors, restrictions, bases, point-wise kernels and
/// operators are created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Context {
    options: ExecutionOptions,
}

impl Context {
    /// Initializes a context from a resource string.
    ///
    /// `/cpu/self`, `/cpu/self/ref` and `/cpu/self/ref/serial` select the serial reference
    /// backend, `/cpu/self/ref/parallel` processes elements on the `rayon` thread pool.
    pub fn init(resource: &str) -> Result<Self> {
        let backend = resource.parse()?;
        debug!("Initialized context for resource {resource} with {backend:?} backend");
        Ok(Self::from_options(ExecutionOptions {
            backend,
            ..ExecutionOptions::default()
        }))
    }

    pub fn from_options(options: ExecutionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn vector<'a, T: Real>(&self, len: usize) -> Vector<'a, T> {
        Vector::create(len)
    }

    pub fn vector_from_slice<'a, T: Real>(&self, values: &[T]) -> Vector<'a, T> {
        Vector::from_slice(values)
    }

    /// See [`ElemRestriction::create`].
    pub fn elem_restriction(
        &self,
        num_elements: usize,
        elem_size: usize,
        num_comp: usize,
        comp_stride: usize,
        lsize: usize,
        offsets: &[usize],
    ) -> Result<ElemRestriction> {
        ElemRestriction::create(num_elements, elem_size, num_comp, comp_stride, lsize, offsets)
    }

    /// See [`ElemRestriction::create_strided`].
    pub fn strided_elem_restriction(
        &self,
        num_elements: usize,
        elem_size: usize,
        num_comp: usize,
        lsize: usize,
        strides: Strides,
    ) -> Result<ElemRestriction> {
        ElemRestriction::create_strided(num_elements, elem_size, num_comp, lsize, strides)
    }

    /// See [`Basis::tensor_h1_lagrange`].
    pub fn basis_tensor_h1_lagrange<T: Real>(
        &self,
        dim: usize,
        num_comp: usize,
        p1d: usize,
        q1d: usize,
        qmode: QuadMode,
    ) -> Result<Basis<T>> {
        Basis::tensor_h1_lagrange(dim, num_comp, p1d, q1d, qmode)
    }

    /// See [`Basis::tensor_h1`].
    #[allow(clippy::too_many_arguments)]
    pub fn basis_tensor_h1<T: Real>(
        &self,
        dim: usize,
        num_comp: usize,
        interp_1d: &DMatrix<T>,
        grad_1d: &DMatrix<T>,
        q_ref_1d: &[T],
        q_weight_1d: &[T],
    ) -> Result<Basis<T>> {
        Basis::tensor_h1(dim, num_comp, interp_1d, grad_1d, q_ref_1d, q_weight_1d)
    }

    /// See [`Basis::h1`].
    pub fn basis_h1<T: Real>(
        &self,
        num_comp: usize,
        interp: DMatrix<T>,
        grad: Vec<DMatrix<T>>,
        q_ref: DMatrix<T>,
        q_weights: DVector<T>,
    ) -> Result<Basis<T>> {
        Basis::h1(num_comp, interp, grad, q_ref, q_weights)
    }

    pub fn q_function_interior<'a, T: Real>(&self, user_f: Box<QFunctionUserClosure<'a, T>>) -> QFunction<'a, T> {
        QFunction::create(user_f)
    }

    /// See [`gallery::by_name`].
    pub fn q_function_by_name<T: Real>(&self, name: &str) -> Result<QFunction<'static, T>> {
        gallery::by_name(name)
    }

    /// Creates an operator that runs its element loops with this context's options.
    pub fn operator<'a, T: Real>(&self, qf: &QFunction<'a, T>) -> Operator<'a, T> {
        Operator::create(qf).with_options(self.options)
    }

    pub fn composite_operator<'a, T: Real>(&self) -> CompositeOperator<'a, T> {
        CompositeOperator::create()
    }
}
