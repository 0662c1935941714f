//! Flat scalar arrays with leased access.
//!
//! A [`Vector`] owns or borrows a contiguous array of scalars of fixed length. Access to the
//! array goes through *leases*: any number of shared [`VectorView`]s, or a single exclusive
//! [`VectorViewMut`]. Requesting a lease that conflicts with an outstanding one fails with
//! [`Error::ResourceBusy`] instead of blocking.
use crate::error::{Error, Result};
use crate::Real;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Denotes the type of vector norm to be computed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormType {
    One,
    Two,
    Max,
}

#[derive(Debug)]
enum Storage<'a, T> {
    Owned(Vec<T>),
    Borrowed(&'a mut [T]),
}

impl<'a, T> Deref for Storage<'a, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        match self {
            Self::Owned(values) => values,
            Self::Borrowed(values) => values,
        }
    }
}

impl<'a, T> DerefMut for Storage<'a, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        match self {
            Self::Owned(values) => values,
            Self::Borrowed(values) => values,
        }
    }
}

/// A mesh-wide or element-wise array of scalars.
///
/// The vector either owns its array, or borrows an external array for the lifetime `'a`
/// (see [`Vector::from_array`]). Operators that bind a vector as a passive field keep a
/// shared reference to the same array, so that data written by one operator can be read
/// by another.
#[derive(Debug)]
pub struct Vector<'a, T> {
    len: usize,
    storage: Arc<RwLock<Storage<'a, T>>>,
}

/// A shared lease on the array of a [`Vector`].
#[derive(Debug)]
pub struct VectorView<'v, 'a, T> {
    guard: RwLockReadGuard<'v, Storage<'a, T>>,
}

/// An exclusive lease on the array of a [`Vector`].
#[derive(Debug)]
pub struct VectorViewMut<'v, 'a, T> {
    guard: RwLockWriteGuard<'v, Storage<'a, T>>,
}

impl<'v, 'a, T> Deref for VectorView<'v, 'a, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.guard
    }
}

impl<'v, 'a, T> Deref for VectorViewMut<'v, 'a, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.guard
    }
}

impl<'v, 'a, T> DerefMut for VectorViewMut<'v, 'a, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.guard
    }
}

impl<'a, T: Real> Vector<'a, T> {
    /// Creates a zero-initialized vector of the given length.
    pub fn create(len: usize) -> Self {
        Self::from_storage(Storage::Owned(vec![T::zero(); len]))
    }

    /// Creates a vector that owns a copy of the given values.
    pub fn from_slice(values: &[T]) -> Self {
        Self::from_storage(Storage::Owned(values.to_vec()))
    }

    /// Creates a vector that operates directly on an external array.
    ///
    /// Writes to the vector are visible in `values` once the vector (and every operator
    /// holding it) has been dropped.
    pub fn from_array(values: &'a mut [T]) -> Self {
        Self::from_storage(Storage::Borrowed(values))
    }

    fn from_storage(storage: Storage<'a, T>) -> Self {
        Self {
            len: storage.len(),
            storage: Arc::new(RwLock::new(storage)),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Acquires a shared lease on the array.
    pub fn view(&self) -> Result<VectorView<'_, 'a, T>> {
        let guard = self.storage.try_read().ok_or(Error::ResourceBusy)?;
        Ok(VectorView { guard })
    }

    /// Acquires an exclusive lease on the array.
    pub fn view_mut(&self) -> Result<VectorViewMut<'_, 'a, T>> {
        let guard = self.storage.try_write().ok_or(Error::ResourceBusy)?;
        Ok(VectorViewMut { guard })
    }

    /// Sets every entry to the given value.
    pub fn set_value(&self, value: T) -> Result<()> {
        self.view_mut()?.fill(value);
        Ok(())
    }

    /// Copies the given values into the vector.
    pub fn set_slice(&self, values: &[T]) -> Result<()> {
        if values.len() != self.len {
            return Err(Error::dimension_mismatch(format!(
                "cannot copy {} values into vector of length {}",
                values.len(),
                self.len
            )));
        }
        self.view_mut()?.copy_from_slice(values);
        Ok(())
    }

    /// Returns a copy of the values in the vector.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        Ok(self.view()?.to_vec())
    }

    pub fn norm(&self, norm_type: NormType) -> Result<T> {
        let values = self.view()?;
        let norm = match norm_type {
            NormType::One => values.iter().fold(T::zero(), |acc, x| acc + x.abs()),
            NormType::Two => values.iter().fold(T::zero(), |acc, x| acc + *x * *x).sqrt(),
            NormType::Max => values.iter().fold(T::zero(), |acc, x| acc.max(x.abs())),
        };
        Ok(norm)
    }

    /// Computes `self = alpha * self`.
    pub fn scale(&self, alpha: T) -> Result<()> {
        self.view_mut()?.iter_mut().for_each(|y| *y *= alpha);
        Ok(())
    }

    /// Computes `self = alpha * x + self`.
    ///
    /// Fails with [`Error::ResourceBusy`] if `x` and `self` share the same array.
    pub fn axpy(&self, alpha: T, x: &Vector<'_, T>) -> Result<()> {
        if x.len != self.len {
            return Err(Error::dimension_mismatch(format!(
                "axpy with vectors of length {} and {}",
                x.len, self.len
            )));
        }
        let x = x.view()?;
        let mut y = self.view_mut()?;
        y.iter_mut().zip(x.iter()).for_each(|(y, x)| *y += alpha * *x);
        Ok(())
    }

    /// Consumes the vector and returns its values.
    ///
    /// Fails with [`Error::ObjectInUse`] if an operator still holds the vector as a field.
    pub fn take_values(self) -> Result<Vec<T>> {
        let storage = Arc::try_unwrap(self.storage).map_err(|shared| Error::ObjectInUse {
            holders: Arc::strong_count(&shared) - 1,
        })?;
        Ok(match storage.into_inner() {
            Storage::Owned(values) => values,
            Storage::Borrowed(values) => values.to_vec(),
        })
    }
}

impl<'a, T> Vector<'a, T> {
    /// Returns `true` if both vectors refer to the same array.
    pub fn shares_array_with(&self, other: &Vector<'_, T>) -> bool {
        Arc::as_ptr(&self.storage) as *const () == Arc::as_ptr(&other.storage) as *const ()
    }

    /// Returns another handle to the same array.
    pub(crate) fn share(&self) -> Self {
        Self {
            len: self.len,
            storage: Arc::clone(&self.storage),
        }
    }

    /// Shared lease that succeeds even if the current thread already holds a shared lease.
    pub(crate) fn view_recursive(&self) -> Result<VectorView<'_, 'a, T>> {
        let guard = self
            .storage
            .try_read_recursive()
            .ok_or(Error::ResourceBusy)?;
        Ok(VectorView { guard })
    }
}

impl<'a, T: Real> Display for Vector<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vector of length {}", self.len)?;
        match self.storage.try_read() {
            Some(values) => {
                for value in values.iter() {
                    writeln!(f, "    {value:.8}")?;
                }
                Ok(())
            }
            None => writeln!(f, "    <array is exclusively leased>"),
        }
    }
}
