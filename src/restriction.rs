//! Element restrictions: maps between mesh-wide L-vectors and element-wise E-vectors.
//!
//! An E-vector stores, for every element, all components of all of its nodes. The entry for
//! element `e`, component `c` and node `i` is found at index
//!
//! ```text
//! (e * num_comp + c) * elem_size + i
//! ```
//!
//! The *gather* direction copies from the L-vector into this layout. The *scatter* direction
//! is the transpose: it adds every E-vector entry into the L-vector position it was gathered
//! from, so that nodes shared by several elements receive the sum of all contributions.
use crate::context::ExecutionOptions;
use crate::error::{Error, Result};
use crate::vector::Vector;
use crate::Real;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Denotes whether a linear transformation or its transpose should be applied.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransposeMode {
    NoTranspose,
    Transpose,
}

/// Strides of a strided element restriction.
///
/// Node `i`, component `c` of element `e` is stored in the L-vector at
/// `i * node + c * component + e * element`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strides {
    pub node: usize,
    pub component: usize,
    pub element: usize,
}

impl Strides {
    pub fn new(node: usize, component: usize, element: usize) -> Self {
        Self {
            node,
            component,
            element,
        }
    }

    /// The strides matching the E-vector layout, so that the L-vector is laid out exactly
    /// like the E-vector.
    pub fn backend(elem_size: usize, num_comp: usize) -> Self {
        Self::new(1, elem_size, elem_size * num_comp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    Indexed { comp_stride: usize, offsets: Vec<usize> },
    Strided(Strides),
}

#[derive(Debug, PartialEq, Eq)]
struct RestrictionCore {
    num_elements: usize,
    elem_size: usize,
    num_comp: usize,
    lsize: usize,
    layout: Layout,
}

/// A map between an L-vector and an E-vector.
///
/// Restrictions are immutable after creation. Cloning is cheap and yields a handle to the same
/// restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElemRestriction {
    core: Arc<RestrictionCore>,
}

/// An element restriction, or the absence of one for fields that are not gathered from
/// any vector (quadrature weights).
#[derive(Debug, Copy, Clone)]
pub enum ElemRestrictionOpt<'r> {
    Some(&'r ElemRestriction),
    None,
}

impl<'r> From<&'r ElemRestriction> for ElemRestrictionOpt<'r> {
    fn from(restriction: &'r ElemRestriction) -> Self {
        Self::Some(restriction)
    }
}

impl<'r> ElemRestrictionOpt<'r> {
    pub fn is_some(&self) -> bool {
        matches!(self, Self::Some(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

fn check_nonzero_sizes(elem_size: usize, num_comp: usize) -> Result<()> {
    if elem_size == 0 || num_comp == 0 {
        return Err(Error::dimension_mismatch(format!(
            "restriction needs a positive element size and component count, got {elem_size} and {num_comp}"
        )));
    }
    Ok(())
}

impl ElemRestriction {
    /// Creates a restriction from explicit per-element offsets.
    ///
    /// * `num_elements` - Number of elements described by `offsets`
    /// * `elem_size` - Number of nodes per element
    /// * `num_comp` - Number of components per node
    /// * `comp_stride` - Stride between components of the same L-vector node. Node `i`,
    ///   component `c` of element `e` is found at `offsets[e * elem_size + i] + c * comp_stride`.
    /// * `lsize` - Length of the L-vector
    /// * `offsets` - Array of shape `[num_elements, elem_size]`
    ///
    /// Fails with [`Error::InvalidIndex`] if any offset (for any component) lies outside the
    /// L-vector.
    pub fn create(
        num_elements: usize,
        elem_size: usize,
        num_comp: usize,
        comp_stride: usize,
        lsize: usize,
        offsets: &[usize],
    ) -> Result<Self> {
        check_nonzero_sizes(elem_size, num_comp)?;
        if num_elements.checked_mul(elem_size) != Some(offsets.len()) {
            return Err(Error::dimension_mismatch(format!(
                "expected {num_elements} x {elem_size} offsets, got {}",
                offsets.len()
            )));
        }

        // Saturated indices are out of range for every representable lsize
        let last_comp_shift = (num_comp - 1).saturating_mul(comp_stride);
        if let Some(index) = offsets
            .iter()
            .map(|offset| offset.saturating_add(last_comp_shift))
            .find(|&index| index >= lsize)
        {
            return Err(Error::InvalidIndex { index, bound: lsize });
        }

        Ok(Self::from_core(RestrictionCore {
            num_elements,
            elem_size,
            num_comp,
            lsize,
            layout: Layout::Indexed {
                comp_stride,
                offsets: offsets.to_vec(),
            },
        }))
    }

    /// Creates a restriction whose L-vector positions follow from fixed strides.
    ///
    /// Strided restrictions are typically used for data that lives at quadrature points and
    /// is not shared between elements. Fails with [`Error::InvalidIndex`] if the largest
    /// reachable position lies outside the L-vector.
    pub fn create_strided(
        num_elements: usize,
        elem_size: usize,
        num_comp: usize,
        lsize: usize,
        strides: Strides,
    ) -> Result<Self> {
        check_nonzero_sizes(elem_size, num_comp)?;
        if num_elements > 0 {
            let max_index = (elem_size - 1)
                .saturating_mul(strides.node)
                .saturating_add((num_comp - 1).saturating_mul(strides.component))
                .saturating_add((num_elements - 1).saturating_mul(strides.element));
            if max_index >= lsize {
                return Err(Error::InvalidIndex {
                    index: max_index,
                    bound: lsize,
                });
            }
        }

        Ok(Self::from_core(RestrictionCore {
            num_elements,
            elem_size,
            num_comp,
            lsize,
            layout: Layout::Strided(strides),
        }))
    }

    fn from_core(core: RestrictionCore) -> Self {
        Self { core: Arc::new(core) }
    }

    pub fn num_elements(&self) -> usize {
        self.core.num_elements
    }

    pub fn elem_size(&self) -> usize {
        self.core.elem_size
    }

    pub fn num_components(&self) -> usize {
        self.core.num_comp
    }

    /// Length of the L-vector.
    pub fn lvector_size(&self) -> usize {
        self.core.lsize
    }

    /// Length of the E-vector, `num_elements * elem_size * num_comp`.
    pub fn evector_size(&self) -> usize {
        self.core.num_elements * self.core.elem_size * self.core.num_comp
    }

    pub fn is_strided(&self) -> bool {
        matches!(self.core.layout, Layout::Strided(_))
    }

    /// Returns the strides if this is a strided restriction.
    pub fn strides(&self) -> Option<Strides> {
        match &self.core.layout {
            Layout::Strided(strides) => Some(*strides),
            Layout::Indexed { .. } => None,
        }
    }

    pub fn create_lvector<'a, T: Real>(&self) -> Vector<'a, T> {
        Vector::create(self.lvector_size())
    }

    pub fn create_evector<'a, T: Real>(&self) -> Vector<'a, T> {
        Vector::create(self.evector_size())
    }

    /// Calls `f(e_index, l_index)` for every entry of one element.
    #[inline]
    fn for_each_in_element(&self, element: usize, mut f: impl FnMut(usize, usize)) {
        let RestrictionCore {
            elem_size, num_comp, ..
        } = *self.core;
        let element_begin = element * elem_size * num_comp;
        match &self.core.layout {
            Layout::Indexed { comp_stride, offsets } => {
                let element_offsets = &offsets[element * elem_size..(element + 1) * elem_size];
                for c in 0..num_comp {
                    for (i, offset) in element_offsets.iter().enumerate() {
                        f(element_begin + c * elem_size + i, offset + c * comp_stride);
                    }
                }
            }
            Layout::Strided(strides) => {
                for c in 0..num_comp {
                    for i in 0..elem_size {
                        let l_index = i * strides.node + c * strides.component + element * strides.element;
                        f(element_begin + c * elem_size + i, l_index);
                    }
                }
            }
        }
    }

    fn check_lengths(&self, lvec_len: usize, evec_len: usize) -> Result<()> {
        if lvec_len != self.lvector_size() || evec_len != self.evector_size() {
            return Err(Error::dimension_mismatch(format!(
                "restriction maps L-vectors of length {} to E-vectors of length {}, got {lvec_len} and {evec_len}",
                self.lvector_size(),
                self.evector_size()
            )));
        }
        Ok(())
    }

    /// Copies L-vector entries into the E-vector layout, overwriting `evec`.
    pub fn gather<T: Real>(&self, lvec: &[T], evec: &mut [T]) -> Result<()> {
        self.gather_with(lvec, evec, &ExecutionOptions::default())
    }

    pub(crate) fn gather_with<T: Real>(&self, lvec: &[T], evec: &mut [T], options: &ExecutionOptions) -> Result<()> {
        self.check_lengths(lvec.len(), evec.len())?;
        let chunk_size = self.core.elem_size * self.core.num_comp;
        options.for_each_chunk_mut(evec, chunk_size, |element, element_values| {
            let element_begin = element * chunk_size;
            self.for_each_in_element(element, |e_index, l_index| {
                element_values[e_index - element_begin] = lvec[l_index];
            });
            Ok(())
        })
    }

    /// Adds E-vector entries into the L-vector positions they were gathered from.
    ///
    /// Entries of `lvec` that no element touches keep their values.
    pub fn scatter_add<T: Real>(&self, evec: &[T], lvec: &mut [T]) -> Result<()> {
        self.check_lengths(lvec.len(), evec.len())?;
        for element in 0..self.core.num_elements {
            self.for_each_in_element(element, |e_index, l_index| {
                lvec[l_index] += evec[e_index];
            });
        }
        Ok(())
    }

    /// Zeroes every L-vector entry that some element touches.
    pub(crate) fn zero_touched<T: Real>(&self, lvec: &mut [T]) -> Result<()> {
        if lvec.len() != self.lvector_size() {
            return Err(Error::dimension_mismatch(format!(
                "expected L-vector of length {}, got {}",
                self.lvector_size(),
                lvec.len()
            )));
        }
        for element in 0..self.core.num_elements {
            self.for_each_in_element(element, |_, l_index| lvec[l_index] = T::zero());
        }
        Ok(())
    }

    /// Applies the restriction to vectors.
    ///
    /// With [`TransposeMode::NoTranspose`], `u` is an L-vector and `v` an E-vector that is
    /// overwritten. With [`TransposeMode::Transpose`], `u` is an E-vector whose entries are
    /// *added* into the L-vector `v`.
    pub fn apply<T: Real>(&self, tmode: TransposeMode, u: &Vector<'_, T>, v: &Vector<'_, T>) -> Result<()> {
        let u = u.view()?;
        let mut v = v.view_mut()?;
        match tmode {
            TransposeMode::NoTranspose => self.gather(&u, &mut v),
            TransposeMode::Transpose => self.scatter_add(&u, &mut v),
        }
    }

    /// Counts, for every L-vector entry, how many element nodes are gathered from it.
    pub fn multiplicity<T: Real>(&self) -> Result<Vec<T>> {
        let ones = vec![T::one(); self.evector_size()];
        let mut multiplicity = vec![T::zero(); self.lvector_size()];
        self.scatter_add(&ones, &mut multiplicity)?;
        Ok(multiplicity)
    }
}

impl Display for ElemRestriction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kind = if self.is_strided() { "Strided" } else { "Indexed" };
        write!(
            f,
            "{kind} element restriction from ({}, {}) to {} elements with {} nodes each",
            self.lvector_size(),
            self.num_components(),
            self.num_elements(),
            self.elem_size()
        )
    }
}
