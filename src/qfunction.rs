//! Point-wise kernels evaluated at quadrature points.
//!
//! A [`QFunction`] wraps a user closure together with the declared names, widths and
//! evaluation modes of its input and output fields. The closure is called with one slice per
//! declared field, holding the values of that field at a batch of quadrature points. For a
//! field of width `size`, component `k` at point `i` of a batch of `q` points is stored at
//! `k * q + i`.
use crate::error::{Error, Result};
use crate::vector::Vector;
use crate::Real;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

pub mod gallery;

/// Maximum number of inputs (and, separately, outputs) of a point-wise kernel.
pub const MAX_QFUNCTION_FIELDS: usize = 16;

pub type QFunctionInputs<'a, T> = [&'a [T]; MAX_QFUNCTION_FIELDS];
pub type QFunctionOutputs<'a, T> = [&'a mut [T]; MAX_QFUNCTION_FIELDS];

/// Signature of a user point-wise kernel.
///
/// Slots beyond the number of declared fields hold empty slices.
pub type QFunctionUserClosure<'a, T> =
    dyn Fn(QFunctionInputs<T>, QFunctionOutputs<T>) -> eyre::Result<()> + Send + Sync + 'a;

/// Basis evaluation mode of a kernel field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvalMode {
    /// Values are passed through without any basis action. Requires a collocated basis.
    None,
    /// Values interpolated to quadrature points.
    Interp,
    /// Reference gradients at quadrature points.
    Grad,
    /// Quadrature weights. Only valid for inputs.
    Weight,
}

/// Declared name, width and evaluation mode of a kernel field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QFunctionField {
    name: String,
    size: usize,
    eval_mode: EvalMode,
}

impl QFunctionField {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of values per quadrature point.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn eval_mode(&self) -> EvalMode {
        self.eval_mode
    }
}

/// Position of a field in the declared signature.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum FieldSlot {
    Input(usize),
    Output(usize),
}

struct QFunctionCore<'a, T> {
    name: Option<String>,
    inputs: Vec<QFunctionField>,
    outputs: Vec<QFunctionField>,
    slots: FxHashMap<String, FieldSlot>,
    user_f: Box<QFunctionUserClosure<'a, T>>,
}

/// A point-wise kernel with a declared signature.
///
/// Cloning is cheap and yields a handle to the same kernel. The signature can only be
/// extended while no other handle exists, in particular before the kernel is given to an
/// operator.
pub struct QFunction<'a, T> {
    core: Arc<QFunctionCore<'a, T>>,
}

impl<'a, T> Clone for QFunction<'a, T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<'a, T> Debug for QFunction<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("QFunction")
            .field("name", &self.core.name)
            .field("inputs", &self.core.inputs)
            .field("outputs", &self.core.outputs)
            .finish_non_exhaustive()
    }
}

impl<'a, T: Real> QFunction<'a, T> {
    /// Creates a kernel with an empty signature from a user closure.
    ///
    /// Fields are declared afterwards with [`QFunction::input`] and [`QFunction::output`], in
    /// the order in which the closure expects them.
    pub fn create(user_f: Box<QFunctionUserClosure<'a, T>>) -> Self {
        Self {
            core: Arc::new(QFunctionCore {
                name: None,
                inputs: Vec::new(),
                outputs: Vec::new(),
                slots: FxHashMap::default(),
                user_f,
            }),
        }
    }

    pub(crate) fn named(mut self, name: &str) -> Self {
        if let Some(core) = Arc::get_mut(&mut self.core) {
            core.name = Some(name.to_string());
        }
        self
    }

    /// Declares the next input field.
    ///
    /// At most one input may have weight mode, and it must have size 1.
    pub fn input(self, name: &str, size: usize, eval_mode: EvalMode) -> Result<Self> {
        if eval_mode == EvalMode::Weight {
            if size != 1 {
                return Err(Error::dimension_mismatch(format!(
                    "weight input '{name}' must have size 1, got {size}"
                )));
            }
            if let Some(weights) = self.inputs().iter().find(|field| field.eval_mode == EvalMode::Weight) {
                return Err(Error::invalid_field(
                    name,
                    format!("quadrature weights are already provided by input '{}'", weights.name),
                ));
            }
        }
        self.add_field(name, size, eval_mode, true)
    }

    /// Declares the next output field. Weight mode is not a valid output mode.
    pub fn output(self, name: &str, size: usize, eval_mode: EvalMode) -> Result<Self> {
        if eval_mode == EvalMode::Weight {
            return Err(Error::InvalidEvalMode(format!(
                "output '{name}' cannot have evaluation mode Weight"
            )));
        }
        self.add_field(name, size, eval_mode, false)
    }

    fn add_field(mut self, name: &str, size: usize, eval_mode: EvalMode, is_input: bool) -> Result<Self> {
        let holders = Arc::strong_count(&self.core) - 1;
        let core = Arc::get_mut(&mut self.core).ok_or(Error::ObjectInUse { holders })?;
        if size == 0 {
            return Err(Error::dimension_mismatch(format!("field '{name}' must have positive size")));
        }
        if core.slots.contains_key(name) {
            return Err(Error::DuplicateField { name: name.to_string() });
        }
        let fields = if is_input { &mut core.inputs } else { &mut core.outputs };
        if fields.len() == MAX_QFUNCTION_FIELDS {
            return Err(Error::dimension_mismatch(format!(
                "a kernel has at most {MAX_QFUNCTION_FIELDS} inputs and {MAX_QFUNCTION_FIELDS} outputs"
            )));
        }
        let slot = if is_input {
            FieldSlot::Input(fields.len())
        } else {
            FieldSlot::Output(fields.len())
        };
        fields.push(QFunctionField {
            name: name.to_string(),
            size,
            eval_mode,
        });
        core.slots.insert(name.to_string(), slot);
        Ok(self)
    }

    /// Evaluates the kernel directly on vectors holding `q` quadrature points.
    ///
    /// `inputs` and `outputs` must provide one vector per declared field, each of length
    /// `q * size`.
    pub fn apply(&self, q: usize, inputs: &[&Vector<'_, T>], outputs: &[&Vector<'_, T>]) -> Result<()> {
        let core = &self.core;
        if inputs.len() != core.inputs.len() || outputs.len() != core.outputs.len() {
            return Err(Error::dimension_mismatch(format!(
                "kernel declares {} inputs and {} outputs, got {} and {} vectors",
                core.inputs.len(),
                core.outputs.len(),
                inputs.len(),
                outputs.len()
            )));
        }
        let expected_lengths = core.inputs.iter().chain(&core.outputs).map(|field| q * field.size);
        let actual_lengths = inputs
            .iter()
            .map(|vector| vector.len())
            .chain(outputs.iter().map(|vector| vector.len()));
        if let Some((expected, actual)) = expected_lengths
            .zip(actual_lengths)
            .find(|(expected, actual)| expected != actual)
        {
            return Err(Error::dimension_mismatch(format!(
                "kernel field at {q} points needs a vector of length {expected}, got {actual}"
            )));
        }

        let input_views = inputs
            .iter()
            .map(|vector| vector.view_recursive())
            .collect::<Result<Vec<_>>>()?;
        let mut output_views = outputs
            .iter()
            .map(|vector| vector.view_mut())
            .collect::<Result<Vec<_>>>()?;

        let mut input_array: QFunctionInputs<T> = [&[]; MAX_QFUNCTION_FIELDS];
        for (slot, view) in input_array.iter_mut().zip(&input_views) {
            *slot = &view[..];
        }
        let mut output_array: QFunctionOutputs<T> = Default::default();
        for (slot, view) in output_array.iter_mut().zip(output_views.iter_mut()) {
            *slot = &mut view[..];
        }
        self.call(input_array, output_array)
    }

    /// Calls the user closure, converting its failure into [`Error::Kernel`].
    pub(crate) fn call(&self, inputs: QFunctionInputs<T>, outputs: QFunctionOutputs<T>) -> Result<()> {
        (self.core.user_f)(inputs, outputs).map_err(Error::Kernel)
    }
}

impl<'a, T> QFunction<'a, T> {
    /// Name of the kernel if it was created from the gallery.
    pub fn name(&self) -> Option<&str> {
        self.core.name.as_deref()
    }

    pub fn inputs(&self) -> &[QFunctionField] {
        &self.core.inputs
    }

    pub fn outputs(&self) -> &[QFunctionField] {
        &self.core.outputs
    }

    pub(crate) fn slot(&self, name: &str) -> Option<FieldSlot> {
        self.core.slots.get(name).copied()
    }
}

impl<'a, T> Display for QFunction<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "QFunction {}", self.name().unwrap_or("<user closure>"))?;
        for (kind, fields) in [("Input", self.inputs()), ("Output", self.outputs())] {
            for field in fields {
                writeln!(
                    f,
                    "  {kind} field '{}': size {}, {:?}",
                    field.name, field.size, field.eval_mode
                )?;
            }
        }
        Ok(())
    }
}
