//! Operators: restriction, basis and point-wise kernel composed into a global linear or
//! nonlinear action.
//!
//! An [`Operator`] binds every declared field of a [`QFunction`] to an element restriction, a
//! basis and a vector role. Applying the operator
//!
//! 1. gathers every input field from its vector and transforms it to quadrature points
//!    (or evaluates the quadrature weights),
//! 2. calls the kernel on the quadrature point data of every element,
//! 3. transforms every output field back with the adjoint basis and scatter-adds it into its
//!    vector.
//!
//! Fields marked [`VectorOpt::Active`] read from (write to) the vectors passed to
//! [`Operator::apply`]. Fields bound to a concrete vector are *passive* and always use that
//! vector.
use crate::basis::{Basis, BasisOpt};
use crate::context::ExecutionOptions;
use crate::error::{Error, Result};
use crate::qfunction::{EvalMode, FieldSlot, QFunction, QFunctionInputs, QFunctionOutputs, MAX_QFUNCTION_FIELDS};
use crate::restriction::{ElemRestriction, ElemRestrictionOpt, TransposeMode};
use crate::vector::Vector;
use crate::Real;
use log::{debug, trace};
use parking_lot::Mutex;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};

mod composite;

pub use composite::CompositeOperator;

/// The vector role of an operator field.
#[derive(Debug)]
pub enum VectorOpt<'v, 'a, T> {
    /// A passive field that always uses the given vector.
    Some(&'v Vector<'a, T>),
    /// The field uses the input or output vector passed to [`Operator::apply`].
    Active,
    /// No vector. Only valid for quadrature weights.
    None,
}

impl<'v, 'a, T> Clone for VectorOpt<'v, 'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'v, 'a, T> Copy for VectorOpt<'v, 'a, T> {}

impl<'v, 'a, T> From<&'v Vector<'a, T>> for VectorOpt<'v, 'a, T> {
    fn from(vector: &'v Vector<'a, T>) -> Self {
        Self::Some(vector)
    }
}

impl<'v, 'a, T> VectorOpt<'v, 'a, T> {
    pub fn is_some(&self) -> bool {
        matches!(self, Self::Some(_))
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Debug)]
enum FieldVector<'a, T> {
    Active,
    Passive(Vector<'a, T>),
}

/// Where the quadrature point data of a field comes from (or goes to).
#[derive(Debug)]
enum FieldSource<'a, T> {
    Weight(Basis<T>),
    Basis {
        restriction: ElemRestriction,
        basis: Basis<T>,
        vector: FieldVector<'a, T>,
    },
    Collocated {
        restriction: ElemRestriction,
        vector: FieldVector<'a, T>,
    },
}

#[derive(Debug)]
struct OperatorField<'a, T> {
    name: String,
    eval_mode: EvalMode,
    size: usize,
    source: FieldSource<'a, T>,
}

impl<'a, T> OperatorField<'a, T> {
    fn restriction(&self) -> Option<&ElemRestriction> {
        self.source.restriction()
    }

    fn vector(&self) -> Option<&FieldVector<'a, T>> {
        match &self.source {
            FieldSource::Weight(_) => None,
            FieldSource::Basis { vector, .. } | FieldSource::Collocated { vector, .. } => Some(vector),
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.vector(), Some(FieldVector::Active))
    }

    fn passive_vector(&self) -> Option<&Vector<'a, T>> {
        match self.vector() {
            Some(FieldVector::Passive(vector)) => Some(vector),
            _ => None,
        }
    }
}

/// How the result of an output field is combined with the prior contents of its vector.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum OutputMode {
    /// Positions touched by the field's restriction are replaced.
    Overwrite,
    /// The result is added to the prior contents.
    Add,
}

/// Element and quadrature point buffers reused across applications.
#[derive(Debug)]
struct ApplyWorkspace<T> {
    e_in: Vec<Vec<T>>,
    q_in: Vec<Vec<T>>,
    q_out: Vec<Vec<T>>,
    e_out: Vec<Vec<T>>,
}

impl<T> Default for ApplyWorkspace<T> {
    fn default() -> Self {
        Self {
            e_in: Vec::new(),
            q_in: Vec::new(),
            q_out: Vec::new(),
            e_out: Vec::new(),
        }
    }
}

impl<T: Real> ApplyWorkspace<T> {
    fn prepare(&mut self, num_inputs: usize, num_outputs: usize) {
        self.e_in.resize_with(num_inputs, Vec::new);
        self.q_in.resize_with(num_inputs, Vec::new);
        self.q_out.resize_with(num_outputs, Vec::new);
        self.e_out.resize_with(num_outputs, Vec::new);
    }
}

fn resize_buffer<T: Real>(buffer: &mut Vec<T>, len: usize) {
    buffer.resize(len, T::zero());
}

/// A point-wise kernel bound to restrictions, bases and vectors.
///
/// Fields are bound with [`Operator::set_field`]. Once the operator has been applied, its
/// fields are fixed.
#[derive(Debug)]
pub struct Operator<'a, T> {
    qf: QFunction<'a, T>,
    inputs: Vec<Option<OperatorField<'a, T>>>,
    outputs: Vec<Option<OperatorField<'a, T>>>,
    num_elements: Option<usize>,
    num_qpoints: Option<usize>,
    options: ExecutionOptions,
    finalized: AtomicBool,
    workspace: Mutex<ApplyWorkspace<T>>,
}

impl<'a, T: Real> Operator<'a, T> {
    /// Creates an operator for the given kernel with no fields bound.
    pub fn create(qf: &QFunction<'a, T>) -> Self {
        Self {
            qf: qf.clone(),
            inputs: qf.inputs().iter().map(|_| None).collect(),
            outputs: qf.outputs().iter().map(|_| None).collect(),
            num_elements: None,
            num_qpoints: None,
            options: ExecutionOptions::default(),
            finalized: AtomicBool::new(false),
            workspace: Mutex::new(ApplyWorkspace::default()),
        }
    }

    /// Replaces the options used to run the element loops.
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Number of elements, or zero if no field with a restriction has been bound yet.
    pub fn num_elements(&self) -> usize {
        self.num_elements.unwrap_or(0)
    }

    /// Number of quadrature points per element, or zero if no field has been bound yet.
    pub fn num_quadrature_points(&self) -> usize {
        self.num_qpoints.unwrap_or(0)
    }

    pub fn qfunction(&self) -> &QFunction<'a, T> {
        &self.qf
    }

    /// Binds a kernel field.
    ///
    /// * `name` - Name of an input or output field declared by the kernel
    /// * `restriction` - Restriction gathering the field from its vector, or
    ///   [`ElemRestrictionOpt::None`] for quadrature weights
    /// * `basis` - Basis transforming nodal values to quadrature points, or
    ///   [`BasisOpt::Collocated`] for data given at quadrature points ([`EvalMode::None`])
    /// * `vector` - [`VectorOpt::Active`], a passive vector, or [`VectorOpt::None`] for
    ///   quadrature weights
    ///
    /// All restrictions must describe the same number of elements, and all bases (or
    /// collocated restrictions) the same number of quadrature points.
    pub fn set_field<'r, 'b, 'v>(
        &mut self,
        name: &str,
        restriction: impl Into<ElemRestrictionOpt<'r>>,
        basis: impl Into<BasisOpt<'b, T>>,
        vector: impl Into<VectorOpt<'v, 'a, T>>,
    ) -> Result<()>
    where
        'a: 'v,
    {
        if self.finalized.load(Ordering::Acquire) {
            return Err(Error::OperatorFinalized);
        }
        let slot = self
            .qf
            .slot(name)
            .ok_or_else(|| Error::UnknownField { name: name.to_string() })?;
        let (declared, bound) = match slot {
            FieldSlot::Input(i) => (&self.qf.inputs()[i], &self.inputs[i]),
            FieldSlot::Output(i) => (&self.qf.outputs()[i], &self.outputs[i]),
        };
        if bound.is_some() {
            return Err(Error::DuplicateField { name: name.to_string() });
        }
        let eval_mode = declared.eval_mode();
        let size = declared.size();

        let source = field_source(name, eval_mode, restriction.into(), basis.into(), vector.into())?;
        let num_qpoints = check_field_dimensions(name, eval_mode, size, &source)?;
        let num_elements = source.restriction().map(|r| r.num_elements());

        if let Some(expected) = self.num_qpoints {
            if expected != num_qpoints {
                return Err(Error::dimension_mismatch(format!(
                    "field '{name}' has {num_qpoints} quadrature points per element, but the operator has {expected}"
                )));
            }
        }
        if let (Some(expected), Some(actual)) = (self.num_elements, num_elements) {
            if expected != actual {
                return Err(Error::dimension_mismatch(format!(
                    "field '{name}' has {actual} elements, but the operator has {expected}"
                )));
            }
        }

        let field = OperatorField {
            name: name.to_string(),
            eval_mode,
            size,
            source,
        };
        debug!(
            "Bound operator field '{name}' ({eval_mode:?}, size {size}): {}",
            describe_field(&field)
        );
        self.num_qpoints = Some(num_qpoints);
        self.num_elements = self.num_elements.or(num_elements);
        match slot {
            FieldSlot::Input(i) => self.inputs[i] = Some(field),
            FieldSlot::Output(i) => self.outputs[i] = Some(field),
        }
        Ok(())
    }

    /// Binds a kernel field, see [`Operator::set_field`].
    pub fn field<'r, 'b, 'v>(
        mut self,
        name: &str,
        restriction: impl Into<ElemRestrictionOpt<'r>>,
        basis: impl Into<BasisOpt<'b, T>>,
        vector: impl Into<VectorOpt<'v, 'a, T>>,
    ) -> Result<Self>
    where
        'a: 'v,
    {
        self.set_field(name, restriction, basis, vector)?;
        Ok(self)
    }

    /// Verifies that every declared kernel field has been bound.
    pub fn check_ready(&self) -> Result<()> {
        let missing: Vec<String> = self
            .qf
            .inputs()
            .iter()
            .zip(&self.inputs)
            .chain(self.qf.outputs().iter().zip(&self.outputs))
            .filter(|(_, bound)| bound.is_none())
            .map(|(declared, _)| declared.name().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::IncompleteOperator { missing })
        }
    }

    /// Computes `output = A(input)`.
    ///
    /// Positions of every output vector touched by its field's restriction are overwritten,
    /// all other positions keep their prior values.
    pub fn apply(&self, input: &Vector<'_, T>, output: &Vector<'_, T>) -> Result<()> {
        self.apply_with(input, output, OutputMode::Overwrite, OutputMode::Overwrite)
    }

    /// Computes `output = output + A(input)`.
    ///
    /// Passive output vectors are accumulated into as well.
    pub fn apply_add(&self, input: &Vector<'_, T>, output: &Vector<'_, T>) -> Result<()> {
        self.apply_with(input, output, OutputMode::Add, OutputMode::Add)
    }

    fn bound_fields<'s>(fields: &'s [Option<OperatorField<'a, T>>]) -> Vec<&'s OperatorField<'a, T>> {
        fields.iter().flatten().collect()
    }

    fn check_active_length(&self, fields: &[&OperatorField<'a, T>], vector: &Vector<'_, T>, role: &str) -> Result<()> {
        for field in fields.iter().filter(|field| field.is_active()) {
            if let Some(restriction) = field.restriction() {
                if restriction.lvector_size() != vector.len() {
                    return Err(Error::dimension_mismatch(format!(
                        "active {role} field '{}' expects a vector of length {}, got {}",
                        field.name,
                        restriction.lvector_size(),
                        vector.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Zeroes every position of `output` touched by an active output field.
    pub(crate) fn zero_active_output(&self, output: &Vector<'_, T>) -> Result<()> {
        self.check_ready()?;
        let outputs = Self::bound_fields(&self.outputs);
        self.check_active_length(&outputs, output, "output")?;
        if !outputs.iter().any(|field| field.is_active()) {
            return Ok(());
        }
        let mut output = output.view_mut()?;
        for restriction in outputs
            .iter()
            .filter(|field| field.is_active())
            .filter_map(|field| field.restriction())
        {
            restriction.zero_touched(&mut output)?;
        }
        Ok(())
    }

    pub(crate) fn apply_with(
        &self,
        input: &Vector<'_, T>,
        output: &Vector<'_, T>,
        active_mode: OutputMode,
        passive_mode: OutputMode,
    ) -> Result<()> {
        self.check_ready()?;
        let inputs = Self::bound_fields(&self.inputs);
        let outputs = Self::bound_fields(&self.outputs);
        self.check_active_length(&inputs, input, "input")?;
        self.check_active_length(&outputs, output, "output")?;

        if !self.finalized.swap(true, Ordering::AcqRel) {
            debug!(
                "Finalized operator with {} input and {} output fields on {} elements",
                inputs.len(),
                outputs.len(),
                self.num_elements()
            );
        }

        let num_elements = self.num_elements();
        let q = self.num_quadrature_points();
        if num_elements == 0 || q == 0 {
            return Ok(());
        }
        let options = &self.options;

        let mut workspace = self.workspace.try_lock().ok_or(Error::ResourceBusy)?;
        workspace.prepare(inputs.len(), outputs.len());
        let ApplyWorkspace {
            e_in,
            q_in,
            q_out,
            e_out,
        } = &mut *workspace;

        // Read leases on all input vectors are taken before any output vector is leased
        let active_in = if inputs.iter().any(|field| field.is_active()) {
            Some(input.view_recursive()?)
        } else {
            None
        };
        let passive_in = inputs
            .iter()
            .map(|field| field.passive_vector().map(|vector| vector.view_recursive()).transpose())
            .collect::<Result<Vec<_>>>()?;

        // Output fields writing to the same array share one target
        let has_active_output = outputs.iter().any(|field| field.is_active());
        let mut passive_targets: Vec<&Vector<'a, T>> = Vec::new();
        let mut target_of = Vec::with_capacity(outputs.len());
        for field in &outputs {
            let target = match field.vector() {
                Some(FieldVector::Active) => Some(0),
                Some(FieldVector::Passive(vector)) => {
                    let k = match passive_targets.iter().position(|t| t.shares_array_with(vector)) {
                        Some(k) => k,
                        None => {
                            passive_targets.push(vector);
                            passive_targets.len() - 1
                        }
                    };
                    Some(k + usize::from(has_active_output))
                }
                None => None,
            };
            target_of.push(target);
        }
        let mut active_out = if has_active_output {
            Some(output.view_mut()?)
        } else {
            None
        };
        let mut passive_out = passive_targets
            .iter()
            .map(|vector| vector.view_mut())
            .collect::<Result<Vec<_>>>()?;
        let mut targets: Vec<&mut [T]> = active_out
            .as_deref_mut()
            .into_iter()
            .chain(passive_out.iter_mut().map(|view| &mut **view))
            .collect();

        trace!("Evaluating {} input fields at quadrature points", inputs.len());
        for (i, field) in inputs.iter().enumerate() {
            let q_values = &mut q_in[i];
            resize_buffer(q_values, num_elements * q * field.size);
            let source = match field.vector() {
                Some(FieldVector::Active) => active_in.as_deref(),
                Some(FieldVector::Passive(_)) => passive_in[i].as_deref(),
                None => None,
            };
            match (&field.source, source) {
                (FieldSource::Weight(basis), _) => {
                    basis.apply_slices_with(
                        num_elements,
                        TransposeMode::NoTranspose,
                        EvalMode::Weight,
                        &[],
                        q_values,
                        options,
                    )?;
                }
                (FieldSource::Basis { restriction, basis, .. }, Some(source)) => {
                    let e_values = &mut e_in[i];
                    resize_buffer(e_values, restriction.evector_size());
                    restriction.gather_with(source, e_values, options)?;
                    basis.apply_slices_with(
                        num_elements,
                        TransposeMode::NoTranspose,
                        field.eval_mode,
                        e_values,
                        q_values,
                        options,
                    )?;
                }
                (FieldSource::Collocated { restriction, .. }, Some(source)) => {
                    restriction.gather_with(source, q_values, options)?;
                }
                (_, None) => unreachable!("Internal error: field with restriction has no leased vector"),
            }
        }

        trace!("Calling point-wise kernel on {num_elements} elements with {q} points each");
        for (q_values, field) in q_out.iter_mut().zip(&outputs) {
            q_values.clear();
            resize_buffer(q_values, num_elements * q * field.size);
        }
        let mut element_outputs: Vec<Vec<&mut [T]>> = (0..num_elements)
            .map(|_| Vec::with_capacity(outputs.len()))
            .collect();
        for (q_values, field) in q_out.iter_mut().zip(&outputs) {
            for (element_output, chunk) in element_outputs
                .iter_mut()
                .zip(q_values.chunks_mut(q * field.size))
            {
                element_output.push(chunk);
            }
        }
        let input_sizes: Vec<usize> = inputs.iter().map(|field| q * field.size).collect();
        let q_in = &*q_in;
        let qf = &self.qf;
        options.for_each_item(element_outputs, |element, element_output| {
            let mut input_array: QFunctionInputs<T> = [&[]; MAX_QFUNCTION_FIELDS];
            for ((slot, q_values), &len) in input_array.iter_mut().zip(q_in).zip(&input_sizes) {
                *slot = &q_values[element * len..(element + 1) * len];
            }
            let mut output_array: QFunctionOutputs<T> = Default::default();
            for (slot, chunk) in output_array.iter_mut().zip(element_output) {
                *slot = chunk;
            }
            qf.call(input_array, output_array)
        })?;

        trace!("Transforming {} output fields back to their vectors", outputs.len());
        for (field, target) in outputs.iter().zip(&target_of) {
            let mode = if field.is_active() { active_mode } else { passive_mode };
            if let (OutputMode::Overwrite, Some(restriction), Some(t)) = (mode, field.restriction(), target) {
                restriction.zero_touched(&mut *targets[*t])?;
            }
        }
        for (o, (field, target)) in outputs.iter().zip(&target_of).enumerate() {
            let Some(t) = *target else { continue };
            match &field.source {
                FieldSource::Basis { restriction, basis, .. } => {
                    let e_values = &mut e_out[o];
                    resize_buffer(e_values, restriction.evector_size());
                    basis.apply_slices_with(
                        num_elements,
                        TransposeMode::Transpose,
                        field.eval_mode,
                        &q_out[o],
                        e_values,
                        options,
                    )?;
                    restriction.scatter_add(e_values, &mut *targets[t])?;
                }
                FieldSource::Collocated { restriction, .. } => {
                    restriction.scatter_add(&q_out[o], &mut *targets[t])?;
                }
                FieldSource::Weight(_) => {}
            }
        }
        Ok(())
    }
}

impl<'a, T> FieldSource<'a, T> {
    fn restriction(&self) -> Option<&ElemRestriction> {
        match self {
            Self::Weight(_) => None,
            Self::Basis { restriction, .. } | Self::Collocated { restriction, .. } => Some(restriction),
        }
    }
}

/// Validates the combination of restriction, basis and vector for a field.
fn field_source<'a, T: Real>(
    name: &str,
    eval_mode: EvalMode,
    restriction: ElemRestrictionOpt<'_>,
    basis: BasisOpt<'_, T>,
    vector: VectorOpt<'_, 'a, T>,
) -> Result<FieldSource<'a, T>> {
    if eval_mode == EvalMode::Weight {
        return match (restriction, basis, vector) {
            (ElemRestrictionOpt::None, BasisOpt::Some(basis), VectorOpt::None) => {
                Ok(FieldSource::Weight(basis.clone()))
            }
            (ElemRestrictionOpt::None, BasisOpt::Collocated, VectorOpt::None) => Err(Error::invalid_field(
                name,
                "quadrature weights need a basis to provide them",
            )),
            _ => Err(Error::invalid_field(
                name,
                "weight fields take neither a restriction nor a vector",
            )),
        };
    }

    let restriction = match restriction {
        ElemRestrictionOpt::Some(restriction) => restriction.clone(),
        ElemRestrictionOpt::None => {
            return Err(Error::invalid_field(name, "only weight fields may omit the restriction"))
        }
    };
    let vector = match vector {
        VectorOpt::Active => FieldVector::Active,
        VectorOpt::Some(vector) => {
            if vector.len() != restriction.lvector_size() {
                return Err(Error::dimension_mismatch(format!(
                    "field '{name}' restricts from vectors of length {}, but the bound vector has length {}",
                    restriction.lvector_size(),
                    vector.len()
                )));
            }
            FieldVector::Passive(vector.share())
        }
        VectorOpt::None => return Err(Error::invalid_field(name, "only weight fields may omit the vector")),
    };

    match (eval_mode, basis) {
        (EvalMode::None, BasisOpt::Collocated) => Ok(FieldSource::Collocated { restriction, vector }),
        (EvalMode::None, BasisOpt::Some(_)) => Err(Error::invalid_field(
            name,
            "evaluation mode None requires the collocated basis",
        )),
        (_, BasisOpt::Collocated) => Err(Error::invalid_field(
            name,
            format!("evaluation mode {eval_mode:?} requires a basis"),
        )),
        (_, BasisOpt::Some(basis)) => Ok(FieldSource::Basis {
            restriction,
            basis: basis.clone(),
            vector,
        }),
    }
}

/// Checks restriction, basis and kernel field widths against each other and returns the
/// number of quadrature points per element of the field.
fn check_field_dimensions<T>(
    name: &str,
    eval_mode: EvalMode,
    size: usize,
    source: &FieldSource<'_, T>,
) -> Result<usize> {
    match source {
        FieldSource::Weight(basis) => Ok(basis.num_quadrature_points()),
        FieldSource::Collocated { restriction, .. } => {
            if restriction.num_components() != size {
                return Err(Error::dimension_mismatch(format!(
                    "field '{name}' has size {size}, but its restriction has {} components",
                    restriction.num_components()
                )));
            }
            Ok(restriction.elem_size())
        }
        FieldSource::Basis { restriction, basis, .. } => {
            if restriction.elem_size() != basis.num_nodes() || restriction.num_components() != basis.num_components() {
                return Err(Error::dimension_mismatch(format!(
                    "field '{name}': restriction has {} nodes with {} components per element, \
                     but basis has {} nodes with {} components",
                    restriction.elem_size(),
                    restriction.num_components(),
                    basis.num_nodes(),
                    basis.num_components()
                )));
            }
            let basis_size = basis.qcomp(eval_mode);
            if basis_size != size {
                return Err(Error::dimension_mismatch(format!(
                    "field '{name}' has size {size}, but the basis provides {basis_size} values per point in mode \
                     {eval_mode:?}"
                )));
            }
            Ok(basis.num_quadrature_points())
        }
    }
}

fn describe_field<T>(field: &OperatorField<'_, T>) -> String {
    let vector = match field.vector() {
        Some(FieldVector::Active) => "active vector",
        Some(FieldVector::Passive(_)) => "passive vector",
        None => "no vector",
    };
    match &field.source {
        FieldSource::Weight(basis) => format!(
            "quadrature weights of a basis with {} points",
            basis.num_quadrature_points()
        ),
        FieldSource::Basis { restriction, basis, .. } => format!(
            "restriction to {} elements of size {}, basis with {} nodes and {} points, {vector}",
            restriction.num_elements(),
            restriction.elem_size(),
            basis.num_nodes(),
            basis.num_quadrature_points()
        ),
        FieldSource::Collocated { restriction, .. } => format!(
            "restriction to {} elements of size {}, collocated, {vector}",
            restriction.num_elements(),
            restriction.elem_size()
        ),
    }
}

impl<'a, T: Real> Display for Operator<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Operator with {} elements and {} quadrature points per element",
            self.num_elements(),
            self.num_quadrature_points()
        )?;
        let declared = self.qf.inputs().iter().zip(&self.inputs).map(|fields| ("Input", fields));
        let declared = declared.chain(self.qf.outputs().iter().zip(&self.outputs).map(|fields| ("Output", fields)));
        for (kind, (declared, bound)) in declared {
            let description = bound
                .as_ref()
                .map(describe_field)
                .unwrap_or_else(|| "not bound".to_string());
            writeln!(
                f,
                "  {kind} field '{}' ({:?}, size {}): {description}",
                declared.name(),
                declared.eval_mode(),
                declared.size()
            )?;
        }
        Ok(())
    }
}
