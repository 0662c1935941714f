use crate::error::Result;
use crate::operator::{Operator, OutputMode};
use crate::vector::Vector;
use crate::Real;
use log::trace;
use std::fmt;
use std::fmt::{Display, Formatter};

/// The sum of several operators acting on the same active input and output vectors.
#[derive(Debug)]
pub struct CompositeOperator<'a, T> {
    sub_operators: Vec<Operator<'a, T>>,
}

impl<'a, T> Default for CompositeOperator<'a, T> {
    fn default() -> Self {
        Self {
            sub_operators: Vec::new(),
        }
    }
}

impl<'a, T: Real> CompositeOperator<'a, T> {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn add_sub_operator(&mut self, operator: Operator<'a, T>) {
        self.sub_operators.push(operator);
    }

    /// Adds a sub-operator, for chained construction.
    pub fn sub_operator(mut self, operator: Operator<'a, T>) -> Self {
        self.add_sub_operator(operator);
        self
    }

    pub fn sub_operators(&self) -> &[Operator<'a, T>] {
        &self.sub_operators
    }

    pub fn len(&self) -> usize {
        self.sub_operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_operators.is_empty()
    }

    /// Computes `output = sum_k A_k(input)`.
    ///
    /// Every position of `output` touched by an active output of some sub-operator is
    /// overwritten with the sum of all contributions. Passive outputs are overwritten by each
    /// sub-operator individually.
    pub fn apply(&self, input: &Vector<'_, T>, output: &Vector<'_, T>) -> Result<()> {
        for operator in &self.sub_operators {
            operator.zero_active_output(output)?;
        }
        for (k, operator) in self.sub_operators.iter().enumerate() {
            trace!("Applying sub-operator {k} of composite operator");
            operator.apply_with(input, output, OutputMode::Add, OutputMode::Overwrite)?;
        }
        Ok(())
    }

    /// Computes `output = output + sum_k A_k(input)`.
    pub fn apply_add(&self, input: &Vector<'_, T>, output: &Vector<'_, T>) -> Result<()> {
        for (k, operator) in self.sub_operators.iter().enumerate() {
            trace!("Applying sub-operator {k} of composite operator");
            operator.apply_add(input, output)?;
        }
        Ok(())
    }
}

impl<'a, T: Real> Display for CompositeOperator<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Composite operator with {} sub-operators", self.len())?;
        for operator in &self.sub_operators {
            write!(f, "{operator}")?;
        }
        Ok(())
    }
}
