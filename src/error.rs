//! Error type shared by all operator building blocks.
use std::error::Error as StdError;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Library-wide error type.
///
/// All errors are detected synchronously by the call that violates a contract. None of them
/// are transient, so retrying the same call with the same arguments fails the same way.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An index into an L-vector is out of bounds.
    InvalidIndex { index: usize, bound: usize },
    /// Sizes of restrictions, bases, kernel fields or vectors are incompatible.
    DimensionMismatch(String),
    /// The name does not appear among the declared fields of the point-wise kernel.
    UnknownField { name: String },
    /// A kernel field was declared twice, or an operator field was bound twice.
    DuplicateField { name: String },
    /// The combination of restriction, basis and vector is not allowed for this field.
    InvalidField { name: String, reason: String },
    /// A basis cannot perform the requested transform.
    InvalidEvalMode(String),
    /// The operator was applied before all of its fields were bound.
    IncompleteOperator { missing: Vec<String> },
    /// The operator has been applied and its fields can no longer change.
    OperatorFinalized,
    /// A vector array is leased in a way that conflicts with the requested access.
    ResourceBusy,
    /// The object is still referenced by other holders.
    ObjectInUse { holders: usize },
    /// No point-wise kernel with the given name is available in the gallery.
    UnknownQFunction { name: String },
    /// The resource string does not name a known backend.
    UnsupportedBackend { resource: String },
    /// The user-supplied point-wise kernel reported a failure.
    Kernel(eyre::Report),
}

impl Error {
    pub(crate) fn dimension_mismatch(message: impl Into<String>) -> Self {
        Self::DimensionMismatch(message.into())
    }

    pub(crate) fn invalid_field(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIndex { index, bound } => {
                write!(f, "index {index} is out of bounds for L-vector of length {bound}")
            }
            Self::DimensionMismatch(message) => write!(f, "dimension mismatch: {message}"),
            Self::UnknownField { name } => write!(f, "kernel has no field named \"{name}\""),
            Self::DuplicateField { name } => write!(f, "field \"{name}\" is already defined"),
            Self::InvalidField { name, reason } => write!(f, "invalid setup for field \"{name}\": {reason}"),
            Self::InvalidEvalMode(message) => write!(f, "invalid evaluation mode: {message}"),
            Self::IncompleteOperator { missing } => {
                write!(f, "operator is missing fields: {}", missing.join(", "))
            }
            Self::OperatorFinalized => write!(f, "operator fields cannot change after the first apply"),
            Self::ResourceBusy => write!(f, "vector array is already leased with conflicting access"),
            Self::ObjectInUse { holders } => write!(f, "object is still referenced by {holders} other holder(s)"),
            Self::UnknownQFunction { name } => write!(f, "no gallery kernel named \"{name}\""),
            Self::UnsupportedBackend { resource } => write!(f, "unsupported backend resource \"{resource}\""),
            Self::Kernel(report) => write!(f, "point-wise kernel failed: {report}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Kernel(report) => {
                let inner: &(dyn StdError + Send + Sync + 'static) = report.as_ref();
                Some(inner)
            }
            _ => None,
        }
    }
}
