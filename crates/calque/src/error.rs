//! Error types.
//!
//! Two distinct families. [`ModelError`] covers building and inspecting the
//! object graph (declaring classes, instantiating, reading fields): these
//! are embedder mistakes or resource rejections and have nothing to do with
//! copying. [`CopyError`] is the copy engine's taxonomy: every failure mode
//! of a `deep_copy` call maps to one of four [`CopyErrorKind`]s, the call
//! aborts as a whole, and no partial copy is ever returned.

use std::{error::Error, fmt};

use strum::{Display, EnumString, IntoStaticStr};

use crate::resource::ResourceError;

/// Result alias for copy operations.
pub type CopyResult<T> = Result<T, CopyError>;

/// Result alias for graph-building operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// The failure categories of a deep copy.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and
/// `Into<&'static str>`; the string form matches the variant name exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum CopyErrorKind {
    /// The top-level value was null or undefined.
    NullInput,
    /// Construction fallback exhausted: the class has no usable
    /// constructor and no clone capability.
    UnsupportedType,
    /// A field could not be read or written under the active policy.
    FieldAccessError,
    /// A selected constructor failed during invocation, or sequence/heap
    /// allocation failed while building the copy.
    InstantiationError,
}

/// An error that aborted a deep copy.
///
/// Carries the failing class and field names where they are known, so the
/// caller can tell *which* part of the graph was uncopyable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyError {
    kind: CopyErrorKind,
    class: Option<String>,
    field: Option<String>,
    message: String,
}

impl CopyError {
    pub(crate) fn null_input() -> Self {
        Self {
            kind: CopyErrorKind::NullInput,
            class: None,
            field: None,
            message: "deep copy requires a non-null input value".to_owned(),
        }
    }

    pub(crate) fn unsupported_type(class: &str) -> Self {
        Self {
            kind: CopyErrorKind::UnsupportedType,
            class: Some(class.to_owned()),
            field: None,
            message: format!("class '{class}' has no usable constructor or clone capability"),
        }
    }

    pub(crate) fn field_access(class: &str, field: &str, detail: &str) -> Self {
        Self {
            kind: CopyErrorKind::FieldAccessError,
            class: Some(class.to_owned()),
            field: Some(field.to_owned()),
            message: format!("field '{class}.{field}': {detail}"),
        }
    }

    pub(crate) fn instantiation(class: &str, detail: &str) -> Self {
        Self {
            kind: CopyErrorKind::InstantiationError,
            class: Some(class.to_owned()),
            field: None,
            message: format!("constructing a shell of class '{class}' failed: {detail}"),
        }
    }

    pub(crate) fn allocation(detail: &ResourceError) -> Self {
        Self {
            kind: CopyErrorKind::InstantiationError,
            class: None,
            field: None,
            message: format!("allocation failed while copying: {detail}"),
        }
    }

    /// The failure category.
    #[must_use]
    pub fn kind(&self) -> CopyErrorKind {
        self.kind
    }

    /// The class the failure occurred on, when known.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// The field the failure occurred on, when known.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Human-readable detail, without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Error for CopyError {}

/// An error from building or inspecting the object graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The class (including its ancestors) declares no such field.
    UnknownField {
        /// Class name.
        class: String,
        /// Field name.
        field: String,
    },
    /// A value of the wrong kind was written to a field or array slot.
    KindMismatch {
        /// Where the write happened, e.g. `Person.age` or `Int array`.
        target: String,
        /// What the slot accepts.
        expected: String,
        /// What was written.
        got: String,
    },
    /// An array index was out of bounds.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The array length.
        len: usize,
    },
    /// No declared constructor takes this many arguments.
    NoMatchingConstructor {
        /// Class name.
        class: String,
        /// Number of arguments supplied.
        argc: usize,
    },
    /// A constructor argument had the wrong type.
    ArgumentType {
        /// Class name.
        class: String,
        /// Zero-based argument position.
        index: usize,
        /// Expected parameter type.
        expected: String,
        /// Supplied value kind.
        got: String,
    },
    /// A class specification was rejected at registration.
    BadSpec {
        /// Class name.
        class: String,
        /// What was wrong.
        message: String,
    },
    /// A heap object had a different shape than the operation expects.
    WrongObjectKind {
        /// What the operation needs.
        expected: &'static str,
        /// What the id points at.
        got: &'static str,
    },
    /// A native constructor reported a domain failure.
    Constructor {
        /// The constructor's own message.
        message: String,
    },
    /// The heap's resource meter rejected an allocation.
    Resource(ResourceError),
}

impl ModelError {
    /// Convenience for native constructors rejecting their arguments.
    #[must_use]
    pub fn constructor(message: impl Into<String>) -> Self {
        Self::Constructor {
            message: message.into(),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { class, field } => {
                write!(f, "class '{class}' has no field '{field}'")
            }
            Self::KindMismatch {
                target,
                expected,
                got,
            } => write!(f, "{target} expects {expected}, got {got}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::NoMatchingConstructor { class, argc } => {
                write!(f, "class '{class}' has no constructor taking {argc} arguments")
            }
            Self::ArgumentType {
                class,
                index,
                expected,
                got,
            } => write!(
                f,
                "constructor of '{class}': argument {index} expects {expected}, got {got}"
            ),
            Self::BadSpec { class, message } => {
                write!(f, "invalid specification for class '{class}': {message}")
            }
            Self::WrongObjectKind { expected, got } => {
                write!(f, "expected {expected} object, got {got}")
            }
            Self::Constructor { message } => write!(f, "constructor failed: {message}"),
            Self::Resource(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ModelError {}

impl From<ResourceError> for ModelError {
    fn from(err: ResourceError) -> Self {
        Self::Resource(err)
    }
}
