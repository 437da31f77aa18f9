//! The runtime value representation.
//!
//! A [`Value`] is either an immediate (numbers, booleans, characters,
//! immutable text, a class object) or a reference to an object on the
//! [`Heap`](crate::heap::Heap). Immediates are the *leaf* values of the
//! copy engine: they have no internal object structure to traverse and are
//! copied by value. Everything with identity lives on the heap and is
//! reached through [`Value::Ref`].

use std::sync::Arc;

use crate::{class::ClassId, heap::HeapId};

/// A single runtime value.
///
/// Deliberately cheap to clone: immutable text is shared via `Arc`, every
/// other variant is a plain copy. Cloning a `Value` never duplicates heap
/// data; that is the copy engine's job.
#[derive(Debug, Clone, strum::IntoStaticStr)]
pub enum Value {
    /// Sentinel for an instance slot that has never been written.
    ///
    /// Not a real value: bare instances start with `Undefined` in slots
    /// that have no declared default, and the engine rejects it as
    /// top-level input.
    Undefined,
    /// The null reference.
    None,
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A single character.
    Char(char),
    /// Immutable text. A leaf value: copying shares the allocation and the
    /// engine never traverses into it.
    Str(Arc<str>),
    /// A registered class used as a value. Per-type state is shared, so
    /// class values are copied by value and never duplicated.
    Class(ClassId),
    /// A reference to a heap object (instance or array).
    Ref(HeapId),
}

impl Value {
    /// Convenience constructor for text values.
    #[must_use]
    pub fn str(text: impl Into<Arc<str>>) -> Self {
        Self::Str(text.into())
    }

    /// The variant name, for messages and stats.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        self.into()
    }

    /// True for leaf values: values with no internal object structure.
    ///
    /// `None`, `Undefined`, class objects and heap references are not
    /// leaves.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Char(_) | Self::Str(_)
        )
    }

    /// True for the null reference.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// True for the uninitialized-slot sentinel.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// The contained integer, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The contained float, if any.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The contained boolean, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The contained character, if any.
    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// The contained text, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The referenced heap id, if any.
    #[must_use]
    pub fn as_ref_id(&self) -> Option<HeapId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// The contained class id, if any.
    #[must_use]
    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            Self::Class(c) => Some(*c),
            _ => None,
        }
    }

    /// Shallow equality: leaves compare by value, references by identity.
    ///
    /// Floats compare by bit pattern, so `NaN` equals itself and `0.0` and
    /// `-0.0` are distinct. This is the equality the shipped collection
    /// classes use for membership; structural comparison lives on
    /// [`Heap::deep_eq`](crate::heap::Heap::deep_eq).
    #[must_use]
    pub fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Class(a), Self::Class(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => a == b,
            _ => false,
        }
    }
}
