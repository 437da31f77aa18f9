//! Fixed-size sequence objects.
//!
//! Sequences come in exactly two heap shapes. A [`ScalarArray`] is
//! homogeneous leaf storage (every element the same [`ScalarKind`]) and is
//! bulk-copied by the engine in one clone. A [`RefArray`] is heterogeneous
//! element storage whose entries may be leaves, nulls, or references;
//! references are copied element-wise through the scheduler.
//!
//! Both are length-fixed once allocated. Resizable collections are built
//! *on top* of these as ordinary classes (see [`stdtypes`](crate::stdtypes))
//! whose storage field points at an array object; the engine has no special
//! case for them.

use std::sync::Arc;

use crate::value::Value;

/// Element kind of a homogeneous leaf array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
pub enum ScalarKind {
    /// Booleans.
    Bool,
    /// 64-bit signed integers.
    Int,
    /// 64-bit floats.
    Float,
    /// Single characters.
    Char,
    /// Immutable text.
    Str,
}

impl ScalarKind {
    /// The synthetic default value for a parameter of this kind: zero,
    /// false, NUL, or empty text.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Char => Value::Char('\0'),
            Self::Str => Value::str(""),
        }
    }
}

/// Storage of a fixed-size homogeneous array of leaf values.
///
/// Built directly by the embedder (`ScalarArray::Int(vec![1, 2, 3])`) and
/// handed to [`Heap::alloc_leaf_array`](crate::heap::Heap::alloc_leaf_array).
#[derive(Debug, Clone)]
pub enum ScalarArray {
    /// Boolean storage.
    Bool(Vec<bool>),
    /// Integer storage.
    Int(Vec<i64>),
    /// Float storage.
    Float(Vec<f64>),
    /// Character storage.
    Char(Vec<char>),
    /// Text storage; elements share their allocations when cloned.
    Str(Vec<Arc<str>>),
}

impl ScalarArray {
    /// An empty array of the given element kind.
    #[must_use]
    pub fn empty(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => Self::Bool(Vec::new()),
            ScalarKind::Int => Self::Int(Vec::new()),
            ScalarKind::Float => Self::Float(Vec::new()),
            ScalarKind::Char => Self::Char(Vec::new()),
            ScalarKind::Str => Self::Str(Vec::new()),
        }
    }

    /// The element kind.
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::Int(_) => ScalarKind::Int,
            Self::Float(_) => ScalarKind::Float,
            Self::Char(_) => ScalarKind::Char,
            Self::Str(_) => ScalarKind::Str,
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::Str(v) => v.len(),
        }
    }

    /// True when the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index` as a [`Value`], if in bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Self::Bool(v) => v.get(index).map(|b| Value::Bool(*b)),
            Self::Int(v) => v.get(index).map(|i| Value::Int(*i)),
            Self::Float(v) => v.get(index).map(|f| Value::Float(*f)),
            Self::Char(v) => v.get(index).map(|c| Value::Char(*c)),
            Self::Str(v) => v.get(index).map(|s| Value::Str(Arc::clone(s))),
        }
    }

    /// Writes a leaf value into `index`.
    ///
    /// The caller has already checked bounds and that `value` matches the
    /// element kind; a mismatch here is a bug in the caller.
    pub(crate) fn set(&mut self, index: usize, value: &Value) {
        match (self, value) {
            (Self::Bool(v), Value::Bool(b)) => v[index] = *b,
            (Self::Int(v), Value::Int(i)) => v[index] = *i,
            (Self::Float(v), Value::Float(f)) => v[index] = *f,
            (Self::Char(v), Value::Char(c)) => v[index] = *c,
            (Self::Str(v), Value::Str(s)) => v[index] = Arc::clone(s),
            (arr, other) => panic!(
                "ScalarArray::set: {} array cannot hold {}",
                arr.kind(),
                other.kind_name()
            ),
        }
    }

    /// True when `value` can be stored in this array.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Bool(_), Value::Bool(_))
                | (Self::Int(_), Value::Int(_))
                | (Self::Float(_), Value::Float(_))
                | (Self::Char(_), Value::Char(_))
                | (Self::Str(_), Value::Str(_))
        )
    }

    /// Approximate storage footprint, charged to the resource meter.
    pub(crate) fn estimate_bytes(&self) -> usize {
        let elem = match self {
            Self::Bool(_) => size_of::<bool>(),
            Self::Int(_) => size_of::<i64>(),
            Self::Float(_) => size_of::<f64>(),
            Self::Char(_) => size_of::<char>(),
            Self::Str(_) => size_of::<Arc<str>>(),
        };
        size_of::<Self>() + elem * self.len()
    }
}

/// Storage of a fixed-size array of reference values.
///
/// Elements are arbitrary [`Value`]s: references, nulls, or leaves mixed
/// freely. The engine copies reference elements through the scheduler and
/// leaf elements by value.
#[derive(Debug, Clone, Default)]
pub struct RefArray {
    items: Vec<Value>,
}

impl RefArray {
    /// Wraps existing elements.
    #[must_use]
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    /// A shell array of `len` undefined slots, to be written element by
    /// element.
    pub(crate) fn with_len(len: usize) -> Self {
        Self {
            items: vec![Value::Undefined; len],
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The element at `index`, if in bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub(crate) fn set(&mut self, index: usize, value: Value) {
        self.items[index] = value;
    }

    /// Iterates the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub(crate) fn estimate_bytes(&self) -> usize {
        size_of::<Self>() + size_of::<Value>() * self.items.len()
    }
}

impl<'a> IntoIterator for &'a RefArray {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_kind_roundtrip() {
        let arr = ScalarArray::Int(vec![1, 2, 3]);
        assert_eq!(arr.kind(), ScalarKind::Int);
        assert_eq!(arr.len(), 3);
        assert!(arr.get(1).unwrap().shallow_eq(&Value::Int(2)));
        assert!(arr.get(3).is_none());
    }

    #[test]
    fn scalar_set_and_accepts() {
        let mut arr = ScalarArray::Str(vec![Arc::from("a"), Arc::from("b")]);
        assert!(arr.accepts(&Value::str("c")));
        assert!(!arr.accepts(&Value::Int(1)));
        arr.set(0, &Value::str("z"));
        assert_eq!(arr.get(0).unwrap().as_str(), Some("z"));
    }

    #[test]
    fn empty_arrays() {
        for kind in [
            ScalarKind::Bool,
            ScalarKind::Int,
            ScalarKind::Float,
            ScalarKind::Char,
            ScalarKind::Str,
        ] {
            let arr = ScalarArray::empty(kind);
            assert!(arr.is_empty());
            assert_eq!(arr.kind(), kind);
        }
    }

    #[test]
    fn ref_array_shell_starts_undefined() {
        let arr = RefArray::with_len(2);
        assert_eq!(arr.len(), 2);
        assert!(arr.get(0).unwrap().is_undefined());
    }

    #[test]
    fn scalar_default_values() {
        assert!(ScalarKind::Int.default_value().shallow_eq(&Value::Int(0)));
        assert!(
            ScalarKind::Bool
                .default_value()
                .shallow_eq(&Value::Bool(false))
        );
        assert_eq!(ScalarKind::Str.default_value().as_str(), Some(""));
        assert_eq!(ScalarKind::Char.default_value().as_char(), Some('\0'));
    }
}
