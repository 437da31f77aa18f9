//! Stock container classes built on the object model.
//!
//! These are ordinary heap classes, declared through the same [`ClassSpec`]
//! path an embedder uses, so the copy engine treats them like any user
//! class: a `List` is an instance with an `items` reference-array field and
//! a `len` counter, nothing more. They exist so graphs with collection
//! structure (growable lists, identity-based sets, single-slot boxes) can
//! be built without every embedder re-deriving the layout.
//!
//! `Set` membership uses shallow equality: leaves compare by value,
//! references by identity. Two distinct boxes holding the same number are
//! two distinct members, which is exactly what makes a copied set
//! independent of its original.

use crate::class::{ClassId, ClassSpec, CtorSpec, FieldKind, FieldSpec, ParamSpec, ParamType};
use crate::error::{ModelError, ModelResult};
use crate::heap::{Heap, HeapId};
use crate::value::Value;

/// Storage for an empty list or set starts at this capacity and doubles.
const SEQ_INITIAL_CAPACITY: usize = 4;

/// Class ids of the stock container classes on one heap.
#[derive(Debug, Clone, Copy)]
pub struct StdTypes {
    /// Growable list: `items` reference array plus `len` counter.
    pub list: ClassId,
    /// Identity-based set with the same layout as `List`.
    pub set: ClassId,
    /// Single mutable slot: one `value` reference field.
    pub boxed: ClassId,
}

impl StdTypes {
    /// Declares `Box`, `List` and `Set` on `heap`.
    pub fn install(heap: &mut Heap) -> ModelResult<Self> {
        let boxed = heap.declare_class(
            ClassSpec::new("Box")
                .field(FieldSpec::new("value", FieldKind::Reference))
                .constructor(CtorSpec::zero_arg())
                .constructor(CtorSpec::assigning([ParamSpec::new(
                    "value",
                    ParamType::Reference,
                )])),
        )?;
        let list = heap.declare_class(
            ClassSpec::new("List")
                .field(FieldSpec::new("items", FieldKind::RefSeq).with_default(Value::None))
                .field(FieldSpec::new("len", FieldKind::Leaf).with_default(Value::Int(0)))
                .constructor(CtorSpec::zero_arg()),
        )?;
        let set = heap.declare_class(
            ClassSpec::new("Set")
                .field(FieldSpec::new("items", FieldKind::RefSeq).with_default(Value::None))
                .field(FieldSpec::new("len", FieldKind::Leaf).with_default(Value::Int(0)))
                .constructor(CtorSpec::zero_arg()),
        )?;
        Ok(Self { list, set, boxed })
    }

    // ========================================================================
    // Box
    // ========================================================================

    /// Allocates a box holding `value`.
    pub fn box_new(&self, heap: &mut Heap, value: Value) -> ModelResult<HeapId> {
        heap.instantiate(self.boxed, &[value])
    }

    /// The value held by a box.
    pub fn box_get(&self, heap: &Heap, boxed: HeapId) -> ModelResult<Value> {
        guard(heap, boxed, self.boxed, "Box receiver")?;
        heap.get_field(boxed, "value")
    }

    /// Replaces the value held by a box.
    pub fn box_set(&self, heap: &mut Heap, boxed: HeapId, value: Value) -> ModelResult<()> {
        guard(heap, boxed, self.boxed, "Box receiver")?;
        heap.set_field(boxed, "value", value)
    }

    // ========================================================================
    // List
    // ========================================================================

    /// Allocates an empty list.
    pub fn list_new(&self, heap: &mut Heap) -> ModelResult<HeapId> {
        heap.instantiate(self.list, &[])
    }

    /// Appends `value`, growing storage when full.
    pub fn list_push(&self, heap: &mut Heap, list: HeapId, value: Value) -> ModelResult<()> {
        guard(heap, list, self.list, "List receiver")?;
        seq_push(heap, list, value)
    }

    /// The element at `index`.
    pub fn list_get(&self, heap: &Heap, list: HeapId, index: usize) -> ModelResult<Value> {
        guard(heap, list, self.list, "List receiver")?;
        let len = stored_len(heap, list)?;
        if index >= len {
            return Err(ModelError::IndexOutOfRange { index, len });
        }
        let items = storage(heap, list)?.ok_or(ModelError::IndexOutOfRange { index, len })?;
        heap.ref_array_get(items, index)
    }

    /// Number of elements.
    pub fn list_len(&self, heap: &Heap, list: HeapId) -> ModelResult<usize> {
        guard(heap, list, self.list, "List receiver")?;
        stored_len(heap, list)
    }

    // ========================================================================
    // Set
    // ========================================================================

    /// Allocates an empty set.
    pub fn set_new(&self, heap: &mut Heap) -> ModelResult<HeapId> {
        heap.instantiate(self.set, &[])
    }

    /// Adds `value` unless an equal member (shallow equality) is present.
    /// Returns whether the set grew.
    pub fn set_add(&self, heap: &mut Heap, set: HeapId, value: Value) -> ModelResult<bool> {
        guard(heap, set, self.set, "Set receiver")?;
        if member_index(heap, set, &value)?.is_some() {
            return Ok(false);
        }
        seq_push(heap, set, value)?;
        Ok(true)
    }

    /// Whether an equal member (shallow equality) is present.
    pub fn set_contains(&self, heap: &Heap, set: HeapId, value: &Value) -> ModelResult<bool> {
        guard(heap, set, self.set, "Set receiver")?;
        Ok(member_index(heap, set, value)?.is_some())
    }

    /// Number of members.
    pub fn set_len(&self, heap: &Heap, set: HeapId) -> ModelResult<usize> {
        guard(heap, set, self.set, "Set receiver")?;
        stored_len(heap, set)
    }
}

fn member_index(heap: &Heap, set: HeapId, value: &Value) -> ModelResult<Option<usize>> {
    let len = stored_len(heap, set)?;
    let Some(items) = storage(heap, set)? else {
        return Ok(None);
    };
    for index in 0..len {
        if heap.ref_array_get(items, index)?.shallow_eq(value) {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Appends to the `items`/`len` pair shared by `List` and `Set`.
fn seq_push(heap: &mut Heap, obj: HeapId, value: Value) -> ModelResult<()> {
    let len = stored_len(heap, obj)?;
    let items = match storage(heap, obj)? {
        Some(items) if len < heap.array_len(items)? => items,
        exhausted => {
            let capacity = match exhausted {
                Some(items) => heap.array_len(items)?,
                None => 0,
            };
            let grown = if capacity == 0 {
                SEQ_INITIAL_CAPACITY
            } else {
                capacity * 2
            };
            // Spare capacity is padded with nulls; `len` marks the boundary.
            let replacement = heap.alloc_ref_array(vec![Value::None; grown])?;
            if let Some(old) = exhausted {
                for index in 0..len {
                    let element = heap.ref_array_get(old, index)?;
                    heap.ref_array_set(replacement, index, element)?;
                }
            }
            heap.set_field(obj, "items", Value::Ref(replacement))?;
            replacement
        }
    };
    heap.ref_array_set(items, len, value)?;
    heap.set_field(obj, "len", int_value(len + 1))?;
    Ok(())
}

fn guard(heap: &Heap, id: HeapId, class: ClassId, target: &str) -> ModelResult<()> {
    if heap.instance_class(id).ok() == Some(class) {
        Ok(())
    } else {
        Err(ModelError::KindMismatch {
            target: target.to_owned(),
            expected: format!("an instance of {}", heap.class_name(class)),
            got: heap.describe_value(&Value::Ref(id)),
        })
    }
}

/// Reads the `len` counter of a list or set.
fn stored_len(heap: &Heap, obj: HeapId) -> ModelResult<usize> {
    let value = heap.get_field(obj, "len")?;
    value
        .as_int()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| ModelError::KindMismatch {
            target: "len".to_owned(),
            expected: "a non-negative Int".to_owned(),
            got: value.kind_name().to_owned(),
        })
}

/// Reads the `items` storage of a list or set; `None` before first growth.
fn storage(heap: &Heap, obj: HeapId) -> ModelResult<Option<HeapId>> {
    let value = heap.get_field(obj, "items")?;
    Ok(value.as_ref_id())
}

/// Saturating length-to-Int conversion; list lengths never get near the
/// boundary.
fn int_value(len: usize) -> Value {
    Value::Int(i64::try_from(len).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn installed() -> (Heap, StdTypes) {
        let mut heap = Heap::new();
        let types = StdTypes::install(&mut heap).unwrap();
        (heap, types)
    }

    #[test]
    fn list_push_and_get_across_growth() {
        let (mut heap, types) = installed();
        let list = types.list_new(&mut heap).unwrap();
        assert_eq!(types.list_len(&heap, list).unwrap(), 0);
        for n in 0..10 {
            types.list_push(&mut heap, list, Value::Int(n)).unwrap();
        }
        assert_eq!(types.list_len(&heap, list).unwrap(), 10);
        for n in 0..10 {
            let index = usize::try_from(n).unwrap();
            assert_eq!(types.list_get(&heap, list, index).unwrap().as_int(), Some(n));
        }
        let err = types.list_get(&heap, list, 10).unwrap_err();
        assert!(matches!(err, ModelError::IndexOutOfRange { index: 10, len: 10 }));
    }

    #[test]
    fn list_holds_mixed_values() {
        let (mut heap, types) = installed();
        let list = types.list_new(&mut heap).unwrap();
        let boxed = types.box_new(&mut heap, Value::Int(1)).unwrap();
        types.list_push(&mut heap, list, Value::str("a")).unwrap();
        types.list_push(&mut heap, list, Value::None).unwrap();
        types.list_push(&mut heap, list, Value::Ref(boxed)).unwrap();
        assert_eq!(types.list_get(&heap, list, 0).unwrap().as_str(), Some("a"));
        assert!(types.list_get(&heap, list, 1).unwrap().is_none());
        assert_eq!(types.list_get(&heap, list, 2).unwrap().as_ref_id(), Some(boxed));
    }

    #[test]
    fn set_dedupes_leaves_by_value_and_refs_by_identity() {
        let (mut heap, types) = installed();
        let set = types.set_new(&mut heap).unwrap();
        assert!(types.set_add(&mut heap, set, Value::Int(7)).unwrap());
        assert!(!types.set_add(&mut heap, set, Value::Int(7)).unwrap());
        let a = types.box_new(&mut heap, Value::Float(200.1)).unwrap();
        let b = types.box_new(&mut heap, Value::Float(200.1)).unwrap();
        assert!(types.set_add(&mut heap, set, Value::Ref(a)).unwrap());
        // Same payload, different identity: still a new member.
        assert!(types.set_add(&mut heap, set, Value::Ref(b)).unwrap());
        assert!(!types.set_add(&mut heap, set, Value::Ref(a)).unwrap());
        assert_eq!(types.set_len(&heap, set).unwrap(), 3);
        assert!(types.set_contains(&heap, set, &Value::Int(7)).unwrap());
        assert!(!types.set_contains(&heap, set, &Value::Int(8)).unwrap());
    }

    #[test]
    fn box_roundtrip() {
        let (mut heap, types) = installed();
        let boxed = types.box_new(&mut heap, Value::Float(100.1)).unwrap();
        assert!(types.box_get(&heap, boxed).unwrap().shallow_eq(&Value::Float(100.1)));
        types.box_set(&mut heap, boxed, Value::Float(1.5)).unwrap();
        assert!(types.box_get(&heap, boxed).unwrap().shallow_eq(&Value::Float(1.5)));
    }

    #[test]
    fn receivers_are_class_checked() {
        let (mut heap, types) = installed();
        let boxed = types.box_new(&mut heap, Value::Int(0)).unwrap();
        let err = types.list_push(&mut heap, boxed, Value::Int(1)).unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));
        let list = types.list_new(&mut heap).unwrap();
        let err = types.box_get(&heap, list).unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));
    }
}
