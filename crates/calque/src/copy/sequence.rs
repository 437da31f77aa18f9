//! Array copying, specialized by array shape.
//!
//! Leaf arrays hold no references, so a copy is one bulk clone of the
//! backing vector. Reference arrays are copied element-wise through the
//! work stack, exactly like instance fields: immediate values land in the
//! copy now, references become scheduled tasks with array-index patch
//! sites.
//!
//! A reference-array copy is recorded in the ledger before any element is
//! scheduled. An array can reach itself (directly or through any path), and
//! the ledger entry is what turns that back-edge into a hit instead of an
//! infinite regress.

use crate::array::RefArray;
use crate::error::{CopyError, CopyResult, ModelError};
use crate::heap::{HeapData, HeapId};
use crate::value::Value;

use super::ledger::PatchSite;
use super::{CopyMachine, CopyTracer};

impl<Tr: CopyTracer> CopyMachine<'_, '_, '_, Tr> {
    /// Copies a leaf array in one move and records it in the ledger.
    pub(super) fn copy_leaf_array(&mut self, original: HeapId) -> CopyResult<HeapId> {
        let array = match self.heap.data(original) {
            HeapData::LeafArray(array) => array.clone(),
            other => unreachable!("copy_leaf_array on a {}", other.kind_name()),
        };
        let elements = array.len();
        let copy = self.allocate(HeapData::LeafArray(array))?;
        self.ledger.record(original, copy);
        self.stats.leaf_arrays_copied += 1;
        self.tracer.on_array_copied(original, copy, elements, true);
        Ok(copy)
    }

    /// Copies a reference array element-wise via the work stack.
    pub(super) fn copy_ref_array(&mut self, original: HeapId) -> CopyResult<HeapId> {
        let items: Vec<Value> = match self.heap.data(original) {
            HeapData::RefArray(array) => array.iter().cloned().collect(),
            other => unreachable!("copy_ref_array on a {}", other.kind_name()),
        };
        let elements = items.len();
        let copy = self.allocate(HeapData::RefArray(RefArray::with_len(elements)))?;
        self.ledger.record(original, copy);
        for (index, value) in items.into_iter().enumerate() {
            match value {
                Value::Ref(child) => {
                    self.copy_edge(child, PatchSite::ArrayIndex { target: copy, index });
                }
                direct => self.heap.write_ref_array_slot(copy, index, direct),
            }
        }
        self.stats.ref_arrays_copied += 1;
        self.tracer.on_array_copied(original, copy, elements, false);
        Ok(copy)
    }

    /// Heap allocation with engine error mapping.
    fn allocate(&mut self, data: HeapData) -> CopyResult<HeapId> {
        self.heap.allocate(data).map_err(|err| match err {
            ModelError::Resource(resource) => CopyError::allocation(&resource),
            other => CopyError::instantiation("<array>", &other.to_string()),
        })
    }
}
