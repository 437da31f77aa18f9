//! The identity ledger and the work-stack task shapes.
//!
//! The ledger is the engine's memory of one pass: original id to copy id.
//! Every share and every cycle in the input graph resolves through it, so
//! the copy has exactly the shape of the original. It lives and dies with a
//! single copy call; copies made by different calls never alias.

use ahash::AHashMap;

use crate::heap::{Heap, HeapId};
use crate::value::Value;

/// Per-call map from original object to its copy.
#[derive(Debug, Default)]
pub(super) struct IdentityLedger {
    entries: AHashMap<HeapId, HeapId>,
}

impl IdentityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The copy already made for `original`, if any.
    pub fn lookup(&self, original: HeapId) -> Option<HeapId> {
        self.entries.get(&original).copied()
    }

    /// Records that `original` has been copied to `copy`.
    pub fn record(&mut self, original: HeapId, copy: HeapId) {
        let previous = self.entries.insert(original, copy);
        debug_assert!(
            previous.is_none(),
            "an original is copied at most once per pass"
        );
    }
}

/// One unit of work: copy `original`, then patch the copy's id into `site`.
///
/// The root task has no site; its copy is read back from the ledger when the
/// stack drains.
#[derive(Debug)]
pub(super) struct CopyTask {
    pub original: HeapId,
    pub site: Option<PatchSite>,
}

/// Where a finished copy's reference belongs.
///
/// A patch site is the suspended half of a parent object's population: the
/// parent's shell already exists, and one of its slots waits for the id of a
/// child copy that is still on the work stack.
#[derive(Debug, Clone, Copy)]
pub(super) enum PatchSite {
    /// A layout slot of an instance shell.
    InstanceField { target: HeapId, slot: usize },
    /// An element of a reference-array shell.
    ArrayIndex { target: HeapId, index: usize },
}

impl PatchSite {
    /// Writes `Ref(copy)` into the waiting slot.
    pub fn apply(self, heap: &mut Heap, copy: HeapId) {
        match self {
            Self::InstanceField { target, slot } => {
                heap.write_instance_slot(target, slot, Value::Ref(copy));
            }
            Self::ArrayIndex { target, index } => {
                heap.write_ref_array_slot(target, index, Value::Ref(copy));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_misses_then_hits() {
        let mut ledger = IdentityLedger::new();
        let a = HeapId::from_index(0);
        let b = HeapId::from_index(7);
        assert!(ledger.lookup(a).is_none());
        ledger.record(a, b);
        assert_eq!(ledger.lookup(a), Some(b));
        assert!(ledger.lookup(b).is_none());
    }
}
