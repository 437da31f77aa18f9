//! The deep-copy engine.
//!
//! A copy pass walks an arbitrary object graph (heterogeneous, shared,
//! cyclic) without recursion. An explicit work stack of tasks replaces the
//! call stack; a per-call identity ledger maps every original to its copy,
//! which is what preserves sharing and terminates cycles. An edge to an
//! already-copied child resolves from the ledger on the spot; other edges
//! become tasks, and a popped task whose original got copied while it
//! waited (two fields racing to the same child) resolves the same way.
//! Anything still uncopied at pop time is copied then: instances get a
//! constructed shell plus field population, arrays are specialized by
//! shape.
//!
//! The copy is all-or-nothing. Any failure (an unsupported class, a blocked
//! field, a failing constructor, a resource limit) aborts the pass with an
//! error; no partially copied graph is ever returned. Aborted passes can
//! leave orphaned shells on the heap, which is an accepted cost of arena
//! allocation.
//!
//! # Module Structure
//!
//! - `ledger` - identity ledger, work tasks and patch sites
//! - `construct` - shell construction strategies
//! - `fields` - instance field population
//! - `sequence` - leaf and reference array copying

pub use construct::ConstructionStrategy;

mod construct;
mod fields;
mod ledger;
mod sequence;

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::class::ClassId;
use crate::error::{CopyError, CopyResult};
use crate::heap::{Heap, HeapData, HeapId};
use crate::tracer::{CopyTracer, NoopTracer};
use crate::value::Value;

use ledger::{CopyTask, IdentityLedger, PatchSite};

/// What the engine may reach past while copying.
///
/// The defaults mirror reflective copying: private state is copied and
/// non-public constructors are fair game, because a deep copy that skips
/// private fields is not a copy of the object. Turn switches off to model a
/// stricter host.
#[derive(Debug, Clone)]
pub struct CopyPolicy {
    /// Copy private fields as freely as public ones. When false, the first
    /// private field in a copied class aborts the pass with a field access
    /// error.
    pub bypass_field_visibility: bool,
    /// Let shell construction use non-public constructors.
    pub allow_non_public_constructors: bool,
    /// Let shell construction fall back to the fewest-parameter
    /// constructor fed synthetic default arguments.
    pub allow_synthetic_constructors: bool,
}

impl Default for CopyPolicy {
    fn default() -> Self {
        Self {
            bypass_field_visibility: true,
            allow_non_public_constructors: true,
            allow_synthetic_constructors: true,
        }
    }
}

/// Counters from one copy pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Tasks popped off the work stack.
    pub tasks_processed: usize,
    /// References resolved from the ledger: one per preserved share or
    /// closed cycle edge.
    pub ledger_hits: usize,
    /// New heap objects created (instances and arrays).
    pub objects_copied: usize,
    /// Leaf arrays copied in bulk.
    pub leaf_arrays_copied: usize,
    /// Reference arrays copied element-wise.
    pub ref_arrays_copied: usize,
    /// Instance copies per class name.
    pub copies_by_class: BTreeMap<String, usize>,
}

/// A finished copy: the copied root value plus pass counters.
#[derive(Debug, Clone)]
pub struct CopyOutcome {
    /// The copy of the root value.
    pub value: Value,
    /// Counters from the pass.
    pub stats: CopyStats,
}

/// Deep-copies `root` within `heap` under the default policy.
///
/// Reference roots yield a structurally identical, fully disconnected copy
/// of everything reachable: mutating either graph never shows through the
/// other, while sharing and cycles inside the graph are reproduced exactly.
/// Leaf roots yield an equal leaf (strings share their immutable backing)
/// and class values are returned as-is. Null and undefined roots are
/// rejected with [`CopyErrorKind::NullInput`](crate::CopyErrorKind::NullInput).
///
/// ```
/// use calque::{ClassSpec, CtorSpec, FieldKind, FieldSpec, Heap, Value, deep_copy};
///
/// let mut heap = Heap::new();
/// let person = heap
///     .declare_class(
///         ClassSpec::new("Person")
///             .field(FieldSpec::new("name", FieldKind::Leaf))
///             .constructor(CtorSpec::zero_arg()),
///     )
///     .unwrap();
/// let dan = heap.new_bare_instance(person).unwrap();
/// heap.set_field(dan, "name", Value::str("Dan")).unwrap();
///
/// let copy = deep_copy(&mut heap, &Value::Ref(dan)).unwrap();
/// let copy_id = copy.as_ref_id().unwrap();
/// assert_ne!(copy_id, dan);
/// assert_eq!(heap.get_field(copy_id, "name").unwrap().as_str(), Some("Dan"));
/// ```
pub fn deep_copy(heap: &mut Heap, root: &Value) -> CopyResult<Value> {
    let mut tracer = NoopTracer;
    CopyMachine::new(heap, &CopyPolicy::default(), &mut tracer)
        .run(root)
        .map(|outcome| outcome.value)
}

/// Deep-copies `root` under an explicit policy, returning the copy together
/// with pass counters.
pub fn deep_copy_with(
    heap: &mut Heap,
    root: &Value,
    policy: &CopyPolicy,
) -> CopyResult<CopyOutcome> {
    let mut tracer = NoopTracer;
    CopyMachine::new(heap, policy, &mut tracer).run(root)
}

/// Deep-copies `root` under an explicit policy with a tracer observing the
/// pass. See [`crate::tracer`] for the available tracers.
pub fn deep_copy_traced<Tr: CopyTracer>(
    heap: &mut Heap,
    root: &Value,
    policy: &CopyPolicy,
    tracer: &mut Tr,
) -> CopyResult<CopyOutcome> {
    CopyMachine::new(heap, policy, tracer).run(root)
}

/// The engine state for one pass. Split across this module's files: shell
/// construction in `construct`, field population in `fields`, array copies
/// in `sequence`.
pub(crate) struct CopyMachine<'h, 'p, 't, Tr> {
    heap: &'h mut Heap,
    policy: &'p CopyPolicy,
    tracer: &'t mut Tr,
    ledger: IdentityLedger,
    pending: Vec<CopyTask>,
    /// Construction strategy committed per class for this pass.
    strategies: AHashMap<ClassId, ConstructionStrategy>,
    stats: CopyStats,
}

impl<'h, 'p, 't, Tr: CopyTracer> CopyMachine<'h, 'p, 't, Tr> {
    fn new(heap: &'h mut Heap, policy: &'p CopyPolicy, tracer: &'t mut Tr) -> Self {
        Self {
            heap,
            policy,
            tracer,
            ledger: IdentityLedger::new(),
            pending: Vec::new(),
            strategies: AHashMap::new(),
            stats: CopyStats::default(),
        }
    }

    fn run(mut self, root: &Value) -> CopyResult<CopyOutcome> {
        let value = match root {
            Value::Undefined | Value::None => return Err(CopyError::null_input()),
            Value::Ref(id) => {
                self.schedule(*id, None);
                self.drive()?;
                let copy = self
                    .ledger
                    .lookup(*id)
                    .expect("the root task records its copy before the stack drains");
                Value::Ref(copy)
            }
            // Leaf and class roots have no object graph behind them; string
            // leaves share their immutable backing.
            direct => direct.clone(),
        };
        Ok(CopyOutcome {
            value,
            stats: self.stats,
        })
    }

    /// Pops tasks until the stack drains or a task fails.
    fn drive(&mut self) -> CopyResult<()> {
        while let Some(task) = self.pending.pop() {
            self.stats.tasks_processed += 1;
            let copy = if let Some(existing) = self.ledger.lookup(task.original) {
                self.stats.ledger_hits += 1;
                self.tracer.on_ledger_hit(task.original, existing);
                existing
            } else {
                let made = self.copy_object(task.original)?;
                self.stats.objects_copied += 1;
                made
            };
            if let Some(site) = task.site {
                site.apply(self.heap, copy);
            }
            self.tracer.on_resolved(task.original, copy, self.pending.len());
        }
        Ok(())
    }

    /// Copies one heap object the ledger has not seen yet.
    fn copy_object(&mut self, original: HeapId) -> CopyResult<HeapId> {
        enum Shape {
            Instance(ClassId),
            LeafArray,
            RefArray,
        }
        let shape = match self.heap.data(original) {
            HeapData::Instance(instance) => Shape::Instance(instance.class),
            HeapData::LeafArray(_) => Shape::LeafArray,
            HeapData::RefArray(_) => Shape::RefArray,
        };
        match shape {
            Shape::Instance(class) => {
                let copy = self.build_shell(original, class)?;
                self.populate_instance(original, copy)?;
                // Recorded after population: population only schedules
                // children, so nothing can query the ledger in between, and
                // the entry lands before any scheduled task pops.
                self.ledger.record(original, copy);
                *self
                    .stats
                    .copies_by_class
                    .entry(self.heap.class_name(class).to_owned())
                    .or_insert(0) += 1;
                Ok(copy)
            }
            Shape::LeafArray => self.copy_leaf_array(original),
            Shape::RefArray => self.copy_ref_array(original),
        }
    }

    /// Resolves one reference edge. An already-copied child is written
    /// through the patch site immediately; anything else becomes a task.
    fn copy_edge(&mut self, child: HeapId, site: PatchSite) {
        if let Some(existing) = self.ledger.lookup(child) {
            self.stats.ledger_hits += 1;
            self.tracer.on_ledger_hit(child, existing);
            site.apply(self.heap, existing);
        } else {
            self.schedule(child, Some(site));
        }
    }

    /// Pushes a work task.
    fn schedule(&mut self, original: HeapId, site: Option<PatchSite>) {
        self.pending.push(CopyTask { original, site });
        self.tracer.on_scheduled(original, self.pending.len());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::class::{ClassSpec, CtorSpec};
    use crate::error::CopyErrorKind;

    #[test]
    fn null_and_undefined_roots_are_rejected() {
        let mut heap = Heap::new();
        for root in [Value::None, Value::Undefined] {
            let err = deep_copy(&mut heap, &root).unwrap_err();
            assert_eq!(err.kind(), CopyErrorKind::NullInput);
        }
    }

    #[test]
    fn leaf_root_copies_to_an_equal_leaf() {
        let mut heap = Heap::new();
        let copy = deep_copy(&mut heap, &Value::Int(17)).unwrap();
        assert_eq!(copy.as_int(), Some(17));
        let copy = deep_copy(&mut heap, &Value::str("hello")).unwrap();
        assert_eq!(copy.as_str(), Some("hello"));
        assert_eq!(heap.stats().live_objects, 0);
    }

    #[test]
    fn class_root_returns_the_same_class() {
        let mut heap = Heap::new();
        let point = heap
            .declare_class(ClassSpec::new("Point").constructor(CtorSpec::zero_arg()))
            .unwrap();
        let copy = deep_copy(&mut heap, &Value::Class(point)).unwrap();
        assert_eq!(copy.as_class(), Some(point));
    }
}
