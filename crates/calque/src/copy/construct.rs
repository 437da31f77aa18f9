//! Shell construction: picking and running a construction strategy.
//!
//! A copied instance starts life as a shell built by whatever means the
//! class offers, in a fixed preference order:
//!
//! 1. a zero-argument constructor,
//! 2. the class's clone capability,
//! 3. the constructor with the fewest parameters, fed synthetic defaults.
//!
//! The first applicable strategy is committed to for the whole pass (it is
//! remembered per class). If the committed strategy then fails at run time,
//! the copy aborts with an instantiation error; there is no fallback to the
//! next tier. A class offering none of the three aborts the copy as
//! unsupported.
//!
//! Strategies 1 and 3 run real constructors, so constructor side effects
//! (counters, registries) happen once per copied instance. Strategy 2 runs
//! none: it duplicates the original's field table. Whatever values a shell
//! starts with are overwritten during population, which is why synthetic
//! defaults are safe: they only have to satisfy the constructor, not the
//! final object.

use std::fmt;

use crate::array::ScalarArray;
use crate::class::{ClassDef, ClassId, Constructor, CtorParam, ParamType, Visibility};
use crate::error::{CopyError, CopyResult, ModelError, ModelResult};
use crate::heap::{Heap, HeapId};
use crate::value::Value;

use super::{CopyMachine, CopyPolicy, CopyTracer};

/// How an instance shell gets built. Carried in trace events so a recording
/// shows which tier each class committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionStrategy {
    /// Run the zero-argument constructor at this index.
    ZeroArg { ctor: usize },
    /// Duplicate the original's field table; no constructor runs.
    CloneCapability,
    /// Run the constructor at this index with synthetic default arguments.
    Synthetic { ctor: usize, arity: usize },
}

impl fmt::Display for ConstructionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroArg { .. } => f.write_str("zero-argument constructor"),
            Self::CloneCapability => f.write_str("clone capability"),
            Self::Synthetic { arity, .. } => {
                write!(f, "synthetic arguments for a {arity}-parameter constructor")
            }
        }
    }
}

/// Picks the construction strategy for a class, or `None` when the class
/// offers no usable way to build a shell under `policy`.
pub(super) fn select_strategy(def: &ClassDef, policy: &CopyPolicy) -> Option<ConstructionStrategy> {
    let usable = |ctor: &Constructor| {
        ctor.visibility == Visibility::Public || policy.allow_non_public_constructors
    };
    if let Some(ctor) = def
        .constructors
        .iter()
        .position(|c| c.params.is_empty() && usable(c))
    {
        return Some(ConstructionStrategy::ZeroArg { ctor });
    }
    if def.cloneable {
        return Some(ConstructionStrategy::CloneCapability);
    }
    if policy.allow_synthetic_constructors
        && let Some((ctor, chosen)) = def
            .constructors
            .iter()
            .enumerate()
            .filter(|(_, c)| usable(c))
            // Ties on arity go to the earliest declaration.
            .min_by_key(|&(index, c)| (c.params.len(), index))
    {
        return Some(ConstructionStrategy::Synthetic {
            ctor,
            arity: chosen.params.len(),
        });
    }
    None
}

/// Default argument per parameter type: scalar zero values for leaves, a
/// fresh empty array for sequences, null for references.
fn synthetic_args(heap: &mut Heap, params: &[CtorParam]) -> ModelResult<Vec<Value>> {
    params
        .iter()
        .map(|param| {
            Ok(match param.ty {
                ParamType::Scalar(kind) => kind.default_value(),
                ParamType::LeafSeq(kind) => {
                    Value::Ref(heap.alloc_leaf_array(ScalarArray::empty(kind))?)
                }
                ParamType::RefSeq => Value::Ref(heap.alloc_ref_array(Vec::new())?),
                ParamType::Reference => Value::None,
            })
        })
        .collect()
}

impl<Tr: CopyTracer> CopyMachine<'_, '_, '_, Tr> {
    /// Builds a shell for one instance of `class` and reports it to the
    /// tracer. The caller populates fields and records the ledger entry.
    pub(super) fn build_shell(
        &mut self,
        original: HeapId,
        class: ClassId,
    ) -> CopyResult<HeapId> {
        let strategy = match self.strategies.get(&class) {
            Some(committed) => *committed,
            None => {
                let selected = select_strategy(self.heap.class(class), self.policy)
                    .ok_or_else(|| CopyError::unsupported_type(self.heap.class_name(class)))?;
                self.strategies.insert(class, selected);
                selected
            }
        };
        let copy = self.run_strategy(class, strategy, original)?;
        self.tracer
            .on_shell_constructed(self.heap.class_name(class), strategy, original, copy);
        Ok(copy)
    }

    fn run_strategy(
        &mut self,
        class: ClassId,
        strategy: ConstructionStrategy,
        original: HeapId,
    ) -> CopyResult<HeapId> {
        let built = match strategy {
            ConstructionStrategy::ZeroArg { ctor } => self.heap.run_constructor(class, ctor, &[]),
            ConstructionStrategy::CloneCapability => self.heap.clone_instance_shell(original),
            ConstructionStrategy::Synthetic { ctor, .. } => {
                let params = self.heap.constructors(class)[ctor].params.clone();
                synthetic_args(self.heap, &params)
                    .and_then(|args| self.heap.run_constructor(class, ctor, &args))
            }
        };
        built.map_err(|err| match err {
            ModelError::Resource(resource) => CopyError::allocation(&resource),
            other => CopyError::instantiation(self.heap.class_name(class), &other.to_string()),
        })
    }
}
