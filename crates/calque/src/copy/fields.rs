//! Field population: mirroring an original instance's slots into its shell.
//!
//! Population walks the flattened layout, so inherited fields (including
//! shadowed ones, which occupy distinct slots) are copied exactly like the
//! class's own. Statics are not part of the layout and are never touched.
//!
//! Leaves, nulls and class values land in the shell immediately. Reference
//! slots resolve against the ledger first: a child that already has a copy
//! is written now, anything else is scheduled on the work stack with a
//! patch site pointing back at the waiting slot. Until that task resolves,
//! the slot keeps whatever the shell's constructor left in it.

use crate::class::Visibility;
use crate::error::{CopyError, CopyResult};
use crate::heap::{HeapData, HeapId};
use crate::value::Value;

use super::ledger::PatchSite;
use super::{CopyMachine, CopyTracer};

impl<Tr: CopyTracer> CopyMachine<'_, '_, '_, Tr> {
    /// Copies every layout slot of `original` into the shell at `copy`.
    pub(super) fn populate_instance(&mut self, original: HeapId, copy: HeapId) -> CopyResult<()> {
        let class = match self.heap.data(original) {
            HeapData::Instance(instance) => instance.class,
            other => unreachable!("populate_instance on a {}", other.kind_name()),
        };
        if !self.policy.bypass_field_visibility {
            let blocked = self
                .heap
                .class(class)
                .layout
                .iter()
                .position(|slot| slot.visibility == Visibility::Private);
            if let Some(slot) = blocked {
                let (owner, field) = self.heap.slot_names(class, slot);
                return Err(CopyError::field_access(
                    owner,
                    field,
                    "field is private and the copy policy does not bypass visibility",
                ));
            }
        }
        let slots = match self.heap.data(original) {
            HeapData::Instance(instance) => instance.slots.clone(),
            _ => unreachable!("checked above"),
        };
        for (slot, value) in slots.into_iter().enumerate() {
            match value {
                Value::Ref(child) => {
                    self.copy_edge(child, PatchSite::InstanceField { target: copy, slot });
                }
                direct => self.heap.write_instance_slot(copy, slot, direct),
            }
        }
        Ok(())
    }
}
