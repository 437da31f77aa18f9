//! The object heap: slot arena, class registry, name interner and resource
//! meter in one place.
//!
//! Objects are allocated into a `Vec` of slots addressed by [`HeapId`] and
//! live as long as the heap; there is no reference counting and no free
//! list, because a heap here models one object graph whose lifetime is the
//! heap's lifetime. A failed deep copy can therefore leave unreachable
//! shells in the arena; they are inert and no id to them ever escapes.
//!
//! The embedder builds graphs through the typed accessors (`declare_class`,
//! `instantiate`, `set_field`, `alloc_ref_array`, ...). These validate kinds
//! and shapes and return [`ModelError`] on misuse, which keeps a standing
//! invariant the copy engine relies on: a stored value always matches its
//! slot's declared [`FieldKind`](crate::class::FieldKind).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use ahash::{AHashMap, AHashSet};

use crate::{
    array::{RefArray, ScalarArray},
    class::{
        ClassDef, ClassId, ClassSpec, Constructor, CtorBehavior, FieldKind, Instance, build_class,
    },
    error::{ModelError, ModelResult},
    intern::{NameId, NameTable},
    resource::{MAX_RENDER_DEPTH, ResourceLimits, ResourceMeter},
    value::Value,
};

/// Id of a heap object. Identity is id equality: two fields holding the
/// same `HeapId` alias one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapId(usize);

impl HeapId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// The data of one heap object.
#[derive(Debug, Clone)]
pub(crate) enum HeapData {
    /// A class instance: one value per layout slot.
    Instance(Instance),
    /// A fixed-size homogeneous leaf array.
    LeafArray(ScalarArray),
    /// A fixed-size array of reference values.
    RefArray(RefArray),
}

impl HeapData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Instance(_) => "instance",
            Self::LeafArray(_) => "leaf array",
            Self::RefArray(_) => "reference array",
        }
    }

    fn estimate_bytes(&self) -> usize {
        match self {
            Self::Instance(instance) => instance.estimate_bytes(),
            Self::LeafArray(array) => array.estimate_bytes(),
            Self::RefArray(array) => array.estimate_bytes(),
        }
    }
}

/// Snapshot of heap counters, taken with [`Heap::stats`].
///
/// `instances_by_class` uses a `BTreeMap` so iteration (and test output) is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of objects in the arena.
    pub live_objects: usize,
    /// Number of class instances.
    pub instances: usize,
    /// Number of leaf arrays.
    pub leaf_arrays: usize,
    /// Number of reference arrays.
    pub ref_arrays: usize,
    /// Instance count per class name.
    pub instances_by_class: BTreeMap<String, usize>,
    /// Allocations charged to the meter since the heap was created.
    pub allocation_count: usize,
    /// Approximate bytes held by heap objects.
    pub live_bytes: usize,
}

/// The heap. See the module docs for the ownership model.
#[derive(Debug, Default)]
pub struct Heap {
    entries: Vec<HeapData>,
    classes: Vec<ClassDef>,
    class_lookup: AHashMap<NameId, ClassId>,
    names: NameTable,
    meter: ResourceMeter,
}

impl Heap {
    /// An unlimited heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A heap whose allocations are charged against `limits`.
    #[must_use]
    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self {
            meter: ResourceMeter::new(limits),
            ..Self::default()
        }
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// Registers a class, validating the declaration and flattening the
    /// ancestor layout. The parent (if any) must already be registered on
    /// this heap.
    pub fn declare_class(&mut self, spec: ClassSpec) -> ModelResult<ClassId> {
        if let Some(existing) = self.names.get(spec.class_name())
            && self.class_lookup.contains_key(&existing)
        {
            return Err(ModelError::BadSpec {
                class: spec.class_name().to_owned(),
                message: "class name already registered".to_owned(),
            });
        }
        let parent_layout = match spec.parent_id() {
            Some(parent) => Some(
                self.classes
                    .get(parent.index())
                    .ok_or_else(|| ModelError::BadSpec {
                        class: spec.class_name().to_owned(),
                        message: "parent class is not registered on this heap".to_owned(),
                    })?
                    .layout
                    .clone(),
            ),
            None => None,
        };
        let id = ClassId(self.classes.len().try_into().expect("ClassId overflow"));
        let def = build_class(spec, id, parent_layout, &mut self.names)?;
        self.class_lookup.insert(def.name, id);
        self.classes.push(def);
        Ok(id)
    }

    /// Looks up a registered class by name.
    #[must_use]
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        let name = self.names.get(name)?;
        self.class_lookup.get(&name).copied()
    }

    /// The name of a registered class.
    ///
    /// # Panics
    /// Panics if `class` did not come from this heap.
    #[must_use]
    pub fn class_name(&self, class: ClassId) -> &str {
        self.names.resolve(self.class(class).name)
    }

    pub(crate) fn class(&self, class: ClassId) -> &ClassDef {
        &self.classes[class.index()]
    }

    pub(crate) fn constructors(&self, class: ClassId) -> &[Constructor] {
        &self.class(class).constructors
    }

    /// Number of layout slots of a class, ancestors included.
    #[must_use]
    pub fn layout_len(&self, class: ClassId) -> usize {
        self.class(class).layout.len()
    }

    /// Owner class and field name of a layout slot. Shadowed ancestor
    /// fields keep their own slots, so this is the only way to name them.
    ///
    /// # Panics
    /// Panics if `slot` is out of range for the class layout.
    #[must_use]
    pub fn slot_names(&self, class: ClassId, slot: usize) -> (&str, &str) {
        let slot = &self.class(class).layout[slot];
        (
            self.names.resolve(self.class(slot.owner).name),
            self.names.resolve(slot.name),
        )
    }

    /// Reads a static value from a class.
    pub fn get_static(&self, class: ClassId, name: &str) -> ModelResult<Value> {
        self.names
            .get(name)
            .and_then(|id| self.class(class).static_value(id).cloned())
            .ok_or_else(|| self.unknown_field(class, name))
    }

    /// Writes a static value (leaf or null only) on a class.
    pub fn set_static(&mut self, class: ClassId, name: &str, value: Value) -> ModelResult<()> {
        if !(value.is_leaf() || value.is_none()) {
            return Err(ModelError::KindMismatch {
                target: format!("{}::{name}", self.class_name(class)),
                expected: "a leaf or null value".to_owned(),
                got: self.describe_value(&value),
            });
        }
        let slot = self
            .names
            .get(name)
            .and_then(|id| self.classes[class.index()].static_value_mut(id))
            .ok_or_else(|| ModelError::UnknownField {
                class: String::new(),
                field: name.to_owned(),
            })?;
        *slot = value;
        Ok(())
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    pub(crate) fn allocate(&mut self, data: HeapData) -> ModelResult<HeapId> {
        self.meter.on_allocate(data.estimate_bytes())?;
        let id = HeapId(self.entries.len());
        self.entries.push(data);
        Ok(id)
    }

    /// Allocates a fixed-size homogeneous leaf array.
    pub fn alloc_leaf_array(&mut self, array: ScalarArray) -> ModelResult<HeapId> {
        self.allocate(HeapData::LeafArray(array))
    }

    /// Allocates a fixed-size array of reference values. Elements may be
    /// any value except the undefined sentinel.
    pub fn alloc_ref_array(&mut self, items: Vec<Value>) -> ModelResult<HeapId> {
        if let Some(bad) = items.iter().position(Value::is_undefined) {
            return Err(ModelError::KindMismatch {
                target: format!("reference array element {bad}"),
                expected: "a value".to_owned(),
                got: "Undefined".to_owned(),
            });
        }
        self.allocate(HeapData::RefArray(RefArray::new(items)))
    }

    /// Allocates an instance without running any constructor: every slot
    /// holds its declared default, or undefined.
    pub fn new_bare_instance(&mut self, class: ClassId) -> ModelResult<HeapId> {
        let slots: Vec<Value> = self
            .class(class)
            .layout
            .iter()
            .map(|slot| slot.default.clone().unwrap_or(Value::Undefined))
            .collect();
        self.allocate(HeapData::Instance(Instance { class, slots }))
    }

    /// Allocates an instance whose slots are duplicated verbatim from an
    /// existing one. This is the clone capability's shell; the engine
    /// rewrites every slot during population.
    pub(crate) fn clone_instance_shell(&mut self, original: HeapId) -> ModelResult<HeapId> {
        let instance = match self.data(original) {
            HeapData::Instance(instance) => instance.clone(),
            other => {
                return Err(ModelError::WrongObjectKind {
                    expected: "instance",
                    got: other.kind_name(),
                });
            }
        };
        self.allocate(HeapData::Instance(instance))
    }

    /// Runs a declared constructor, chosen by argument count (first match
    /// in declaration order).
    pub fn instantiate(&mut self, class: ClassId, args: &[Value]) -> ModelResult<HeapId> {
        let index = self
            .constructors(class)
            .iter()
            .position(|ctor| ctor.params.len() == args.len())
            .ok_or_else(|| ModelError::NoMatchingConstructor {
                class: self.class_name(class).to_owned(),
                argc: args.len(),
            })?;
        self.run_constructor(class, index, args)
    }

    /// Type-checks `args` against a specific constructor and runs it.
    pub(crate) fn run_constructor(
        &mut self,
        class: ClassId,
        ctor_index: usize,
        args: &[Value],
    ) -> ModelResult<HeapId> {
        let ctor = &self.constructors(class)[ctor_index];
        let behavior = ctor.behavior;
        let params = ctor.params.clone();
        for (position, (param, arg)) in params.iter().zip(args).enumerate() {
            let shallow = param.ty.accepts_shallow(arg);
            let shaped = match (param.ty, arg) {
                (crate::class::ParamType::LeafSeq(kind), Value::Ref(id)) => {
                    matches!(self.data(*id), HeapData::LeafArray(arr) if arr.kind() == kind)
                }
                (crate::class::ParamType::RefSeq, Value::Ref(id)) => {
                    matches!(self.data(*id), HeapData::RefArray(_))
                }
                _ => true,
            };
            if !(shallow && shaped) {
                return Err(ModelError::ArgumentType {
                    class: self.class_name(class).to_owned(),
                    index: position,
                    expected: param.ty.describe(),
                    got: self.describe_value(arg),
                });
            }
        }
        match behavior {
            CtorBehavior::Native(body) => body(self, class, args),
            CtorBehavior::Assign => {
                let id = self.new_bare_instance(class)?;
                for (param, arg) in params.iter().zip(args) {
                    let slot = param
                        .binds
                        .expect("assigning constructor parameters always bind a field");
                    self.write_instance_slot(id, slot, arg.clone());
                }
                Ok(id)
            }
        }
    }

    // ========================================================================
    // Object access
    // ========================================================================

    /// The object behind `id`.
    ///
    /// # Panics
    /// Panics if `id` did not come from this heap.
    pub(crate) fn data(&self, id: HeapId) -> &HeapData {
        self.entries
            .get(id.index())
            .expect("Heap::data: no object at this id")
    }

    fn data_mut(&mut self, id: HeapId) -> &mut HeapData {
        self.entries
            .get_mut(id.index())
            .expect("Heap::data_mut: no object at this id")
    }

    /// The class of the instance behind `id`.
    pub fn instance_class(&self, id: HeapId) -> ModelResult<ClassId> {
        match self.data(id) {
            HeapData::Instance(instance) => Ok(instance.class),
            other => Err(ModelError::WrongObjectKind {
                expected: "instance",
                got: other.kind_name(),
            }),
        }
    }

    /// Reads a field by name (most-derived slot when shadowed). Embedder
    /// access ignores visibility; visibility binds only the copy policy.
    pub fn get_field(&self, obj: HeapId, field: &str) -> ModelResult<Value> {
        let (_, slot) = self.resolve_field(obj, field)?;
        match self.data(obj) {
            HeapData::Instance(instance) => Ok(instance.slots[slot].clone()),
            _ => unreachable!("resolve_field checked the shape"),
        }
    }

    /// Writes a field by name, enforcing the slot's declared kind (and, for
    /// sequence kinds, the shape of the referenced array).
    pub fn set_field(&mut self, obj: HeapId, field: &str, value: Value) -> ModelResult<()> {
        let (class, slot) = self.resolve_field(obj, field)?;
        self.check_slot_kind(class, slot, &value)?;
        self.write_instance_slot(obj, slot, value);
        Ok(())
    }

    /// Reads a field by layout slot, reaching shadowed ancestor fields that
    /// name lookup cannot.
    pub fn field_at(&self, obj: HeapId, slot: usize) -> ModelResult<Value> {
        match self.data(obj) {
            HeapData::Instance(instance) => {
                instance
                    .slots
                    .get(slot)
                    .cloned()
                    .ok_or(ModelError::IndexOutOfRange {
                        index: slot,
                        len: instance.slots.len(),
                    })
            }
            other => Err(ModelError::WrongObjectKind {
                expected: "instance",
                got: other.kind_name(),
            }),
        }
    }

    /// Writes a field by layout slot, enforcing the slot's declared kind.
    pub fn set_field_at(&mut self, obj: HeapId, slot: usize, value: Value) -> ModelResult<()> {
        let class = self.instance_class(obj)?;
        if slot >= self.layout_len(class) {
            return Err(ModelError::IndexOutOfRange {
                index: slot,
                len: self.layout_len(class),
            });
        }
        self.check_slot_kind(class, slot, &value)?;
        self.write_instance_slot(obj, slot, value);
        Ok(())
    }

    fn resolve_field(&self, obj: HeapId, field: &str) -> ModelResult<(ClassId, usize)> {
        let instance = match self.data(obj) {
            HeapData::Instance(instance) => instance,
            other => {
                return Err(ModelError::WrongObjectKind {
                    expected: "instance",
                    got: other.kind_name(),
                });
            }
        };
        let class = instance.class;
        let slot = self
            .names
            .get(field)
            .and_then(|name| self.class(class).slot_by_name(name))
            .ok_or_else(|| self.unknown_field(class, field))?;
        Ok((class, slot))
    }

    fn unknown_field(&self, class: ClassId, field: &str) -> ModelError {
        ModelError::UnknownField {
            class: self.class_name(class).to_owned(),
            field: field.to_owned(),
        }
    }

    /// Validates `value` against a layout slot's declared kind.
    fn check_slot_kind(&self, class: ClassId, slot: usize, value: &Value) -> ModelResult<()> {
        let kind = self.class(class).layout[slot].kind;
        let shallow = kind.accepts_shallow(value);
        let shaped = match (kind, value) {
            (FieldKind::LeafSeq(element), Value::Ref(id)) => {
                matches!(self.data(*id), HeapData::LeafArray(arr) if arr.kind() == element)
            }
            (FieldKind::RefSeq, Value::Ref(id)) => {
                matches!(self.data(*id), HeapData::RefArray(_))
            }
            _ => true,
        };
        if shallow && shaped {
            Ok(())
        } else {
            let (owner, name) = self.slot_names(class, slot);
            Err(ModelError::KindMismatch {
                target: format!("{owner}.{name}"),
                expected: kind.describe(),
                got: self.describe_value(value),
            })
        }
    }

    /// Raw slot write. The caller has already validated the kind; the
    /// engine uses this for shell population, where values are kind-correct
    /// by construction.
    pub(crate) fn write_instance_slot(&mut self, obj: HeapId, slot: usize, value: Value) {
        match self.data_mut(obj) {
            HeapData::Instance(instance) => instance.slots[slot] = value,
            other => panic!(
                "Heap::write_instance_slot: target is a {}, not an instance",
                other.kind_name()
            ),
        }
    }

    pub(crate) fn write_ref_array_slot(&mut self, arr: HeapId, index: usize, value: Value) {
        match self.data_mut(arr) {
            HeapData::RefArray(array) => array.set(index, value),
            other => panic!(
                "Heap::write_ref_array_slot: target is a {}, not a reference array",
                other.kind_name()
            ),
        }
    }

    // ========================================================================
    // Array access
    // ========================================================================

    /// Length of the array behind `id` (either array shape).
    pub fn array_len(&self, arr: HeapId) -> ModelResult<usize> {
        match self.data(arr) {
            HeapData::LeafArray(array) => Ok(array.len()),
            HeapData::RefArray(array) => Ok(array.len()),
            HeapData::Instance(_) => Err(ModelError::WrongObjectKind {
                expected: "array",
                got: "instance",
            }),
        }
    }

    /// Borrows the leaf array behind `id`.
    pub fn leaf_array(&self, arr: HeapId) -> ModelResult<&ScalarArray> {
        match self.data(arr) {
            HeapData::LeafArray(array) => Ok(array),
            other => Err(ModelError::WrongObjectKind {
                expected: "leaf array",
                got: other.kind_name(),
            }),
        }
    }

    /// Writes one element of a leaf array.
    pub fn leaf_array_set(&mut self, arr: HeapId, index: usize, value: &Value) -> ModelResult<()> {
        let array = self.leaf_array(arr)?;
        let (len, kind) = (array.len(), array.kind());
        if index >= len {
            return Err(ModelError::IndexOutOfRange { index, len });
        }
        if !array.accepts(value) {
            return Err(ModelError::KindMismatch {
                target: format!("{kind} leaf array"),
                expected: format!("a {kind} value"),
                got: self.describe_value(value),
            });
        }
        match self.data_mut(arr) {
            HeapData::LeafArray(array) => array.set(index, value),
            _ => unreachable!("shape checked above"),
        }
        Ok(())
    }

    /// Reads one element of a reference array.
    pub fn ref_array_get(&self, arr: HeapId, index: usize) -> ModelResult<Value> {
        match self.data(arr) {
            HeapData::RefArray(array) => array
                .get(index)
                .cloned()
                .ok_or(ModelError::IndexOutOfRange {
                    index,
                    len: array.len(),
                }),
            other => Err(ModelError::WrongObjectKind {
                expected: "reference array",
                got: other.kind_name(),
            }),
        }
    }

    /// Writes one element of a reference array.
    pub fn ref_array_set(&mut self, arr: HeapId, index: usize, value: Value) -> ModelResult<()> {
        if value.is_undefined() {
            return Err(ModelError::KindMismatch {
                target: format!("reference array element {index}"),
                expected: "a value".to_owned(),
                got: "Undefined".to_owned(),
            });
        }
        let len = match self.data(arr) {
            HeapData::RefArray(array) => array.len(),
            other => {
                return Err(ModelError::WrongObjectKind {
                    expected: "reference array",
                    got: other.kind_name(),
                });
            }
        };
        if index >= len {
            return Err(ModelError::IndexOutOfRange { index, len });
        }
        self.write_ref_array_slot(arr, index, value);
        Ok(())
    }

    // ========================================================================
    // Comparison, rendering, stats
    // ========================================================================

    /// Structural equality over the graph: leaves by value, instances by
    /// class and field values, arrays element-wise. Uses an explicit
    /// worklist (no recursion) and treats a revisited pair of nodes as
    /// equal, so it terminates on cyclic graphs.
    #[must_use]
    pub fn deep_eq(&self, a: &Value, b: &Value) -> bool {
        let mut pending = vec![(a.clone(), b.clone())];
        let mut seen: AHashSet<(HeapId, HeapId)> = AHashSet::new();
        while let Some((x, y)) = pending.pop() {
            let (p, q) = match (&x, &y) {
                (Value::Ref(p), Value::Ref(q)) => (*p, *q),
                _ => {
                    if x.shallow_eq(&y) {
                        continue;
                    }
                    return false;
                }
            };
            if p == q || !seen.insert((p, q)) {
                continue;
            }
            match (self.data(p), self.data(q)) {
                (HeapData::Instance(i), HeapData::Instance(j)) => {
                    if i.class != j.class {
                        return false;
                    }
                    pending.extend(i.slots.iter().cloned().zip(j.slots.iter().cloned()));
                }
                (HeapData::LeafArray(m), HeapData::LeafArray(n)) => {
                    if m.kind() != n.kind() || m.len() != n.len() {
                        return false;
                    }
                    for index in 0..m.len() {
                        let (Some(a), Some(b)) = (m.get(index), n.get(index)) else {
                            return false;
                        };
                        if !a.shallow_eq(&b) {
                            return false;
                        }
                    }
                }
                (HeapData::RefArray(m), HeapData::RefArray(n)) => {
                    if m.len() != n.len() {
                        return false;
                    }
                    pending.extend(m.iter().cloned().zip(n.iter().cloned()));
                }
                _ => return false,
            }
        }
        true
    }

    /// One-line description of a value for error messages.
    pub(crate) fn describe_value(&self, value: &Value) -> String {
        match value {
            Value::Ref(id) => match self.data(*id) {
                HeapData::Instance(instance) => {
                    format!("a reference to a {} instance", self.class_name(instance.class))
                }
                HeapData::LeafArray(array) => {
                    format!("a reference to a {} leaf array", array.kind())
                }
                HeapData::RefArray(_) => "a reference to a reference array".to_owned(),
            },
            Value::Class(class) => format!("the class {}", self.class_name(*class)),
            other => other.kind_name().to_owned(),
        }
    }

    /// Renders a value (following references) for demos and debugging.
    ///
    /// Instances render as `Name#id{field: value, ..}`, arrays as bracketed
    /// element lists. Back-edges render as `<cycle #id>`; rendering stops
    /// with `...` past a fixed depth.
    #[must_use]
    pub fn render(&self, value: &Value) -> String {
        let mut out = String::new();
        let mut path = AHashSet::new();
        self.render_into(&mut out, value, 0, &mut path);
        out
    }

    fn render_into(&self, out: &mut String, value: &Value, depth: usize, path: &mut AHashSet<HeapId>) {
        match value {
            Value::Undefined => out.push_str("<undefined>"),
            Value::None => out.push_str("null"),
            Value::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Value::Int(i) => {
                let _ = write!(out, "{i}");
            }
            Value::Float(x) => {
                let _ = write!(out, "{x}");
            }
            Value::Char(c) => {
                let _ = write!(out, "{c:?}");
            }
            Value::Str(s) => {
                let _ = write!(out, "{s:?}");
            }
            Value::Class(class) => {
                let _ = write!(out, "class {}", self.class_name(*class));
            }
            Value::Ref(id) => {
                if depth >= MAX_RENDER_DEPTH {
                    out.push_str("...");
                    return;
                }
                if !path.insert(*id) {
                    let _ = write!(out, "<cycle #{}>", id.index());
                    return;
                }
                self.render_object(out, *id, depth, path);
                path.remove(id);
            }
        }
    }

    fn render_object(&self, out: &mut String, id: HeapId, depth: usize, path: &mut AHashSet<HeapId>) {
        match self.data(id) {
            HeapData::Instance(instance) => {
                let _ = write!(out, "{}#{}{{", self.class_name(instance.class), id.index());
                let layout = &self.class(instance.class).layout;
                for (index, (slot, value)) in layout.iter().zip(&instance.slots).enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}: ", self.names.resolve(slot.name));
                    self.render_into(out, value, depth + 1, path);
                }
                out.push('}');
            }
            HeapData::LeafArray(array) => {
                let _ = write!(out, "{}[", array.kind());
                for index in 0..array.len() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    if let Some(element) = array.get(index) {
                        self.render_into(out, &element, depth + 1, path);
                    }
                }
                out.push(']');
            }
            HeapData::RefArray(array) => {
                out.push('[');
                for (index, element) in array.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    self.render_into(out, element, depth + 1, path);
                }
                out.push(']');
            }
        }
    }

    /// Snapshot of the heap's counters.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats {
            allocation_count: self.meter.allocation_count(),
            live_bytes: self.meter.live_bytes(),
            ..HeapStats::default()
        };
        for entry in &self.entries {
            stats.live_objects += 1;
            match entry {
                HeapData::Instance(instance) => {
                    stats.instances += 1;
                    *stats
                        .instances_by_class
                        .entry(self.class_name(instance.class).to_owned())
                        .or_insert(0) += 1;
                }
                HeapData::LeafArray(_) => stats.leaf_arrays += 1,
                HeapData::RefArray(_) => stats.ref_arrays += 1,
            }
        }
        stats
    }
}
