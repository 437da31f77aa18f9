//! Class definitions: the runtime type descriptors.
//!
//! A class describes everything the engine needs to know about a type at
//! run time: its fields across the full ancestor chain (the *layout*), each
//! tagged with a [`FieldKind`] classification, its declared constructors,
//! whether it supports the opaque clone capability, and its static values
//! (per-class shared state, never part of an instance).
//!
//! Classes are declared through the [`ClassSpec`] builder and registered on
//! a [`Heap`](crate::heap::Heap), which hands back a [`ClassId`]. A parent
//! class must be registered before its subclasses, so inheritance cycles
//! cannot be expressed at all.

use smallvec::SmallVec;

use crate::{
    array::ScalarKind,
    error::{ModelError, ModelResult},
    heap::{Heap, HeapId},
    intern::{NameId, NameTable},
    value::Value,
};

/// Id of a registered class. `u32` keeps the values carrying one small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Field and constructor visibility.
///
/// Visibility binds only the copy engine's [`CopyPolicy`](crate::CopyPolicy):
/// the embedder that owns the heap can always read and write its own
/// objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    /// Visible to any copy policy.
    Public,
    /// Requires a policy that bypasses visibility.
    Private,
}

/// Classification of a field, driving how the engine copies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A leaf value (number, boolean, character, immutable text): copied by
    /// value.
    Leaf,
    /// An arbitrary value, usually a heap reference: copied through the
    /// identity ledger and the work stack.
    Reference,
    /// A reference to a fixed-size homogeneous leaf array: bulk-copied.
    LeafSeq(ScalarKind),
    /// A reference to a fixed-size array of reference values: copied
    /// element-wise.
    RefSeq,
}

impl FieldKind {
    /// Short description for error messages.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::Leaf => "a leaf value".to_owned(),
            Self::Reference => "a reference value".to_owned(),
            Self::LeafSeq(kind) => format!("a {kind} leaf array reference"),
            Self::RefSeq => "a reference array reference".to_owned(),
        }
    }

    /// Checks `value` against this kind without dereferencing the heap.
    ///
    /// `Ref` targets of sequence kinds still need a shape check against the
    /// heap, which [`Heap::set_field`](crate::heap::Heap::set_field) does.
    pub(crate) fn accepts_shallow(self, value: &Value) -> bool {
        match self {
            Self::Leaf => value.is_leaf() || value.is_none(),
            // A reference slot is an untyped object slot.
            Self::Reference => !value.is_undefined(),
            Self::LeafSeq(_) | Self::RefSeq => {
                value.is_none() || matches!(value, Value::Ref(_))
            }
        }
    }
}

/// Type of a constructor parameter, used both for type-checking arguments
/// and for producing synthetic defaults in the construction fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// A leaf of the given kind; synthetic default is zero/false/NUL/empty
    /// text.
    Scalar(ScalarKind),
    /// A leaf array reference; synthetic default is a fresh empty array.
    LeafSeq(ScalarKind),
    /// A reference array reference; synthetic default is a fresh empty
    /// array.
    RefSeq,
    /// Any reference; synthetic default is null.
    Reference,
}

impl ParamType {
    /// Short description for error messages.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::Scalar(kind) => format!("a {kind} value"),
            Self::LeafSeq(kind) => format!("a {kind} leaf array reference"),
            Self::RefSeq => "a reference array reference".to_owned(),
            Self::Reference => "a reference value".to_owned(),
        }
    }

    pub(crate) fn accepts_shallow(self, value: &Value) -> bool {
        match self {
            Self::Scalar(ScalarKind::Bool) => matches!(value, Value::Bool(_)),
            Self::Scalar(ScalarKind::Int) => matches!(value, Value::Int(_)),
            Self::Scalar(ScalarKind::Float) => matches!(value, Value::Float(_)),
            Self::Scalar(ScalarKind::Char) => matches!(value, Value::Char(_)),
            Self::Scalar(ScalarKind::Str) => matches!(value, Value::Str(_)),
            Self::LeafSeq(_) | Self::RefSeq => {
                value.is_none() || matches!(value, Value::Ref(_))
            }
            Self::Reference => !value.is_undefined(),
        }
    }

    /// The field kind a parameter of this type may bind to in an assigning
    /// constructor.
    fn compatible_field(self, kind: FieldKind) -> bool {
        match (self, kind) {
            (Self::Scalar(_), FieldKind::Leaf) | (Self::RefSeq, FieldKind::RefSeq) => true,
            (Self::LeafSeq(a), FieldKind::LeafSeq(b)) => a == b,
            (Self::Reference, FieldKind::Reference) => true,
            _ => false,
        }
    }
}

/// A native constructor body.
///
/// Receives the heap, the class being constructed, and the type-checked
/// arguments; returns the id of the instance it allocated, or a
/// [`ModelError`] (typically [`ModelError::Constructor`]) on validation
/// failure. During a copy, a failure here aborts the call as an
/// instantiation error.
pub type NativeCtor = fn(&mut Heap, ClassId, &[Value]) -> ModelResult<HeapId>;

/// How a constructor produces an instance.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CtorBehavior {
    /// Allocate a bare instance (field defaults applied), then write each
    /// argument into the field its parameter binds to.
    Assign,
    /// Run a native function.
    Native(NativeCtor),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CtorParam {
    pub name: NameId,
    pub ty: ParamType,
    /// Layout slot the argument is assigned to; `None` for native
    /// constructors, which place arguments themselves.
    pub binds: Option<usize>,
}

/// A declared constructor.
#[derive(Debug, Clone)]
pub(crate) struct Constructor {
    pub visibility: Visibility,
    pub params: SmallVec<[CtorParam; 4]>,
    pub behavior: CtorBehavior,
}

/// One slot of a class layout: a field descriptor with its flattened
/// position.
#[derive(Debug, Clone)]
pub(crate) struct LayoutSlot {
    pub name: NameId,
    pub kind: FieldKind,
    pub visibility: Visibility,
    /// The class that declared this field (an ancestor for inherited
    /// slots); used in messages.
    pub owner: ClassId,
    pub default: Option<Value>,
}

/// A registered class.
#[derive(Debug)]
pub(crate) struct ClassDef {
    pub name: NameId,
    pub parent: Option<ClassId>,
    /// Full ancestor chain layout, ancestor fields first, then own fields,
    /// each group in declaration order.
    pub layout: Vec<LayoutSlot>,
    pub constructors: Vec<Constructor>,
    pub cloneable: bool,
    pub statics: Vec<(NameId, Value)>,
}

impl ClassDef {
    /// Resolves a field name to its layout slot, preferring the
    /// most-derived declaration when ancestors shadow each other.
    pub fn slot_by_name(&self, name: NameId) -> Option<usize> {
        self.layout.iter().rposition(|slot| slot.name == name)
    }

    pub fn static_value(&self, name: NameId) -> Option<&Value> {
        self.statics
            .iter()
            .find(|(static_name, _)| *static_name == name)
            .map(|(_, value)| value)
    }

    pub fn static_value_mut(&mut self, name: NameId) -> Option<&mut Value> {
        self.statics
            .iter_mut()
            .find(|(static_name, _)| *static_name == name)
            .map(|(_, value)| value)
    }
}

/// An instance: a class id plus one value per layout slot.
#[derive(Debug, Clone)]
pub(crate) struct Instance {
    pub class: ClassId,
    pub slots: Vec<Value>,
}

impl Instance {
    pub fn estimate_bytes(&self) -> usize {
        size_of::<Self>() + size_of::<Value>() * self.slots.len()
    }
}

// ============================================================================
// Specs: the declaration builders
// ============================================================================

/// Declares one field of a class.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    visibility: Visibility,
    default: Option<Value>,
}

impl FieldSpec {
    /// A public field of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility: Visibility::Public,
            default: None,
        }
    }

    /// Marks the field private: the copy engine may only touch it under a
    /// policy that bypasses visibility.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Gives the field a declared initial value (leaf or null only),
    /// applied whenever a bare instance is allocated.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Declares one constructor parameter. For assigning constructors the name
/// must match a field of the class (or an ancestor); native constructors
/// use names only in messages.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    ty: ParamType,
}

impl ParamSpec {
    /// A parameter of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Declares one constructor.
#[derive(Debug, Clone)]
pub struct CtorSpec {
    visibility: Visibility,
    params: Vec<ParamSpec>,
    native: Option<NativeCtor>,
}

impl CtorSpec {
    /// A public zero-argument constructor producing a bare instance with
    /// field defaults applied.
    #[must_use]
    pub fn zero_arg() -> Self {
        Self {
            visibility: Visibility::Public,
            params: Vec::new(),
            native: None,
        }
    }

    /// A public assigning constructor: each argument is written to the
    /// field its parameter is named after.
    #[must_use]
    pub fn assigning(params: impl IntoIterator<Item = ParamSpec>) -> Self {
        Self {
            visibility: Visibility::Public,
            params: params.into_iter().collect(),
            native: None,
        }
    }

    /// A public native constructor with the given signature and body.
    #[must_use]
    pub fn native(params: impl IntoIterator<Item = ParamSpec>, body: NativeCtor) -> Self {
        Self {
            visibility: Visibility::Public,
            params: params.into_iter().collect(),
            native: Some(body),
        }
    }

    /// Marks the constructor private: the copy engine may only select it
    /// under a policy that allows non-public constructors.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }
}

/// Builder for declaring a class on a heap.
///
/// ```
/// use calque::{ClassSpec, CtorSpec, FieldKind, FieldSpec, Heap};
///
/// let mut heap = Heap::new();
/// let person = heap
///     .declare_class(
///         ClassSpec::new("Person")
///             .field(FieldSpec::new("name", FieldKind::Leaf))
///             .field(FieldSpec::new("age", FieldKind::Leaf))
///             .constructor(CtorSpec::zero_arg()),
///     )
///     .unwrap();
/// let dan = heap.new_bare_instance(person).unwrap();
/// assert!(heap.get_field(dan, "name").unwrap().is_undefined());
/// ```
#[derive(Debug, Clone)]
pub struct ClassSpec {
    name: String,
    parent: Option<ClassId>,
    fields: Vec<FieldSpec>,
    constructors: Vec<CtorSpec>,
    cloneable: bool,
    statics: Vec<(String, Value)>,
}

impl ClassSpec {
    /// Starts a spec for a class with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            constructors: Vec::new(),
            cloneable: false,
            statics: Vec::new(),
        }
    }

    /// Sets the parent class. Inherited fields come first in the layout.
    #[must_use]
    pub fn extends(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Adds a field after those already declared.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a constructor after those already declared. Declaration order
    /// breaks ties in the engine's fewest-parameters fallback.
    #[must_use]
    pub fn constructor(mut self, ctor: CtorSpec) -> Self {
        self.constructors.push(ctor);
        self
    }

    /// Declares the opaque clone capability: the engine may duplicate an
    /// existing instance's field table to obtain a shell.
    #[must_use]
    pub fn cloneable(mut self) -> Self {
        self.cloneable = true;
        self
    }

    /// Adds a static value (leaf or null only). Statics are per-class
    /// shared state and are never copied with instances.
    #[must_use]
    pub fn static_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.statics.push((name.into(), value));
        self
    }

    pub(crate) fn class_name(&self) -> &str {
        &self.name
    }

    pub(crate) fn parent_id(&self) -> Option<ClassId> {
        self.parent
    }
}

fn leaf_or_null(value: &Value) -> bool {
    value.is_leaf() || value.is_none()
}

/// Validates a spec and builds the [`ClassDef`], flattening the parent
/// layout into this class's. Called by the heap at registration.
pub(crate) fn build_class(
    spec: ClassSpec,
    id: ClassId,
    parent_layout: Option<Vec<LayoutSlot>>,
    names: &mut NameTable,
) -> ModelResult<ClassDef> {
    let bad = |message: String| ModelError::BadSpec {
        class: spec.name.clone(),
        message,
    };

    let mut layout = parent_layout.unwrap_or_default();
    let inherited = layout.len();
    for field in &spec.fields {
        if let Some(default) = &field.default
            && !leaf_or_null(default)
        {
            return Err(bad(format!(
                "default for field '{}' must be a leaf or null, got {}",
                field.name,
                default.kind_name()
            )));
        }
        let name = names.intern(&field.name);
        if layout[inherited..].iter().any(|slot| slot.name == name) {
            return Err(bad(format!("duplicate field '{}'", field.name)));
        }
        layout.push(LayoutSlot {
            name,
            kind: field.kind,
            visibility: field.visibility,
            owner: id,
            default: field.default.clone(),
        });
    }

    let mut constructors = Vec::with_capacity(spec.constructors.len());
    for ctor in &spec.constructors {
        let mut params = SmallVec::with_capacity(ctor.params.len());
        for param in &ctor.params {
            let name = names.intern(&param.name);
            let binds = if ctor.native.is_some() {
                None
            } else {
                // Assigning constructors must bind every parameter to a
                // field of matching kind; shadowed names resolve to the
                // most-derived slot.
                let slot = layout
                    .iter()
                    .rposition(|candidate| candidate.name == name)
                    .ok_or_else(|| {
                        bad(format!(
                            "constructor parameter '{}' does not name a field",
                            param.name
                        ))
                    })?;
                if !param.ty.compatible_field(layout[slot].kind) {
                    return Err(bad(format!(
                        "constructor parameter '{}' is {}, but the field is {}",
                        param.name,
                        param.ty.describe(),
                        layout[slot].kind.describe()
                    )));
                }
                Some(slot)
            };
            params.push(CtorParam {
                name,
                ty: param.ty,
                binds,
            });
        }
        constructors.push(Constructor {
            visibility: ctor.visibility,
            params,
            behavior: match ctor.native {
                Some(body) => CtorBehavior::Native(body),
                None => CtorBehavior::Assign,
            },
        });
    }

    let mut statics = Vec::with_capacity(spec.statics.len());
    for (static_name, value) in &spec.statics {
        if !leaf_or_null(value) {
            return Err(bad(format!(
                "static '{static_name}' must be a leaf or null, got {}",
                value.kind_name()
            )));
        }
        statics.push((names.intern(static_name), value.clone()));
    }

    Ok(ClassDef {
        name: names.intern(&spec.name),
        parent: spec.parent,
        layout,
        constructors,
        cloneable: spec.cloneable,
        statics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(spec: ClassSpec) -> ModelResult<ClassDef> {
        let mut names = NameTable::new();
        build_class(spec, ClassId(0), None, &mut names)
    }

    #[test]
    fn layout_follows_declaration_order() {
        let def = build(
            ClassSpec::new("Pair")
                .field(FieldSpec::new("first", FieldKind::Leaf))
                .field(FieldSpec::new("second", FieldKind::Reference)),
        )
        .unwrap();
        assert_eq!(def.layout.len(), 2);
        assert_eq!(def.layout[0].kind, FieldKind::Leaf);
        assert_eq!(def.layout[1].kind, FieldKind::Reference);
    }

    #[test]
    fn duplicate_field_rejected() {
        let err = build(
            ClassSpec::new("Dup")
                .field(FieldSpec::new("x", FieldKind::Leaf))
                .field(FieldSpec::new("x", FieldKind::Leaf)),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::BadSpec { .. }));
    }

    #[test]
    fn reference_default_rejected() {
        let err = build(ClassSpec::new("Bad").field(
            FieldSpec::new("x", FieldKind::Reference).with_default(Value::Ref(HeapId::from_index(0))),
        ))
        .unwrap_err();
        assert!(matches!(err, ModelError::BadSpec { .. }));
    }

    #[test]
    fn assigning_ctor_must_bind_fields() {
        let err = build(
            ClassSpec::new("Point")
                .field(FieldSpec::new("x", FieldKind::Leaf))
                .constructor(CtorSpec::assigning([ParamSpec::new(
                    "y",
                    ParamType::Scalar(ScalarKind::Int),
                )])),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::BadSpec { .. }));
    }

    #[test]
    fn assigning_ctor_kind_mismatch_rejected() {
        let err = build(
            ClassSpec::new("Point")
                .field(FieldSpec::new("x", FieldKind::Leaf))
                .constructor(CtorSpec::assigning([ParamSpec::new("x", ParamType::RefSeq)])),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::BadSpec { .. }));
    }

    #[test]
    fn shadowed_name_resolves_most_derived() {
        let mut names = NameTable::new();
        let parent = build_class(
            ClassSpec::new("Base").field(FieldSpec::new("x", FieldKind::Leaf)),
            ClassId(0),
            None,
            &mut names,
        )
        .unwrap();
        let child = build_class(
            ClassSpec::new("Child").field(FieldSpec::new("x", FieldKind::Reference)),
            ClassId(1),
            Some(parent.layout.clone()),
            &mut names,
        )
        .unwrap();
        let x = names.get("x").unwrap();
        // Both slots exist; lookup prefers the child's.
        assert_eq!(child.layout.len(), 2);
        assert_eq!(child.slot_by_name(x), Some(1));
    }
}
