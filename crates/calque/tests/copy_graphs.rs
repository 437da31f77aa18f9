//! Structural tests for whole-graph copying.
//!
//! Each test builds an object graph by hand, copies it, and checks the two
//! halves of the contract: the copy is structurally identical to the
//! original (sharing and cycles reproduced exactly), and the two graphs are
//! fully disconnected (no mutation on either side shows through the other).

use std::collections::HashSet;

use calque::{
    ClassId, ClassSpec, CopyPolicy, CtorSpec, FieldKind, FieldSpec, Heap, HeapId, ScalarArray,
    ScalarKind, Value, deep_copy, deep_copy_with,
};
use pretty_assertions::assert_eq;

/// `Person` from the README: two leaves and a string-array reference.
fn declare_person(heap: &mut Heap) -> ClassId {
    heap.declare_class(
        ClassSpec::new("Person")
            .field(FieldSpec::new("name", FieldKind::Leaf))
            .field(FieldSpec::new("age", FieldKind::Leaf))
            .field(FieldSpec::new("cities", FieldKind::LeafSeq(ScalarKind::Str)))
            .constructor(CtorSpec::zero_arg()),
    )
    .unwrap()
}

fn new_person(heap: &mut Heap, class: ClassId, name: &str, age: i64, cities: &[&str]) -> HeapId {
    let cities = heap
        .alloc_leaf_array(ScalarArray::Str(cities.iter().map(|&c| c.into()).collect()))
        .unwrap();
    let person = heap.new_bare_instance(class).unwrap();
    heap.set_field(person, "name", Value::str(name)).unwrap();
    heap.set_field(person, "age", Value::Int(age)).unwrap();
    heap.set_field(person, "cities", Value::Ref(cities)).unwrap();
    person
}

/// A linked-list node: one leaf, one untyped reference.
fn declare_node(heap: &mut Heap) -> ClassId {
    heap.declare_class(
        ClassSpec::new("Node")
            .field(FieldSpec::new("value", FieldKind::Leaf))
            .field(FieldSpec::new("next", FieldKind::Reference))
            .constructor(CtorSpec::zero_arg()),
    )
    .unwrap()
}

fn ref_id(value: &Value) -> HeapId {
    value.as_ref_id().expect("expected a reference value")
}

fn field_ref(heap: &Heap, obj: HeapId, name: &str) -> HeapId {
    ref_id(&heap.get_field(obj, name).unwrap())
}

// =============================================================================
// 1. Fidelity and disconnection
// =============================================================================

/// The flagship scenario: a copied Person is equal but fully disconnected.
#[test]
fn person_copy_is_equal_and_disconnected() {
    let mut heap = Heap::new();
    let class = declare_person(&mut heap);
    let dan = new_person(&mut heap, class, "Dan", 29, &["Dublin", "New York"]);

    let copy = ref_id(&deep_copy(&mut heap, &Value::Ref(dan)).unwrap());
    assert_ne!(copy, dan, "the copy must be a distinct object");
    assert!(heap.deep_eq(&Value::Ref(dan), &Value::Ref(copy)));
    assert_ne!(
        field_ref(&heap, copy, "cities"),
        field_ref(&heap, dan, "cities"),
        "the cities array must be copied, not shared"
    );

    // Mutate the original: the copy must not move.
    heap.set_field(dan, "name", Value::str("Dave")).unwrap();
    let cities = field_ref(&heap, dan, "cities");
    heap.leaf_array_set(cities, 0, &Value::str("Berlin")).unwrap();
    assert_eq!(heap.get_field(copy, "name").unwrap().as_str(), Some("Dan"));
    let copied_cities = heap.leaf_array(field_ref(&heap, copy, "cities")).unwrap();
    assert_eq!(copied_cities.get(0).unwrap().as_str(), Some("Dublin"));

    // And the other direction.
    heap.set_field(copy, "age", Value::Int(30)).unwrap();
    assert_eq!(heap.get_field(dan, "age").unwrap().as_int(), Some(29));
}

/// A leaf array as the copy root gets a fresh, independent array.
#[test]
fn leaf_array_root() {
    let mut heap = Heap::new();
    let original = heap
        .alloc_leaf_array(ScalarArray::Int(vec![1, 2, 3]))
        .unwrap();
    let copy = ref_id(&deep_copy(&mut heap, &Value::Ref(original)).unwrap());
    assert_ne!(copy, original);
    assert!(heap.deep_eq(&Value::Ref(original), &Value::Ref(copy)));
    heap.leaf_array_set(original, 1, &Value::Int(99)).unwrap();
    assert_eq!(heap.leaf_array(copy).unwrap().get(1).unwrap().as_int(), Some(2));
}

/// A mixed reference array as the copy root: leaves and nulls in place,
/// references copied.
#[test]
fn ref_array_root_with_mixed_elements() {
    let mut heap = Heap::new();
    let class = declare_node(&mut heap);
    let node = heap.new_bare_instance(class).unwrap();
    heap.set_field(node, "value", Value::Int(5)).unwrap();
    let original = heap
        .alloc_ref_array(vec![
            Value::Int(1),
            Value::None,
            Value::str("text"),
            Value::Ref(node),
        ])
        .unwrap();

    let copy = ref_id(&deep_copy(&mut heap, &Value::Ref(original)).unwrap());
    assert_ne!(copy, original);
    assert_eq!(heap.ref_array_get(copy, 0).unwrap().as_int(), Some(1));
    assert!(heap.ref_array_get(copy, 1).unwrap().is_none());
    assert_eq!(heap.ref_array_get(copy, 2).unwrap().as_str(), Some("text"));
    let copied_node = ref_id(&heap.ref_array_get(copy, 3).unwrap());
    assert_ne!(copied_node, node, "the element object must be copied");
    assert_eq!(heap.get_field(copied_node, "value").unwrap().as_int(), Some(5));
}

/// Inherited fields are copied across the whole ancestor chain, including
/// a shadowed base slot that name lookup cannot reach.
#[test]
fn inherited_and_shadowed_fields_are_copied() {
    let mut heap = Heap::new();
    let base = heap
        .declare_class(
            ClassSpec::new("Base")
                .field(FieldSpec::new("tag", FieldKind::Leaf).with_default(Value::Int(1))),
        )
        .unwrap();
    let child = heap
        .declare_class(
            ClassSpec::new("Child")
                .extends(base)
                .field(FieldSpec::new("tag", FieldKind::Leaf).with_default(Value::Int(2)))
                .constructor(CtorSpec::zero_arg()),
        )
        .unwrap();

    let original = heap.new_bare_instance(child).unwrap();
    heap.set_field_at(original, 0, Value::Int(7)).unwrap();
    heap.set_field(original, "tag", Value::Int(99)).unwrap();

    let copy = ref_id(&deep_copy(&mut heap, &Value::Ref(original)).unwrap());
    assert_eq!(heap.layout_len(child), 2);
    assert_eq!(
        heap.field_at(copy, 0).unwrap().as_int(),
        Some(7),
        "the shadowed Base.tag slot must carry the mutated value, not the default"
    );
    assert_eq!(heap.field_at(copy, 1).unwrap().as_int(), Some(99));
    assert_eq!(heap.get_field(copy, "tag").unwrap().as_int(), Some(99));
}

// =============================================================================
// 2. Identity preservation
// =============================================================================

/// Diamond sharing: two fields aliasing one object alias one copy.
#[test]
fn shared_object_is_copied_once() {
    let mut heap = Heap::new();
    let class = declare_node(&mut heap);
    let shared = heap.new_bare_instance(class).unwrap();
    let holder = heap
        .declare_class(
            ClassSpec::new("Holder")
                .field(FieldSpec::new("a", FieldKind::Reference))
                .field(FieldSpec::new("b", FieldKind::Reference))
                .constructor(CtorSpec::zero_arg()),
        )
        .unwrap();
    let root = heap.new_bare_instance(holder).unwrap();
    heap.set_field(root, "a", Value::Ref(shared)).unwrap();
    heap.set_field(root, "b", Value::Ref(shared)).unwrap();

    let outcome = deep_copy_with(&mut heap, &Value::Ref(root), &CopyPolicy::default()).unwrap();
    let copy = ref_id(&outcome.value);
    let a = field_ref(&heap, copy, "a");
    let b = field_ref(&heap, copy, "b");
    assert_eq!(a, b, "both fields must alias the one copy");
    assert_ne!(a, shared);
    assert_eq!(outcome.stats.ledger_hits, 1, "the second edge is a ledger hit");
    assert_eq!(outcome.stats.objects_copied, 2);
}

/// A shared leaf array keeps its shared-ness in the copy: one new array,
/// two references to it.
#[test]
fn shared_leaf_array_is_copied_once() {
    let mut heap = Heap::new();
    let class = declare_person(&mut heap);
    let cities = heap
        .alloc_leaf_array(ScalarArray::Str(vec!["Oslo".into()]))
        .unwrap();
    let first = heap.new_bare_instance(class).unwrap();
    let second = heap.new_bare_instance(class).unwrap();
    heap.set_field(first, "cities", Value::Ref(cities)).unwrap();
    heap.set_field(second, "cities", Value::Ref(cities)).unwrap();
    let pair = heap
        .alloc_ref_array(vec![Value::Ref(first), Value::Ref(second)])
        .unwrap();

    let copy = ref_id(&deep_copy(&mut heap, &Value::Ref(pair)).unwrap());
    let first_copy = ref_id(&heap.ref_array_get(copy, 0).unwrap());
    let second_copy = ref_id(&heap.ref_array_get(copy, 1).unwrap());
    let first_cities = field_ref(&heap, first_copy, "cities");
    let second_cities = field_ref(&heap, second_copy, "cities");
    assert_eq!(first_cities, second_cities);
    assert_ne!(first_cities, cities);
}

/// The same object three times in one array: one copy, three references,
/// two ledger hits.
#[test]
fn repeated_array_element_preserves_identity() {
    let mut heap = Heap::new();
    let class = declare_node(&mut heap);
    let node = heap.new_bare_instance(class).unwrap();
    let array = heap
        .alloc_ref_array(vec![Value::Ref(node), Value::Ref(node), Value::Ref(node)])
        .unwrap();

    let outcome = deep_copy_with(&mut heap, &Value::Ref(array), &CopyPolicy::default()).unwrap();
    let copy = ref_id(&outcome.value);
    let first = ref_id(&heap.ref_array_get(copy, 0).unwrap());
    for index in 1..3 {
        assert_eq!(ref_id(&heap.ref_array_get(copy, index).unwrap()), first);
    }
    assert_ne!(first, node);
    assert_eq!(outcome.stats.ledger_hits, 2);
}

/// Copies made by different calls never alias: the ledger is per call.
#[test]
fn separate_calls_produce_disjoint_copies() {
    let mut heap = Heap::new();
    let class = declare_node(&mut heap);
    let original = heap.new_bare_instance(class).unwrap();
    heap.set_field(original, "value", Value::Int(1)).unwrap();

    let first = ref_id(&deep_copy(&mut heap, &Value::Ref(original)).unwrap());
    let second = ref_id(&deep_copy(&mut heap, &Value::Ref(original)).unwrap());
    assert_ne!(first, second);
    heap.set_field(first, "value", Value::Int(2)).unwrap();
    assert_eq!(heap.get_field(second, "value").unwrap().as_int(), Some(1));
}

// =============================================================================
// 3. Cycles
// =============================================================================

/// A two-node cycle closes onto the copies, not the originals.
#[test]
fn two_node_cycle() {
    let mut heap = Heap::new();
    let class = declare_node(&mut heap);
    let a = heap.new_bare_instance(class).unwrap();
    let b = heap.new_bare_instance(class).unwrap();
    heap.set_field(a, "next", Value::Ref(b)).unwrap();
    heap.set_field(b, "next", Value::Ref(a)).unwrap();

    let copy_a = ref_id(&deep_copy(&mut heap, &Value::Ref(a)).unwrap());
    let copy_b = field_ref(&heap, copy_a, "next");
    assert_ne!(copy_a, a);
    assert_ne!(copy_b, b);
    assert_eq!(
        field_ref(&heap, copy_b, "next"),
        copy_a,
        "the cycle must close onto the copied node"
    );
    assert!(heap.deep_eq(&Value::Ref(a), &Value::Ref(copy_a)));
}

/// A self-referencing node maps onto a self-referencing copy.
#[test]
fn self_cycle() {
    let mut heap = Heap::new();
    let class = declare_node(&mut heap);
    let a = heap.new_bare_instance(class).unwrap();
    heap.set_field(a, "next", Value::Ref(a)).unwrap();

    let copy = ref_id(&deep_copy(&mut heap, &Value::Ref(a)).unwrap());
    assert_ne!(copy, a);
    assert_eq!(field_ref(&heap, copy, "next"), copy);
}

/// A cycle that runs through a reference array is reproduced through the
/// copied array.
#[test]
fn cycle_through_an_array() {
    let mut heap = Heap::new();
    let class = declare_node(&mut heap);
    let node = heap.new_bare_instance(class).unwrap();
    let array = heap.alloc_ref_array(vec![Value::Ref(node)]).unwrap();
    heap.set_field(node, "next", Value::Ref(array)).unwrap();

    let copied_array = ref_id(&deep_copy(&mut heap, &Value::Ref(array)).unwrap());
    let copied_node = ref_id(&heap.ref_array_get(copied_array, 0).unwrap());
    assert_ne!(copied_array, array);
    assert_ne!(copied_node, node);
    assert_eq!(field_ref(&heap, copied_node, "next"), copied_array);
}

// =============================================================================
// 4. Depth and stats
// =============================================================================

/// A 10,000-node chain copies without recursion and without touching any
/// original node.
#[test]
fn deep_chain_copies_iteratively() {
    const LEN: usize = 10_000;
    let mut heap = Heap::new();
    let class = declare_node(&mut heap);
    let mut next = Value::None;
    let mut originals = HashSet::new();
    for value in (0..LEN).rev() {
        let node = heap.new_bare_instance(class).unwrap();
        heap.set_field(node, "value", Value::Int(i64::try_from(value).unwrap()))
            .unwrap();
        heap.set_field(node, "next", next).unwrap();
        originals.insert(node);
        next = Value::Ref(node);
    }

    let outcome = deep_copy_with(&mut heap, &next, &CopyPolicy::default()).unwrap();
    let mut cursor = outcome.value.clone();
    let mut walked = 0usize;
    while let Some(id) = cursor.as_ref_id() {
        assert!(
            !originals.contains(&id),
            "copy must not reference any original node"
        );
        assert_eq!(
            heap.get_field(id, "value").unwrap().as_int(),
            Some(i64::try_from(walked).unwrap())
        );
        walked += 1;
        cursor = heap.get_field(id, "next").unwrap();
    }
    assert_eq!(walked, LEN);
    assert_eq!(outcome.stats.objects_copied, LEN);
    assert_eq!(outcome.stats.ledger_hits, 0);
}

/// Pass counters for a small graph are exact.
#[test]
fn stats_count_one_person() {
    let mut heap = Heap::new();
    let class = declare_person(&mut heap);
    let dan = new_person(&mut heap, class, "Dan", 29, &["Dublin", "New York"]);

    let outcome = deep_copy_with(&mut heap, &Value::Ref(dan), &CopyPolicy::default()).unwrap();
    let stats = &outcome.stats;
    assert_eq!(stats.tasks_processed, 2, "the person and its cities array");
    assert_eq!(stats.ledger_hits, 0);
    assert_eq!(stats.objects_copied, 2);
    assert_eq!(stats.leaf_arrays_copied, 1);
    assert_eq!(stats.ref_arrays_copied, 0);
    assert_eq!(stats.copies_by_class.get("Person"), Some(&1));
}
