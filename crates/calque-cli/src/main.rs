use std::{
    env,
    process::ExitCode,
    time::{Duration, Instant},
};

use calque::{
    ClassSpec, CopyPolicy, CopyStats, CtorSpec, FieldKind, FieldSpec, Heap, ScalarArray,
    ScalarKind, StdTypes, StderrTracer, Value, deep_copy_traced, deep_copy_with,
};

const DEFAULT_CHAIN_LEN: usize = 100_000;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let chain_len = match parse_chain_len(&args) {
        Ok(n) => n,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("usage: calque [chain-length]");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = run(chain_len) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn parse_chain_len(args: &[String]) -> Result<usize, String> {
    let Some(raw) = args.get(1) else {
        return Ok(DEFAULT_CHAIN_LEN);
    };
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err("chain length must be at least 1".to_owned()),
        Err(err) => Err(format!("bad chain length '{raw}': {err}")),
    }
}

fn run(chain_len: usize) -> Result<(), Box<dyn std::error::Error>> {
    demo_person()?;
    demo_shared_set()?;
    demo_chain(chain_len)?;
    Ok(())
}

/// Copies a small instance graph with a stderr trace of the pass, and shows
/// that mutations on the original never show through the copy.
fn demo_person() -> Result<(), Box<dyn std::error::Error>> {
    println!("== person graph ==");
    let mut heap = Heap::new();
    let person = heap.declare_class(
        ClassSpec::new("Person")
            .field(FieldSpec::new("name", FieldKind::Leaf))
            .field(FieldSpec::new("age", FieldKind::Leaf))
            .field(FieldSpec::new("cities", FieldKind::LeafSeq(ScalarKind::Str)))
            .constructor(CtorSpec::zero_arg()),
    )?;
    let cities =
        heap.alloc_leaf_array(ScalarArray::Str(vec!["Dublin".into(), "New York".into()]))?;
    let dan = heap.new_bare_instance(person)?;
    heap.set_field(dan, "name", Value::str("Dan"))?;
    heap.set_field(dan, "age", Value::Int(29))?;
    heap.set_field(dan, "cities", Value::Ref(cities))?;

    let mut tracer = StderrTracer::new();
    let start = Instant::now();
    let outcome =
        deep_copy_traced(&mut heap, &Value::Ref(dan), &CopyPolicy::default(), &mut tracer)?;
    let elapsed = start.elapsed();

    println!("original: {}", heap.render(&Value::Ref(dan)));
    println!("copy:     {}", heap.render(&outcome.value));

    heap.set_field(dan, "age", Value::Int(30))?;
    heap.leaf_array_set(cities, 0, &Value::str("Berlin"))?;
    println!("after mutating the original:");
    println!("original: {}", heap.render(&Value::Ref(dan)));
    println!("copy:     {}", heap.render(&outcome.value));

    print_stats(&outcome.stats, elapsed);
    Ok(())
}

/// Copies a `Set` of boxed floats. Membership is by box identity, so the
/// copy holds its own boxes and an equal-looking box is a new member.
fn demo_shared_set() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n== boxed-numbers set ==");
    let mut heap = Heap::new();
    let types = StdTypes::install(&mut heap)?;
    let set = types.set_new(&mut heap)?;
    for number in [100.1, 200.1, 300.1] {
        let boxed = types.box_new(&mut heap, Value::Float(number))?;
        types.set_add(&mut heap, set, Value::Ref(boxed))?;
    }

    let start = Instant::now();
    let outcome = deep_copy_with(&mut heap, &Value::Ref(set), &CopyPolicy::default())?;
    let elapsed = start.elapsed();
    let copy = outcome
        .value
        .as_ref_id()
        .ok_or("copy of a reference must be a reference")?;

    let another = types.box_new(&mut heap, Value::Float(200.1))?;
    types.set_add(&mut heap, copy, Value::Ref(another))?;
    println!("original size: {}", types.set_len(&heap, set)?);
    println!(
        "copy size after adding a second Box(200.1): {}",
        types.set_len(&heap, copy)?
    );

    print_stats(&outcome.stats, elapsed);
    Ok(())
}

/// Copies a long singly linked chain. The engine works through an explicit
/// stack, so this runs at any length without exhausting the call stack.
fn demo_chain(len: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n== {len}-node chain ==");
    let mut heap = Heap::new();
    let node = heap.declare_class(
        ClassSpec::new("Node")
            .field(FieldSpec::new("value", FieldKind::Leaf))
            .field(FieldSpec::new("next", FieldKind::Reference))
            .constructor(CtorSpec::zero_arg()),
    )?;

    let mut next = Value::None;
    let mut head = None;
    for i in (0..len).rev() {
        let n = heap.new_bare_instance(node)?;
        heap.set_field(n, "value", Value::Int(i64::try_from(i).unwrap_or(i64::MAX)))?;
        heap.set_field(n, "next", next)?;
        next = Value::Ref(n);
        head = Some(n);
    }
    let head = head.ok_or("chain must have at least one node")?;

    let start = Instant::now();
    let outcome = deep_copy_with(&mut heap, &Value::Ref(head), &CopyPolicy::default())?;
    let elapsed = start.elapsed();

    print_stats(&outcome.stats, elapsed);
    Ok(())
}

fn print_stats(stats: &CopyStats, elapsed: Duration) {
    println!(
        "pass: {} tasks, {} objects copied, {} ledger hits, {} leaf arrays, {} ref arrays in {elapsed:?}",
        stats.tasks_processed,
        stats.objects_copied,
        stats.ledger_hits,
        stats.leaf_arrays_copied,
        stats.ref_arrays_copied
    );
    for (class, count) in &stats.copies_by_class {
        println!("  {class}: {count}");
    }
}
