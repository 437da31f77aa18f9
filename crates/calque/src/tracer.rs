//! Copy-pass tracing infrastructure.
//!
//! Provides a trait-based tracing system for the copy engine with zero-cost
//! abstraction. When using [`NoopTracer`], all trace methods compile away
//! entirely via monomorphization.
//!
//! # Architecture
//!
//! The [`CopyTracer`] trait defines hook points at key engine events (task
//! scheduling, ledger hits, shell construction, array copies). Concrete
//! implementations collect different kinds of data:
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable copy log to stderr |
//! | [`RecordingTracer`] | Full event recording for post-mortem analysis |
//!
//! # Usage
//!
//! The engine carries the tracer as a type parameter. Callers choose the
//! tracer per copy call:
//!
//! ```
//! use calque::{ClassSpec, CopyPolicy, CtorSpec, Heap, RecordingTracer, Value, deep_copy_traced};
//!
//! let mut heap = Heap::new();
//! let point = heap
//!     .declare_class(ClassSpec::new("Point").constructor(CtorSpec::zero_arg()))
//!     .unwrap();
//! let original = heap.new_bare_instance(point).unwrap();
//!
//! let mut tracer = RecordingTracer::new();
//! let policy = CopyPolicy::default();
//! deep_copy_traced(&mut heap, &Value::Ref(original), &policy, &mut tracer).unwrap();
//! assert!(tracer.event_count() > 0);
//! ```

use crate::copy::ConstructionStrategy;
use crate::heap::HeapId;

/// Trace event emitted during a copy pass.
///
/// Used by [`RecordingTracer`] to capture a full pass for post-mortem
/// analysis.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    /// A heap object was pushed onto the work stack.
    Scheduled {
        /// The original object to be copied.
        original: HeapId,
        /// Work stack depth after the push.
        pending: usize,
    },
    /// A reference resolved against an existing identity-ledger entry.
    LedgerHit {
        /// The original object.
        original: HeapId,
        /// Its previously made copy.
        copy: HeapId,
    },
    /// An instance shell was constructed for an original.
    ShellConstructed {
        /// Class of the instance.
        class_name: String,
        /// How the shell was built.
        strategy: ConstructionStrategy,
        /// The original instance.
        original: HeapId,
        /// The freshly built shell.
        copy: HeapId,
    },
    /// An array was copied (bulk for leaf arrays, element-wise for
    /// reference arrays).
    ArrayCopied {
        /// The original array.
        original: HeapId,
        /// Its copy.
        copy: HeapId,
        /// Element count.
        elements: usize,
        /// Whether this was a leaf array (copied in one move).
        leaf: bool,
    },
    /// A work task finished: the original's copy exists and is fully
    /// populated or, for reference arrays, scheduled for population.
    Resolved {
        /// The original object.
        original: HeapId,
        /// Its copy.
        copy: HeapId,
        /// Work stack depth after the pop.
        pending: usize,
    },
}

/// Trait for copy-pass tracing.
///
/// All methods have default no-op implementations, so [`NoopTracer`] requires
/// zero lines of code and compiles to zero instructions. Implementations only
/// override the hooks they care about.
///
/// The trait is designed for monomorphization: the engine carries the tracer
/// as a type parameter, so the compiler can inline and eliminate no-op calls
/// at compile time.
pub trait CopyTracer: std::fmt::Debug {
    /// Called when an object is pushed onto the work stack.
    ///
    /// This is the hottest hook on reference-heavy graphs; implementations
    /// should stay lightweight.
    ///
    /// # Arguments
    /// * `original` - The heap object scheduled for copying
    /// * `pending` - Work stack depth after the push
    #[inline(always)]
    fn on_scheduled(&mut self, _original: HeapId, _pending: usize) {}

    /// Called when a reference resolves against an existing ledger entry,
    /// either as a field or element edge is examined or when a popped task
    /// finds its original already copied.
    ///
    /// Every hit is one preserved share or one closed cycle.
    ///
    /// # Arguments
    /// * `original` - The heap object that was already copied
    /// * `copy` - The copy recorded in the ledger
    #[inline(always)]
    fn on_ledger_hit(&mut self, _original: HeapId, _copy: HeapId) {}

    /// Called after an instance shell is constructed, before its fields are
    /// populated.
    ///
    /// # Arguments
    /// * `class_name` - Class of the instance
    /// * `strategy` - The construction strategy that was committed to
    /// * `original` - The original instance
    /// * `copy` - The shell
    #[inline(always)]
    fn on_shell_constructed(
        &mut self,
        _class_name: &str,
        _strategy: ConstructionStrategy,
        _original: HeapId,
        _copy: HeapId,
    ) {
    }

    /// Called after an array copy is allocated.
    ///
    /// # Arguments
    /// * `original` - The original array
    /// * `copy` - Its copy
    /// * `elements` - Element count
    /// * `leaf` - True for a bulk leaf-array copy
    #[inline(always)]
    fn on_array_copied(&mut self, _original: HeapId, _copy: HeapId, _elements: usize, _leaf: bool) {
    }

    /// Called when a work task resolves.
    ///
    /// # Arguments
    /// * `original` - The original object
    /// * `copy` - Its copy
    /// * `pending` - Work stack depth after the pop
    #[inline(always)]
    fn on_resolved(&mut self, _original: HeapId, _copy: HeapId, _pending: usize) {}
}

// ============================================================================
// NoopTracer — zero-cost production default
// ============================================================================

/// A tracer that does nothing.
///
/// All trait methods use the default no-op implementations. Because the
/// engine carries the tracer as a type parameter, the compiler monomorphizes
/// the untraced path and inlines every hook to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl CopyTracer for NoopTracer {}

// ============================================================================
// StderrTracer — human-readable copy log
// ============================================================================

/// Tracer that prints a human-readable copy log to stderr.
///
/// Output format:
/// ```text
/// >>> SCHED #4              pending=1
///   +++ SHELL Person       #4 -> #9  (zero-argument constructor)
///   ... ARRAY              #5 -> #10 elements=2 leaf
///   <<< DONE               #4 -> #9  pending=0
/// ```
///
/// Useful for watching a copy unfold on a small graph; on large graphs use
/// [`RecordingTracer::with_limit`] instead.
#[derive(Debug)]
pub struct StderrTracer {
    /// Maximum number of lines to print before stopping (prevents runaway
    /// output on large graphs). None = unlimited.
    limit: Option<usize>,
    /// Number of lines printed so far.
    count: usize,
    /// Whether printing has stopped (hit the limit).
    stopped: bool,
}

impl StderrTracer {
    /// Creates a new stderr tracer with no line limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            limit: None,
            count: 0,
            stopped: false,
        }
    }

    /// Creates a new stderr tracer that stops after `limit` lines.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            count: 0,
            stopped: false,
        }
    }

    fn emit(&mut self, line: std::fmt::Arguments<'_>) {
        if self.stopped {
            return;
        }
        eprintln!("{line}");
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count >= limit
        {
            eprintln!("--- trace limit reached ({limit} lines) ---");
            self.stopped = true;
        }
    }
}

impl Default for StderrTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyTracer for StderrTracer {
    fn on_scheduled(&mut self, original: HeapId, pending: usize) {
        self.emit(format_args!(
            ">>> SCHED {original:?}              pending={pending}"
        ));
    }

    fn on_ledger_hit(&mut self, original: HeapId, copy: HeapId) {
        self.emit(format_args!(
            "  ~~~ HIT                {original:?} -> {copy:?}"
        ));
    }

    fn on_shell_constructed(
        &mut self,
        class_name: &str,
        strategy: ConstructionStrategy,
        original: HeapId,
        copy: HeapId,
    ) {
        self.emit(format_args!(
            "  +++ SHELL {class_name:<12} {original:?} -> {copy:?}  ({strategy})"
        ));
    }

    fn on_array_copied(&mut self, original: HeapId, copy: HeapId, elements: usize, leaf: bool) {
        let shape = if leaf { "leaf" } else { "ref" };
        self.emit(format_args!(
            "  ... ARRAY              {original:?} -> {copy:?} elements={elements} {shape}"
        ));
    }

    fn on_resolved(&mut self, original: HeapId, copy: HeapId, pending: usize) {
        self.emit(format_args!(
            "  <<< DONE               {original:?} -> {copy:?}  pending={pending}"
        ));
    }
}

// ============================================================================
// RecordingTracer — full event recording
// ============================================================================

/// Tracer that records all events for post-mortem analysis.
///
/// Captures every trace event into a `Vec<TraceEvent>`. This is the most
/// expensive tracer (allocates per event), so use it on small graphs or with
/// [`RecordingTracer::with_limit`].
///
/// After the copy, iterate [`events`](RecordingTracer::events) to
/// reconstruct the pass: scheduling order, which shares were resolved from
/// the ledger, and which construction strategy each class committed to.
#[derive(Debug)]
pub struct RecordingTracer {
    /// All recorded events in chronological order.
    events: Vec<TraceEvent>,
    /// Optional limit on number of events recorded.
    limit: Option<usize>,
}

impl RecordingTracer {
    /// Creates a new recording tracer with no event limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            limit: None,
        }
    }

    /// Creates a new recording tracer that stops recording after `limit`
    /// events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Consumes the tracer and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    /// Returns the number of events recorded.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the event limit has been reached.
    fn at_limit(&self) -> bool {
        self.limit.is_some_and(|l| self.events.len() >= l)
    }
}

impl Default for RecordingTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyTracer for RecordingTracer {
    #[inline]
    fn on_scheduled(&mut self, original: HeapId, pending: usize) {
        if self.at_limit() {
            return;
        }
        self.events.push(TraceEvent::Scheduled { original, pending });
    }

    fn on_ledger_hit(&mut self, original: HeapId, copy: HeapId) {
        if self.at_limit() {
            return;
        }
        self.events.push(TraceEvent::LedgerHit { original, copy });
    }

    fn on_shell_constructed(
        &mut self,
        class_name: &str,
        strategy: ConstructionStrategy,
        original: HeapId,
        copy: HeapId,
    ) {
        if self.at_limit() {
            return;
        }
        self.events.push(TraceEvent::ShellConstructed {
            class_name: class_name.to_owned(),
            strategy,
            original,
            copy,
        });
    }

    fn on_array_copied(&mut self, original: HeapId, copy: HeapId, elements: usize, leaf: bool) {
        if self.at_limit() {
            return;
        }
        self.events.push(TraceEvent::ArrayCopied {
            original,
            copy,
            elements,
            leaf,
        });
    }

    fn on_resolved(&mut self, original: HeapId, copy: HeapId, pending: usize) {
        if self.at_limit() {
            return;
        }
        self.events.push(TraceEvent::Resolved {
            original,
            copy,
            pending,
        });
    }
}
