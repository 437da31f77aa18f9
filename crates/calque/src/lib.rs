#![doc = include_str!("../../../README.md")]

mod array;
mod class;
mod copy;
mod error;
mod heap;
mod intern;
mod resource;
pub mod stdtypes;
pub mod tracer;
mod value;

pub use crate::{
    array::{RefArray, ScalarArray, ScalarKind},
    class::{
        ClassId, ClassSpec, CtorSpec, FieldKind, FieldSpec, NativeCtor, ParamSpec, ParamType,
    },
    copy::{
        ConstructionStrategy, CopyOutcome, CopyPolicy, CopyStats, deep_copy, deep_copy_traced,
        deep_copy_with,
    },
    error::{CopyError, CopyErrorKind, CopyResult, ModelError, ModelResult},
    heap::{Heap, HeapId, HeapStats},
    resource::{ResourceError, ResourceLimits},
    stdtypes::StdTypes,
    tracer::{CopyTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent},
    value::Value,
};
