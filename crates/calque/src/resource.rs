//! Resource accounting for heap allocation.
//!
//! The heap carries a [`ResourceMeter`] configured from [`ResourceLimits`].
//! Every allocation is charged against the meter before the slot is
//! created; exceeding a configured limit surfaces as a [`ResourceError`].
//! The default is unlimited, which reduces the meter to two counters.
//!
//! During a copy, an allocation failure aborts the whole call as an
//! instantiation error (the shell or sequence could not be produced).

use std::{error::Error, fmt};

/// Depth cap for recursive structural rendering of values.
///
/// Rendering follows references and would otherwise recurse as deep as the
/// graph; past this depth the renderer emits an ellipsis instead.
pub(crate) const MAX_RENDER_DEPTH: usize = 64;

/// An allocation was rejected by the heap's resource meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    /// The configured object-count limit was reached.
    ObjectLimitExceeded {
        /// The configured limit.
        limit: usize,
    },
    /// The configured memory limit would be exceeded.
    MemoryLimitExceeded {
        /// The configured limit in bytes.
        limit: usize,
        /// Approximate size of the rejected allocation.
        requested: usize,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectLimitExceeded { limit } => {
                write!(f, "object limit exceeded: {limit} objects allocated")
            }
            Self::MemoryLimitExceeded { limit, requested } => {
                write!(
                    f,
                    "memory limit of {limit} bytes exceeded by allocation of {requested} bytes"
                )
            }
        }
    }
}

impl Error for ResourceError {}

/// Limits applied to heap allocation. Unset means unlimited.
///
/// ```
/// use calque::{Heap, ResourceLimits};
///
/// let heap = Heap::with_limits(ResourceLimits::none().with_max_objects(10_000));
/// assert_eq!(heap.stats().live_objects, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    max_objects: Option<usize>,
    max_memory_bytes: Option<usize>,
}

impl ResourceLimits {
    /// No limits at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_objects: None,
            max_memory_bytes: None,
        }
    }

    /// Caps the number of live heap objects.
    #[must_use]
    pub const fn with_max_objects(mut self, limit: usize) -> Self {
        self.max_objects = Some(limit);
        self
    }

    /// Caps the approximate total bytes held by heap objects.
    #[must_use]
    pub const fn with_max_memory_bytes(mut self, limit: usize) -> Self {
        self.max_memory_bytes = Some(limit);
        self
    }
}

/// Allocation counters plus limit enforcement, embedded in the heap.
#[derive(Debug, Default)]
pub(crate) struct ResourceMeter {
    limits: ResourceLimits,
    allocation_count: usize,
    live_bytes: usize,
}

impl ResourceMeter {
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            allocation_count: 0,
            live_bytes: 0,
        }
    }

    /// Charges one allocation of approximately `bytes` bytes.
    pub fn on_allocate(&mut self, bytes: usize) -> Result<(), ResourceError> {
        if let Some(limit) = self.limits.max_objects
            && self.allocation_count >= limit
        {
            return Err(ResourceError::ObjectLimitExceeded { limit });
        }
        if let Some(limit) = self.limits.max_memory_bytes
            && self.live_bytes.saturating_add(bytes) > limit
        {
            return Err(ResourceError::MemoryLimitExceeded {
                limit,
                requested: bytes,
            });
        }
        self.allocation_count += 1;
        self.live_bytes += bytes;
        Ok(())
    }

    pub fn allocation_count(&self) -> usize {
        self.allocation_count
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }
}
