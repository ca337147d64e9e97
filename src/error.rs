//! Error types surfaced while acquiring memory or decoding heap records.
//!
//! None of these are meant to be *handled* by the mutator: the source runtime this collector is
//! ported from has no exception channel a GC can raise into, so a `GcError` reaching a public
//! entry point always ends in a logged diagnostic followed by [`std::process::abort`]. The type
//! exists so the internal plumbing (free-list search, tag decoding, traversal stack) can use
//! ordinary `Result`-based control flow instead of aborting from deep inside a helper.

use std::fmt;

/// The specific way an allocation attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationError {
    /// No free chunk large enough was found, even after a full collection.
    HeapExhausted { requested: usize },
    /// A record's `tag` decoded to neither `EMPTY`, `END`, nor a plausible class-descriptor
    /// address. This indicates heap corruption or a mutator bug; the source C has no check for
    /// it at all (undefined behaviour), so we treat it as fatal rather than silently coping.
    MalformedTag { tag: i32 },
    /// The traversal stack could not be extended with a new frame.
    TraversalStackExhausted,
    /// An array's `element_class` slot did not match any of the runtime's distinguished
    /// primitive-array class descriptors.
    UnknownElementClass { class_addr: usize },
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationError::HeapExhausted { requested } => {
                write!(f, "heap exhausted: could not satisfy a {requested}-byte allocation")
            }
            AllocationError::MalformedTag { tag } => {
                write!(f, "malformed object tag: {tag:#x} is not EMPTY, END, or a valid class pointer")
            }
            AllocationError::TraversalStackExhausted => {
                write!(f, "could not grow the GC traversal stack")
            }
            AllocationError::UnknownElementClass { class_addr } => {
                write!(f, "array element class {class_addr:#x} is not a recognised primitive array class")
            }
        }
    }
}

/// Top-level error type for fallible internal collector operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcError(pub AllocationError);

impl fmt::Display for GcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for GcError {}

impl From<AllocationError> for GcError {
    fn from(e: AllocationError) -> Self {
        GcError(e)
    }
}

/// Log `err` at `error` level and abort the process.
///
/// This is the collector's only error "handling" strategy, matching the source runtime's
/// `printf("Out of memory\n"); exit(2);`: the mutator has no recovery path, so we terminate
/// immediately rather than return a value whose failure mode nobody checks.
pub(crate) fn fatal(err: GcError) -> ! {
    error!("rtgc: unrecoverable allocator error: {err}");
    std::process::abort()
}
