//! rtgc is a stop-the-world mark-and-sweep garbage collector for a managed language runtime
//! compiled to native code. It owns a single contiguous heap region, allocates typed objects and
//! arrays into it, and reclaims unreachable objects by tracing roots obtained from the embedding
//! runtime's stack scanner.
//!
//! Logically, the crate is a handful of small, single-purpose pieces:
//! * [The object layout decoder](policy/object_layout/index.html): turns a record's `tag` into a
//!   class pointer and computes record sizes, including the array stride rules.
//! * [The free-chunk index](policy/free_list/struct.FreeChunkIndex.html): the allocator's
//!   size-sorted search structure over chunks discovered by the last sweep.
//! * [The mark-sweep plan](plan/mark_sweep/index.html): `clear_marks`, `mark`, and `sweep`, using
//!   an [explicit chunked traversal stack](util/chunked_stack/struct.ChunkedStack.html) rather
//!   than host-stack recursion.
//! * [The heap region](heap/region/struct.HeapRegion.html): the single contiguous byte span every
//!   record lives in.
//! * [`Heap`](heap/struct.Heap.html): the top-level handle bundling all of the above, and the
//!   allocation entry points an embedding mutator calls.
//!
//! What the collector does *not* do is out of scope by design: it does not enumerate stack roots
//! itself, it does not know the embedding language's class layouts beyond the
//! [`vm::ClassDescriptor`] contract, and it never moves a live object. See [`vm`] for the trait
//! boundary the embedding runtime implements.

#[macro_use]
extern crate log;

pub mod error;
pub mod heap;
pub mod plan;
pub mod policy;
pub mod util;
pub mod vm;

pub use error::{AllocationError, GcError};
pub use heap::{Heap, HeapConfig};
pub use vm::{ClassDescriptor, PrimitiveKind, RootScanning, RootSink, WellKnownClasses};
