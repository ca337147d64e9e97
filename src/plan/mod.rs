//! GC orchestration. A single plan lives here: stop-the-world mark-sweep. Concurrent,
//! incremental, and generational plans are explicit non-goals and have no counterpart.

pub mod mark_sweep;
