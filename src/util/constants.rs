//! Layout constants shared across the collector.

/// Size in bytes of the word-sized fields (`tag`, `size`) that make up a record header.
pub const BYTES_IN_WORD: usize = 4;

/// Total byte size of a record header (`tag` + `size`).
pub const BYTES_IN_HEADER: usize = 2 * BYTES_IN_WORD;

/// Byte size of a native pointer field (e.g. the `element_class` slot of an array header).
pub const BYTES_IN_ADDRESS: usize = std::mem::size_of::<usize>();

/// `tag` value marking a record as a free chunk.
pub const EMPTY_TAG: i32 = 0;

/// `tag` value marking the sentinel record at the end of the heap.
pub const END_TAG: i32 = -1;

/// The top bit of the 32-bit tag, set while an object is reachable from the current mark phase.
pub const GC_MARK: i32 = 1 << 31;

/// Number of low bits reserved in a class-descriptor address so it can be shifted into a tag.
pub const TAG_SHIFT: u32 = 3;

/// Class descriptors (and therefore heap records holding a class tag) must be aligned to this
/// many bytes so the low [`TAG_SHIFT`] bits are free to be reconstructed as zero.
pub const CLASS_ALIGNMENT: usize = 1 << TAG_SHIFT;

/// Number of slots in a single frame of the chunked traversal stack.
pub const TRAVERSAL_STACK_FRAME_SLOTS: usize = 4096;

/// Default heap size: 16 MiB, matching the source runtime's compile-time constant.
pub const DEFAULT_HEAP_SIZE: usize = 16 * 1024 * 1024;

/// Environment variable consulted by [`crate::heap::HeapConfig::from_env`] to override the
/// default heap size for local testing.
pub const HEAP_SIZE_ENV_VAR: &str = "RTGC_HEAP_SIZE";

static_assertions::const_assert_eq!(BYTES_IN_HEADER, 8);
