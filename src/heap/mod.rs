//! The top-level collector handle: bundles the heap region, the free-chunk index, and the
//! runtime's class/root contract, and exposes the allocation entry points the mutator calls.
//!
//! A `Heap` is a single process-wide collector instance: it is not `Sync`, and callers must not
//! share one across mutator threads without adding a safepoint mechanism of their own.

pub mod region;

use crate::error::{fatal, AllocationError, GcError};
use crate::plan::mark_sweep;
use crate::policy::free_list::FreeChunkIndex;
use crate::policy::object_layout::{
    array_total_size, class_ptr_from_tag, read_header, tag_for_class, write_header,
    RecordHeader, ARRAY_HEADER_SIZE,
};
use crate::util::address::Address;
use crate::util::constants::{
    BYTES_IN_ADDRESS, CLASS_ALIGNMENT, DEFAULT_HEAP_SIZE, EMPTY_TAG, HEAP_SIZE_ENV_VAR,
};
use crate::vm::{ClassDescriptor, PrimitiveKind, RootScanning, WellKnownClasses};
use region::HeapRegion;

/// Configuration consulted when constructing a [`Heap`].
#[derive(Clone, Copy, Debug)]
pub struct HeapConfig {
    pub heap_size: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig {
            heap_size: DEFAULT_HEAP_SIZE,
        }
    }
}

impl HeapConfig {
    /// Build a config from defaults, optionally overridden by the `RTGC_HEAP_SIZE`
    /// environment variable (bytes). Intended for tests that want a small heap to force
    /// collections deterministically; embedders are free to construct [`HeapConfig`] directly
    /// instead.
    pub fn from_env() -> Self {
        let heap_size = std::env::var(HEAP_SIZE_ENV_VAR)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_HEAP_SIZE);
        HeapConfig { heap_size }
    }
}

/// The collector. Parameterized over the runtime's [`RootScanning`] implementation, so the whole
/// embedding contract is resolved statically rather than through dynamic dispatch.
pub struct Heap<R: RootScanning> {
    region: HeapRegion,
    free_list: FreeChunkIndex,
    classes: WellKnownClasses,
    scanner: R,
}

impl<R: RootScanning> Heap<R> {
    pub fn new(config: HeapConfig, classes: WellKnownClasses, scanner: R) -> Self {
        crate::util::logger::try_init();
        let region = HeapRegion::new(config.heap_size);
        let mut free_list = FreeChunkIndex::new();
        // The fresh region is already laid out as a single free chunk (see `HeapRegion::new`);
        // seed the index with it directly so the very first allocation doesn't have to force a
        // no-op collection just to discover what the region constructor already knows.
        unsafe { free_list.rebuild(vec![region.base()]) };
        Heap {
            region,
            free_list,
            classes,
            scanner,
        }
    }

    pub fn region(&self) -> &HeapRegion {
        &self.region
    }

    pub fn free_list(&self) -> &FreeChunkIndex {
        &self.free_list
    }

    /// The embedding runtime's root scanner, as supplied to [`Heap::new`].
    pub fn scanner(&self) -> &R {
        &self.scanner
    }

    /// The well-known class addresses, as supplied to [`Heap::new`].
    pub fn classes(&self) -> &WellKnownClasses {
        &self.classes
    }

    /// Run a full collection cycle unconditionally (clear marks, trace, sweep), rebuilding the
    /// free-chunk index from the result.
    pub fn collect_garbage(&mut self) -> Result<(), GcError> {
        trace!("rtgc: starting collection");
        let chunks = mark_sweep::collect_garbage(&self.region, &self.classes, &self.scanner)?;
        unsafe { self.free_list.rebuild(chunks) };
        trace!(
            "rtgc: collection done, {} free chunks",
            self.free_list.len()
        );
        Ok(())
    }

    /// Try the free-chunk index; on miss, collect and retry once; a second miss is fatal.
    fn get_available_chunk(&mut self, n: usize) -> Result<Address, GcError> {
        if let Some(chunk) = unsafe { self.free_list.find_available_chunk(n) } {
            return Ok(chunk);
        }
        warn!("rtgc: allocation of {n} bytes missed the free list; collecting");
        self.collect_garbage()?;
        unsafe { self.free_list.find_available_chunk(n) }
            .ok_or(GcError(AllocationError::HeapExhausted { requested: n }))
    }

    /// Allocate and zero a scalar object of the class encoded by `tag`.
    ///
    /// Aborts the process on out-of-memory or a malformed tag: the mutator has no recovery path
    /// for either.
    pub fn alloc(&mut self, tag: i32) -> *mut u8 {
        match self.try_alloc(tag) {
            Ok(ptr) => ptr,
            Err(e) => fatal(e),
        }
    }

    fn try_alloc(&mut self, tag: i32) -> Result<*mut u8, GcError> {
        let class_ptr = class_ptr_from_tag(tag);
        if class_ptr.is_zero() || !class_ptr.is_aligned_to(CLASS_ALIGNMENT) {
            return Err(GcError(AllocationError::MalformedTag { tag }));
        }
        let size = unsafe { &*class_ptr.to_ptr::<ClassDescriptor>() }.byte_size as usize;

        let chunk = self.get_available_chunk(size)?;
        let chunk_size = unsafe { read_header(chunk) }.size as usize;
        unsafe {
            if chunk_size > size {
                let remainder = chunk + size;
                write_header(remainder, EMPTY_TAG, (chunk_size - size) as i32);
                self.free_list.insert(remainder);
            }
            self.region.zero(chunk, size);
            write_header(chunk, tag, 0);
        }
        debug!("rtgc: alloc tag={tag:#x} size={size} -> {chunk}");
        Ok(chunk.to_mut_ptr())
    }

    /// `objectArrayAlloc` / the typed `*ArrayAlloc` wrappers: allocate an array of `length`
    /// elements of `stride` bytes each, tagged with the general Array class and carrying
    /// `element_class`/`depth` metadata.
    fn array_alloc(
        &mut self,
        element_class: Address,
        depth: u8,
        length: i32,
        stride: usize,
    ) -> Result<*mut u8, GcError> {
        let element_count = length.max(0) as usize;
        let total = array_total_size(element_count, stride);

        let chunk = self.get_available_chunk(total)?;
        let chunk_size = unsafe { read_header(chunk) }.size as usize;
        unsafe {
            if chunk_size > total {
                let remainder = chunk + total;
                write_header(remainder, EMPTY_TAG, (chunk_size - total) as i32);
                self.free_list.insert(remainder);
            }
            self.region.zero(chunk, total);
            write_header(chunk, tag_for_class(self.classes.array, false), length);
            (chunk + std::mem::size_of::<RecordHeader>()).store(element_class);
            (chunk + ARRAY_HEADER_SIZE).store::<u8>(depth);
        }
        debug!("rtgc: array_alloc length={length} stride={stride} -> {chunk}");
        Ok(chunk.to_mut_ptr())
    }

    /// `objectArrayAlloc(elementClassTag, depth, length)`: a reference array whose elements are
    /// themselves managed pointers, traced during mark.
    pub fn object_array_alloc(&mut self, element_class_tag: i32, depth: u8, length: i32) -> *mut u8 {
        let element_class = class_ptr_from_tag(element_class_tag);
        if element_class.is_zero() || !element_class.is_aligned_to(CLASS_ALIGNMENT) {
            fatal(GcError(AllocationError::MalformedTag {
                tag: element_class_tag,
            }));
        }
        match self.array_alloc(element_class, depth, length, BYTES_IN_ADDRESS) {
            Ok(ptr) => ptr,
            Err(e) => fatal(e),
        }
    }

    fn primitive_array_alloc(&mut self, kind: PrimitiveKind, length: i32) -> *mut u8 {
        let element_class = kind.class_of(&self.classes);
        match self.array_alloc(element_class, 0, length, kind.stride()) {
            Ok(ptr) => ptr,
            Err(e) => fatal(e),
        }
    }

    pub fn boolean_array_alloc(&mut self, length: i32) -> *mut u8 {
        self.primitive_array_alloc(PrimitiveKind::Boolean, length)
    }
    pub fn byte_array_alloc(&mut self, length: i32) -> *mut u8 {
        self.primitive_array_alloc(PrimitiveKind::Byte, length)
    }
    pub fn short_array_alloc(&mut self, length: i32) -> *mut u8 {
        self.primitive_array_alloc(PrimitiveKind::Short, length)
    }
    pub fn char_array_alloc(&mut self, length: i32) -> *mut u8 {
        self.primitive_array_alloc(PrimitiveKind::Char, length)
    }
    pub fn int_array_alloc(&mut self, length: i32) -> *mut u8 {
        self.primitive_array_alloc(PrimitiveKind::Int, length)
    }
    pub fn long_array_alloc(&mut self, length: i32) -> *mut u8 {
        self.primitive_array_alloc(PrimitiveKind::Long, length)
    }
    pub fn float_array_alloc(&mut self, length: i32) -> *mut u8 {
        self.primitive_array_alloc(PrimitiveKind::Float, length)
    }
    pub fn double_array_alloc(&mut self, length: i32) -> *mut u8 {
        self.primitive_array_alloc(PrimitiveKind::Double, length)
    }
}
