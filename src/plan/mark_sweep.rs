//! The collector itself: clearing mark bits, tracing reachable objects, and sweeping dead space
//! back into free chunks. This is the only GC plan this crate implements — a single
//! stop-the-world mark-sweep pass, run to completion on the calling thread.

use crate::error::{AllocationError, GcError};
use crate::heap::region::HeapRegion;
use crate::policy::object_layout::{
    class_ptr_from_tag, is_marked, read_header, size_of_record, ArrayHeader, RecordHeader,
    ARRAY_HEADER_SIZE,
};
use crate::util::address::Address;
use crate::util::chunked_stack::ChunkedStack;
use crate::util::constants::{BYTES_IN_ADDRESS, CLASS_ALIGNMENT, EMPTY_TAG, END_TAG, GC_MARK};
use crate::vm::{ClassDescriptor, RootScanning, RootSink, WellKnownClasses};

impl RootSink for ChunkedStack {
    fn root(&mut self, addr: Address) {
        if addr.is_zero() {
            return;
        }
        self.push(addr);
    }
}

/// Walk the heap, masking the mark bit off every non-free record. Run before tracing so stale
/// marks from a previous cycle (there shouldn't be any, per the mark-bit-cleanliness invariant,
/// but the source does this unconditionally) can never linger.
pub fn clear_marks(region: &HeapRegion, classes: &WellKnownClasses) -> Result<(), GcError> {
    region.for_each_record(classes, |addr| {
        let header = unsafe { read_header(addr) };
        if header.tag != EMPTY_TAG && is_marked(header.tag) {
            unsafe { write_header_tag(addr, header.tag & !GC_MARK, header.size) };
        }
        Ok(())
    })
}

unsafe fn write_header_tag(addr: Address, tag: i32, size: i32) {
    crate::policy::object_layout::write_header(addr, tag, size);
}

/// Push every as-yet-unmarked managed-reference field of the object at `addr` onto `stack`, then
/// mark `addr` itself. Only children whose mark bit is still clear are pushed, so a cyclic or
/// diamond-shaped object graph is never revisited once marked.
///
/// # Safety
/// `addr` must point at a live (non-`EMPTY`, non-`END`) record with a valid class tag.
unsafe fn mark_one(
    addr: Address,
    classes: &WellKnownClasses,
    stack: &mut ChunkedStack,
) -> Result<(), GcError> {
    let header = read_header(addr);
    let class_ptr = class_ptr_from_tag(header.tag);
    if class_ptr.is_zero() || !class_ptr.is_aligned_to(CLASS_ALIGNMENT) {
        return Err(GcError(AllocationError::MalformedTag { tag: header.tag }));
    }
    write_header_tag(addr, header.tag | GC_MARK, header.size);

    let mut push_if_unmarked = |field: Address| {
        if field.is_zero() {
            return;
        }
        let field_header = read_header(field);
        if !is_marked(field_header.tag) {
            stack.push(field);
        }
    };

    if class_ptr == classes.array {
        let array_header = addr.load::<ArrayHeader>();
        let depth: u8 = (addr + ARRAY_HEADER_SIZE).load();
        if depth > 0 {
            // Reference array: every element is a managed pointer.
            let element_count = header.size as usize;
            let payload = addr + ARRAY_HEADER_SIZE + BYTES_IN_ADDRESS;
            for i in 0..element_count {
                let slot = payload + i * BYTES_IN_ADDRESS;
                push_if_unmarked(slot.load::<Address>());
            }
        }
        let _ = array_header; // element type carries no references of its own
    } else {
        let cls = &*class_ptr.to_ptr::<ClassDescriptor>();
        for &offset in cls.field_offsets() {
            let field_slot = addr + offset as usize;
            push_if_unmarked(field_slot.load::<Address>());
        }
    }

    Ok(())
}

/// Trace every object reachable from `scanner`'s roots, setting each one's mark bit.
pub fn mark(classes: &WellKnownClasses, scanner: &dyn RootScanning) -> Result<(), GcError> {
    let mut stack = ChunkedStack::new();
    scanner.scan_roots(&mut stack);

    while let Some(addr) = stack.pop() {
        let header = unsafe { read_header(addr) };
        if header.tag == END_TAG || header.tag == EMPTY_TAG {
            // A root pointing at a sentinel or free chunk indicates mutator/runtime corruption;
            // the source has no check for this either, so surface it as a malformed tag.
            return Err(GcError(AllocationError::MalformedTag { tag: header.tag }));
        }
        if is_marked(header.tag) {
            continue;
        }
        unsafe { mark_one(addr, classes, &mut stack)? };
    }
    Ok(())
}

/// Walk the whole heap, coalescing adjacent free and now-dead records into single free chunks
/// and clearing mark bits from survivors. Returns the addresses of every resulting free chunk,
/// in heap order (the caller sorts them into the free-chunk index).
pub fn sweep(region: &HeapRegion, classes: &WellKnownClasses) -> Result<Vec<Address>, GcError> {
    let mut free_chunks = Vec::new();
    let mut run: Option<(Address, usize)> = None;

    let mut cursor = region.base();
    loop {
        let header: RecordHeader = unsafe { read_header(cursor) };
        if header.tag == END_TAG {
            break;
        }
        let size = unsafe { size_of_record(cursor, classes) }?;

        let dead = header.tag == EMPTY_TAG || !is_marked(header.tag);
        if dead {
            run = Some(match run {
                Some((start, acc)) => (start, acc + size),
                None => (cursor, size),
            });
        } else {
            unsafe { write_header_tag(cursor, header.tag & !GC_MARK, header.size) };
            if let Some((start, acc)) = run.take() {
                unsafe { write_header_tag(start, EMPTY_TAG, acc as i32) };
                free_chunks.push(start);
            }
        }

        cursor += size;
    }

    if let Some((start, acc)) = run.take() {
        unsafe { write_header_tag(start, EMPTY_TAG, acc as i32) };
        free_chunks.push(start);
    }

    Ok(free_chunks)
}

/// Run a full collection cycle: clear marks, trace from roots, sweep dead space. Returns the
/// free chunks the sweep discovered; the caller is responsible for rebuilding its free-chunk
/// index from them.
pub fn collect_garbage(
    region: &HeapRegion,
    classes: &WellKnownClasses,
    scanner: &dyn RootScanning,
) -> Result<Vec<Address>, GcError> {
    clear_marks(region, classes)?;
    mark(classes, scanner)?;
    sweep(region, classes)
}
