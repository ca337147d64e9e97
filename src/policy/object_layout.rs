//! The object layout decoder: turns a record's `tag` into a class pointer, and computes the
//! byte length of any record (free chunk, scalar object, or array) so callers can advance past
//! it while walking the heap. This module is pure and allocation-free: it is called from the
//! mark-bit clearer, the sweeper, and the allocator's split logic, none of which can tolerate a
//! side effect sneaking into a record-size computation.

use crate::error::{AllocationError, GcError};
use crate::util::address::Address;
use crate::util::constants::{BYTES_IN_ADDRESS, CLASS_ALIGNMENT, EMPTY_TAG, GC_MARK, TAG_SHIFT};
use crate::vm::{ClassDescriptor, WellKnownClasses};

/// The two word-sized fields every inline heap record opens with.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct RecordHeader {
    pub tag: i32,
    pub size: i32,
}

/// Header shared by every array record: the usual object header, followed by a pointer to the
/// element class. The depth byte and payload immediately follow in memory but are not part of
/// this struct, since their placement/size depends on the element stride (see
/// [`array_total_size`]).
#[derive(Clone, Copy)]
#[repr(C)]
pub struct ArrayHeader {
    pub header: RecordHeader,
    pub element_class: Address,
}

pub const ARRAY_HEADER_SIZE: usize = std::mem::size_of::<ArrayHeader>();

/// Read the raw header fields of the record at `addr`.
///
/// # Safety
/// `addr` must point at a valid record header within the heap region.
pub unsafe fn read_header(addr: Address) -> RecordHeader {
    addr.load::<RecordHeader>()
}

/// # Safety
/// `addr` must point at a valid record header within the heap region.
pub unsafe fn write_header(addr: Address, tag: i32, size: i32) {
    addr.store(RecordHeader { tag, size });
}

/// Mask off the mark bit and reconstruct the class-descriptor address encoded in a tag.
pub fn class_ptr_from_tag(tag: i32) -> Address {
    let unmarked = (tag & !GC_MARK) as u32 as usize;
    Address::from_usize(unmarked << TAG_SHIFT)
}

/// Encode a class-descriptor address (and optional mark bit) as a tag.
pub fn tag_for_class(class: Address, marked: bool) -> i32 {
    let shifted = (class.as_usize() >> TAG_SHIFT) as i32;
    if marked {
        shifted | GC_MARK
    } else {
        shifted
    }
}

pub fn is_marked(tag: i32) -> bool {
    tag & GC_MARK != 0
}

/// Total byte length of an array record holding `element_count` elements of the given `stride`.
///
/// The allocator reserves one extra element's worth of space (`+1`) immediately after the
/// header so the one-byte `depth` field has somewhere to live without its own separately-sized
/// header slot; the decoder must use this same formula, or walking the heap by repeatedly
/// advancing by a record's size would drift off an array's true boundary. See `DESIGN.md` for
/// why this single formula is shared by alloc and decode.
pub fn array_total_size(element_count: usize, stride: usize) -> usize {
    ARRAY_HEADER_SIZE + stride * (element_count + 1)
}

/// Resolve a record's class pointer to a concrete stride, given it is a primitive array.
fn primitive_stride(element_class: Address, classes: &WellKnownClasses) -> Result<usize, GcError> {
    use crate::vm::PrimitiveKind::*;
    for kind in [Boolean, Byte, Short, Char, Int, Long, Float, Double] {
        if kind.class_of(classes) == element_class {
            return Ok(kind.stride());
        }
    }
    Err(GcError(AllocationError::UnknownElementClass {
        class_addr: element_class.as_usize(),
    }))
}

/// Compute the byte length to advance past the record at `addr` — the heap's one and only
/// notion of "the next record starts here".
///
/// # Safety
/// `addr` must point at a valid, fully-written record header (and, for arrays, a valid depth
/// byte and element-class pointer) within the heap region.
pub unsafe fn size_of_record(addr: Address, classes: &WellKnownClasses) -> Result<usize, GcError> {
    let header = read_header(addr);
    if header.tag == EMPTY_TAG {
        return Ok(header.size as usize);
    }

    let class_ptr = class_ptr_from_tag(header.tag);
    if class_ptr.is_zero() || !class_ptr.is_aligned_to(CLASS_ALIGNMENT) {
        return Err(GcError(AllocationError::MalformedTag { tag: header.tag }));
    }

    if class_ptr == classes.array {
        let array_header = addr.load::<ArrayHeader>();
        let element_count = header.size as usize;
        let depth: u8 = (addr + ARRAY_HEADER_SIZE).load();
        let stride = if depth == 0 {
            primitive_stride(array_header.element_class, classes)?
        } else {
            BYTES_IN_ADDRESS
        };
        Ok(array_total_size(element_count, stride))
    } else {
        let cls = &*class_ptr.to_ptr::<ClassDescriptor>();
        Ok(cls.byte_size as usize)
    }
}
