//! The heap region: one contiguous byte span owned exclusively by the collector. Every byte
//! belongs to exactly one inline record; walking the region by repeatedly advancing by a
//! record's size must always land exactly on the `END` sentinel.

use crate::error::GcError;
use crate::policy::object_layout::{size_of_record, write_header};
use crate::util::address::Address;
use crate::util::constants::{BYTES_IN_HEADER, EMPTY_TAG, END_TAG};
use crate::vm::WellKnownClasses;

/// A single contiguous byte span backing the heap. Allocated once, at construction, and never
/// freed, moved, or resized: object addresses handed out to the mutator remain valid for the
/// lifetime of the `HeapRegion`.
pub struct HeapRegion {
    // Kept alive for the whole lifetime of the region; never read through directly once `base`
    // is computed (all access goes through raw `Address` arithmetic, matching the source's
    // pointer-only view of the pool).
    buffer: Box<[u8]>,
    base: Address,
}

impl HeapRegion {
    /// Allocate a region of `size` bytes and lay out the initial single free chunk plus the
    /// trailing `END` sentinel.
    pub fn new(size: usize) -> Self {
        assert!(
            size > BYTES_IN_HEADER * 2,
            "heap must be large enough for a free chunk header and the END sentinel"
        );
        let mut buffer = vec![0u8; size].into_boxed_slice();
        let base = Address::from_ptr(buffer.as_mut_ptr());
        let sentinel = base + (size - BYTES_IN_HEADER);
        unsafe {
            write_header(base, EMPTY_TAG, (size - BYTES_IN_HEADER) as i32);
            write_header(sentinel, END_TAG, 0);
        }
        HeapRegion { buffer, base }
    }

    pub fn base(&self) -> Address {
        self.base
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn contains(&self, addr: Address) -> bool {
        let end = self.base + self.buffer.len();
        addr >= self.base && addr < end
    }

    /// Zero `len` bytes starting at `addr`.
    ///
    /// # Safety
    /// `[addr, addr + len)` must lie entirely within this region.
    pub unsafe fn zero(&mut self, addr: Address, len: usize) {
        std::ptr::write_bytes(addr.to_mut_ptr::<u8>(), 0, len);
    }

    /// Walk every record from the base to (but not including) the `END` sentinel, calling `f`
    /// with each record's address. Stops and propagates the first error `size_of_record`
    /// reports (a malformed tag).
    pub fn for_each_record(
        &self,
        classes: &WellKnownClasses,
        mut f: impl FnMut(Address) -> Result<(), GcError>,
    ) -> Result<(), GcError> {
        let mut cursor = self.base;
        loop {
            let tag = unsafe { cursor.load::<i32>() };
            if tag == END_TAG {
                return Ok(());
            }
            f(cursor)?;
            let size = unsafe { size_of_record(cursor, classes) }?;
            cursor += size;
        }
    }
}
