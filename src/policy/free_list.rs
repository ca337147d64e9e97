//! Size-sorted index over the free chunks discovered by the last sweep. This is the allocator's
//! search structure: the front-end advances a cursor over it, skipping chunks that are
//! too small, until it finds one it can split (or exactly consume) to satisfy a request.

use crate::policy::object_layout::read_header;
use crate::util::address::Address;
use crate::util::constants::BYTES_IN_HEADER;

#[derive(Default)]
pub struct FreeChunkIndex {
    /// Free chunks, sorted by descending byte size. Rebuilt in full by every sweep.
    chunks: Vec<Address>,
    /// Chunks before this index are known to be too small for any request seen so far this GC
    /// cycle and are skipped rather than re-examined.
    cursor: usize,
}

impl FreeChunkIndex {
    pub fn new() -> Self {
        FreeChunkIndex {
            chunks: Vec::new(),
            cursor: 0,
        }
    }

    /// Replace the index's contents with a freshly swept set of chunks, sorted by descending
    /// size, and reset the cursor.
    ///
    /// # Safety
    /// Every address in `chunks` must point at a live `EMPTY`-tagged record header.
    pub unsafe fn rebuild(&mut self, mut chunks: Vec<Address>) {
        chunks.sort_unstable_by_key(|&addr| std::cmp::Reverse(read_header(addr).size));
        self.chunks = chunks;
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.chunks.len() - self.cursor.min(self.chunks.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the chunks currently visible to the allocator (i.e. not yet skipped past), in
    /// descending size order. Used by tests to assert free-list ordering.
    pub fn iter(&self) -> impl Iterator<Item = Address> + '_ {
        self.chunks[self.cursor..].iter().copied()
    }

    /// Splice a freshly split-off remainder chunk back into the still-unexamined tail of the
    /// index, in its correct descending-size position, so a later allocation within the same GC
    /// cycle can find it without forcing an unnecessary collection. Chunks before the cursor are
    /// left alone: they were already confirmed too small for a request seen this cycle, and the
    /// new chunk being inserted only ever needs to be found by requests still to come.
    ///
    /// # Safety
    /// `addr` must point at a live `EMPTY`-tagged record header.
    pub unsafe fn insert(&mut self, addr: Address) {
        let size = read_header(addr).size;
        let tail = &self.chunks[self.cursor..];
        let offset = tail.partition_point(|&a| read_header(a).size >= size);
        self.chunks.insert(self.cursor + offset, addr);
    }

    /// Find a chunk that can satisfy a request of `n` bytes: usable if
    /// `chunk.size >= n + BYTES_IN_HEADER` (splitting leaves a valid remainder) or
    /// `chunk.size == n` (exact fit, no split). Chunks that are too small are skipped
    /// permanently for the remainder of this allocation cycle.
    ///
    /// # Safety
    /// Every chunk address currently in the index must point at a live `EMPTY`-tagged header.
    pub unsafe fn find_available_chunk(&mut self, n: usize) -> Option<Address> {
        while self.cursor < self.chunks.len() {
            let chunk = self.chunks[self.cursor];
            let size = read_header(chunk).size as usize;
            self.cursor += 1;
            if size >= n + BYTES_IN_HEADER || size == n {
                return Some(chunk);
            }
        }
        None
    }
}
