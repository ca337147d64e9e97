//! A small, self-contained object model used only by the integration tests: a handful of
//! `ClassDescriptor`s with known field layouts, and a `RootScanning` stub the tests can point at
//! whatever addresses they want treated as live.

use std::cell::RefCell;

use rtgc::policy::object_layout::{is_marked, read_header, size_of_record, tag_for_class};
use rtgc::util::constants::{BYTES_IN_HEADER, EMPTY_TAG, END_TAG};
use rtgc::util::Address;
use rtgc::{ClassDescriptor, Heap, HeapConfig, RootScanning, RootSink, WellKnownClasses};

// Field tables for the test classes below. `ClassDescriptor::field_offsets` only ever names
// managed-reference fields; scalar payload bytes are not listed.
static NO_FIELDS: [i32; 0] = [];
static LINK_FIELDS: [i32; 1] = [16];
static CYCLE_FIELDS: [i32; 1] = [8];

/// A 64-byte scalar class with no reference fields.
pub static SCALAR_64: ClassDescriptor = ClassDescriptor {
    byte_size: 64,
    tag_value: 1,
    field_count: 0,
    field_offsets: NO_FIELDS.as_ptr(),
};

/// A linked-list node: an 8-byte header, 8 bytes of scalar payload, then a `next` pointer at
/// offset 16.
pub static LINK_NODE: ClassDescriptor = ClassDescriptor {
    byte_size: 24,
    tag_value: 2,
    field_count: 1,
    field_offsets: LINK_FIELDS.as_ptr(),
};

/// A two-field-free class whose single reference field sits immediately after the header, for
/// building reference cycles.
pub static CYCLE_NODE: ClassDescriptor = ClassDescriptor {
    byte_size: 16,
    tag_value: 3,
    field_count: 1,
    field_offsets: CYCLE_FIELDS.as_ptr(),
};

static ARRAY_CLASS: ClassDescriptor = ClassDescriptor {
    byte_size: 0,
    tag_value: 100,
    field_count: 0,
    field_offsets: NO_FIELDS.as_ptr(),
};
static BOOLEAN_ARRAY_CLASS: ClassDescriptor = ClassDescriptor {
    byte_size: 0,
    tag_value: 101,
    field_count: 0,
    field_offsets: NO_FIELDS.as_ptr(),
};
static BYTE_ARRAY_CLASS: ClassDescriptor = ClassDescriptor {
    byte_size: 0,
    tag_value: 102,
    field_count: 0,
    field_offsets: NO_FIELDS.as_ptr(),
};
static SHORT_ARRAY_CLASS: ClassDescriptor = ClassDescriptor {
    byte_size: 0,
    tag_value: 103,
    field_count: 0,
    field_offsets: NO_FIELDS.as_ptr(),
};
static CHAR_ARRAY_CLASS: ClassDescriptor = ClassDescriptor {
    byte_size: 0,
    tag_value: 104,
    field_count: 0,
    field_offsets: NO_FIELDS.as_ptr(),
};
static INT_ARRAY_CLASS: ClassDescriptor = ClassDescriptor {
    byte_size: 0,
    tag_value: 105,
    field_count: 0,
    field_offsets: NO_FIELDS.as_ptr(),
};
static LONG_ARRAY_CLASS: ClassDescriptor = ClassDescriptor {
    byte_size: 0,
    tag_value: 106,
    field_count: 0,
    field_offsets: NO_FIELDS.as_ptr(),
};
static FLOAT_ARRAY_CLASS: ClassDescriptor = ClassDescriptor {
    byte_size: 0,
    tag_value: 107,
    field_count: 0,
    field_offsets: NO_FIELDS.as_ptr(),
};
static DOUBLE_ARRAY_CLASS: ClassDescriptor = ClassDescriptor {
    byte_size: 0,
    tag_value: 108,
    field_count: 0,
    field_offsets: NO_FIELDS.as_ptr(),
};

pub fn well_known_classes() -> WellKnownClasses {
    WellKnownClasses {
        array: Address::from_ptr(&ARRAY_CLASS),
        boolean_array: Address::from_ptr(&BOOLEAN_ARRAY_CLASS),
        byte_array: Address::from_ptr(&BYTE_ARRAY_CLASS),
        short_array: Address::from_ptr(&SHORT_ARRAY_CLASS),
        char_array: Address::from_ptr(&CHAR_ARRAY_CLASS),
        int_array: Address::from_ptr(&INT_ARRAY_CLASS),
        long_array: Address::from_ptr(&LONG_ARRAY_CLASS),
        float_array: Address::from_ptr(&FLOAT_ARRAY_CLASS),
        double_array: Address::from_ptr(&DOUBLE_ARRAY_CLASS),
    }
}

pub fn scalar_tag(class: &ClassDescriptor) -> i32 {
    tag_for_class(Address::from_ptr(class), false)
}

/// A `RootScanning` stub whose root set the test controls directly, standing in for the
/// embedding runtime's stack scanner.
#[derive(Default)]
pub struct StubRoots(RefCell<Vec<Address>>);

impl StubRoots {
    pub fn new() -> Self {
        StubRoots(RefCell::new(Vec::new()))
    }

    pub fn set(&self, roots: Vec<Address>) {
        *self.0.borrow_mut() = roots;
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl RootScanning for StubRoots {
    fn scan_roots(&self, sink: &mut dyn RootSink) {
        for &addr in self.0.borrow().iter() {
            sink.root(addr);
        }
    }
}

pub fn small_heap() -> Heap<StubRoots> {
    Heap::new(
        HeapConfig { heap_size: 4096 },
        well_known_classes(),
        StubRoots::new(),
    )
}

pub fn addr_of(ptr: *mut u8) -> Address {
    Address::from_ptr(ptr as *const u8)
}

/// Sum of the byte length of every EMPTY record currently in the heap, found by walking it
/// directly rather than trusting the free-chunk index (which only reflects what the last sweep
/// discovered, not remainders split off since).
pub fn total_free_bytes(heap: &Heap<StubRoots>) -> usize {
    let mut total = 0usize;
    heap.region()
        .for_each_record(heap.classes(), |addr| {
            let header = unsafe { read_header(addr) };
            if header.tag == EMPTY_TAG {
                total += header.size as usize;
            }
            Ok(())
        })
        .unwrap();
    total
}

/// Count of non-EMPTY (live) records in the heap, found by direct walk.
pub fn live_count(heap: &Heap<StubRoots>) -> usize {
    let mut count = 0usize;
    heap.region()
        .for_each_record(heap.classes(), |addr| {
            let header = unsafe { read_header(addr) };
            if header.tag != EMPTY_TAG {
                count += 1;
            }
            Ok(())
        })
        .unwrap();
    count
}

/// What a full, independent walk of the heap (base to `END`, computing each record's size by
/// hand) found. Used by the property tests to check invariants `for_each_record`'s own callers
/// don't otherwise surface.
pub struct WalkReport {
    /// Total bytes accounted for by every record plus the `END` sentinel's header. Should always
    /// equal the region's full size: if a record's computed size ever drifted from its true
    /// extent, this sum would stop matching it.
    pub bytes_covered: usize,
    /// Whether any record's mark bit was still set.
    pub any_marked: bool,
    /// Number of times two `EMPTY`-tagged records were found directly adjacent to each other.
    pub adjacent_empty_pairs: usize,
}

/// Walk the heap directly (not through `for_each_record`, which only yields addresses) and
/// report the invariants a sweep is supposed to uphold.
pub fn walk_heap(heap: &Heap<StubRoots>) -> WalkReport {
    let classes = heap.classes();
    let mut cursor = heap.region().base();
    let mut bytes_covered = 0usize;
    let mut any_marked = false;
    let mut adjacent_empty_pairs = 0usize;
    let mut prev_was_empty = false;

    loop {
        let tag = unsafe { cursor.load::<i32>() };
        if tag == END_TAG {
            bytes_covered += BYTES_IN_HEADER;
            break;
        }
        let header = unsafe { read_header(cursor) };
        if is_marked(header.tag) {
            any_marked = true;
        }
        let is_empty = header.tag == EMPTY_TAG;
        if is_empty && prev_was_empty {
            adjacent_empty_pairs += 1;
        }
        prev_was_empty = is_empty;

        let size = unsafe { size_of_record(cursor, classes) }.unwrap();
        bytes_covered += size;
        cursor += size;
    }

    WalkReport {
        bytes_covered,
        any_marked,
        adjacent_empty_pairs,
    }
}
