use std::mem::{align_of, size_of};
use std::sync::atomic::AtomicU32;

/// Size of the length prefix in front of every entry.
pub const ENTRY_HEADER_SIZE: u32 = size_of::<u32>() as u32;

/// Size of the [`QueueHeader`]; the ring starts right after it.
pub const QUEUE_HEADER_SIZE: usize = size_of::<QueueHeader>();

/// Version written into the appendix by the creator.
pub const APPENDIX_VERSION: u32 = 1;

/// Largest ring capacity whose region size still fits the `u32` offset space.
pub const MAX_CAPACITY: u32 =
    u32::MAX - QUEUE_HEADER_SIZE as u32 - size_of::<QueueAppendix>() as u32 - 3;

/// The header located at the very beginning of the shared memory region.
///
/// Producer and consumer may live in different processes, so the layout is
/// fixed: `capacity` at 0, `head` at 4, `tail` at 8, ring bytes at 12.
#[repr(C)]
pub struct QueueHeader {
    /// Ring capacity in bytes. Written once by the creator.
    pub capacity: u32,

    /// Offset of the oldest unread entry. Only the consumer stores to it.
    pub head: AtomicU32,

    /// Offset just past the newest entry. Only the producer stores to it.
    pub tail: AtomicU32,
}

/// Small trailer after the ring bytes, reserved for collaborators of the queue.
///
/// The notification sequence word doubles as the futex the default
/// notification port wakes.
#[repr(C)]
pub struct QueueAppendix {
    /// Layout version, [`APPENDIX_VERSION`] when initialized.
    pub version: u32,

    /// Bumped on every data-available notification.
    pub notify_seq: AtomicU32,
}

/// Byte offset of the appendix for a ring of `capacity` bytes.
///
/// The appendix sits at the first suitably aligned offset after the ring.
pub fn appendix_offset(capacity: usize) -> Option<usize> {
    let align = align_of::<QueueAppendix>();
    QUEUE_HEADER_SIZE
        .checked_add(capacity)?
        .checked_add(align - 1)
        .map(|end| end & !(align - 1))
}

/// Bytes needed for header, ring and appendix, before page rounding.
pub fn required_size(capacity: usize) -> Option<usize> {
    appendix_offset(capacity)?.checked_add(size_of::<QueueAppendix>())
}

/// Total region size for `capacity`, rounded up to a multiple of `page`.
pub fn region_size(capacity: usize, page: usize) -> Option<usize> {
    required_size(capacity)?
        .checked_add(page - 1)
        .map(|v| v & !(page - 1))
}

/// Whether `capacity` can back a queue at all.
pub fn is_valid_capacity(capacity: usize) -> bool {
    capacity > ENTRY_HEADER_SIZE as usize && capacity <= MAX_CAPACITY as usize
}
