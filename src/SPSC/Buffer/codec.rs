// Entry framing and the offset arithmetic behind enqueue/dequeue.
//
// Every position is a plain u32 offset into the ring; nothing here trusts a
// value read from shared memory without checking it against `capacity`.

use std::ptr;

use super::layout::ENTRY_HEADER_SIZE;

/// Where the producer writes the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The entry fits at `offset` without crossing the physical end.
    Linear { offset: u32, new_tail: u32 },
    /// The entry restarts at offset 0. When `marker` is set there is room
    /// at the old tail for a length field, which the consumer uses to detect
    /// the wrap.
    Wrapped { new_tail: u32, marker: bool },
}

impl Placement {
    pub fn new_tail(&self) -> u32 {
        match *self {
            Placement::Linear { new_tail, .. } | Placement::Wrapped { new_tail, .. } => new_tail,
        }
    }
}

/// A decoded entry at the front of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryLocation {
    /// Offset of the length field.
    pub offset: u32,
    /// Payload length in bytes.
    pub payload_len: u32,
    /// Head after the entry is consumed.
    pub next_head: u32,
}

impl EntryLocation {
    pub fn payload_offset(&self) -> u32 {
        self.offset + ENTRY_HEADER_SIZE
    }

    pub fn framed_len(&self) -> u32 {
        self.payload_len + ENTRY_HEADER_SIZE
    }

    pub fn is_wrapped(&self, head: u32) -> bool {
        self.offset != head
    }
}

/// Framed size of a payload of `payload_len` bytes, `None` if it overflows u32.
pub fn entry_size(payload_len: usize) -> Option<u32> {
    u32::try_from(payload_len)
        .ok()?
        .checked_add(ENTRY_HEADER_SIZE)
}

/// Decide where an entry of `entry_size` framed bytes goes.
///
/// Both cursors must already be known to be `<= capacity`. The tail is never
/// allowed to land on the head, so `head == tail` keeps meaning empty.
pub fn plan_enqueue(head: u32, tail: u32, capacity: u32, entry_size: u32) -> Option<Placement> {
    if tail >= head {
        if entry_size <= capacity - tail {
            Some(Placement::Linear {
                offset: tail,
                new_tail: tail + entry_size,
            })
        } else if entry_size < head {
            Some(Placement::Wrapped {
                new_tail: entry_size,
                marker: capacity - tail >= ENTRY_HEADER_SIZE,
            })
        } else {
            None
        }
    } else if entry_size < head - tail {
        Some(Placement::Linear {
            offset: tail,
            new_tail: tail + entry_size,
        })
    } else {
        None
    }
}

/// Decode the entry at `head`.
///
/// A length field that does not fit before the end, or a payload that would
/// run past it, means the producer restarted the entry at offset 0.
/// Returns `None` when the decoded size is impossible for this ring.
///
/// # Safety
/// `ring` must point to `capacity` readable bytes, `head <= capacity`, and
/// `capacity >= ENTRY_HEADER_SIZE`.
pub unsafe fn locate_entry(ring: *const u8, head: u32, capacity: u32) -> Option<EntryLocation> {
    if capacity - head >= ENTRY_HEADER_SIZE {
        let len = read_len(ring, head);
        if let Some(size) = len.checked_add(ENTRY_HEADER_SIZE) {
            if size <= capacity - head {
                return Some(EntryLocation {
                    offset: head,
                    payload_len: len,
                    next_head: head + size,
                });
            }
        }
    }

    let len = read_len(ring, 0);
    let size = len.checked_add(ENTRY_HEADER_SIZE)?;
    if size > capacity {
        return None;
    }
    Some(EntryLocation {
        offset: 0,
        payload_len: len,
        next_head: size,
    })
}

/// Whether `entry`, decoded at `head`, lies inside the bytes the producer has published.
pub fn within_occupied(head: u32, tail: u32, entry: &EntryLocation) -> bool {
    if tail > head {
        // Occupied bytes are [head, tail); a wrapped entry cannot exist here.
        !entry.is_wrapped(head) && entry.next_head <= tail
    } else if entry.is_wrapped(head) {
        // Occupied bytes are [head, capacity) + [0, tail).
        entry.next_head <= tail
    } else {
        true
    }
}

/// Read a little-endian length field at `offset`.
///
/// # Safety
/// `offset + ENTRY_HEADER_SIZE` bytes must be readable from `ring`.
#[inline]
pub unsafe fn read_len(ring: *const u8, offset: u32) -> u32 {
    let mut raw = [0u8; ENTRY_HEADER_SIZE as usize];
    ptr::copy_nonoverlapping(ring.add(offset as usize), raw.as_mut_ptr(), raw.len());
    u32::from_le_bytes(raw)
}

/// Write a little-endian length field at `offset`.
///
/// # Safety
/// `offset + ENTRY_HEADER_SIZE` bytes must be writable at `ring`.
#[inline]
pub unsafe fn write_len(ring: *mut u8, offset: u32, len: u32) {
    let raw = len.to_le_bytes();
    ptr::copy_nonoverlapping(raw.as_ptr(), ring.add(offset as usize), raw.len());
}

/// Frame `payload` at `offset`.
///
/// # Safety
/// The framed entry must fit inside the ring at `offset`, and `payload.len()`
/// must fit in a u32.
#[inline]
pub unsafe fn write_entry(ring: *mut u8, offset: u32, payload: &[u8]) {
    write_len(ring, offset, payload.len() as u32);
    ptr::copy_nonoverlapping(
        payload.as_ptr(),
        ring.add((offset + ENTRY_HEADER_SIZE) as usize),
        payload.len(),
    );
}

/// Copy the payload of `entry` into the front of `dst`.
///
/// # Safety
/// `entry` must come from [`locate_entry`] on the same ring and
/// `dst.len() >= entry.payload_len`.
#[inline]
pub unsafe fn read_payload(ring: *const u8, entry: &EntryLocation, dst: &mut [u8]) {
    ptr::copy_nonoverlapping(
        ring.add(entry.payload_offset() as usize),
        dst.as_mut_ptr(),
        entry.payload_len as usize,
    );
}
