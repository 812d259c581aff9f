// Borrowed views of entries that still live in the ring

use crate::SPSC::Buffer::codec::EntryLocation;
use crate::SPSC::Buffer::layout::ENTRY_HEADER_SIZE;
use crate::error::QueueError;
use std::marker::PhantomData;

/// The oldest entry, viewed in place without consuming it.
///
/// Only the consumer moves `head`, and the producer never writes into bytes
/// between `head` and `tail`, so the entry stays put for as long as the view
/// borrows the consumer-side ring.
#[derive(Clone, Copy)]
pub struct EntryView<'a> {
    framed: *const u8,
    entry: EntryLocation,
    _ring: PhantomData<&'a [u8]>,
}

impl<'a> EntryView<'a> {
    /// # Safety
    /// `ring` must be the ring `entry` was decoded from, valid for `'a`.
    pub(crate) unsafe fn new(ring: *const u8, entry: EntryLocation) -> Self {
        Self {
            framed: ring.add(entry.offset as usize),
            entry,
            _ring: PhantomData,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.entry.payload_len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.entry.payload_len == 0
    }

    /// Offset of the length field inside the ring.
    pub fn offset(&self) -> u32 {
        self.entry.offset
    }

    /// Length field followed by the payload, as stored.
    pub fn framed(&self) -> &'a [u8] {
        unsafe { std::slice::from_raw_parts(self.framed, self.entry.framed_len() as usize) }
    }

    /// The payload bytes.
    pub fn payload(&self) -> &'a [u8] {
        &self.framed()[ENTRY_HEADER_SIZE as usize..]
    }

    /// Copy the payload into `dst`, returning its length.
    pub fn copy_to(&self, dst: &mut [u8]) -> Result<usize, QueueError> {
        let len = self.len();
        if dst.len() < len {
            return Err(QueueError::BufferTooSmall {
                needed: len,
                available: dst.len(),
            });
        }
        dst[..len].copy_from_slice(self.payload());
        Ok(len)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.payload().to_vec()
    }
}

impl std::fmt::Debug for EntryView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryView")
            .field("offset", &self.entry.offset)
            .field("len", &self.entry.payload_len)
            .finish()
    }
}
