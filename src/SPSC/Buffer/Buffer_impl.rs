use std::sync::atomic::fence;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release, SeqCst};
use std::sync::Arc;
use std::time::Duration;

use super::codec::{self, EntryLocation, Placement};
use super::layout::QueueHeader;
use super::Buffer::RingBuffer;
use crate::Core::alloc::QueueRegion;
use crate::Core::notify::NotificationPort;
use crate::SPSC::Structs::EntryView;
use crate::error::QueueError;

impl RingBuffer {
    /// Create a ring buffer view over a queue region.
    pub fn new(region: Arc<QueueRegion>) -> Self {
        Self {
            header: region.header_ptr(),
            ring: region.ring_ptr(),
            capacity: region.capacity(),
            region,
            port: parking_lot::RwLock::new(None),
        }
    }

    /// Ring capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The region this view maps.
    pub fn region(&self) -> &Arc<QueueRegion> {
        &self.region
    }

    #[inline]
    fn header(&self) -> &QueueHeader {
        // Safety: the region is kept alive by self.region
        unsafe { &*self.header }
    }

    /// Install or clear what gets poked when data becomes available.
    pub fn set_notification_port(&self, port: Option<Arc<dyn NotificationPort>>) {
        *self.port.write() = port;
    }

    pub fn has_notification_port(&self) -> bool {
        self.port.read().is_some()
    }

    /// Current (head, tail).
    pub fn cursors(&self) -> (u32, u32) {
        let header = self.header();
        (header.head.load(Acquire), header.tail.load(Acquire))
    }

    pub fn is_empty(&self) -> bool {
        let (head, tail) = self.cursors();
        head == tail
    }

    #[inline]
    fn check_cursors(&self, head: u32, tail: u32) -> Result<(), QueueError> {
        if head > self.capacity || tail > self.capacity {
            log::warn!(
                "data queue cursors out of range: head={} tail={} capacity={}",
                head,
                tail,
                self.capacity
            );
            return Err(self.corrupted(head, tail));
        }
        Ok(())
    }

    #[inline]
    fn corrupted(&self, head: u32, tail: u32) -> QueueError {
        QueueError::Corrupted {
            head,
            tail,
            capacity: self.capacity,
        }
    }

    /// Frame `data` and append it to the queue.
    ///
    /// Fails with `Full` when there is not enough room right now and with
    /// `TooLarge` when the entry could never fit. A failed enqueue changes
    /// nothing.
    ///
    /// # Safety
    /// No other enqueue on this region, through any view in any process, may
    /// run concurrently. [`crate::SPSC::Producer`] upholds this.
    pub unsafe fn enqueue(&self, data: &[u8]) -> Result<(), QueueError> {
        let entry_size = codec::entry_size(data.len())
            .filter(|&size| size <= self.capacity)
            .ok_or(QueueError::TooLarge {
                len: data.len(),
                capacity: self.capacity,
            })?;

        let header = self.header();
        let tail = header.tail.load(Relaxed);
        let mut head = header.head.load(Acquire);
        self.check_cursors(head, tail)?;

        let placement = codec::plan_enqueue(head, tail, self.capacity, entry_size)
            .ok_or(QueueError::Full { needed: entry_size })?;

        unsafe {
            match placement {
                Placement::Linear { offset, .. } => codec::write_entry(self.ring, offset, data),
                Placement::Wrapped { marker, .. } => {
                    // Leave the length at the old tail so the consumer sees
                    // it cannot fit there and looks at offset 0
                    if marker {
                        codec::write_len(self.ring, tail, data.len() as u32);
                    }
                    codec::write_entry(self.ring, 0, data);
                }
            }
        }

        // Publish the entry
        header.tail.store(placement.new_tail(), Release);

        if tail != head {
            // Pairs with the fence in advance_head: either the consumer sees
            // the new tail, or we see the head it published when emptying.
            fence(SeqCst);
            head = header.head.load(Relaxed);
        }

        if tail == head {
            self.send_data_available();
        }

        Ok(())
    }

    /// Dequeue the oldest entry into `buf`, returning the payload length.
    ///
    /// If `buf` is too small the call fails with `BufferTooSmall` and the
    /// entry stays in the queue.
    ///
    /// # Safety
    /// The caller must be the only consumer of this region: no other dequeue,
    /// skip or peek may run concurrently, and no [`EntryView`] from this
    /// region may be alive. [`crate::SPSC::Consumer`] upholds this.
    pub unsafe fn dequeue(&self, buf: &mut [u8]) -> Result<usize, QueueError> {
        let (tail, entry) = self.front()?;
        let len = entry.payload_len as usize;
        if buf.len() < len {
            return Err(QueueError::BufferTooSmall {
                needed: len,
                available: buf.len(),
            });
        }

        unsafe { codec::read_payload(self.ring, &entry, buf) };
        self.advance_head(entry.next_head, tail);
        Ok(len)
    }

    /// Dequeue the oldest entry into a freshly allocated vector.
    ///
    /// # Safety
    /// Same contract as [`RingBuffer::dequeue`].
    pub unsafe fn dequeue_vec(&self) -> Result<Vec<u8>, QueueError> {
        let (tail, entry) = self.front()?;
        let mut payload = vec![0u8; entry.payload_len as usize];
        unsafe { codec::read_payload(self.ring, &entry, &mut payload) };
        self.advance_head(entry.next_head, tail);
        Ok(payload)
    }

    /// Drop the oldest entry without copying it, returning its length.
    ///
    /// # Safety
    /// Same contract as [`RingBuffer::dequeue`].
    pub unsafe fn skip(&self) -> Result<usize, QueueError> {
        let (tail, entry) = self.front()?;
        self.advance_head(entry.next_head, tail);
        Ok(entry.payload_len as usize)
    }

    /// View the oldest entry without consuming it.
    ///
    /// Returns `None` when the queue is empty or its layout is inconsistent.
    ///
    /// # Safety
    /// The caller must be the only consumer of this region, and must not
    /// dequeue or skip, through any view, while the returned [`EntryView`]
    /// is alive. Once head moves past the entry the producer may overwrite
    /// the bytes the view borrows.
    pub unsafe fn peek(&self) -> Option<EntryView<'_>> {
        let (_, entry) = self.front().ok()?;
        Some(unsafe { EntryView::new(self.ring, entry) })
    }

    /// Locate the oldest entry. Returns the observed tail alongside it.
    fn front(&self) -> Result<(u32, EntryLocation), QueueError> {
        let header = self.header();
        let head = header.head.load(Relaxed);
        let tail = header.tail.load(Acquire);

        self.check_cursors(head, tail)?;
        if head == tail {
            return Err(QueueError::Empty);
        }

        let entry = unsafe { codec::locate_entry(self.ring, head, self.capacity) }
            .filter(|entry| codec::within_occupied(head, tail, entry));

        match entry {
            Some(entry) => Ok((tail, entry)),
            None => {
                log::warn!(
                    "data queue entry at head={} is inconsistent (tail={} capacity={})",
                    head,
                    tail,
                    self.capacity
                );
                Err(self.corrupted(head, tail))
            }
        }
    }

    fn advance_head(&self, new_head: u32, tail: u32) {
        let header = self.header();
        header.head.store(new_head, Release);

        if new_head == tail {
            // We just emptied the queue. Pairs with the fence in enqueue so a
            // racing producer either sees this head or we see its tail.
            fence(SeqCst);
        }
    }

    fn send_data_available(&self) {
        // Release the lock before calling out; a port may replace itself
        let port = self.port.read().clone();
        if let Some(port) = port {
            port.notify();
        }
    }

    /// Park the calling consumer until the producer signals data or `timeout` passes.
    ///
    /// Returns immediately if the queue is already non-empty. Spurious
    /// returns are possible; callers re-check the queue.
    pub fn wait_for_data(&self, timeout: Option<Duration>) {
        let word = &self.region.appendix().notify_seq;
        let seq = word.load(Acquire);
        if !self.is_empty() {
            return;
        }
        crate::Core::futex::futex_wait(word, seq, timeout);
    }
}
