// Shared helpers for tests that drive a RingBuffer directly
#![allow(dead_code)]

use dmxp_dataqueue::Core::alloc::QueueRegion;
use dmxp_dataqueue::SPSC::Structs::EntryView;
use dmxp_dataqueue::{QueueError, RingBuffer};
use std::cell::Cell;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

/// A queue whose producer and consumer are both the current test thread.
///
/// Not `Sync`, so no other thread can reach the ring through it, and `peek`
/// borrows mutably so a view cannot outlive the next dequeue.
pub struct LocalQueue {
    ring: RingBuffer,
    _single_thread: PhantomData<Cell<()>>,
}

impl LocalQueue {
    pub fn new(capacity: usize) -> Self {
        let region = QueueRegion::create_private(capacity).expect("private region");
        Self::over(Arc::new(region))
    }

    pub fn over(region: Arc<QueueRegion>) -> Self {
        Self {
            ring: RingBuffer::new(region),
            _single_thread: PhantomData,
        }
    }

    pub fn enqueue(&self, data: &[u8]) -> Result<(), QueueError> {
        unsafe { self.ring.enqueue(data) }
    }

    pub fn dequeue(&self, buf: &mut [u8]) -> Result<usize, QueueError> {
        unsafe { self.ring.dequeue(buf) }
    }

    pub fn dequeue_vec(&self) -> Result<Vec<u8>, QueueError> {
        unsafe { self.ring.dequeue_vec() }
    }

    pub fn skip(&self) -> Result<usize, QueueError> {
        unsafe { self.ring.skip() }
    }

    pub fn peek(&mut self) -> Option<EntryView<'_>> {
        unsafe { self.ring.peek() }
    }
}

impl Deref for LocalQueue {
    type Target = RingBuffer;

    fn deref(&self) -> &RingBuffer {
        &self.ring
    }
}
