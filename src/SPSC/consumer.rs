// src/SPSC/consumer.rs

use crate::SPSC::Buffer::RingBuffer;
use crate::error::QueueError;
use crossbeam_utils::Backoff;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// The reading end of a data queue.
///
/// Receives are serialized through an internal lock, so a `Consumer` shared
/// between threads still honours the single-reader rule of the ring. Create
/// at most one `Consumer` per region.
///
/// Entries can only be looked at in place through [`Consumer::with_peek`],
/// which keeps the lock held for as long as the borrowed bytes are in use.
pub struct Consumer {
    buffer: RingBuffer,
    lock: Mutex<()>,
    received: AtomicU64,
}

impl Consumer {
    pub(crate) fn new(buffer: RingBuffer) -> Self {
        Self {
            buffer,
            lock: Mutex::new(()),
            received: AtomicU64::new(0),
        }
    }

    /// Dequeue into `buf`, returning the queue's own error on failure.
    pub fn try_receive(&self, buf: &mut [u8]) -> Result<usize, QueueError> {
        let _guard = self.lock.lock();
        // Safety: the lock makes this the only consumer-side call in flight
        let len = unsafe { self.buffer.dequeue(buf) }?;
        self.received.fetch_add(1, Ordering::Relaxed);
        Ok(len)
    }

    /// Receives a message into `buf` if one is available.
    ///
    /// # Returns
    /// * `Ok(Some(len))` if a message was received
    /// * `Ok(None)` if the queue is empty
    /// * `InvalidInput` if `buf` is smaller than the next message; it stays queued
    pub fn receive(&self, buf: &mut [u8]) -> std::io::Result<Option<usize>> {
        match self.try_receive(buf) {
            Ok(len) => Ok(Some(len)),
            Err(QueueError::Empty) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Receives a message into a new vector if one is available.
    pub fn receive_vec(&self) -> std::io::Result<Option<Vec<u8>>> {
        let _guard = self.lock.lock();
        match unsafe { self.buffer.dequeue_vec() } {
            Ok(payload) => {
                self.received.fetch_add(1, Ordering::Relaxed);
                Ok(Some(payload))
            }
            Err(QueueError::Empty) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Receives a message, blocking until one is available.
    pub fn receive_blocking(&self) -> std::io::Result<Vec<u8>> {
        let backoff = Backoff::new();
        loop {
            if let Some(payload) = self.receive_vec()? {
                return Ok(payload);
            }
            if backoff.is_completed() {
                // Wait for signal
                self.buffer.wait_for_data(None);
            } else {
                backoff.snooze();
            }
        }
    }

    /// Receives a message, waiting up to the specified timeout.
    ///
    /// # Returns
    /// * `Ok(Some(data))` if a message was received
    /// * `Ok(None)` if the timeout was reached
    pub fn receive_timeout(&self, timeout: Duration) -> std::io::Result<Option<Vec<u8>>> {
        let start = Instant::now();
        let backoff = Backoff::new();

        loop {
            if let Some(payload) = self.receive_vec()? {
                return Ok(Some(payload));
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Ok(None);
            }
            if backoff.is_completed() {
                self.buffer.wait_for_data(Some(timeout - elapsed));
            } else {
                backoff.snooze();
            }
        }
    }

    /// Length of the next message, if any.
    pub fn peek_len(&self) -> Option<usize> {
        let _guard = self.lock.lock();
        unsafe { self.buffer.peek() }.map(|entry| entry.len())
    }

    /// Run `f` over the next message without consuming it.
    ///
    /// The slice handed to `f` cannot outlive the call, and nothing can
    /// dequeue until `f` returns.
    pub fn with_peek<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let _guard = self.lock.lock();
        // Safety: the view is dropped before the guard
        unsafe { self.buffer.peek() }.map(|entry| f(entry.payload()))
    }

    /// Discard the next message, returning its length.
    pub fn skip(&self) -> std::io::Result<Option<usize>> {
        let _guard = self.lock.lock();
        match unsafe { self.buffer.skip() } {
            Ok(len) => {
                self.received.fetch_add(1, Ordering::Relaxed);
                Ok(Some(len))
            }
            Err(QueueError::Empty) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> u32 {
        self.buffer.capacity()
    }

    /// Number of messages dequeued or skipped through this handle
    pub fn messages_received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub(crate) fn buffer(&self) -> &RingBuffer {
        &self.buffer
    }
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_consumer(self, f)
    }
}
