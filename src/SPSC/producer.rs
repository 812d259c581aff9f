// In src/SPSC/producer.rs
use crate::Core::notify::NotificationPort;
use crate::Core::SharedMemory::SharedMemoryBackend;
use crate::SPSC::Buffer::RingBuffer;
use crate::error::QueueError;
use crossbeam_utils::Backoff;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The writing end of a data queue.
///
/// Sends are serialized through an internal lock, so a `Producer` shared
/// between threads still honours the single-writer rule of the ring. Create
/// at most one `Producer` per region.
pub struct Producer {
    buffer: RingBuffer,
    lock: Mutex<()>,
    sent: AtomicU64,
}

impl Producer {
    pub(crate) fn new(buffer: RingBuffer) -> Self {
        Self {
            buffer,
            lock: Mutex::new(()),
            sent: AtomicU64::new(0),
        }
    }

    /// Enqueue a message, returning the queue's own error on failure.
    pub fn try_send(&self, message: &[u8]) -> Result<(), QueueError> {
        let _guard = self.lock.lock();
        // Safety: the lock makes this the only enqueue in flight
        unsafe { self.buffer.enqueue(message) }?;
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Sends a message through the queue.
    ///
    /// # Returns
    /// * `Ok(())` if the message was enqueued
    /// * `WouldBlock` if the queue is full right now
    /// * `InvalidInput` if the message can never fit
    pub fn send<T: AsRef<[u8]>>(&self, message: T) -> std::io::Result<()> {
        self.try_send(message.as_ref()).map_err(Into::into)
    }

    /// Keep retrying a full queue until `timeout` passes.
    ///
    /// The consumer sends no wakeup for freed space, so this spins, then
    /// backs off to short sleeps.
    pub fn send_timeout<T: AsRef<[u8]>>(&self, message: T, timeout: Duration) -> std::io::Result<()> {
        let message = message.as_ref();
        let start = Instant::now();
        let backoff = Backoff::new();

        loop {
            match self.try_send(message) {
                Ok(()) => return Ok(()),
                Err(QueueError::Full { .. }) => {
                    if start.elapsed() >= timeout {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::TimedOut,
                            "Timed out waiting for room in the queue",
                        ));
                    }
                    if backoff.is_completed() {
                        let remaining = timeout.saturating_sub(start.elapsed());
                        std::thread::sleep(remaining.min(Duration::from_micros(100)));
                    } else {
                        backoff.snooze();
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Replace what gets poked when the queue becomes non-empty.
    pub fn set_notification_port(&self, port: Option<Arc<dyn NotificationPort>>) {
        self.buffer.set_notification_port(port);
    }

    /// Whether a notification port is installed.
    pub fn has_notification_port(&self) -> bool {
        self.buffer.has_notification_port()
    }

    /// The backing store, for handing to another process.
    pub fn memory_region(&self) -> &dyn SharedMemoryBackend {
        self.buffer.region().memory_region()
    }

    pub fn capacity(&self) -> u32 {
        self.buffer.capacity()
    }

    /// Number of messages enqueued through this handle
    pub fn messages_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub(crate) fn buffer(&self) -> &RingBuffer {
        &self.buffer
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_producer(self, f)
    }
}
