use super::{Consumer, Producer};
use crate::Core::alloc::QueueRegion;
use crate::Core::notify::FutexPort;
use crate::SPSC::Buffer::RingBuffer;
use std::sync::Arc;

/// Where the queue region comes from.
#[derive(Debug, Clone)]
enum Backing {
    /// Anonymous memfd, shared by passing its descriptor
    Anonymous,
    /// Named region under /dev/shm
    Named(String),
    /// Heap memory private to this process
    Private,
}

pub struct QueueBuilder {
    capacity: usize,
    backing: Backing,
    notifications: bool,
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self {
            capacity: 1024 * 1024, // 1MB default
            backing: Backing::Anonymous,
            notifications: true,
        }
    }
}

impl QueueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ring capacity in bytes (length prefixes included).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Back the queue with a named /dev/shm region other processes can attach to.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.backing = Backing::Named(name.into());
        self
    }

    /// Back the queue with process-private memory.
    pub fn private(mut self) -> Self {
        self.backing = Backing::Private;
        self
    }

    /// Whether the producer wakes futex waiters on empty to non-empty transitions.
    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications = enabled;
        self
    }

    fn create_region(&self) -> std::io::Result<Arc<QueueRegion>> {
        let region = match &self.backing {
            Backing::Anonymous => QueueRegion::create(self.capacity, None)?,
            Backing::Named(name) => QueueRegion::create(self.capacity, Some(name.as_str()))?,
            Backing::Private => QueueRegion::create_private(self.capacity)?,
        };
        Ok(Arc::new(region))
    }

    fn producer_for(&self, region: &Arc<QueueRegion>) -> Producer {
        let buffer = RingBuffer::new(Arc::clone(region));
        if self.notifications {
            buffer.set_notification_port(Some(Arc::new(FutexPort::new(Arc::clone(region)))));
        }
        Producer::new(buffer)
    }

    /// Create a region and return both ends of the queue.
    pub fn build(self) -> std::io::Result<(Producer, Consumer)> {
        let region = self.create_region()?;
        let producer = self.producer_for(&region);
        let consumer = Consumer::new(RingBuffer::new(region));
        Ok((producer, consumer))
    }

    /// Create the region and return its producer end.
    pub fn build_producer(self) -> std::io::Result<Producer> {
        let region = self.create_region()?;
        Ok(self.producer_for(&region))
    }

    /// Attach to the named region a producer created.
    #[cfg(target_os = "linux")]
    pub fn build_consumer(self) -> std::io::Result<Consumer> {
        match &self.backing {
            Backing::Named(name) => {
                let region = QueueRegion::attach(name)?;
                Ok(Consumer::new(RingBuffer::new(Arc::new(region))))
            }
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "A consumer can only attach to a named queue",
            )),
        }
    }
}
