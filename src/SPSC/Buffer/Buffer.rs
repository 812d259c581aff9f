// The lock-free SPSC byte ring over one QueueRegion

use crate::Core::alloc::QueueRegion;
use crate::Core::notify::NotificationPort;
use super::layout::QueueHeader;

use parking_lot::RwLock;
use std::sync::Arc;

/// A lock-free, single-producer, single-consumer ring of variable-length entries.
///
/// This struct is NOT stored in shared memory. It is a view that holds
/// pointers into a [`QueueRegion`]; the producer and the consumer each build
/// their own view, possibly in different processes.
///
/// ### Concurrency Design:
/// - **Producer (Enqueue)**: the only writer of `tail`. It reads `head` with
///   acquire ordering to learn how much room the consumer has freed, writes
///   the framed entry, then publishes the new `tail` with release ordering.
/// - **Consumer (Dequeue)**: the only writer of `head`. It reads `tail` with
///   acquire ordering so the producer's bytes are visible, copies the entry
///   out, then publishes the new `head` with release ordering.
/// - The producer never lets `tail` catch up with `head`, so `head == tail`
///   always means empty.
///
/// At most one thread may enqueue and at most one thread may dequeue at a time.
/// [`crate::SPSC::Producer`] and [`crate::SPSC::Consumer`] enforce that.
pub struct RingBuffer {
    /// Keeps the mapping alive for as long as this view exists.
    pub(crate) region: Arc<QueueRegion>,

    /// Pointer to the shared header at offset 0 of the region.
    pub(crate) header: *const QueueHeader,

    /// Pointer to the first ring byte.
    pub(crate) ring: *mut u8,

    /// Ring capacity, validated once and never re-read from shared memory.
    pub(crate) capacity: u32,

    /// Poked on an empty to non-empty transition.
    pub(crate) port: RwLock<Option<Arc<dyn NotificationPort>>>,
}

unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}
