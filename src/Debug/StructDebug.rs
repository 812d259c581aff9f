use crate::Core::alloc::QueueRegion;
use crate::SPSC::Buffer::RingBuffer;
use crate::SPSC::{Consumer, Producer};
use std::fmt;

/// Debug function for QueueRegion
///
/// Provides a safe debug representation that shows:
/// - Header pointer location
/// - Capacity and current cursors
/// - Backing store handle
/// - Initialization status
pub fn debug_queue_region(region: &QueueRegion, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (head, tail) = region.cursors();
    f.debug_struct("QueueRegion")
        .field("header", &format_args!("{:p}", region.header_ptr()))
        .field("capacity", &region.capacity())
        .field("head", &head)
        .field("tail", &tail)
        .field("handle", &region.memory_region().raw_handle())
        .field("size", &region.memory_region().size())
        .field("initialized", &region.is_initialized())
        .finish()
}

/// Debug function for RingBuffer
///
/// Shows cursors and whether a notification port is installed,
/// never the payload bytes.
pub fn debug_ring_buffer(buffer: &RingBuffer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (head, tail) = buffer.cursors();
    f.debug_struct("RingBuffer")
        .field("ring", &format_args!("0x{:x}", buffer.ring as usize))
        .field("capacity", &buffer.capacity)
        .field("head", &head)
        .field("tail", &tail)
        .field("notifies", &buffer.has_notification_port())
        .finish()
}

pub fn debug_producer(producer: &Producer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Producer")
        .field("buffer", producer.buffer())
        .field("messages_sent", &producer.messages_sent())
        .finish()
}

pub fn debug_consumer(consumer: &Consumer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Consumer")
        .field("buffer", consumer.buffer())
        .field("messages_received", &consumer.messages_received())
        .finish()
}
