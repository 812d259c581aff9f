use std::io;
use thiserror::Error;

/// Why a queue operation did not complete.
///
/// Every variant leaves the queue exactly as it was; none of them is fatal to
/// the queue itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Nothing to dequeue or peek.
    #[error("queue is empty")]
    Empty,

    /// Not enough free room for an entry of `needed` framed bytes right now.
    #[error("queue is full: no room for a {needed}-byte entry")]
    Full { needed: u32 },

    /// The entry could never fit, even in an empty queue.
    #[error("entry of {len} bytes can never fit in a {capacity}-byte queue")]
    TooLarge { len: usize, capacity: u32 },

    /// The destination is smaller than the next entry. Retry with `needed` bytes.
    #[error("destination holds {available} bytes but the next entry needs {needed}")]
    BufferTooSmall { needed: usize, available: usize },

    /// The shared header or an entry length is inconsistent with the capacity.
    #[error("inconsistent queue layout (head={head}, tail={tail}, capacity={capacity})")]
    Corrupted { head: u32, tail: u32, capacity: u32 },
}

impl QueueError {
    /// Whether the same call can succeed later without the caller changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueueError::Empty | QueueError::Full { .. })
    }
}

impl From<QueueError> for io::Error {
    fn from(err: QueueError) -> Self {
        let kind = match err {
            QueueError::Empty | QueueError::Full { .. } => io::ErrorKind::WouldBlock,
            QueueError::TooLarge { .. } | QueueError::BufferTooSmall { .. } => {
                io::ErrorKind::InvalidInput
            }
            QueueError::Corrupted { .. } => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}
