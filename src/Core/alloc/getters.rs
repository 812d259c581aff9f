use super::*;

/// Getter methods for QueueRegion
///
/// These expose the raw layout for debugging, monitoring and the C ABI.
impl QueueRegion {
    /// Get the raw pointer to the QueueHeader
    ///
    /// # Safety
    /// The caller must ensure the pointer is not used after the region is dropped
    pub fn header_ptr(&self) -> *const QueueHeader {
        self.header
    }

    /// Get the raw pointer to the first ring byte
    pub fn ring_ptr(&self) -> *mut u8 {
        self.ring
    }

    /// Layout version stored in the appendix
    pub fn version(&self) -> u32 {
        unsafe { std::ptr::read_volatile(&(*self.appendix).version) }
    }

    /// Check if the region carries a valid header and appendix
    ///
    /// Returns true if the stored capacity matches this view and the
    /// appendix version is the expected one.
    pub fn is_initialized(&self) -> bool {
        // header points into a mapping that is never null
        let stored = unsafe { std::ptr::read_volatile(&(*self.header).capacity) };
        stored == self.capacity && self.version() == APPENDIX_VERSION
    }

    /// Current (head, tail) as seen by an observer
    pub fn cursors(&self) -> (u32, u32) {
        let header = self.header();
        (
            header.head.load(Ordering::Acquire),
            header.tail.load(Ordering::Acquire),
        )
    }
}
