use crate::Core::SharedMemory::{self, SharedMemoryBackend};
use crate::SPSC::Buffer::layout::{
    self, QueueAppendix, QueueHeader, APPENDIX_VERSION, MAX_CAPACITY, QUEUE_HEADER_SIZE,
};
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
mod debug;
mod getters;

/// The memory behind one queue: header, ring bytes and appendix.
///
/// Views hold it in an `Arc`; the mapping lives as long as the longest holder.
pub struct QueueRegion {
    shm: Box<dyn SharedMemoryBackend>,
    header: *mut QueueHeader,
    ring: *mut u8,
    appendix: *mut QueueAppendix,
    capacity: u32,
}

impl QueueRegion {
    /// Create a zero-initialized queue region for a ring of `capacity` bytes.
    ///
    /// `name` selects a named /dev/shm region; `None` creates an anonymous one
    /// shared through its file descriptor.
    pub fn create(capacity: usize, name: Option<&str>) -> io::Result<Self> {
        let size = Self::size_for(capacity)?;
        let shm = SharedMemory::create_shared_memory(size, name).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!(
                    "Failed to create shared memory:\n\
                    ├─ Capacity:    {capacity}\n\
                    ├─ Region size: {size}\n\
                    ╰─ Error: {e}"
                ),
            )
        })?;
        Self::init(shm, capacity as u32)
    }

    /// Create a region in process-private memory.
    pub fn create_private(capacity: usize) -> io::Result<Self> {
        let size = Self::size_for(capacity)?;
        let shm = SharedMemory::allocate_private_memory(size)?;
        Self::init(shm, capacity as u32)
    }

    /// Attach to a region another process created under `name`.
    #[cfg(target_os = "linux")]
    pub fn attach(name: &str) -> io::Result<Self> {
        let shm = SharedMemory::attach_shared_memory(name, QUEUE_HEADER_SIZE)?;
        Self::from_backend(shm)
    }

    /// Attach to a region received as a file descriptor.
    #[cfg(target_os = "linux")]
    pub fn from_fd(fd: std::os::fd::OwnedFd) -> io::Result<Self> {
        let shm = SharedMemory::map_shared_fd(fd, QUEUE_HEADER_SIZE)?;
        Self::from_backend(shm)
    }

    /// Validate an already-mapped region and build a view of it.
    ///
    /// The creator may be hostile, so every field is checked against the
    /// mapping before anything else touches it.
    pub fn from_backend(shm: Box<dyn SharedMemoryBackend>) -> io::Result<Self> {
        if shm.size() < QUEUE_HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Shared memory too small for queue header",
            ));
        }

        let header = shm.as_ptr() as *mut QueueHeader;
        let capacity = unsafe { std::ptr::read_volatile(&(*header).capacity) };

        if !layout::is_valid_capacity(capacity as usize) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid queue capacity in shared memory: {}", capacity),
            ));
        }

        let needed = layout::required_size(capacity as usize).unwrap_or(usize::MAX);
        if shm.size() < needed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Shared memory too small: capacity {} needs {} bytes, got {}",
                    capacity,
                    needed,
                    shm.size()
                ),
            ));
        }

        let region = unsafe { Self::from_parts(shm, capacity) };

        let version = region.version();
        if version != APPENDIX_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Unsupported queue version {} (expected {})",
                    version, APPENDIX_VERSION
                ),
            ));
        }

        let head = region.header().head.load(Ordering::Acquire);
        let tail = region.header().tail.load(Ordering::Acquire);
        if head > capacity || tail > capacity {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Queue cursors out of range: head={} tail={} capacity={}",
                    head, tail, capacity
                ),
            ));
        }

        log::debug!(
            "attached data queue: capacity={} head={} tail={} region={}",
            capacity,
            head,
            tail,
            region.shm.size()
        );
        Ok(region)
    }

    /// Region size needed for a ring of `capacity` bytes, page rounded.
    pub fn size_for(capacity: usize) -> io::Result<usize> {
        if !layout::is_valid_capacity(capacity) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Capacity must be between {} and {} bytes, got {}",
                    layout::ENTRY_HEADER_SIZE + 1,
                    MAX_CAPACITY,
                    capacity
                ),
            ));
        }
        layout::region_size(capacity, SharedMemory::page_size()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Capacity {} overflows the region size", capacity),
            )
        })
    }

    fn init(shm: Box<dyn SharedMemoryBackend>, capacity: u32) -> io::Result<Self> {
        let needed = layout::required_size(capacity as usize).unwrap_or(usize::MAX);
        if shm.size() < needed {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!(
                    "Backing store of {} bytes cannot hold {} bytes",
                    shm.size(),
                    needed
                ),
            ));
        }

        // Initialize header and appendix; the ring bytes are already zero
        unsafe {
            std::ptr::write(
                shm.as_ptr() as *mut QueueHeader,
                QueueHeader {
                    capacity,
                    head: AtomicU32::new(0),
                    tail: AtomicU32::new(0),
                },
            );
            let appendix = shm
                .as_ptr()
                .add(layout::appendix_offset(capacity as usize).unwrap_or(0))
                as *mut QueueAppendix;
            std::ptr::write(
                appendix,
                QueueAppendix {
                    version: APPENDIX_VERSION,
                    notify_seq: AtomicU32::new(0),
                },
            );
        }

        let region = unsafe { Self::from_parts(shm, capacity) };
        log::debug!(
            "created data queue: capacity={} region={}",
            capacity,
            region.shm.size()
        );
        Ok(region)
    }

    /// # Safety
    /// `shm` must be at least `required_size(capacity)` bytes.
    unsafe fn from_parts(shm: Box<dyn SharedMemoryBackend>, capacity: u32) -> Self {
        let base = shm.as_ptr();
        let appendix_offset = layout::appendix_offset(capacity as usize).unwrap_or(0);
        Self {
            header: base as *mut QueueHeader,
            ring: base.add(QUEUE_HEADER_SIZE),
            appendix: base.add(appendix_offset) as *mut QueueAppendix,
            capacity,
            shm,
        }
    }

    /// Ring capacity in bytes, as validated when this view was built.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The shared queue header.
    pub fn header(&self) -> &QueueHeader {
        unsafe { &*self.header }
    }

    /// The appendix after the ring.
    pub fn appendix(&self) -> &QueueAppendix {
        unsafe { &*self.appendix }
    }

    /// The backing store, for mapping into another address space.
    pub fn memory_region(&self) -> &dyn SharedMemoryBackend {
        &*self.shm
    }
}

// Implement Send + Sync since all shared state is accessed through atomics
// or under the single-producer/single-consumer discipline
unsafe impl Send for QueueRegion {}
unsafe impl Sync for QueueRegion {}
