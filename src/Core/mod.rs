pub mod SharedMemory;
pub mod alloc;
pub mod futex;
pub mod notify;

pub use SharedMemory::{
    allocate_private_memory, attach_shared_memory, create_shared_memory, page_size, RawHandle,
    SharedMemoryBackend,
};
#[cfg(target_os = "linux")]
pub use SharedMemory::{map_shared_fd, unlink_shared_memory};
pub use alloc::QueueRegion;
pub use notify::{FutexPort, NotificationPort};
