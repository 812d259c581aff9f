// Shared memory backend abstraction for Linux
// Uses /dev/shm files (named) or memfd_create (anonymous) + mmap

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt::Debug;
use std::io;
use std::ptr::NonNull;

#[cfg(target_os = "linux")]
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

lazy_static::lazy_static! {
    static ref PAGE_SIZE: usize = query_page_size();
}

/// Shared memory backend trait for cross-platform memory mapping
pub trait SharedMemoryBackend: Send + Sync + Debug {
    /// Get a pointer to the mapped memory region
    fn as_ptr(&self) -> *mut u8;

    /// Get the size of the mapped region in bytes
    fn size(&self) -> usize;

    /// Get the handle another address space can map
    fn raw_handle(&self) -> RawHandle;
}

/// Platform-specific handle type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawHandle {
    /// Unix file descriptor (Linux)
    Fd(i32),
    /// Process-private memory, not shareable
    Private,
}

impl RawHandle {
    /// The file descriptor, if the region can be shared at all.
    pub fn fd(&self) -> Option<i32> {
        match *self {
            RawHandle::Fd(fd) => Some(fd),
            RawHandle::Private => None,
        }
    }
}

/// Platform page size in bytes.
pub fn page_size() -> usize {
    *PAGE_SIZE
}

#[cfg(unix)]
fn query_page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        4096
    } else {
        size as usize
    }
}

#[cfg(not(unix))]
fn query_page_size() -> usize {
    4096
}

/// Round `size` up to a whole number of pages. `None` on overflow.
pub fn round_to_page(size: usize) -> Option<usize> {
    let page = page_size();
    size.checked_add(page - 1).map(|v| v & !(page - 1))
}

/// Create a new shared memory region with the specified size
///
/// # Arguments
/// * `size` - Size of the region in bytes, rounded up to a page
/// * `name` - Name under /dev/shm for cross-process attachment by name.
///   `None` creates an anonymous memfd that is shared by passing its descriptor.
///
/// # Returns
/// A boxed trait object implementing SharedMemoryBackend, zero-filled
#[cfg(target_os = "linux")]
pub fn create_shared_memory(
    size: usize,
    name: Option<&str>,
) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Ok(Box::new(LinuxSharedMemory::create(size, name)?))
}

/// Attach to an existing named shared memory region
///
/// # Arguments
/// * `name` - Name of the region under /dev/shm
/// * `min_size` - Minimum size the region must have
#[cfg(target_os = "linux")]
pub fn attach_shared_memory(
    name: &str,
    min_size: usize,
) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Ok(Box::new(LinuxSharedMemory::attach(name, min_size)?))
}

/// Map a region received as a file descriptor (inherited or passed over a socket).
#[cfg(target_os = "linux")]
pub fn map_shared_fd(fd: OwnedFd, min_size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Ok(Box::new(LinuxSharedMemory::from_fd(fd, min_size)?))
}

/// Remove a named region from /dev/shm. Existing mappings stay valid.
#[cfg(target_os = "linux")]
pub fn unlink_shared_memory(name: &str) -> io::Result<()> {
    std::fs::remove_file(shm_path(name))
}

#[cfg(not(target_os = "linux"))]
pub fn create_shared_memory(
    _size: usize,
    _name: Option<&str>,
) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Shared memory only supported on Linux",
    ))
}

#[cfg(not(target_os = "linux"))]
pub fn attach_shared_memory(
    _name: &str,
    _min_size: usize,
) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Shared memory only supported on Linux",
    ))
}

#[cfg(not(target_os = "linux"))]
pub fn unlink_shared_memory(_name: &str) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Shared memory only supported on Linux",
    ))
}

/// Allocate zeroed, page-aligned memory private to this process.
///
/// Useful when producer and consumer live in the same address space.
pub fn allocate_private_memory(size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Ok(Box::new(PrivateMemory::allocate(size)?))
}

#[cfg(target_os = "linux")]
fn shm_path(name: &str) -> String {
    format!("/dev/shm/{}", name)
}

#[cfg(target_os = "linux")]
#[derive(Debug)]
pub struct LinuxSharedMemory {
    ptr: NonNull<u8>,
    size: usize,
    fd: OwnedFd,
}

#[cfg(target_os = "linux")]
unsafe impl Send for LinuxSharedMemory {}
#[cfg(target_os = "linux")]
unsafe impl Sync for LinuxSharedMemory {}

#[cfg(target_os = "linux")]
impl LinuxSharedMemory {
    /// Create a new region, either named under /dev/shm or as an anonymous memfd
    pub fn create(size: usize, name: Option<&str>) -> io::Result<Self> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let size = round_to_page(size).filter(|&s| s > 0).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid shared memory size: {}", size),
            )
        })?;

        let fd: OwnedFd = match name {
            Some(name) => {
                let path = shm_path(name);
                // Create or truncate the file in /dev/shm
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(0o600)
                    .open(&path)
                    .map_err(|e| {
                        io::Error::new(
                            e.kind(),
                            format!("Failed to create shared memory file at {}: {}", path, e),
                        )
                    })?;
                file.into()
            }
            None => {
                let raw = unsafe {
                    libc::memfd_create(
                        b"dmxp_dataqueue\0".as_ptr() as *const libc::c_char,
                        libc::MFD_CLOEXEC,
                    )
                };
                if raw < 0 {
                    return Err(io::Error::last_os_error());
                }
                unsafe { OwnedFd::from_raw_fd(raw) }
            }
        };

        // Set size; the new pages read as zero
        if unsafe { libc::ftruncate(fd.as_raw_fd(), size as libc::off_t) } != 0 {
            return Err(io::Error::last_os_error());
        }

        Self::map(fd, size)
    }

    /// Attach to an existing named region
    pub fn attach(name: &str, min_size: usize) -> io::Result<Self> {
        use std::fs::OpenOptions;

        let path = shm_path(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("Failed to open shared memory at {}: {}", path, e),
                )
            })?;

        Self::from_fd(file.into(), min_size)
    }

    /// Map an already-open descriptor using its current size
    pub fn from_fd(fd: OwnedFd, min_size: usize) -> io::Result<Self> {
        let actual_size = unsafe {
            let mut stat: libc::stat = std::mem::zeroed();
            if libc::fstat(fd.as_raw_fd(), &mut stat) != 0 {
                return Err(io::Error::last_os_error());
            }
            stat.st_size as usize
        };

        if actual_size == 0 || actual_size < min_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Shared memory too small: expected at least {}, got {}",
                    min_size, actual_size
                ),
            ));
        }

        Self::map(fd, actual_size)
    }

    fn map(fd: OwnedFd, size: usize) -> io::Result<Self> {
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd.as_raw_fd(),
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        let ptr = NonNull::new(ptr as *mut u8)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned null"))?;

        Ok(Self { ptr, size, fd })
    }
}

#[cfg(target_os = "linux")]
impl Drop for LinuxSharedMemory {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size);
        }
        // fd is closed by OwnedFd
    }
}

#[cfg(target_os = "linux")]
impl SharedMemoryBackend for LinuxSharedMemory {
    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn raw_handle(&self) -> RawHandle {
        RawHandle::Fd(self.fd.as_raw_fd())
    }
}

/// Page-aligned heap memory that never leaves this process.
#[derive(Debug)]
pub struct PrivateMemory {
    ptr: NonNull<u8>,
    layout: Layout,
}

unsafe impl Send for PrivateMemory {}
unsafe impl Sync for PrivateMemory {}

impl PrivateMemory {
    pub fn allocate(size: usize) -> io::Result<Self> {
        let size = round_to_page(size).filter(|&s| s > 0).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid private memory size: {}", size),
            )
        })?;
        let layout = Layout::from_size_align(size, page_size())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("Failed to allocate {} bytes of private memory", size),
            )
        })?;

        Ok(Self { ptr, layout })
    }
}

impl Drop for PrivateMemory {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl SharedMemoryBackend for PrivateMemory {
    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn size(&self) -> usize {
        self.layout.size()
    }

    fn raw_handle(&self) -> RawHandle {
        RawHandle::Private
    }
}
