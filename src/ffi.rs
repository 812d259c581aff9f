use crate::Core::alloc::QueueRegion;
use crate::Core::notify::NotificationPort;
use crate::SPSC::Buffer::RingBuffer;
use crate::error::QueueError;
use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;

// Error codes
pub const DMXP_SUCCESS: i32 = 0;
pub const DMXP_ERROR_NULL_POINTER: i32 = -1;
pub const DMXP_ERROR_INVALID_ARG: i32 = -2;
pub const DMXP_ERROR_ALLOCATION_FAILED: i32 = -3;
pub const DMXP_ERROR_QUEUE_FULL: i32 = -4;
pub const DMXP_ERROR_EMPTY: i32 = -5;
pub const DMXP_ERROR_BUFFER_TOO_SMALL: i32 = -6;
pub const DMXP_ERROR_CORRUPTED: i32 = -7;

/// Handle to a data queue view (opaque pointer)
///
/// The caller is responsible for using one handle as the only producer and
/// one (possibly the same) handle as the only consumer at any time.
pub struct DataQueueHandle {
    inner: RingBuffer,
}

/// Callback invoked when the queue goes from empty to non-empty.
pub type DmxpNotifyFn = extern "C" fn(ctx: *mut c_void);

struct CallbackPort {
    callback: DmxpNotifyFn,
    // Stored as an integer so the port is Send + Sync; the C side owns it
    ctx: usize,
}

impl NotificationPort for CallbackPort {
    fn notify(&self) {
        (self.callback)(self.ctx as *mut c_void);
    }
}

fn error_code(err: QueueError) -> i32 {
    match err {
        QueueError::Empty => DMXP_ERROR_EMPTY,
        QueueError::Full { .. } => DMXP_ERROR_QUEUE_FULL,
        QueueError::TooLarge { .. } => DMXP_ERROR_INVALID_ARG,
        QueueError::BufferTooSmall { .. } => DMXP_ERROR_BUFFER_TOO_SMALL,
        QueueError::Corrupted { .. } => DMXP_ERROR_CORRUPTED,
    }
}

fn into_handle(region: QueueRegion) -> *mut DataQueueHandle {
    let handle = Box::new(DataQueueHandle {
        inner: RingBuffer::new(Arc::new(region)),
    });
    Box::into_raw(handle)
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

/// Create a new queue in an anonymous shared memory region.
///
/// # Arguments
/// * `capacity` - Ring capacity in bytes.
///
/// # Returns
/// * Pointer to `DataQueueHandle`, or NULL on failure.
#[no_mangle]
pub extern "C" fn dmxp_queue_create(capacity: u32) -> *mut DataQueueHandle {
    match QueueRegion::create(capacity as usize, None) {
        Ok(region) => into_handle(region),
        Err(e) => {
            log::error!("dmxp_queue_create({}) failed: {}", capacity, e);
            ptr::null_mut()
        }
    }
}

/// Attach to a queue region shared as a file descriptor.
///
/// The descriptor is duplicated; the caller keeps ownership of `fd`.
#[cfg(target_os = "linux")]
#[no_mangle]
pub extern "C" fn dmxp_queue_attach_fd(fd: i32) -> *mut DataQueueHandle {
    use std::os::fd::{FromRawFd, OwnedFd};

    let dup = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 0) };
    if dup < 0 {
        log::error!(
            "dmxp_queue_attach_fd({}) failed: {}",
            fd,
            std::io::Error::last_os_error()
        );
        return ptr::null_mut();
    }

    match QueueRegion::from_fd(unsafe { OwnedFd::from_raw_fd(dup) }) {
        Ok(region) => into_handle(region),
        Err(e) => {
            log::error!("dmxp_queue_attach_fd({}) failed: {}", fd, e);
            ptr::null_mut()
        }
    }
}

/// Free a queue handle. The region is unmapped once no handle uses it.
#[no_mangle]
pub extern "C" fn dmxp_queue_free(handle: *mut DataQueueHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle); // Dropped automatically
        }
    }
}

// -----------------------------------------------------------------------------
// Queue operations
// -----------------------------------------------------------------------------

/// Enqueue `size` bytes from `data`.
///
/// # Returns
/// * 0 on success, negative error code otherwise.
#[no_mangle]
pub extern "C" fn dmxp_queue_enqueue(
    handle: *mut DataQueueHandle,
    data: *const u8,
    size: u32,
) -> i32 {
    if handle.is_null() || (data.is_null() && size != 0) {
        return DMXP_ERROR_NULL_POINTER;
    }

    let queue = unsafe { &(*handle).inner };
    let slice: &[u8] = if size == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(data, size as usize) }
    };

    // Safety: the C caller keeps a single producer per queue
    match unsafe { queue.enqueue(slice) } {
        Ok(()) => DMXP_SUCCESS,
        Err(e) => error_code(e),
    }
}

/// Dequeue the oldest entry.
///
/// # Arguments
/// * `out_buf` - Buffer to write the entry into. NULL discards the entry.
/// * `inout_size` - Input: size of `out_buf`. Output: length of the entry.
///
/// # Returns
/// * 0 on success.
/// * DMXP_ERROR_EMPTY if the queue is empty.
/// * DMXP_ERROR_BUFFER_TOO_SMALL if `out_buf` is too small; `*inout_size`
///   holds the needed length and the entry stays queued.
#[no_mangle]
pub extern "C" fn dmxp_queue_dequeue(
    handle: *mut DataQueueHandle,
    out_buf: *mut u8,
    inout_size: *mut u32,
) -> i32 {
    if handle.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }

    let queue = unsafe { &(*handle).inner };

    if out_buf.is_null() {
        return match unsafe { queue.skip() } {
            Ok(len) => {
                if !inout_size.is_null() {
                    unsafe { *inout_size = len as u32 };
                }
                DMXP_SUCCESS
            }
            Err(e) => error_code(e),
        };
    }

    if inout_size.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }

    let max_len = unsafe { *inout_size } as usize;
    let buf = unsafe { std::slice::from_raw_parts_mut(out_buf, max_len) };

    match unsafe { queue.dequeue(buf) } {
        Ok(len) => {
            unsafe { *inout_size = len as u32 };
            DMXP_SUCCESS
        }
        Err(QueueError::BufferTooSmall { needed, .. }) => {
            unsafe { *inout_size = needed as u32 };
            DMXP_ERROR_BUFFER_TOO_SMALL
        }
        Err(e) => error_code(e),
    }
}

/// Peek at the oldest entry.
///
/// # Returns
/// * Pointer to the payload, valid until the next dequeue on this queue,
///   with its length in `*out_size`; NULL if the queue is empty.
#[no_mangle]
pub extern "C" fn dmxp_queue_peek(handle: *mut DataQueueHandle, out_size: *mut u32) -> *const u8 {
    if handle.is_null() {
        return ptr::null();
    }

    let queue = unsafe { &(*handle).inner };
    // Safety: the pointer is documented as invalid after the next dequeue
    match unsafe { queue.peek() } {
        Some(entry) => {
            if !out_size.is_null() {
                unsafe { *out_size = entry.len() as u32 };
            }
            entry.payload().as_ptr()
        }
        None => ptr::null(),
    }
}

/// File descriptor of the backing region, for passing to another process.
///
/// # Returns
/// * The descriptor, or -1 if the region cannot be shared.
#[no_mangle]
pub extern "C" fn dmxp_queue_memory_fd(handle: *mut DataQueueHandle) -> i32 {
    if handle.is_null() {
        return -1;
    }
    let queue = unsafe { &(*handle).inner };
    queue
        .region()
        .memory_region()
        .raw_handle()
        .fd()
        .unwrap_or(-1)
}

/// Register a callback for empty to non-empty transitions. NULL clears it.
#[no_mangle]
pub extern "C" fn dmxp_queue_set_notification(
    handle: *mut DataQueueHandle,
    callback: Option<DmxpNotifyFn>,
    ctx: *mut c_void,
) -> i32 {
    if handle.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }
    let queue = unsafe { &(*handle).inner };
    let port = callback.map(|callback| {
        Arc::new(CallbackPort {
            callback,
            ctx: ctx as usize,
        }) as Arc<dyn NotificationPort>
    });
    queue.set_notification_port(port);
    DMXP_SUCCESS
}
