use std::sync::atomic::AtomicU32;
use std::time::Duration;

// The futex word lives in memory mapped by several processes, so these use
// the shared (non-PRIVATE) futex operations.

/// Park until `atomic` is woken or no longer holds `expected`.
///
/// Returns `false` if the wait ended because `timeout` elapsed.
#[cfg(target_os = "linux")]
pub fn futex_wait(atomic: &AtomicU32, expected: u32, timeout: Option<Duration>) -> bool {
    use std::ptr;
    use std::sync::atomic::Ordering;

    // Check condition first to avoid syscall if possible
    if atomic.load(Ordering::Relaxed) != expected {
        return true;
    }

    let ts = timeout.map(|t| libc::timespec {
        tv_sec: t.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
        tv_nsec: t.subsec_nanos() as libc::c_long,
    });
    let ts_ptr = ts
        .as_ref()
        .map_or(ptr::null(), |ts| ts as *const libc::timespec);

    let rc = unsafe {
        libc::syscall(
            libc::SYS_futex,
            atomic as *const AtomicU32 as *const u32,
            libc::FUTEX_WAIT,
            expected,
            ts_ptr,
            ptr::null::<u32>(),
            0u32,
        )
    };

    !(rc != 0 && std::io::Error::last_os_error().raw_os_error() == Some(libc::ETIMEDOUT))
}

/// Wake every waiter parked on `atomic`. Returns the number woken.
#[cfg(target_os = "linux")]
pub fn futex_wake(atomic: &AtomicU32) -> usize {
    let rc = unsafe {
        libc::syscall(
            libc::SYS_futex,
            atomic as *const AtomicU32 as *const u32,
            libc::FUTEX_WAKE,
            i32::MAX,
            std::ptr::null::<libc::timespec>(),
            std::ptr::null::<u32>(),
            0u32,
        )
    };
    if rc < 0 {
        log::warn!(
            "futex wake failed: {}",
            std::io::Error::last_os_error()
        );
        0
    } else {
        rc as usize
    }
}

#[cfg(not(target_os = "linux"))]
pub fn futex_wait(_atomic: &AtomicU32, _expected: u32, timeout: Option<Duration>) -> bool {
    // Fallback for non-Linux: short sleep, caller re-checks the queue
    std::thread::sleep(timeout.map_or(Duration::from_millis(1), |t| t.min(Duration::from_millis(1))));
    true
}

#[cfg(not(target_os = "linux"))]
pub fn futex_wake(_atomic: &AtomicU32) -> usize {
    // No-op on non-Linux
    0
}
