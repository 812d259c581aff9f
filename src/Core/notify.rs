// Data-available notification: a wakeup hint, never needed for correctness.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::alloc::QueueRegion;
use super::futex::futex_wake;

/// Something to poke when the queue goes from empty to non-empty.
///
/// Delivery is best effort. Implementations must not block and must not
/// panic; a consumer that misses a poke still finds the data on its next poll.
pub trait NotificationPort: Send + Sync {
    fn notify(&self);
}

impl<F> NotificationPort for F
where
    F: Fn() + Send + Sync,
{
    fn notify(&self) {
        self()
    }
}

/// Wakes consumers parked on the appendix sequence word, in any process
/// that maps the region.
pub struct FutexPort {
    region: Arc<QueueRegion>,
}

impl FutexPort {
    pub fn new(region: Arc<QueueRegion>) -> Self {
        Self { region }
    }
}

impl NotificationPort for FutexPort {
    fn notify(&self) {
        let word = &self.region.appendix().notify_seq;
        word.fetch_add(1, Ordering::Release);
        futex_wake(word);
    }
}
