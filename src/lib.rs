// Module naming follows project convention (SPSC = Single-Producer Single-Consumer)
#[allow(non_snake_case)]
pub mod SPSC;

#[allow(non_snake_case)]
pub mod Core;

#[allow(non_snake_case)]
pub mod Debug;

pub mod error;
pub mod ffi;

pub use error::QueueError;
pub use Core::notify::{FutexPort, NotificationPort};
pub use Core::QueueRegion;
pub use SPSC::Buffer::RingBuffer;
pub use SPSC::{Consumer, Producer, QueueBuilder};
