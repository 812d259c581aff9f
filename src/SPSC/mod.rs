mod builder;
mod consumer;
mod producer;

pub use builder::QueueBuilder;
pub use consumer::Consumer;
pub use producer::Producer;

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub mod codec;
    pub mod layout;
    pub use Buffer::RingBuffer; // re-export for stable path
    pub use layout::{QueueAppendix, QueueHeader, ENTRY_HEADER_SIZE, QUEUE_HEADER_SIZE};
}

pub mod Structs {
    pub mod Buffer_Structs;
    pub use Buffer_Structs::EntryView; // re-export for stable path
}
