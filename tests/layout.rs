// Layout conformance tests for ABI stability across processes and languages.
// These assert sizes, alignments and field offsets of the shared header and
// appendix, and the region sizing math built on them.
use dmxp_dataqueue::Core::alloc::QueueRegion;
use dmxp_dataqueue::SPSC::Buffer::layout::{
    self, QueueAppendix, QueueHeader, APPENDIX_VERSION, ENTRY_HEADER_SIZE, MAX_CAPACITY,
    QUEUE_HEADER_SIZE,
};
use memoffset::offset_of;
use std::mem::{align_of, size_of};

#[test]
fn test_queue_header_layout() {
    let size = size_of::<QueueHeader>();
    let off_capacity = offset_of!(QueueHeader, capacity);
    let off_head = offset_of!(QueueHeader, head);
    let off_tail = offset_of!(QueueHeader, tail);

    println!(
        "QueueHeader => size: {size}, align: {}, offsets: [capacity:{off_capacity}, head:{off_head}, tail:{off_tail}]",
        align_of::<QueueHeader>()
    );

    assert_eq!(size, 12);
    assert_eq!(QUEUE_HEADER_SIZE, 12);
    assert_eq!(align_of::<QueueHeader>(), 4);
    assert_eq!(off_capacity, 0);
    assert_eq!(off_head, 4);
    assert_eq!(off_tail, 8);
}

#[test]
fn test_appendix_layout() {
    assert_eq!(size_of::<QueueAppendix>(), 8);
    assert_eq!(align_of::<QueueAppendix>(), 4);
    assert_eq!(offset_of!(QueueAppendix, version), 0);
    assert_eq!(offset_of!(QueueAppendix, notify_seq), 4);
    assert_eq!(ENTRY_HEADER_SIZE, 4);
}

#[test]
fn test_region_sizing() {
    // Appendix follows the ring at the next 4-byte boundary
    assert_eq!(layout::appendix_offset(64), Some(76));
    assert_eq!(layout::appendix_offset(63), Some(76));
    assert_eq!(layout::appendix_offset(61), Some(76));
    assert_eq!(layout::required_size(64), Some(84));

    assert_eq!(layout::region_size(64, 4096), Some(4096));
    assert_eq!(layout::region_size(4096, 4096), Some(8192));
    assert_eq!(layout::region_size(usize::MAX, 4096), None);
    assert_eq!(layout::region_size(usize::MAX - 16, 4096), None);
}

#[test]
fn test_capacity_bounds() {
    assert!(!layout::is_valid_capacity(0));
    assert!(!layout::is_valid_capacity(ENTRY_HEADER_SIZE as usize));
    assert!(layout::is_valid_capacity(ENTRY_HEADER_SIZE as usize + 1));
    assert!(layout::is_valid_capacity(MAX_CAPACITY as usize));
    assert!(!layout::is_valid_capacity(MAX_CAPACITY as usize + 1));

    let err = QueueRegion::size_for(0).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    let err = QueueRegion::size_for(usize::MAX).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    assert!(QueueRegion::create_private(u32::MAX as usize).is_err());
}

#[test]
fn test_created_region_layout() {
    let region = QueueRegion::create_private(100).unwrap();
    let base = region.header_ptr() as usize;

    assert_eq!(region.capacity(), 100);
    assert_eq!(region.ring_ptr() as usize - base, 12);
    assert_eq!(region.appendix() as *const QueueAppendix as usize - base, 112);
    assert_eq!(region.version(), APPENDIX_VERSION);
    assert!(region.is_initialized());
    assert_eq!(region.cursors(), (0, 0));
    assert_eq!(region.memory_region().size() % dmxp_dataqueue::Core::page_size(), 0);

    // Ring bytes start zeroed
    let ring = unsafe { std::slice::from_raw_parts(region.ring_ptr(), 100) };
    assert!(ring.iter().all(|&b| b == 0));

    println!("Region: {:#?}", region);
}

#[test]
fn test_initialized_tracks_header_and_version() {
    let region = QueueRegion::create_private(64).unwrap();
    assert!(region.is_initialized());

    let base = region.header_ptr() as *mut u8;
    let version = unsafe { base.add(76) as *mut u32 };
    unsafe { std::ptr::write_volatile(version, APPENDIX_VERSION + 1) };
    assert!(!region.is_initialized());

    unsafe { std::ptr::write_volatile(version, APPENDIX_VERSION) };
    assert!(region.is_initialized());

    unsafe { std::ptr::write_volatile(base as *mut u32, 63) };
    assert!(!region.is_initialized());
}
