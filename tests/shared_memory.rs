// Shared memory backend tests for Linux
// Run with: cargo test --test shared_memory -- --nocapture

#[cfg(target_os = "linux")]
mod linux_tests {
    use dmxp_dataqueue::Core::alloc::QueueRegion;
    use dmxp_dataqueue::Core::{
        attach_shared_memory, create_shared_memory, map_shared_fd, page_size,
        unlink_shared_memory, RawHandle,
    };
    use dmxp_dataqueue::RingBuffer;
    use serial_test::serial;
    use std::io::ErrorKind;
    use std::os::fd::{FromRawFd, OwnedFd};
    use std::sync::Arc;

    fn unique_name(tag: &str) -> String {
        format!("dmxp_test_{}_{}", std::process::id(), tag)
    }

    fn dup_fd(fd: i32) -> OwnedFd {
        let dup = unsafe { libc::dup(fd) };
        assert!(dup >= 0, "dup failed: {}", std::io::Error::last_os_error());
        unsafe { OwnedFd::from_raw_fd(dup) }
    }

    #[test]
    fn test_anonymous_region_is_page_rounded_and_zeroed() {
        let shm = create_shared_memory(100, None).unwrap();

        assert_eq!(shm.size(), page_size());
        assert!(!shm.as_ptr().is_null());
        assert!(matches!(shm.raw_handle(), RawHandle::Fd(fd) if fd >= 0));

        let slice = unsafe { std::slice::from_raw_parts(shm.as_ptr(), shm.size()) };
        assert!(slice.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_shared_memory_size() {
        let sizes = vec![4096, 65536, 1024 * 1024];

        for size in sizes {
            let shm = create_shared_memory(size, None).unwrap();
            assert_eq!(shm.size() % page_size(), 0);
            assert!(shm.size() >= size);
        }
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let err = create_shared_memory(0, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    #[serial]
    fn test_named_region_is_visible_to_attach() {
        let name = unique_name("named");
        let creator = create_shared_memory(8192, Some(&name)).unwrap();
        unsafe { *creator.as_ptr().add(100) = 0x42 };

        let attached = attach_shared_memory(&name, 8192).unwrap();
        assert_eq!(attached.size(), creator.size());
        assert_eq!(unsafe { *attached.as_ptr().add(100) }, 0x42);

        // Writes go both ways
        unsafe { *attached.as_ptr().add(200) = 0x17 };
        assert_eq!(unsafe { *creator.as_ptr().add(200) }, 0x17);

        unlink_shared_memory(&name).unwrap();
    }

    #[test]
    #[serial]
    fn test_attach_missing_region_fails() {
        let err = attach_shared_memory(&unique_name("missing"), 4096).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = QueueRegion::attach(&unique_name("missing")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    #[serial]
    fn test_attach_requires_min_size() {
        let name = unique_name("small");
        let _creator = create_shared_memory(4096, Some(&name)).unwrap();

        let err = attach_shared_memory(&name, 1 << 20).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);

        unlink_shared_memory(&name).unwrap();
    }

    #[test]
    fn test_map_shared_fd_sees_same_bytes() {
        let shm = create_shared_memory(4096, None).unwrap();
        let fd = shm.raw_handle().fd().unwrap();

        let second = map_shared_fd(dup_fd(fd), 4096).unwrap();
        assert_ne!(second.as_ptr(), shm.as_ptr());

        unsafe { *shm.as_ptr() = 0xAB };
        assert_eq!(unsafe { *second.as_ptr() }, 0xAB);
    }

    #[test]
    #[serial]
    fn test_queue_region_attach_round_trip() {
        let name = unique_name("queue");
        let created = Arc::new(QueueRegion::create(256, Some(&name)).unwrap());
        let attached = Arc::new(QueueRegion::attach(&name).unwrap());

        assert_eq!(attached.capacity(), 256);
        assert!(attached.is_initialized());

        let writer = RingBuffer::new(created);
        let reader = RingBuffer::new(attached);
        // Safety: one producer view and one consumer view, both on this thread
        unsafe {
            writer.enqueue(b"across mappings").unwrap();
            assert_eq!(reader.dequeue_vec().unwrap(), b"across mappings");
        }
        assert_eq!(writer.cursors(), reader.cursors());

        unlink_shared_memory(&name).unwrap();
    }

    #[test]
    fn test_region_with_zero_capacity_is_rejected() {
        let shm = create_shared_memory(4096, None).unwrap();
        let err = QueueRegion::from_backend(shm).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_region_with_wrong_version_is_rejected() {
        let shm = create_shared_memory(4096, None).unwrap();
        // Capacity 64, appendix at 76 left at version 0
        unsafe { (shm.as_ptr() as *mut u32).write(64) };

        let err = QueueRegion::from_backend(shm).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_region_with_wild_cursor_is_rejected() {
        let shm = create_shared_memory(4096, None).unwrap();
        unsafe {
            let words = shm.as_ptr() as *mut u32;
            words.write(64);
            words.add(2).write(100);
            (shm.as_ptr().add(76) as *mut u32).write(1);
        }

        let err = QueueRegion::from_backend(shm).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_region_larger_than_mapping_is_rejected() {
        let shm = create_shared_memory(4096, None).unwrap();
        unsafe { (shm.as_ptr() as *mut u32).write(1 << 20) };

        let err = QueueRegion::from_backend(shm).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_from_fd_attaches_existing_queue() {
        let created = QueueRegion::create(512, None).unwrap();
        let fd = created.memory_region().raw_handle().fd().unwrap();

        let attached = QueueRegion::from_fd(dup_fd(fd)).unwrap();
        assert_eq!(attached.capacity(), 512);
        assert_eq!(attached.cursors(), (0, 0));
    }
}

mod private_tests {
    use dmxp_dataqueue::Core::{allocate_private_memory, page_size, RawHandle};

    #[test]
    fn test_private_memory_is_aligned_and_zeroed() {
        let mem = allocate_private_memory(10_000).unwrap();

        assert_eq!(mem.size() % page_size(), 0);
        assert!(mem.size() >= 10_000);
        assert_eq!(mem.as_ptr() as usize % page_size(), 0);
        assert_eq!(mem.raw_handle(), RawHandle::Private);
        assert_eq!(mem.raw_handle().fd(), None);

        let slice = unsafe { std::slice::from_raw_parts(mem.as_ptr(), mem.size()) };
        assert!(slice.iter().all(|&b| b == 0));
    }
}
