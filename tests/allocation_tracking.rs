// Allocation tracking tests for RingBuffer
//
// Note: Tests using dhat are marked with #[serial_test::serial] because
// dhat only allows one profiler to run at a time. They will run sequentially.
//
// # Run all allocation tracking tests
// cargo test --test allocation_tracking -- --nocapture

mod common;

use common::LocalQueue;

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn make_queue(capacity: usize) -> LocalQueue {
    LocalQueue::new(capacity)
}

#[test]
#[serial_test::serial]
fn test_enqueue_dequeue_do_not_allocate() {
    let _profiler = dhat::Profiler::builder().testing().build();

    let rb = make_queue(4096);
    let payload = [0x5Au8; 100];
    let mut out = [0u8; 128];

    // Warm up lazily created lock bookkeeping
    rb.enqueue(&payload).unwrap();
    rb.dequeue(&mut out).unwrap();

    let before = dhat::HeapStats::get();
    for i in 0..10_000 {
        rb.enqueue(&payload).unwrap();
        let len = rb.dequeue(&mut out).unwrap();
        assert_eq!(len, 100);
        if i % 2 == 0 {
            rb.enqueue(&payload[..i % 64]).unwrap();
            rb.skip().unwrap();
        }
    }
    let after = dhat::HeapStats::get();

    println!(
        "blocks before: {}, after: {}",
        before.total_blocks, after.total_blocks
    );
    assert_eq!(after.total_blocks, before.total_blocks);
}

#[test]
#[serial_test::serial]
fn test_peek_does_not_allocate() {
    let _profiler = dhat::Profiler::builder().testing().build();

    let mut rb = make_queue(1024);
    rb.enqueue(b"peek at me").unwrap();

    let before = dhat::HeapStats::get();
    for _ in 0..1_000 {
        let view = rb.peek().unwrap();
        assert_eq!(view.payload(), b"peek at me");
    }
    let after = dhat::HeapStats::get();

    assert_eq!(after.total_blocks, before.total_blocks);
}

#[test]
#[serial_test::serial]
fn test_dequeue_vec_allocates_once_per_message() {
    let _profiler = dhat::Profiler::builder().testing().build();

    let rb = make_queue(4096);
    for _ in 0..10 {
        rb.enqueue(&[1u8; 32]).unwrap();
    }

    let before = dhat::HeapStats::get();
    for _ in 0..10 {
        let payload = rb.dequeue_vec().unwrap();
        assert_eq!(payload.len(), 32);
    }
    let after = dhat::HeapStats::get();

    assert_eq!(after.total_blocks - before.total_blocks, 10);
}

#[test]
#[serial_test::serial]
fn test_queue_with_memory_stats() {
    use memory_stats::memory_stats;

    let before = memory_stats();
    println!("Memory before: {:?}", before);

    let rb = make_queue(1 << 20);
    let payload = vec![0xC3u8; 1000];
    let mut out = vec![0u8; 1000];
    for _ in 0..100_000 {
        rb.enqueue(&payload).unwrap();
        rb.dequeue(&mut out).unwrap();
    }

    let after = memory_stats();
    println!("Memory after: {:?}", after);

    if let (Some(before), Some(after)) = (before, after) {
        let growth = after.physical_mem.saturating_sub(before.physical_mem);
        println!("Physical memory growth: {} bytes", growth);
        // The ring plus slack; steady-state traffic must not keep growing it
        assert!(growth < 16 * 1024 * 1024);
    }
}
