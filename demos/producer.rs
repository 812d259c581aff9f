// Writes hashed messages into a named data queue for consumer.rs to read.
use dmxp_dataqueue::Core::unlink_shared_memory;
use dmxp_dataqueue::QueueBuilder;
use sha2::{Digest, Sha256};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const QUEUE_NAME: &str = "dmxp_dataqueue_demo";

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <num_messages> [--auto-exit]", args[0]);
        std::process::exit(1);
    }

    let num_messages: usize = args[1].parse().expect("Invalid number of messages");
    let auto_exit = args.get(2).map(|s| s == "--auto-exit").unwrap_or(false);

    let start_hash = Instant::now();
    let hashes: Vec<String> = (0..num_messages)
        .map(|i| format!("{:x}", Sha256::digest(format!("message_{}", i).as_bytes())))
        .collect();
    println!(
        "Producer: Hashed {} messages in {:.2?}",
        num_messages,
        start_hash.elapsed()
    );

    let producer = QueueBuilder::new()
        .with_capacity(64 * 1024)
        .with_name(QUEUE_NAME)
        .build_producer()?;
    println!(
        "Producer: Created queue /dev/shm/{} ({} bytes)",
        QUEUE_NAME,
        producer.capacity()
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_for_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_for_handler.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let start_send = Instant::now();
    for (i, hash) in hashes.iter().enumerate() {
        // Format: "message_number:hash"
        let message = format!("{}:{}", i, hash);
        loop {
            match producer.send(&message) {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    // Consumer has not caught up yet
                    std::thread::sleep(Duration::from_micros(10));
                }
                Err(e) => {
                    eprintln!("Failed to send message {}: {}", i, e);
                    break;
                }
            }
        }
        if !running.load(Ordering::SeqCst) {
            break;
        }
    }

    let sent = producer.messages_sent();
    let send_time = start_send.elapsed();
    println!("Producer: Sent {} messages in {:.2?}", sent, send_time);
    println!(
        "Producer: Throughput: {:.2} messages/sec",
        sent as f64 / send_time.as_secs_f64()
    );

    if auto_exit {
        std::thread::sleep(Duration::from_secs(2));
    } else {
        println!("Press Ctrl+C to exit...");
        while running.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    println!("Producer: Shutting down");
    unlink_shared_memory(QUEUE_NAME)
}
