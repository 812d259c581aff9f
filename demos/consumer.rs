// Polls the queue producer.rs writes and prints every message.
use dmxp_dataqueue::QueueBuilder;
use std::env;
use std::time::{Duration, Instant};

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <expected_messages>", args[0]);
        std::process::exit(1);
    }

    let expected_messages: usize = args[1].parse().expect("Invalid number of messages");

    let consumer = match QueueBuilder::new()
        .with_name("dmxp_dataqueue_demo")
        .build_consumer()
    {
        Ok(consumer) => consumer,
        Err(e) => {
            eprintln!("Failed to attach to queue (is the producer running?): {}", e);
            return Ok(());
        }
    };
    println!("Consumer: Attached, capacity {} bytes", consumer.capacity());

    let start = Instant::now();
    let mut last_message = Instant::now();
    let mut received = 0;

    println!("\n{:<10} {}", "Msg #", "Hash");
    println!("{}", "=".repeat(80));

    while received < expected_messages {
        match consumer.receive_vec() {
            Ok(Some(data)) => {
                let message = String::from_utf8_lossy(&data);
                match message.split_once(':') {
                    Some((num, hash)) => println!("{:<10} {}", num, hash),
                    None => println!("Invalid format: {}", message),
                }
                received += 1;
                last_message = Instant::now();
            }
            Ok(None) => {
                if last_message.elapsed() > Duration::from_secs(5) {
                    eprintln!("Timeout waiting for messages");
                    break;
                }
                std::thread::yield_now();
            }
            Err(e) => {
                eprintln!("Error receiving message: {}", e);
                break;
            }
        }
    }

    let elapsed = start.elapsed();
    println!("\n{}", "=".repeat(80));
    println!("Consumer: Received {} messages in {:.2?}", received, elapsed);
    println!(
        "Average: {:.2} messages/second",
        received as f64 / elapsed.as_secs_f64()
    );

    Ok(())
}
