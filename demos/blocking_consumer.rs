// Parks on the queue's futex word instead of polling.
use dmxp_dataqueue::QueueBuilder;
use std::env;

fn main() -> std::io::Result<()> {
    let name = env::args()
        .nth(1)
        .unwrap_or_else(|| "dmxp_dataqueue_demo".to_string());

    println!("Blocking Consumer: Attaching to /dev/shm/{}", name);
    let consumer = QueueBuilder::new().with_name(name).build_consumer()?;

    println!("Blocking Consumer: Waiting for messages...");
    loop {
        match consumer.receive_blocking() {
            Ok(data) => println!("Received: {}", String::from_utf8_lossy(&data)),
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    Ok(())
}
