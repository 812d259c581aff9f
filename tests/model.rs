// Randomized operations checked against a VecDeque model of the queue

mod common;

use common::LocalQueue;
use dmxp_dataqueue::QueueError;
use std::collections::VecDeque;

fn run_model(seed: u64, capacity: usize, max_payload: usize, steps: usize) {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut rb = LocalQueue::new(capacity);
    let mut model: VecDeque<Vec<u8>> = VecDeque::new();
    let mut buf = vec![0u8; max_payload];

    for step in 0..steps {
        match rng.u8(0..10) {
            // Enqueue slightly more often than dequeue so the ring fills up
            0..=5 => {
                let len = rng.usize(0..=max_payload);
                let payload: Vec<u8> = (0..len).map(|_| rng.u8(..)).collect();
                match rb.enqueue(&payload) {
                    Ok(()) => model.push_back(payload),
                    Err(QueueError::Full { needed }) => {
                        assert_eq!(needed as usize, len + 4);
                        assert!(!model.is_empty(), "seed {} step {}: full while empty", seed, step);
                    }
                    Err(e) => panic!("seed {} step {}: {}", seed, step, e),
                }
            }
            6 => {
                let peeked = rb.peek().map(|view| view.to_vec());
                assert_eq!(peeked.as_ref(), model.front(), "seed {} step {}", seed, step);
            }
            7 => match rb.skip() {
                Ok(len) => assert_eq!(Some(len), model.pop_front().map(|p| p.len())),
                Err(e) => {
                    assert_eq!(e, QueueError::Empty);
                    assert!(model.is_empty());
                }
            },
            _ => match rb.dequeue(&mut buf) {
                Ok(len) => {
                    let expected = model.pop_front().expect("queue returned data the model lacks");
                    assert_eq!(&buf[..len], &expected[..], "seed {} step {}", seed, step);
                }
                Err(e) => {
                    assert_eq!(e, QueueError::Empty, "seed {} step {}", seed, step);
                    assert!(model.is_empty());
                }
            },
        }

        let (head, tail) = rb.cursors();
        assert!(head <= capacity as u32 && tail <= capacity as u32);
        assert_eq!(rb.is_empty(), model.is_empty(), "seed {} step {}", seed, step);
    }

    // Drain
    while let Some(expected) = model.pop_front() {
        assert_eq!(rb.dequeue_vec().unwrap(), expected);
    }
    assert_eq!(rb.dequeue_vec(), Err(QueueError::Empty));
}

#[test]
fn model_small_ring_many_wraps() {
    for seed in 0..20 {
        run_model(seed, 64, 20, 2_000);
    }
}

#[test]
fn model_odd_capacity() {
    for seed in 100..110 {
        run_model(seed, 251, 60, 5_000);
    }
}

#[test]
fn model_large_entries() {
    // Entries up to just under half the ring
    for seed in 200..205 {
        run_model(seed, 1024, 500, 3_000);
    }
}
