//! End-of-stream handling between pipeline stages.
//!
//! A source pushes into a queue and closes it; downstream stages drain until they
//! observe `Closed`, then close their own output.

use std::sync::Arc;
use std::thread;

use sluice::{
    BoundedQueue, ConfigError, PopError, QueueBack, QueueClosed, QueueConfig, QueueFront,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct User {
    uid: usize,
}

fn find_uid(name: String) -> usize {
    name.len()
}

fn spawn_stage<A, B, F>(
    input: Arc<BoundedQueue<A>>,
    output: Arc<BoundedQueue<B>>,
    f: F,
) -> thread::JoinHandle<usize>
where
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> B + Send + 'static,
{
    thread::spawn(move || {
        let forwarded = input.drain_until_closed(|value| {
            output.push(f(value)).ok();
        });
        output.close();
        forwarded
    })
}

#[test]
fn close_propagates_through_stages() {
    let names = Arc::new(
        BoundedQueue::from_iter_labeled(
            10,
            ["queued hello".to_string(), "queued world".to_string()],
            "names",
        )
        .unwrap(),
    );
    let uids = Arc::new(BoundedQueue::with_label(2, "uids").unwrap());
    let users = Arc::new(BoundedQueue::with_label(2, "users").unwrap());

    let first = spawn_stage(Arc::clone(&names), Arc::clone(&uids), find_uid);
    let second = spawn_stage(Arc::clone(&uids), Arc::clone(&users), |uid| User { uid });

    for more in ["More stuff", "Yet More stuff", "Are we done yet???"] {
        names.push(more.to_string()).unwrap();
    }
    names.close();

    let mut consumed = Vec::new();
    loop {
        match users.wait_pop() {
            Ok(user) => consumed.push(user.uid),
            Err(PopError::Closed) => break,
            Err(other) => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(first.join().unwrap(), 5);
    assert_eq!(second.join().unwrap(), 5);
    assert_eq!(consumed, vec![12, 12, 10, 14, 18]);
    assert!((*uids).is_closed() && (*users).is_closed());
}

#[test]
fn value_pop_propagates_closed_with_question_mark() {
    fn sum_all(queue: &BoundedQueue<u32>) -> Result<u32, QueueClosed> {
        let mut sum = 0;
        for _ in 0..3 {
            sum += queue.value_pop()?;
        }
        Ok(sum)
    }

    let queue = BoundedQueue::from_iter_with_capacity(3, [1, 2, 3]).unwrap();
    assert_eq!(sum_all(&queue), Ok(6));

    let short = BoundedQueue::from_iter_with_capacity(3, [1, 2]).unwrap();
    short.close();
    assert!(sum_all(&short).is_err());
}

#[test]
fn push_after_close_returns_the_value() {
    let queue = BoundedQueue::new(1).unwrap();
    queue.close();
    let rejected = queue.push(vec![1, 2, 3]).unwrap_err();
    assert_eq!(rejected.to_string(), "queue is closed");
    assert_eq!(rejected.into_inner(), vec![1, 2, 3]);
}

#[test]
fn capacity_one_close_scenario() {
    let queue = BoundedQueue::new(1).unwrap();
    queue.push('a').unwrap();
    queue.close();
    assert_eq!(queue.wait_pop(), Ok('a'));
    assert_eq!(queue.wait_pop(), Err(PopError::Closed));
    assert!(queue.try_push('b').unwrap_err().is_closed());
}

#[test]
fn construction_is_validated_eagerly() {
    assert_eq!(
        BoundedQueue::<u8>::new(0).unwrap_err(),
        ConfigError::ZeroCapacity
    );
    assert_eq!(
        BoundedQueue::from_iter_with_capacity(1, ['a', 'b']).unwrap_err(),
        ConfigError::TooManyElements { capacity: 1 }
    );

    let config = QueueConfig::with_capacity(3).label("configured");
    let queue = BoundedQueue::from_config_iter(config, 0..3).unwrap();
    assert_eq!(queue.capacity(), 3);
    assert_eq!(queue.name(), Some("configured"));
    assert!(queue.is_full());
    assert_eq!(queue.drain(), vec![0, 1, 2]);
}
