use vigilia::{Event, EventQueue, Filter};

use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_trigger_fires_registered_user_event() {
    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    let n = queue
        .poll(
            &[Event::user(42).clear()],
            &mut events,
            Some(Duration::ZERO),
        )
        .expect("Failed to register user event");
    assert_eq!(n, 0, "An untriggered user event stays quiet");

    let n = queue
        .poll(
            &[Event::user(42).trigger()],
            &mut events,
            Some(Duration::from_secs(1)),
        )
        .expect("Failed to poll");

    assert_eq!(n, 1);
    assert_eq!(events[0].ident, 42);
    assert_eq!(events[0].filter, Filter::User);
}

#[test]
fn test_trigger_unblocks_waiting_poll() {
    let queue = Arc::new(EventQueue::new().expect("Failed to create event queue"));

    // Register the user source before anyone waits on it.
    queue
        .poll(
            &[Event::user(7).clear()],
            &mut Vec::new(),
            Some(Duration::ZERO),
        )
        .expect("Failed to register user event");

    let waiter = {
        let queue = queue.clone();
        thread::spawn(move || {
            let mut events = Vec::with_capacity(4);
            let n = queue
                .poll(&[], &mut events, Some(Duration::from_secs(5)))
                .expect("Failed to poll");
            (n, events)
        })
    };

    // Give the waiter time to block.
    thread::sleep(Duration::from_millis(100));

    // A zero-capacity buffer applies the trigger without competing for
    // the fired record.
    queue
        .poll(
            &[Event::user(7).trigger()],
            &mut Vec::new(),
            Some(Duration::ZERO),
        )
        .expect("Failed to trigger user event");

    let (n, events) = waiter.join().expect("Waiter thread panicked");

    assert_eq!(n, 1, "The blocked poll must wake on the trigger");
    assert_eq!(events[0].ident, 7);
    assert_eq!(events[0].filter, Filter::User);
}
