use vigilia::{Event, EventQueue, Filter};

use std::thread;
use std::time::Duration;

#[test]
fn test_timer_fires_and_accumulates() {
    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    // Arm a 1ms periodic timer and wait for its first expiry.
    let n = queue
        .poll(
            &[Event::timer(1, 1)],
            &mut events,
            Some(Duration::from_secs(5)),
        )
        .expect("Failed to poll");

    assert_eq!(n, 1);
    assert_eq!(events[0].ident, 1);
    assert_eq!(events[0].filter, Filter::Timer);
    assert!(events[0].data >= 1, "At least one period has elapsed");

    // While armed, expirations accumulate between retrievals.
    thread::sleep(Duration::from_millis(25));

    let n = queue
        .poll(&[], &mut events, Some(Duration::from_secs(5)))
        .expect("Failed to poll");

    assert_eq!(n, 1);
    assert!(
        events[0].data >= 10,
        "Roughly 25 periods elapsed, got {}",
        events[0].data
    );
}

#[test]
fn test_oneshot_timer_fires_once() {
    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    let n = queue
        .poll(
            &[Event::timer(2, 5).oneshot()],
            &mut events,
            Some(Duration::from_secs(5)),
        )
        .expect("Failed to poll");

    assert_eq!(n, 1);
    assert_eq!(events[0].ident, 2);

    // The registration deregistered itself on delivery.
    let n = queue
        .poll(&[], &mut events, Some(Duration::from_millis(50)))
        .expect("Failed to poll");

    assert_eq!(n, 0, "A oneshot timer must not fire a second time");
}

#[test]
fn test_deleted_timer_goes_quiet() {
    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    let n = queue
        .poll(
            &[Event::timer(3, 1)],
            &mut events,
            Some(Duration::from_secs(5)),
        )
        .expect("Failed to poll");
    assert_eq!(n, 1);

    let n = queue
        .poll(
            &[Event::timer(3, 1).delete()],
            &mut events,
            Some(Duration::from_millis(50)),
        )
        .expect("Failed to poll");

    assert_eq!(n, 0, "A deleted timer must not fire");
}
