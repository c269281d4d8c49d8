use vigilia::{Event, EventQueue, Filter, QueueError};

use std::net::{TcpListener, TcpStream};
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

#[test]
fn test_empty_poll_returns_immediately() {
    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(8);

    let start = Instant::now();
    let n = queue
        .poll(&[], &mut events, Some(Duration::ZERO))
        .expect("Failed to poll");

    assert_eq!(n, 0, "A fresh queue has nothing to report");
    assert!(
        start.elapsed() < Duration::from_millis(100),
        "A zero timeout must not block"
    );
}

#[test]
fn test_write_readiness_fires_immediately() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to get local address");
    let stream = TcpStream::connect(addr).expect("Failed to connect");

    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(8);

    let n = queue
        .poll(
            &[Event::write(stream.as_raw_fd())],
            &mut events,
            Some(Duration::from_secs(1)),
        )
        .expect("Failed to poll");

    assert_eq!(n, 1, "A fresh connected socket is writable");
    assert_eq!(events[0].ident, stream.as_raw_fd() as u64);
    assert_eq!(events[0].filter, Filter::Write);
}

#[test]
fn test_capacity_bounds_returned_records() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to get local address");
    let first = TcpStream::connect(addr).expect("Failed to connect");
    let second = TcpStream::connect(addr).expect("Failed to connect");

    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(1);

    let n = queue
        .poll(
            &[
                Event::write(first.as_raw_fd()),
                Event::write(second.as_raw_fd()),
            ],
            &mut events,
            Some(Duration::from_secs(1)),
        )
        .expect("Failed to poll");

    assert_eq!(n, 1, "Buffer capacity bounds one call's records");

    // Both sockets stay writable, so the level-triggered readiness is
    // still observable on the next call.
    let n = queue
        .poll(&[], &mut events, Some(Duration::from_secs(1)))
        .expect("Failed to poll");

    assert_eq!(n, 1);
}

#[test]
fn test_timeout_elapses_in_full() {
    // A listener with no pending connections never becomes readable.
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");

    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    let timeout = Duration::from_millis(150);
    let start = Instant::now();

    let n = queue
        .poll(
            &[Event::read(listener.as_raw_fd())],
            &mut events,
            Some(timeout),
        )
        .expect("Failed to poll");

    assert_eq!(n, 0, "Nothing fired, so the poll timed out");
    assert!(
        start.elapsed() >= timeout,
        "The wait must never return before the timeout elapses"
    );
}

#[test]
fn test_zero_capacity_buffer_applies_registrations_only() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to get local address");
    let stream = TcpStream::connect(addr).expect("Failed to connect");

    let queue = EventQueue::new().expect("Failed to create event queue");

    let n = queue
        .poll(
            &[Event::write(stream.as_raw_fd())],
            &mut Vec::new(),
            Some(Duration::from_secs(1)),
        )
        .expect("Failed to poll");

    assert_eq!(n, 0, "A zero-capacity buffer cannot receive records");

    // The registration was applied regardless.
    let mut events = Vec::with_capacity(4);
    let n = queue
        .poll(&[], &mut events, Some(Duration::from_secs(1)))
        .expect("Failed to poll");

    assert_eq!(n, 1);
    assert_eq!(events[0].ident, stream.as_raw_fd() as u64);
}

#[test]
fn test_rejects_timer_without_period() {
    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    let err = queue
        .poll(&[Event::timer(1, 0)], &mut events, Some(Duration::ZERO))
        .expect_err("A zero timer period must be rejected");

    assert!(matches!(err, QueueError::Registration { ident: 1, .. }));
}

#[test]
fn test_rejects_invalid_signal_number() {
    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    let err = queue
        .poll(&[Event::signal(0)], &mut events, Some(Duration::ZERO))
        .expect_err("Signal number 0 must be rejected");

    assert!(matches!(err, QueueError::Registration { ident: 0, .. }));
}

#[test]
fn test_rejects_invalid_descriptor() {
    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    let err = queue
        .poll(&[Event::read(-1)], &mut events, Some(Duration::ZERO))
        .expect_err("An invalid descriptor must be rejected");

    assert!(matches!(err, QueueError::Registration { .. }));
}

#[test]
fn test_rejects_delete_of_unknown_registration() {
    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    let err = queue
        .poll(
            &[Event::timer(9, 5).delete()],
            &mut events,
            Some(Duration::ZERO),
        )
        .expect_err("Deleting an unknown registration must fail");

    assert!(matches!(err, QueueError::Registration { ident: 9, .. }));
}

#[test]
fn test_double_close_fails() {
    let queue = EventQueue::new().expect("Failed to create event queue");

    queue.close().expect("First close must succeed");

    let err = queue.close().expect_err("Second close must fail");
    assert!(matches!(err, QueueError::Resource(_)));
}

#[test]
fn test_poll_after_close_fails() {
    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    queue.close().expect("Failed to close queue");

    let err = queue
        .poll(&[], &mut events, Some(Duration::ZERO))
        .expect_err("Polling a closed queue must fail");

    assert!(matches!(err, QueueError::Resource(_)));
}
