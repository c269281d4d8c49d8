use vigilia::{Event, EventQueue, Filter};

use std::time::Duration;

#[test]
fn test_signal_delivery_is_observed() {
    // On macOS the kernel reports the signal on the queue but delivery
    // otherwise proceeds normally, so park the default disposition.
    #[cfg(target_os = "macos")]
    unsafe {
        libc::signal(libc::SIGUSR1, libc::SIG_IGN);
    }

    let queue = EventQueue::new().expect("Failed to create event queue");
    let mut events = Vec::with_capacity(4);

    // Register first; the raise below must find the watch armed.
    let n = queue
        .poll(
            &[Event::signal(libc::SIGUSR1)],
            &mut events,
            Some(Duration::ZERO),
        )
        .expect("Failed to register signal watch");
    assert_eq!(n, 0);

    unsafe {
        libc::raise(libc::SIGUSR1);
    }

    let n = queue
        .poll(&[], &mut events, Some(Duration::from_secs(2)))
        .expect("Failed to poll");

    assert_eq!(n, 1, "Exactly one signal record fires");
    assert_eq!(events[0].ident, libc::SIGUSR1 as u64);
    assert_eq!(events[0].filter, Filter::Signal);
    assert!(events[0].data >= 1, "At least one delivery was counted");
}
