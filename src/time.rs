//! Conversions between durations and kernel time representations.
//!
//! The kernel speaks three dialects of time and this module owns all of
//! them:
//! - `timespec` (seconds + nanoseconds) for `kevent(2)` timeouts,
//! - whole milliseconds for `epoll_wait(2)` timeouts,
//! - `timeval` (seconds + microseconds) for socket timeout options.
//!
//! Conversions from fractional seconds truncate the sub-second part
//! rather than round. Wait timeouts are the one exception: a remainder
//! below the kernel's granularity is rounded **up**, so a timed wait can
//! never return before the requested duration has elapsed.

use std::time::Duration;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Converts a non-negative fractional-seconds value to a `timespec`.
///
/// The sub-second part is truncated, not rounded: `1.9999999999` seconds
/// becomes `1s + 999_999_999ns`, never `2s`.
///
/// # Panics
///
/// Panics if `secs` is negative or not finite. A negative duration is a
/// contract violation by the caller, not an environmental failure.
pub fn timespec_from_secs(secs: f64) -> libc::timespec {
    assert!(
        secs.is_finite() && secs >= 0.0,
        "duration must be a non-negative finite number of seconds"
    );

    let whole = secs.trunc();
    let nanos = ((secs - whole) * NANOS_PER_SEC).trunc();

    libc::timespec {
        tv_sec: whole as libc::time_t,
        tv_nsec: nanos as _,
    }
}

/// Converts a `timespec` back to fractional seconds.
///
/// Together with [`timespec_from_secs`] this round-trips within one
/// nanosecond of the truncated original; exact equality is not promised
/// for fractions that have no binary representation.
pub fn secs_from_timespec(ts: &libc::timespec) -> f64 {
    ts.tv_sec as f64 + ts.tv_nsec as f64 / NANOS_PER_SEC
}

/// Encodes a wait timeout as a `timespec` for `kevent(2)`.
///
/// `Duration` is already nanosecond-precise, so no precision is lost.
pub(crate) fn timespec_from_duration(timeout: Duration) -> libc::timespec {
    libc::timespec {
        tv_sec: timeout.as_secs() as libc::time_t,
        tv_nsec: timeout.subsec_nanos() as _,
    }
}

/// Encodes a wait timeout as whole milliseconds for `epoll_wait(2)`.
///
/// Sub-millisecond remainders round up: a 100µs timeout must block for
/// at least 100µs, so it encodes as 1ms rather than 0 (which would mean
/// an immediate return). Durations beyond the representable range clamp
/// to `i32::MAX`.
pub(crate) fn millis_from_duration(timeout: Duration) -> i32 {
    let nanos = timeout.as_nanos();
    let millis = nanos.div_ceil(1_000_000);

    millis.min(i32::MAX as u128) as i32
}

/// Encodes a socket timeout as a `timeval` for `SO_RCVTIMEO` and
/// `SO_SNDTIMEO`, truncating to microsecond granularity.
pub(crate) fn timeval_from_duration(timeout: Duration) -> libc::timeval {
    libc::timeval {
        tv_sec: timeout.as_secs() as libc::time_t,
        tv_usec: timeout.subsec_micros() as _,
    }
}

/// Decodes a socket timeout option value.
///
/// The kernel reports "no timeout" as an all-zero `timeval`.
pub(crate) fn duration_from_timeval(tv: &libc::timeval) -> Option<Duration> {
    if tv.tv_sec == 0 && tv.tv_usec == 0 {
        return None;
    }

    Some(Duration::new(tv.tv_sec as u64, tv.tv_usec as u32 * 1_000))
}
