//! The kernel event queue.
//!
//! This module implements the core of the crate: a typed front over the
//! platform's kernel event-notification primitive.
//!
//! The queue is responsible for:
//! - translating [`Event`] descriptors into kernel registrations,
//! - blocking for readiness across heterogeneous sources,
//! - decoding the kernel's result set back into typed records.
//!
//! The concrete backend is selected at compile time depending on the
//! target operating system.

#[cfg(target_os = "linux")]
mod epoll;

#[cfg(target_os = "macos")]
mod kqueue;

#[cfg(target_os = "linux")]
use epoll::EpollBackend as Backend;

#[cfg(target_os = "macos")]
use kqueue::KqueueBackend as Backend;

use crate::error::QueueError;
use crate::event::{Event, EventFlags, Filter};

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Highest signal number accepted for a `Signal` descriptor.
#[cfg(target_os = "linux")]
const SIGNAL_MAX: u64 = 64;

#[cfg(target_os = "macos")]
const SIGNAL_MAX: u64 = 31;

/// A kernel event queue.
///
/// An `EventQueue` owns exactly one kernel queue resource for its
/// lifetime. It starts with no registrations; every [`poll`](Self::poll)
/// call first applies the supplied descriptors as registration changes,
/// then waits for readiness. The kernel holds the live registration
/// table, so registrations persist across poll calls until deleted,
/// disabled, or consumed by a oneshot delivery.
///
/// The queue never owns the resources a descriptor identifies: sockets
/// and signals are referenced by plain numbers. Closing a registered
/// socket elsewhere typically makes the kernel drop the registration
/// silently.
///
/// # Thread contract
///
/// One active caller at a time: `poll` and `close` on the same queue are
/// not safe to race and must be serialized by the caller. The one
/// sanctioned cross-thread interaction is firing a registered
/// [`Filter::User`](crate::Filter::User) source from a second thread —
/// that is how a blocked poll is woken:
///
/// ```rust,ignore
/// // thread A: block until something happens
/// queue.poll(&[Event::user(7)], &mut events, None)?;
///
/// // thread B: wake it
/// queue.poll(&[Event::user(7).trigger()], &mut Vec::new(), Some(Duration::ZERO))?;
/// ```
pub struct EventQueue {
    backend: Backend,

    /// Set once by `close`; later operations fail deterministically.
    closed: AtomicBool,
}

impl EventQueue {
    /// Allocates a kernel event queue.
    ///
    /// # Errors
    ///
    /// [`QueueError::Resource`] if the OS denies the allocation, e.g.
    /// on descriptor-table exhaustion.
    pub fn new() -> Result<Self, QueueError> {
        let backend = Backend::new().map_err(QueueError::Resource)?;

        log::debug!("event queue opened");

        Ok(Self {
            backend,
            closed: AtomicBool::new(false),
        })
    }

    /// Applies registration changes, then waits for fired events.
    ///
    /// Every descriptor in `changes` is applied against the kernel
    /// registration table first; waiting happens after. The two steps
    /// run on every call — registration is not a separate operation.
    ///
    /// The caller-owned `events` vector is cleared and refilled; its
    /// **capacity** bounds how many records one call can return, and a
    /// zero-capacity vector applies registrations without waiting.
    /// Records are written in kernel delivery order.
    ///
    /// Timeout semantics:
    /// - `None` blocks until at least one event fires,
    /// - `Some(Duration::ZERO)` returns immediately with whatever is
    ///   already ready,
    /// - a positive timeout blocks up to that duration; a return of `0`
    ///   means "timed out, nothing fired" and is not an error.
    ///
    /// A wait interrupted by an unrelated signal is retried internally
    /// with the remaining timeout budget; use
    /// [`poll_once`](Self::poll_once) to opt out.
    ///
    /// # Errors
    ///
    /// - [`QueueError::Resource`] if the queue is closed or the kernel
    ///   handle is invalid,
    /// - [`QueueError::Registration`] if a descriptor is rejected; no
    ///   partial-success contract is made for the rest of the batch.
    pub fn poll(
        &self,
        changes: &[Event],
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> Result<usize, QueueError> {
        self.prepare(changes)?;

        if events.capacity() == 0 {
            events.clear();
            return Ok(0);
        }

        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));

            match self.backend.wait(events, remaining) {
                Err(QueueError::Interrupted) => continue,
                result => return result,
            }
        }
    }

    /// Like [`poll`](Self::poll), but surfaces an interrupted wait as
    /// [`QueueError::Interrupted`] instead of retrying.
    pub fn poll_once(
        &self,
        changes: &[Event],
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> Result<usize, QueueError> {
        self.prepare(changes)?;

        if events.capacity() == 0 {
            events.clear();
            return Ok(0);
        }

        self.backend.wait(events, timeout)
    }

    /// Releases the kernel queue resource.
    ///
    /// Close-at-most-once is part of the contract: the second close
    /// fails with [`QueueError::Resource`] rather than silently
    /// succeeding, and every operation after a close fails the same
    /// way. A queue that is merely dropped closes best-effort instead.
    pub fn close(&self) -> Result<(), QueueError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(QueueError::closed());
        }

        log::debug!("event queue closed");

        self.backend.close().map_err(QueueError::Resource)
    }

    /// Shared front half of both poll flavors: reject closed queues,
    /// pre-validate descriptors, apply registrations.
    fn prepare(&self, changes: &[Event]) -> Result<(), QueueError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::closed());
        }

        validate(changes)?;

        if !changes.is_empty() {
            log::trace!("applying {} registration change(s)", changes.len());
        }

        self.backend.apply(changes)
    }
}

impl Drop for EventQueue {
    /// Closes the kernel queue if the caller has not closed explicitly.
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            if let Err(e) = self.backend.close() {
                log::warn!("failed to close event queue: {e}");
            }
        }
    }
}

/// Rejects descriptors that violate the registration invariants before
/// they reach the kernel boundary.
fn validate(changes: &[Event]) -> Result<(), QueueError> {
    for change in changes {
        if !change.flags.contains(EventFlags::ADD) {
            continue;
        }

        let valid = match change.filter {
            Filter::Timer => change.data > 0,
            Filter::Signal => (1..=SIGNAL_MAX).contains(&change.ident),
            _ => true,
        };

        if !valid {
            return Err(QueueError::registration_errno(
                change.ident,
                change.filter,
                libc::EINVAL,
            ));
        }
    }

    Ok(())
}
