use crate::event::Filter;

use std::io;
use thiserror::Error;

/// Errors produced by an [`EventQueue`](crate::EventQueue).
///
/// Every OS-level error code is classified into one of these variants
/// at the component boundary; raw errno values never escape except as
/// the wrapped [`io::Error`] source.
///
/// A timed-out wait is **not** an error: it is reported as a fired-event
/// count of `0`.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The kernel queue handle is invalid, closed, or the OS refused to
    /// allocate one (e.g. descriptor-table exhaustion).
    ///
    /// This is never retried internally.
    #[error("event queue resource unavailable: {0}")]
    Resource(#[source] io::Error),

    /// A specific event descriptor was rejected by the kernel or failed
    /// pre-validation (bad identifier, bad signal number, non-positive
    /// timer period).
    ///
    /// When a batch of descriptors is submitted, the first rejection is
    /// reported; no partial-success contract is made for the rest of the
    /// batch.
    #[error("registration rejected for ident {ident} ({filter:?}): {source}")]
    Registration {
        /// Identifier of the rejected descriptor.
        ident: u64,
        /// Filter of the rejected descriptor.
        filter: Filter,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The wait was interrupted by an unrelated signal.
    ///
    /// [`EventQueue::poll`](crate::EventQueue::poll) retries these
    /// transparently with the remaining timeout budget; only
    /// [`EventQueue::poll_once`](crate::EventQueue::poll_once) surfaces
    /// this variant.
    #[error("wait interrupted by signal")]
    Interrupted,
}

impl QueueError {
    /// Builds the deterministic error returned for any operation on a
    /// queue that has already been closed.
    pub(crate) fn closed() -> Self {
        QueueError::Resource(io::Error::from_raw_os_error(libc::EBADF))
    }

    /// Builds a registration error from the current OS error.
    pub(crate) fn registration(ident: u64, filter: Filter) -> Self {
        QueueError::Registration {
            ident,
            filter,
            source: io::Error::last_os_error(),
        }
    }

    /// Builds a registration error from an explicit errno value, as
    /// reported by per-change kernel receipts.
    pub(crate) fn registration_errno(ident: u64, filter: Filter, errno: i32) -> Self {
        QueueError::Registration {
            ident,
            filter,
            source: io::Error::from_raw_os_error(errno),
        }
    }
}
