//! The typed event model exchanged with an [`EventQueue`](crate::EventQueue).
//!
//! An [`Event`] plays both roles of the kernel interface:
//! - as a **descriptor**, it requests a registration change (add, delete,
//!   enable, ...) for one watched source;
//! - as a **record**, it reports one fired source after a wait.
//!
//! Both directions share the same five-field shape, mirroring the
//! kernel's own event structure. Presence in the result buffer *is* the
//! fired signal; there is no separate boolean.

use bitflags::bitflags;

/// The category of condition being watched.
///
/// This is a closed set: every encode/decode boundary matches it
/// exhaustively, and the meaning of [`Event::ident`] and [`Event::data`]
/// depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Fires when the identified file descriptor has data to read.
    /// `data` on a fired record is the byte count available, where the
    /// platform reports one.
    Read,

    /// Fires when the identified file descriptor can accept writes.
    Write,

    /// Fires when the signal numbered by `ident` is delivered to the
    /// process. `data` on a fired record counts deliveries since the
    /// last retrieval.
    Signal,

    /// Fires periodically. `ident` is a caller-chosen token; `data` on a
    /// descriptor is the period in milliseconds and on a fired record
    /// the number of periods elapsed since the last retrieval.
    Timer,

    /// Fires when triggered by another poll call carrying
    /// [`FilterFlags::TRIGGER`]. `ident` is a caller-chosen token.
    User,
}

bitflags! {
    /// Registration flags controlling the lifetime of a watch across
    /// poll calls.
    ///
    /// Bit values are crate-stable; each backend translates them to the
    /// kernel's own encoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventFlags: u16 {
        /// Add the source to the registration table (or modify it if
        /// already present).
        const ADD = 0x0001;
        /// Remove the source from the registration table.
        const DELETE = 0x0002;
        /// Re-enable a previously disabled source.
        const ENABLE = 0x0004;
        /// Keep the registration but stop reporting it.
        const DISABLE = 0x0008;
        /// Deregister automatically after the first delivery.
        const ONESHOT = 0x0010;
        /// Edge-triggered: report once per state transition instead of
        /// on every wait while the condition persists.
        const CLEAR = 0x0020;
    }
}

bitflags! {
    /// Filter-specific modifier flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FilterFlags: u32 {
        /// Fire a registered [`Filter::User`] source now.
        const TRIGGER = 0x0001;
    }
}

/// One registration change or one fired-event record.
///
/// The five fields mirror the kernel event structure: an identifier
/// whose meaning depends on the filter, the filter itself, registration
/// flags, filter-specific flags, and a filter-dependent payload.
///
/// Descriptors are built with the per-filter constructors and shaped
/// with the flag combinators:
///
/// ```rust,ignore
/// let watch_read = Event::read(socket.as_raw_fd());
/// let one_timer = Event::timer(1, 250).oneshot();
/// let fire_user = Event::user(7).trigger();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Filter-dependent identifier: a file descriptor for `Read`/`Write`,
    /// a signal number for `Signal`, an arbitrary token for `Timer` and
    /// `User`.
    pub ident: u64,

    /// The watched condition.
    pub filter: Filter,

    /// Registration flags.
    pub flags: EventFlags,

    /// Filter-specific modifier flags.
    pub fflags: FilterFlags,

    /// Filter-dependent payload.
    pub data: i64,
}

impl Event {
    fn new(ident: u64, filter: Filter, data: i64) -> Self {
        Self {
            ident,
            filter,
            flags: EventFlags::ADD | EventFlags::ENABLE,
            fflags: FilterFlags::empty(),
            data,
        }
    }

    /// A descriptor watching `fd` for read readiness.
    pub fn read(fd: i32) -> Self {
        Self::new(fd as u64, Filter::Read, 0)
    }

    /// A descriptor watching `fd` for write readiness.
    pub fn write(fd: i32) -> Self {
        Self::new(fd as u64, Filter::Write, 0)
    }

    /// A descriptor watching delivery of signal `signo`.
    pub fn signal(signo: i32) -> Self {
        Self::new(signo as u64, Filter::Signal, 0)
    }

    /// A descriptor arming a periodic timer under the token `ident`,
    /// firing every `period_ms` milliseconds.
    ///
    /// The period must be strictly positive; registration rejects a
    /// zero or negative period.
    pub fn timer(ident: u64, period_ms: i64) -> Self {
        Self::new(ident, Filter::Timer, period_ms)
    }

    /// A descriptor registering a user-triggered source under the token
    /// `ident`.
    pub fn user(ident: u64) -> Self {
        Self::new(ident, Filter::User, 0)
    }

    /// Marks the registration for automatic removal after its first
    /// delivery.
    pub fn oneshot(mut self) -> Self {
        self.flags |= EventFlags::ONESHOT;
        self
    }

    /// Makes the registration edge-triggered.
    pub fn clear(mut self) -> Self {
        self.flags |= EventFlags::CLEAR;
        self
    }

    /// Turns the descriptor into a removal request.
    pub fn delete(mut self) -> Self {
        self.flags = EventFlags::DELETE;
        self
    }

    /// Turns the descriptor into a disable request: the registration is
    /// kept but stops reporting.
    pub fn disable(mut self) -> Self {
        self.flags = EventFlags::DISABLE;
        self
    }

    /// Turns the descriptor into a re-enable request.
    pub fn enable(mut self) -> Self {
        self.flags = EventFlags::ENABLE;
        self
    }

    /// Fires a registered [`Filter::User`] source. Meaningless on other
    /// filters.
    pub fn trigger(mut self) -> Self {
        self.fflags |= FilterFlags::TRIGGER;
        self
    }
}
