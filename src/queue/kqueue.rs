//! macOS `kqueue`-based queue backend.
//!
//! This backend maps the typed event model directly onto `kevent(2)`:
//! the five filters, the registration flags, and the data payload all
//! have native kernel counterparts.
//!
//! Registration changes are submitted with `EV_RECEIPT`, so every
//! change produces an individual receipt and a single rejected
//! descriptor can be reported precisely. The wait is a second `kevent`
//! call; the kernel's delivery order is preserved as-is.

use crate::error::QueueError;
use crate::event::{Event, EventFlags, Filter, FilterFlags};
use crate::sys::sys_close_checked;
use crate::time::timespec_from_duration;

use std::io;
use std::os::fd::RawFd;
use std::ptr;
use std::time::Duration;

pub(crate) struct KqueueBackend {
    /// Kqueue file descriptor.
    kq: RawFd,
}

impl KqueueBackend {
    /// Allocates a kernel queue.
    pub(crate) fn new() -> io::Result<Self> {
        let kq = unsafe { libc::kqueue() };
        if kq < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { kq })
    }

    /// Applies a batch of registration changes.
    ///
    /// The first rejected change aborts with a registration error; the
    /// kernel may or may not have applied the rest of the batch.
    pub(crate) fn apply(&self, changes: &[Event]) -> Result<(), QueueError> {
        if changes.is_empty() {
            return Ok(());
        }

        let changelist: Vec<libc::kevent> = changes.iter().map(encode).collect();
        let mut receipts: Vec<libc::kevent> = Vec::with_capacity(changelist.len());
        let immediate = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        let n = loop {
            let rc = unsafe {
                libc::kevent(
                    self.kq,
                    changelist.as_ptr(),
                    changelist.len() as i32,
                    receipts.as_mut_ptr(),
                    changelist.len() as i32,
                    &immediate,
                )
            };

            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(QueueError::Resource(err));
            }

            break rc as usize;
        };

        unsafe {
            receipts.set_len(n);
        }

        // EV_RECEIPT yields one receipt per change, in change order.
        for (change, receipt) in changes.iter().zip(&receipts) {
            if receipt.flags & libc::EV_ERROR != 0 && receipt.data != 0 {
                return Err(QueueError::registration_errno(
                    change.ident,
                    change.filter,
                    receipt.data as i32,
                ));
            }
        }

        Ok(())
    }

    /// Blocks until at least one registered source fires or the timeout
    /// elapses, decoding the kernel's result set into `events`.
    pub(crate) fn wait(
        &self,
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> Result<usize, QueueError> {
        let capacity = events.capacity();
        let mut native: Vec<libc::kevent> = Vec::with_capacity(capacity);

        let ts = timeout.map(timespec_from_duration);
        let ts_ptr = ts.as_ref().map_or(ptr::null(), |t| t as *const _);

        let n = unsafe {
            libc::kevent(
                self.kq,
                ptr::null(),
                0,
                native.as_mut_ptr(),
                capacity as i32,
                ts_ptr,
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Err(QueueError::Interrupted);
            }
            return Err(QueueError::Resource(err));
        }

        unsafe {
            native.set_len(n as usize);
        }

        events.clear();

        for ev in &native {
            let Some(filter) = decode_filter(ev.filter) else {
                log::debug!("dropping event with unknown kernel filter {}", ev.filter);
                continue;
            };

            events.push(Event {
                ident: ev.ident as u64,
                filter,
                flags: decode_flags(ev.flags),
                fflags: decode_fflags(ev.fflags),
                data: ev.data as i64,
            });
        }

        Ok(events.len())
    }

    /// Releases the kernel queue.
    pub(crate) fn close(&self) -> io::Result<()> {
        sys_close_checked(self.kq)
    }
}

fn encode(change: &Event) -> libc::kevent {
    libc::kevent {
        ident: change.ident as libc::uintptr_t,
        filter: encode_filter(change.filter),
        flags: encode_flags(change.flags) | libc::EV_RECEIPT,
        fflags: encode_fflags(change.fflags),
        data: change.data as libc::intptr_t,
        udata: ptr::null_mut(),
    }
}

fn encode_filter(filter: Filter) -> i16 {
    match filter {
        Filter::Read => libc::EVFILT_READ,
        Filter::Write => libc::EVFILT_WRITE,
        Filter::Signal => libc::EVFILT_SIGNAL,
        Filter::Timer => libc::EVFILT_TIMER,
        Filter::User => libc::EVFILT_USER,
    }
}

fn decode_filter(filter: i16) -> Option<Filter> {
    match filter {
        libc::EVFILT_READ => Some(Filter::Read),
        libc::EVFILT_WRITE => Some(Filter::Write),
        libc::EVFILT_SIGNAL => Some(Filter::Signal),
        libc::EVFILT_TIMER => Some(Filter::Timer),
        libc::EVFILT_USER => Some(Filter::User),
        _ => None,
    }
}

fn encode_flags(flags: EventFlags) -> u16 {
    let mut native = 0;

    if flags.contains(EventFlags::ADD) {
        native |= libc::EV_ADD;
    }
    if flags.contains(EventFlags::DELETE) {
        native |= libc::EV_DELETE;
    }
    if flags.contains(EventFlags::ENABLE) {
        native |= libc::EV_ENABLE;
    }
    if flags.contains(EventFlags::DISABLE) {
        native |= libc::EV_DISABLE;
    }
    if flags.contains(EventFlags::ONESHOT) {
        native |= libc::EV_ONESHOT;
    }
    if flags.contains(EventFlags::CLEAR) {
        native |= libc::EV_CLEAR;
    }

    native
}

fn decode_flags(native: u16) -> EventFlags {
    let mut flags = EventFlags::empty();

    if native & libc::EV_ADD != 0 {
        flags |= EventFlags::ADD;
    }
    if native & libc::EV_DELETE != 0 {
        flags |= EventFlags::DELETE;
    }
    if native & libc::EV_ENABLE != 0 {
        flags |= EventFlags::ENABLE;
    }
    if native & libc::EV_DISABLE != 0 {
        flags |= EventFlags::DISABLE;
    }
    if native & libc::EV_ONESHOT != 0 {
        flags |= EventFlags::ONESHOT;
    }
    if native & libc::EV_CLEAR != 0 {
        flags |= EventFlags::CLEAR;
    }

    flags
}

fn encode_fflags(fflags: FilterFlags) -> u32 {
    let mut native = 0;

    if fflags.contains(FilterFlags::TRIGGER) {
        native |= libc::NOTE_TRIGGER;
    }

    native
}

fn decode_fflags(native: u32) -> FilterFlags {
    let mut fflags = FilterFlags::empty();

    if native & libc::NOTE_TRIGGER != 0 {
        fflags |= FilterFlags::TRIGGER;
    }

    fflags
}
