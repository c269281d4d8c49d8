//! Linux `epoll`-based queue backend.
//!
//! Linux has no single kernel object covering the five filters, so this
//! backend composes its native primitives behind the same interface the
//! kqueue backend exposes:
//! - `Read`/`Write` readiness goes through `epoll` directly,
//! - `Timer` sources are `timerfd`s,
//! - `Signal` sources are `signalfd`s (the signal is blocked in the
//!   registering thread, as `signalfd(2)` requires),
//! - `User` sources are `eventfd`s, written when a change carries the
//!   `TRIGGER` flag.
//!
//! Auxiliary descriptors are tracked in an internal source table keyed
//! by `(filter kind, ident)` and released on delete, oneshot delivery,
//! and queue close.
//!
//! Documented divergences from the kqueue backend:
//! - `data` on a fired `Write` record is `0` (the kernel exposes no
//!   cheap buffer-space estimate),
//! - `data` on a fired `User` record is the trigger count since last
//!   retrieval,
//! - `CLEAR` (edge-triggering) and `ONESHOT` are per-fd properties in
//!   `epoll`, so when read and write interests on one fd disagree the
//!   union of their flags applies to both.

use crate::error::QueueError;
use crate::event::{Event, EventFlags, Filter, FilterFlags};
use crate::sys::{sys_close, sys_close_checked};
use crate::time::millis_from_duration;

use std::collections::HashMap;
use std::io;
use std::mem;
use std::os::fd::RawFd;
use std::ptr;
use std::sync::Mutex;
use std::time::Duration;

// Source-class tag packed into the top bits of the epoll token.
const TAG_FD: u64 = 0;
const TAG_TIMER: u64 = 1;
const TAG_SIGNAL: u64 = 2;
const TAG_USER: u64 = 3;
const TAG_SHIFT: u32 = 62;

fn token(tag: u64, ident: u64) -> u64 {
    (tag << TAG_SHIFT) | ident
}

fn split_token(token: u64) -> (u64, u64) {
    (token >> TAG_SHIFT, token & ((1 << TAG_SHIFT) - 1))
}

/// Per-direction registration state for a watched file descriptor.
struct DirState {
    enabled: bool,
    clear: bool,
    oneshot: bool,
}

/// A file descriptor watched for read and/or write readiness.
///
/// Both directions share one epoll registration; the interest mask is
/// recomputed whenever either side changes.
#[derive(Default)]
struct FdSource {
    read: Option<DirState>,
    write: Option<DirState>,
}

struct TimerSource {
    fd: RawFd,
    period_ms: i64,
    enabled: bool,
    clear: bool,
    oneshot: bool,
}

struct SignalSource {
    fd: RawFd,
    signo: i32,
    enabled: bool,
    clear: bool,
    oneshot: bool,
}

struct UserSource {
    fd: RawFd,
    enabled: bool,
    clear: bool,
    oneshot: bool,
}

#[derive(Default)]
struct SourceTable {
    fds: HashMap<u64, FdSource>,
    timers: HashMap<u64, TimerSource>,
    signals: HashMap<u64, SignalSource>,
    users: HashMap<u64, UserSource>,
}

pub(crate) struct EpollBackend {
    /// Epoll file descriptor.
    epoll: RawFd,

    /// Auxiliary sources backing the non-fd filters, plus per-fd
    /// interest bookkeeping.
    sources: Mutex<SourceTable>,
}

impl EpollBackend {
    /// Allocates the epoll instance.
    pub(crate) fn new() -> io::Result<Self> {
        let epoll = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            epoll,
            sources: Mutex::new(SourceTable::default()),
        })
    }

    /// Applies a batch of registration changes.
    pub(crate) fn apply(&self, changes: &[Event]) -> Result<(), QueueError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut table = self.sources.lock().unwrap();

        for change in changes {
            match change.filter {
                Filter::Read | Filter::Write => self.apply_fd(&mut table, change)?,
                Filter::Timer => self.apply_timer(&mut table, change)?,
                Filter::Signal => self.apply_signal(&mut table, change)?,
                Filter::User => self.apply_user(&mut table, change)?,
            }
        }

        Ok(())
    }

    /// Blocks until at least one registered source fires or the timeout
    /// elapses, decoding readiness into typed records.
    pub(crate) fn wait(
        &self,
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> Result<usize, QueueError> {
        let capacity = events.capacity();
        let mut native: Vec<libc::epoll_event> = Vec::with_capacity(capacity);

        let timeout_ms = timeout.map(millis_from_duration).unwrap_or(-1);

        let n = unsafe {
            libc::epoll_wait(
                self.epoll,
                native.as_mut_ptr(),
                capacity as i32,
                timeout_ms,
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

        let mut table = self.sources.lock().unwrap();

        for ev in &native {
            if events.len() == capacity {
                break;
            }

            let (tag, ident) = split_token(ev.u64);

            match tag {
                TAG_FD => self.decode_fd(&mut table, ev, ident, events),
                TAG_TIMER => self.decode_timer(&mut table, ident, events),
                TAG_SIGNAL => self.decode_signal(&mut table, ident, events),
                TAG_USER => self.decode_user(&mut table, ident, events),
                _ => {}
            }
        }

        Ok(events.len())
    }

    /// Releases the epoll instance and every auxiliary descriptor.
    pub(crate) fn close(&self) -> io::Result<()> {
        let mut table = self.sources.lock().unwrap();

        for (_, timer) in table.timers.drain() {
            sys_close(timer.fd);
        }
        for (_, signal) in table.signals.drain() {
            sys_close(signal.fd);
            unblock_signal(signal.signo);
        }
        for (_, user) in table.users.drain() {
            sys_close(user.fd);
        }
        table.fds.clear();

        sys_close_checked(self.epoll)
    }

    fn ctl(&self, op: i32, fd: RawFd, mask: u32, token: u64) -> io::Result<()> {
        let mut ev = libc::epoll_event {
            events: mask,
            u64: token,
        };

        let ev_ptr: *mut libc::epoll_event = if op == libc::EPOLL_CTL_DEL {
            ptr::null_mut()
        } else {
            &mut ev
        };

        let rc = unsafe { libc::epoll_ctl(self.epoll, op, fd, ev_ptr) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    /// Recomputes and applies the epoll interest mask for a watched fd.
    fn update_fd(&self, fd: RawFd, entry: &FdSource, add: bool) -> io::Result<()> {
        let mut mask = 0u32;
        let mut enabled = 0;
        let mut clear = 0;
        let mut oneshot = false;

        if let Some(dir) = &entry.read {
            if dir.enabled {
                mask |= libc::EPOLLIN as u32;
                enabled += 1;
                if dir.clear {
                    clear += 1;
                }
                oneshot |= dir.oneshot;
            }
        }

        if let Some(dir) = &entry.write {
            if dir.enabled {
                mask |= libc::EPOLLOUT as u32;
                enabled += 1;
                if dir.clear {
                    clear += 1;
                }
                oneshot |= dir.oneshot;
            }
        }

        if enabled > 0 && clear == enabled {
            mask |= libc::EPOLLET as u32;
        }
        if oneshot {
            mask |= libc::EPOLLONESHOT as u32;
        }

        let op = if add {
            libc::EPOLL_CTL_ADD
        } else {
            libc::EPOLL_CTL_MOD
        };

        self.ctl(op, fd, mask, token(TAG_FD, fd as u64))
    }

    fn apply_fd(&self, table: &mut SourceTable, change: &Event) -> Result<(), QueueError> {
        let ident = change.ident;
        let fd = ident as RawFd;
        let flags = change.flags;

        if flags.contains(EventFlags::DELETE) {
            let Some(entry) = table.fds.get_mut(&ident) else {
                return Err(QueueError::registration_errno(
                    ident,
                    change.filter,
                    libc::ENOENT,
                ));
            };

            let removed = match change.filter {
                Filter::Read => entry.read.take(),
                Filter::Write => entry.write.take(),
                _ => None,
            };
            if removed.is_none() {
                return Err(QueueError::registration_errno(
                    ident,
                    change.filter,
                    libc::ENOENT,
                ));
            }

            if entry.read.is_none() && entry.write.is_none() {
                table.fds.remove(&ident);
                self.ctl(libc::EPOLL_CTL_DEL, fd, 0, 0)
                    .map_err(|e| registration(ident, change.filter, e))?;
            } else {
                let entry = table.fds.get(&ident).unwrap();
                self.update_fd(fd, entry, false)
                    .map_err(|e| registration(ident, change.filter, e))?;
            }

            return Ok(());
        }

        if flags.contains(EventFlags::ADD) {
            let present = table.fds.contains_key(&ident);
            let entry = table.fds.entry(ident).or_default();

            let dir = DirState {
                enabled: !flags.contains(EventFlags::DISABLE),
                clear: flags.contains(EventFlags::CLEAR),
                oneshot: flags.contains(EventFlags::ONESHOT),
            };

            match change.filter {
                Filter::Read => entry.read = Some(dir),
                Filter::Write => entry.write = Some(dir),
                _ => {}
            }

            if let Err(e) = self.update_fd(fd, entry, !present) {
                if !present {
                    table.fds.remove(&ident);
                }
                return Err(registration(ident, change.filter, e));
            }

            return Ok(());
        }

        if flags.intersects(EventFlags::ENABLE | EventFlags::DISABLE) {
            let Some(entry) = table.fds.get_mut(&ident) else {
                return Err(QueueError::registration_errno(
                    ident,
                    change.filter,
                    libc::ENOENT,
                ));
            };

            let dir = match change.filter {
                Filter::Read => entry.read.as_mut(),
                Filter::Write => entry.write.as_mut(),
                _ => None,
            };
            let Some(dir) = dir else {
                return Err(QueueError::registration_errno(
                    ident,
                    change.filter,
                    libc::ENOENT,
                ));
            };

            dir.enabled = flags.contains(EventFlags::ENABLE);

            self.update_fd(fd, entry, false)
                .map_err(|e| registration(ident, change.filter, e))?;
        }

        Ok(())
    }

    fn apply_timer(&self, table: &mut SourceTable, change: &Event) -> Result<(), QueueError> {
        let ident = change.ident;
        let flags = change.flags;

        if flags.contains(EventFlags::DELETE) {
            let Some(timer) = table.timers.remove(&ident) else {
                return Err(QueueError::registration_errno(
                    ident,
                    Filter::Timer,
                    libc::ENOENT,
                ));
            };

            let _ = self.ctl(libc::EPOLL_CTL_DEL, timer.fd, 0, 0);
            sys_close(timer.fd);
            return Ok(());
        }

        if flags.contains(EventFlags::ADD) {
            let enabled = !flags.contains(EventFlags::DISABLE);
            let clear = flags.contains(EventFlags::CLEAR);
            let oneshot = flags.contains(EventFlags::ONESHOT);

            if let Some(timer) = table.timers.get_mut(&ident) {
                timer.period_ms = change.data;
                timer.enabled = enabled;
                timer.clear = clear;
                timer.oneshot = oneshot;

                let period = if enabled { change.data } else { 0 };
                arm_timer(timer.fd, period, oneshot)
                    .map_err(|e| registration(ident, Filter::Timer, e))?;
            } else {
                let tfd = unsafe {
                    libc::timerfd_create(
                        libc::CLOCK_MONOTONIC,
                        libc::TFD_NONBLOCK | libc::TFD_CLOEXEC,
                    )
                };
                if tfd < 0 {
                    return Err(QueueError::registration(ident, Filter::Timer));
                }

                let period = if enabled { change.data } else { 0 };
                if let Err(e) = arm_timer(tfd, period, oneshot) {
                    sys_close(tfd);
                    return Err(registration(ident, Filter::Timer, e));
                }

                let mut mask = libc::EPOLLIN as u32;
                if clear {
                    mask |= libc::EPOLLET as u32;
                }

                if let Err(e) = self.ctl(libc::EPOLL_CTL_ADD, tfd, mask, token(TAG_TIMER, ident)) {
                    sys_close(tfd);
                    return Err(registration(ident, Filter::Timer, e));
                }

                log::trace!("timer {ident} armed with period {}ms", change.data);

                table.timers.insert(
                    ident,
                    TimerSource {
                        fd: tfd,
                        period_ms: change.data,
                        enabled,
                        clear,
                        oneshot,
                    },
                );
            }

            return Ok(());
        }

        if flags.intersects(EventFlags::ENABLE | EventFlags::DISABLE) {
            let Some(timer) = table.timers.get_mut(&ident) else {
                return Err(QueueError::registration_errno(
                    ident,
                    Filter::Timer,
                    libc::ENOENT,
                ));
            };

            timer.enabled = flags.contains(EventFlags::ENABLE);

            let period = if timer.enabled { timer.period_ms } else { 0 };
            arm_timer(timer.fd, period, timer.oneshot)
                .map_err(|e| registration(ident, Filter::Timer, e))?;
        }

        Ok(())
    }

    fn apply_signal(&self, table: &mut SourceTable, change: &Event) -> Result<(), QueueError> {
        let ident = change.ident;
        let signo = ident as i32;
        let flags = change.flags;

        if flags.contains(EventFlags::DELETE) {
            let Some(signal) = table.signals.remove(&ident) else {
                return Err(QueueError::registration_errno(
                    ident,
                    Filter::Signal,
                    libc::ENOENT,
                ));
            };

            let _ = self.ctl(libc::EPOLL_CTL_DEL, signal.fd, 0, 0);
            sys_close(signal.fd);
            unblock_signal(signal.signo);
            return Ok(());
        }

        if flags.contains(EventFlags::ADD) {
            let enabled = !flags.contains(EventFlags::DISABLE);
            let clear = flags.contains(EventFlags::CLEAR);
            let oneshot = flags.contains(EventFlags::ONESHOT);

            if let Some(signal) = table.signals.get_mut(&ident) {
                signal.enabled = enabled;
                signal.clear = clear;
                signal.oneshot = oneshot;

                let mut mask = if enabled { libc::EPOLLIN as u32 } else { 0 };
                if clear {
                    mask |= libc::EPOLLET as u32;
                }

                self.ctl(libc::EPOLL_CTL_MOD, signal.fd, mask, token(TAG_SIGNAL, ident))
                    .map_err(|e| registration(ident, Filter::Signal, e))?;
                return Ok(());
            }

            let mask = block_signal(signo).map_err(|e| registration(ident, Filter::Signal, e))?;

            let sfd =
                unsafe { libc::signalfd(-1, &mask, libc::SFD_NONBLOCK | libc::SFD_CLOEXEC) };
            if sfd < 0 {
                let err = io::Error::last_os_error();
                unblock_signal(signo);
                return Err(registration(ident, Filter::Signal, err));
            }

            let mut ev_mask = libc::EPOLLIN as u32;
            if clear {
                ev_mask |= libc::EPOLLET as u32;
            }

            if let Err(e) = self.ctl(libc::EPOLL_CTL_ADD, sfd, ev_mask, token(TAG_SIGNAL, ident)) {
                sys_close(sfd);
                unblock_signal(signo);
                return Err(registration(ident, Filter::Signal, e));
            }

            log::trace!("signal {signo} routed to the queue");

            table.signals.insert(
                ident,
                SignalSource {
                    fd: sfd,
                    signo,
                    enabled,
                    clear,
                    oneshot,
                },
            );

            return Ok(());
        }

        if flags.intersects(EventFlags::ENABLE | EventFlags::DISABLE) {
            let Some(signal) = table.signals.get_mut(&ident) else {
                return Err(QueueError::registration_errno(
                    ident,
                    Filter::Signal,
                    libc::ENOENT,
                ));
            };

            signal.enabled = flags.contains(EventFlags::ENABLE);

            let mask = if signal.enabled {
                libc::EPOLLIN as u32
            } else {
                0
            };
            self.ctl(libc::EPOLL_CTL_MOD, signal.fd, mask, token(TAG_SIGNAL, ident))
                .map_err(|e| registration(ident, Filter::Signal, e))?;
        }

        Ok(())
    }

    fn apply_user(&self, table: &mut SourceTable, change: &Event) -> Result<(), QueueError> {
        let ident = change.ident;
        let flags = change.flags;

        if flags.contains(EventFlags::DELETE) {
            let Some(user) = table.users.remove(&ident) else {
                return Err(QueueError::registration_errno(
                    ident,
                    Filter::User,
                    libc::ENOENT,
                ));
            };

            let _ = self.ctl(libc::EPOLL_CTL_DEL, user.fd, 0, 0);
            sys_close(user.fd);
            return Ok(());
        }

        if flags.contains(EventFlags::ADD) {
            let enabled = !flags.contains(EventFlags::DISABLE);
            let clear = flags.contains(EventFlags::CLEAR);
            let oneshot = flags.contains(EventFlags::ONESHOT);

            let mut mask = if enabled { libc::EPOLLIN as u32 } else { 0 };
            if clear {
                mask |= libc::EPOLLET as u32;
            }
            if oneshot {
                mask |= libc::EPOLLONESHOT as u32;
            }

            if let Some(user) = table.users.get_mut(&ident) {
                user.enabled = enabled;
                user.clear = clear;
                user.oneshot = oneshot;

                self.ctl(libc::EPOLL_CTL_MOD, user.fd, mask, token(TAG_USER, ident))
                    .map_err(|e| registration(ident, Filter::User, e))?;
            } else {
                let efd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
                if efd < 0 {
                    return Err(QueueError::registration(ident, Filter::User));
                }

                if let Err(e) = self.ctl(libc::EPOLL_CTL_ADD, efd, mask, token(TAG_USER, ident)) {
                    sys_close(efd);
                    return Err(registration(ident, Filter::User, e));
                }

                table.users.insert(
                    ident,
                    UserSource {
                        fd: efd,
                        enabled,
                        clear,
                        oneshot,
                    },
                );
            }
        }

        if flags.intersects(EventFlags::ENABLE | EventFlags::DISABLE) {
            let Some(user) = table.users.get_mut(&ident) else {
                return Err(QueueError::registration_errno(
                    ident,
                    Filter::User,
                    libc::ENOENT,
                ));
            };

            user.enabled = flags.contains(EventFlags::ENABLE);

            let mask = if user.enabled { libc::EPOLLIN as u32 } else { 0 };
            self.ctl(libc::EPOLL_CTL_MOD, user.fd, mask, token(TAG_USER, ident))
                .map_err(|e| registration(ident, Filter::User, e))?;
        }

        if change.fflags.contains(FilterFlags::TRIGGER) {
            let Some(user) = table.users.get(&ident) else {
                return Err(QueueError::registration_errno(
                    ident,
                    Filter::User,
                    libc::ENOENT,
                ));
            };

            let one: u64 = 1;
            let rc = unsafe { libc::write(user.fd, &one as *const _ as *const _, 8) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                // A saturated eventfd counter still counts as triggered.
                if err.kind() != io::ErrorKind::WouldBlock {
                    return Err(registration(ident, Filter::User, err));
                }
            }
        }

        Ok(())
    }

    fn decode_fd(
        &self,
        table: &mut SourceTable,
        ev: &libc::epoll_event,
        ident: u64,
        events: &mut Vec<Event>,
    ) {
        let fd = ident as RawFd;
        let capacity = events.capacity();

        let Some(entry) = table.fds.get_mut(&ident) else {
            return;
        };

        let readable =
            ev.events & (libc::EPOLLIN | libc::EPOLLERR | libc::EPOLLHUP) as u32 != 0;
        let writable = ev.events & libc::EPOLLOUT as u32 != 0;

        let mut fired_read = false;
        let mut fired_write = false;

        if readable {
            if let Some(dir) = &entry.read {
                if dir.enabled && events.len() < capacity {
                    events.push(Event {
                        ident,
                        filter: Filter::Read,
                        flags: dir_flags(dir.clear, dir.oneshot),
                        fflags: FilterFlags::empty(),
                        data: bytes_available(fd),
                    });
                    fired_read = true;
                }
            }
        }

        if writable {
            if let Some(dir) = &entry.write {
                if dir.enabled && events.len() < capacity {
                    events.push(Event {
                        ident,
                        filter: Filter::Write,
                        flags: dir_flags(dir.clear, dir.oneshot),
                        fflags: FilterFlags::empty(),
                        data: 0,
                    });
                    fired_write = true;
                }
            }
        }

        // Oneshot directions deregister on delivery, matching the
        // kernel-side auto-removal of the kqueue backend.
        let drop_read = fired_read && entry.read.as_ref().is_some_and(|d| d.oneshot);
        let drop_write = fired_write && entry.write.as_ref().is_some_and(|d| d.oneshot);

        if drop_read {
            entry.read = None;
        }
        if drop_write {
            entry.write = None;
        }

        if drop_read || drop_write {
            if entry.read.is_none() && entry.write.is_none() {
                table.fds.remove(&ident);
                let _ = self.ctl(libc::EPOLL_CTL_DEL, fd, 0, 0);
            } else {
                let entry = table.fds.get(&ident).unwrap();
                let _ = self.update_fd(fd, entry, false);
            }
        }
    }

    fn decode_timer(&self, table: &mut SourceTable, ident: u64, events: &mut Vec<Event>) {
        let Some(timer) = table.timers.get(&ident) else {
            return;
        };

        let mut expirations = 0u64;
        let rc = unsafe {
            libc::read(
                timer.fd,
                &mut expirations as *mut _ as *mut _,
                mem::size_of::<u64>(),
            )
        };

        if rc as usize != mem::size_of::<u64>() || expirations == 0 {
            return;
        }

        events.push(Event {
            ident,
            filter: Filter::Timer,
            flags: dir_flags(timer.clear, timer.oneshot),
            fflags: FilterFlags::empty(),
            data: expirations as i64,
        });

        if timer.oneshot {
            let timer = table.timers.remove(&ident).unwrap();
            let _ = self.ctl(libc::EPOLL_CTL_DEL, timer.fd, 0, 0);
            sys_close(timer.fd);
        }
    }

    fn decode_signal(&self, table: &mut SourceTable, ident: u64, events: &mut Vec<Event>) {
        let Some(signal) = table.signals.get(&ident) else {
            return;
        };

        let mut deliveries = 0i64;
        loop {
            let mut info: libc::signalfd_siginfo = unsafe { mem::zeroed() };
            let rc = unsafe {
                libc::read(
                    signal.fd,
                    &mut info as *mut _ as *mut _,
                    mem::size_of::<libc::signalfd_siginfo>(),
                )
            };

            if rc as usize != mem::size_of::<libc::signalfd_siginfo>() {
                break;
            }
            deliveries += 1;
        }

        if deliveries == 0 {
            return;
        }

        events.push(Event {
            ident,
            filter: Filter::Signal,
            flags: dir_flags(signal.clear, signal.oneshot),
            fflags: FilterFlags::empty(),
            data: deliveries,
        });

        if signal.oneshot {
            let signal = table.signals.remove(&ident).unwrap();
            let _ = self.ctl(libc::EPOLL_CTL_DEL, signal.fd, 0, 0);
            sys_close(signal.fd);
            unblock_signal(signal.signo);
        }
    }

    fn decode_user(&self, table: &mut SourceTable, ident: u64, events: &mut Vec<Event>) {
        let Some(user) = table.users.get(&ident) else {
            return;
        };

        let mut count = 0u64;
        let rc = unsafe {
            libc::read(
                user.fd,
                &mut count as *mut _ as *mut _,
                mem::size_of::<u64>(),
            )
        };

        if rc as usize != mem::size_of::<u64>() || count == 0 {
            return;
        }

        events.push(Event {
            ident,
            filter: Filter::User,
            flags: dir_flags(user.clear, user.oneshot),
            fflags: FilterFlags::empty(),
            data: count as i64,
        });

        if user.oneshot {
            let user = table.users.remove(&ident).unwrap();
            let _ = self.ctl(libc::EPOLL_CTL_DEL, user.fd, 0, 0);
            sys_close(user.fd);
        }
    }
}

fn registration(ident: u64, filter: Filter, source: io::Error) -> QueueError {
    QueueError::Registration {
        ident,
        filter,
        source,
    }
}

/// Echoes the registration flags a source was armed with, the way the
/// kernel echoes them on a kqueue record.
fn dir_flags(clear: bool, oneshot: bool) -> EventFlags {
    let mut flags = EventFlags::empty();

    if clear {
        flags |= EventFlags::CLEAR;
    }
    if oneshot {
        flags |= EventFlags::ONESHOT;
    }

    flags
}

/// Bytes pending on a readable descriptor, where the kernel can report
/// them; `0` otherwise.
fn bytes_available(fd: RawFd) -> i64 {
    let mut pending: libc::c_int = 0;
    let rc = unsafe { libc::ioctl(fd, libc::FIONREAD, &mut pending) };

    if rc < 0 { 0 } else { pending as i64 }
}

fn timespec_from_millis(ms: i64) -> libc::timespec {
    libc::timespec {
        tv_sec: ms / 1_000,
        tv_nsec: (ms % 1_000) * 1_000_000,
    }
}

/// Arms (or, with a zero period, disarms) a timerfd.
fn arm_timer(fd: RawFd, period_ms: i64, oneshot: bool) -> io::Result<()> {
    let value = timespec_from_millis(period_ms);
    let interval = if oneshot {
        timespec_from_millis(0)
    } else {
        timespec_from_millis(period_ms)
    };

    let timerspec = libc::itimerspec {
        it_interval: interval,
        it_value: value,
    };

    let rc = unsafe { libc::timerfd_settime(fd, 0, &timerspec, ptr::null_mut()) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Blocks `signo` in the calling thread, as `signalfd(2)` requires, and
/// returns the single-signal mask.
fn block_signal(signo: i32) -> io::Result<libc::sigset_t> {
    unsafe {
        let mut mask: libc::sigset_t = mem::zeroed();
        libc::sigemptyset(&mut mask);
        libc::sigaddset(&mut mask, signo);

        let rc = libc::pthread_sigmask(libc::SIG_BLOCK, &mask, ptr::null_mut());
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc));
        }

        Ok(mask)
    }
}

/// Best-effort unblock once a signal source is deregistered.
fn unblock_signal(signo: i32) {
    unsafe {
        let mut mask: libc::sigset_t = mem::zeroed();
        libc::sigemptyset(&mut mask);
        libc::sigaddset(&mut mask, signo);

        let rc = libc::pthread_sigmask(libc::SIG_UNBLOCK, &mask, ptr::null_mut());
        if rc != 0 {
            log::warn!(
                "failed to unblock signal {signo}: {}",
                io::Error::from_raw_os_error(rc)
            );
        }
    }
}
