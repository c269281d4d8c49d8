use super::endpoint::{Endpoint, Family};
use crate::sys::{
    endpoint_to_storage, sys_accept, sys_bind, sys_close, sys_close_checked, sys_connect,
    sys_get_linger, sys_get_nonblocking, sys_get_timeout, sys_listen, sys_peername, sys_read,
    sys_set_linger, sys_set_nonblocking, sys_set_reuseaddr, sys_set_timeout, sys_set_v6only,
    sys_shutdown, sys_socket, sys_sockname, sys_write,
};
use crate::time::{duration_from_timeval, timeval_from_duration};

use std::io;
use std::mem;
use std::net::Shutdown;
use std::os::fd::{AsRawFd, IntoRawFd, RawFd};
use std::time::Duration;

/// The communication style of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Connection-oriented byte stream (TCP, `SOCK_STREAM`).
    Stream,
    /// Connectionless datagrams (UDP, `SOCK_DGRAM`).
    Datagram,
}

/// An owned socket handle.
///
/// A `Socket` owns exactly one file descriptor for its lifetime and
/// exposes the BSD socket lifecycle (bind, listen, accept, connect,
/// shutdown, close) plus option accessors. Every accessor maps the OS
/// error code to a typed [`io::Error`].
///
/// Sockets are created in **blocking** mode; switch with
/// [`set_nonblocking`](Self::set_nonblocking) or bound waits with the
/// read/write timeout options.
///
/// To watch a socket with an [`EventQueue`](crate::EventQueue), pass its
/// [`as_raw_fd`](AsRawFd::as_raw_fd) value as the identifier of a
/// `Read` or `Write` descriptor. The queue holds only that numeric weak
/// reference: dropping the `Socket` while it is registered leaves the
/// kernel to silently drop the registration.
pub struct Socket {
    /// The owned file descriptor.
    fd: RawFd,
}

impl Socket {
    /// Creates a socket of the given family and kind.
    pub fn new(family: Family, kind: Kind) -> io::Result<Self> {
        let domain = match family {
            Family::Inet => libc::AF_INET,
            Family::Inet6 => libc::AF_INET6,
            Family::Unix => libc::AF_UNIX,
        };

        let ty = match kind {
            Kind::Stream => libc::SOCK_STREAM,
            Kind::Datagram => libc::SOCK_DGRAM,
        };

        let fd = sys_socket(domain, ty)?;

        Ok(Self { fd })
    }

    /// Wraps an already-open socket file descriptor, taking ownership.
    ///
    /// # Safety
    ///
    /// `fd` must be a valid, open socket descriptor not owned elsewhere.
    pub unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Binds the socket to an endpoint.
    pub fn bind(&self, endpoint: &Endpoint) -> io::Result<()> {
        let (storage, len) = endpoint_to_storage(endpoint)?;
        sys_bind(self.fd, &storage, len)
    }

    /// Marks the socket as a listening socket with the given backlog.
    pub fn listen(&self, backlog: i32) -> io::Result<()> {
        sys_listen(self.fd, backlog)
    }

    /// Accepts an incoming connection, returning the client socket and
    /// its peer endpoint.
    ///
    /// Blocks until a connection is pending unless the socket is
    /// non-blocking or an accept-readiness event was awaited first.
    pub fn accept(&self) -> io::Result<(Socket, Endpoint)> {
        let (fd, endpoint) = sys_accept(self.fd)?;
        Ok((Socket { fd }, endpoint))
    }

    /// Connects the socket to a remote endpoint.
    pub fn connect(&self, endpoint: &Endpoint) -> io::Result<()> {
        let (storage, len) = endpoint_to_storage(endpoint)?;
        sys_connect(self.fd, &storage, len)
    }

    /// Shuts down the read, write, or both halves of the connection.
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        sys_shutdown(self.fd, how)
    }

    /// Closes the socket, reporting failure.
    ///
    /// Consumes the handle, so a second close is unrepresentable. A
    /// socket that is merely dropped is closed best-effort instead.
    pub fn close(self) -> io::Result<()> {
        let fd = self.fd;
        mem::forget(self);
        sys_close_checked(fd)
    }

    /// Reads bytes from the socket.
    pub fn read(&self, buffer: &mut [u8]) -> io::Result<usize> {
        sys_read(self.fd, buffer)
    }

    /// Writes bytes to the socket.
    pub fn write(&self, buffer: &[u8]) -> io::Result<usize> {
        sys_write(self.fd, buffer)
    }

    /// Returns the local endpoint of this socket.
    pub fn local_endpoint(&self) -> io::Result<Endpoint> {
        sys_sockname(self.fd)
    }

    /// Returns the remote endpoint of a connected socket.
    pub fn peer_endpoint(&self) -> io::Result<Endpoint> {
        sys_peername(self.fd)
    }

    /// Enables `SO_REUSEADDR`.
    pub fn set_reuseaddr(&self) -> io::Result<()> {
        sys_set_reuseaddr(self.fd)
    }

    /// Sets the `IPV6_V6ONLY` option on an IPv6 socket.
    pub fn set_v6only(&self, v6only: bool) -> io::Result<()> {
        sys_set_v6only(self.fd, v6only)
    }

    /// Switches the socket between blocking and non-blocking mode.
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        sys_set_nonblocking(self.fd, nonblocking)
    }

    /// Reports whether the socket is in non-blocking mode.
    pub fn nonblocking(&self) -> io::Result<bool> {
        sys_get_nonblocking(self.fd)
    }

    /// Sets `SO_LINGER`.
    ///
    /// `Some(timeout)` makes close block up to `timeout` (truncated to
    /// whole seconds) while unsent data drains; `None` restores the
    /// default background close.
    pub fn set_linger(&self, linger: Option<Duration>) -> io::Result<()> {
        let value = linger.map(|timeout| libc::linger {
            l_onoff: 1,
            l_linger: timeout.as_secs() as _,
        });

        sys_set_linger(self.fd, value)
    }

    /// Reads the `SO_LINGER` setting.
    pub fn linger(&self) -> io::Result<Option<Duration>> {
        let value = sys_get_linger(self.fd)?;

        if value.l_onoff == 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(value.l_linger as u64)))
        }
    }

    /// Sets the receive timeout (`SO_RCVTIMEO`), truncated to
    /// microsecond granularity. `None` disables it.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        let tv = timeout.map(timeval_from_duration).unwrap_or(libc::timeval {
            tv_sec: 0,
            tv_usec: 0,
        });

        sys_set_timeout(self.fd, libc::SO_RCVTIMEO, tv)
    }

    /// Reads the receive timeout.
    pub fn read_timeout(&self) -> io::Result<Option<Duration>> {
        let tv = sys_get_timeout(self.fd, libc::SO_RCVTIMEO)?;
        Ok(duration_from_timeval(&tv))
    }

    /// Sets the send timeout (`SO_SNDTIMEO`), truncated to microsecond
    /// granularity. `None` disables it.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        let tv = timeout.map(timeval_from_duration).unwrap_or(libc::timeval {
            tv_sec: 0,
            tv_usec: 0,
        });

        sys_set_timeout(self.fd, libc::SO_SNDTIMEO, tv)
    }

    /// Reads the send timeout.
    pub fn write_timeout(&self) -> io::Result<Option<Duration>> {
        let tv = sys_get_timeout(self.fd, libc::SO_SNDTIMEO)?;
        Ok(duration_from_timeval(&tv))
    }
}

impl AsRawFd for Socket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl IntoRawFd for Socket {
    fn into_raw_fd(self) -> RawFd {
        let fd = self.fd;
        mem::forget(self);
        fd
    }
}

impl io::Read for Socket {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        sys_read(self.fd, buffer)
    }
}

impl io::Write for Socket {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        sys_write(self.fd, buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Socket {
    /// Closes the socket if it was not closed explicitly.
    fn drop(&mut self) {
        sys_close(self.fd);
    }
}
