use crate::net::Endpoint;

use libc::{
    AF_INET, AF_INET6, AF_UNIX, F_GETFL, F_SETFL, IPPROTO_IPV6, IPV6_V6ONLY, O_NONBLOCK, SHUT_RD,
    SHUT_RDWR, SHUT_WR, SO_LINGER, SO_RCVTIMEO, SO_REUSEADDR, SO_SNDTIMEO, SOL_SOCKET, accept,
    bind, c_int, close, connect, getpeername, getsockname, getsockopt, listen, read, setsockopt,
    shutdown, sockaddr, sockaddr_in, sockaddr_in6, sockaddr_storage, sockaddr_un, socket,
    socklen_t, write,
};
use std::net::{Ipv4Addr, Ipv6Addr, Shutdown, SocketAddrV4, SocketAddrV6};
use std::os::fd::RawFd;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::PathBuf;
use std::{io, mem};

/// Reads from a file descriptor into the given buffer.
pub(crate) fn sys_read(fd: RawFd, buffer: &mut [u8]) -> io::Result<usize> {
    let n = unsafe { read(fd, buffer.as_mut_ptr() as *mut _, buffer.len()) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

/// Writes the buffer to a file descriptor.
pub(crate) fn sys_write(fd: RawFd, buffer: &[u8]) -> io::Result<usize> {
    let n = unsafe { write(fd, buffer.as_ptr() as *const _, buffer.len()) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

/// Closes a file descriptor, ignoring errors.
///
/// Used from `Drop` implementations where there is no caller to report
/// to.
pub(crate) fn sys_close(fd: RawFd) {
    unsafe { close(fd) };
}

/// Closes a file descriptor and reports failure.
pub(crate) fn sys_close_checked(fd: RawFd) -> io::Result<()> {
    let rc = unsafe { close(fd) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Switches a file descriptor between blocking and non-blocking mode.
pub(crate) fn sys_set_nonblocking(fd: RawFd, nonblocking: bool) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let flags = if nonblocking {
        flags | O_NONBLOCK
    } else {
        flags & !O_NONBLOCK
    };

    let rc = unsafe { libc::fcntl(fd, F_SETFL, flags) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Reports whether a file descriptor is in non-blocking mode.
pub(crate) fn sys_get_nonblocking(fd: RawFd) -> io::Result<bool> {
    let flags = unsafe { libc::fcntl(fd, F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(flags & O_NONBLOCK != 0)
}

/// Creates a socket of the given domain and type.
///
/// The socket starts in blocking mode; callers opt into non-blocking
/// behavior through [`sys_set_nonblocking`].
pub(crate) fn sys_socket(domain: c_int, ty: c_int) -> io::Result<RawFd> {
    let fd = unsafe { socket(domain, ty, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(fd)
}

/// Binds a socket to an address.
pub(crate) fn sys_bind(fd: RawFd, addr: &sockaddr_storage, len: socklen_t) -> io::Result<()> {
    let rc = unsafe { bind(fd, addr as *const _ as *const sockaddr, len) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Marks a socket as a listening socket.
pub(crate) fn sys_listen(fd: RawFd, backlog: c_int) -> io::Result<()> {
    let rc = unsafe { listen(fd, backlog) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Accepts a new incoming connection.
///
/// The client socket inherits blocking mode from nothing: it is
/// returned exactly as the kernel created it.
pub(crate) fn sys_accept(fd: RawFd) -> io::Result<(RawFd, Endpoint)> {
    let mut storage: sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_storage>() as socklen_t;

    let client_fd = unsafe { accept(fd, &mut storage as *mut _ as *mut sockaddr, &mut len) };

    if client_fd < 0 {
        return Err(io::Error::last_os_error());
    }

    let endpoint = match endpoint_from_storage(&storage, len) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            unsafe { close(client_fd) };
            return Err(e);
        }
    };

    Ok((client_fd, endpoint))
}

/// Initiates a connection.
pub(crate) fn sys_connect(fd: RawFd, addr: &sockaddr_storage, len: socklen_t) -> io::Result<()> {
    let rc = unsafe { connect(fd, addr as *const _ as *const sockaddr, len) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Returns the local address of a socket.
pub(crate) fn sys_sockname(fd: RawFd) -> io::Result<Endpoint> {
    let mut storage: sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_storage>() as socklen_t;

    let rc = unsafe { getsockname(fd, &mut storage as *mut _ as *mut sockaddr, &mut len) };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        endpoint_from_storage(&storage, len)
    }
}

/// Returns the remote address of a connected socket.
pub(crate) fn sys_peername(fd: RawFd) -> io::Result<Endpoint> {
    let mut storage: sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_storage>() as socklen_t;

    let rc = unsafe { getpeername(fd, &mut storage as *mut _ as *mut sockaddr, &mut len) };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        endpoint_from_storage(&storage, len)
    }
}

/// Shuts down a socket.
pub(crate) fn sys_shutdown(fd: RawFd, how: Shutdown) -> io::Result<()> {
    let how = match how {
        Shutdown::Read => SHUT_RD,
        Shutdown::Write => SHUT_WR,
        Shutdown::Both => SHUT_RDWR,
    };

    let rc = unsafe { shutdown(fd, how) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn set_opt<T>(fd: RawFd, level: c_int, name: c_int, value: &T) -> io::Result<()> {
    let rc = unsafe {
        setsockopt(
            fd,
            level,
            name,
            value as *const _ as *const _,
            mem::size_of::<T>() as socklen_t,
        )
    };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn get_opt<T>(fd: RawFd, level: c_int, name: c_int) -> io::Result<T> {
    let mut value: T = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<T>() as socklen_t;

    let rc = unsafe { getsockopt(fd, level, name, &mut value as *mut _ as *mut _, &mut len) };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(value)
    }
}

/// Enables `SO_REUSEADDR` on a socket.
pub(crate) fn sys_set_reuseaddr(fd: RawFd) -> io::Result<()> {
    let yes: c_int = 1;
    set_opt(fd, SOL_SOCKET, SO_REUSEADDR, &yes)
}

/// Sets the `IPV6_V6ONLY` socket option.
pub(crate) fn sys_set_v6only(fd: RawFd, v6only: bool) -> io::Result<()> {
    let value: c_int = if v6only { 1 } else { 0 };
    set_opt(fd, IPPROTO_IPV6, IPV6_V6ONLY, &value)
}

/// Sets the `SO_LINGER` option. `None` disables lingering.
pub(crate) fn sys_set_linger(fd: RawFd, linger: Option<libc::linger>) -> io::Result<()> {
    let value = linger.unwrap_or(libc::linger {
        l_onoff: 0,
        l_linger: 0,
    });

    set_opt(fd, SOL_SOCKET, SO_LINGER, &value)
}

/// Reads the `SO_LINGER` option.
pub(crate) fn sys_get_linger(fd: RawFd) -> io::Result<libc::linger> {
    get_opt(fd, SOL_SOCKET, SO_LINGER)
}

/// Sets `SO_RCVTIMEO` or `SO_SNDTIMEO`. An all-zero `timeval` disables
/// the timeout.
pub(crate) fn sys_set_timeout(fd: RawFd, name: c_int, tv: libc::timeval) -> io::Result<()> {
    debug_assert!(name == SO_RCVTIMEO || name == SO_SNDTIMEO);
    set_opt(fd, SOL_SOCKET, name, &tv)
}

/// Reads `SO_RCVTIMEO` or `SO_SNDTIMEO`.
pub(crate) fn sys_get_timeout(fd: RawFd, name: c_int) -> io::Result<libc::timeval> {
    debug_assert!(name == SO_RCVTIMEO || name == SO_SNDTIMEO);
    get_opt(fd, SOL_SOCKET, name)
}

/// Converts an [`Endpoint`] to a `sockaddr_storage`.
///
/// Fails with `InvalidInput` if a unix-domain path does not fit the
/// kernel's `sun_path` buffer.
pub(crate) fn endpoint_to_storage(
    endpoint: &Endpoint,
) -> io::Result<(sockaddr_storage, socklen_t)> {
    let mut storage: sockaddr_storage = unsafe { mem::zeroed() };

    match endpoint {
        Endpoint::V4(v4) => {
            let sa = unsafe { &mut *(&mut storage as *mut _ as *mut sockaddr_in) };
            sa.sin_family = AF_INET as _;
            sa.sin_port = v4.port().to_be();
            sa.sin_addr.s_addr = u32::from(*v4.ip()).to_be();

            Ok((storage, mem::size_of::<sockaddr_in>() as socklen_t))
        }

        Endpoint::V6(v6) => {
            let sa = unsafe { &mut *(&mut storage as *mut _ as *mut sockaddr_in6) };
            sa.sin6_family = AF_INET6 as _;
            sa.sin6_port = v6.port().to_be();
            sa.sin6_addr.s6_addr = v6.ip().octets();
            sa.sin6_flowinfo = v6.flowinfo();
            sa.sin6_scope_id = v6.scope_id();

            Ok((storage, mem::size_of::<sockaddr_in6>() as socklen_t))
        }

        Endpoint::Unix(path) => {
            let sa = unsafe { &mut *(&mut storage as *mut _ as *mut sockaddr_un) };
            sa.sun_family = AF_UNIX as _;

            let bytes = path.as_os_str().as_bytes();
            if bytes.len() >= sa.sun_path.len() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "unix socket path too long",
                ));
            }

            for (dst, src) in sa.sun_path.iter_mut().zip(bytes) {
                *dst = *src as libc::c_char;
            }

            let offset = {
                let base = sa as *const sockaddr_un as usize;
                let path_field = sa.sun_path.as_ptr() as usize;
                path_field - base
            };

            Ok((storage, (offset + bytes.len() + 1) as socklen_t))
        }
    }
}

/// Converts a kernel-reported `sockaddr_storage` to an [`Endpoint`].
///
/// An unsupported address family is an environmental failure
/// (`InvalidData`), not a caller contract violation.
pub(crate) fn endpoint_from_storage(
    storage: &sockaddr_storage,
    len: socklen_t,
) -> io::Result<Endpoint> {
    match storage.ss_family as c_int {
        AF_INET => {
            let addr = unsafe { &*(storage as *const _ as *const sockaddr_in) };
            let ip = Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr));
            let port = u16::from_be(addr.sin_port);

            Ok(Endpoint::V4(SocketAddrV4::new(ip, port)))
        }

        AF_INET6 => {
            let addr = unsafe { &*(storage as *const _ as *const sockaddr_in6) };
            let ip = Ipv6Addr::from(addr.sin6_addr.s6_addr);
            let port = u16::from_be(addr.sin6_port);

            Ok(Endpoint::V6(SocketAddrV6::new(
                ip,
                port,
                addr.sin6_flowinfo,
                addr.sin6_scope_id,
            )))
        }

        AF_UNIX => {
            let addr = unsafe { &*(storage as *const _ as *const sockaddr_un) };

            let offset = {
                let base = addr as *const sockaddr_un as usize;
                let path_field = addr.sun_path.as_ptr() as usize;
                path_field - base
            };

            // An unbound peer reports only the family; map it to an
            // empty path.
            let path_len = (len as usize).saturating_sub(offset);
            let bytes: Vec<u8> = addr.sun_path[..path_len.min(addr.sun_path.len())]
                .iter()
                .map(|c| *c as u8)
                .take_while(|c| *c != 0)
                .collect();

            Ok(Endpoint::Unix(PathBuf::from(
                std::ffi::OsString::from_vec(bytes),
            )))
        }

        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "unsupported address family",
        )),
    }
}
