use std::fmt;
use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The address family of an [`Endpoint`] or a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// IPv4.
    Inet,
    /// IPv6.
    Inet6,
    /// Unix-domain (file-system path).
    Unix,
}

/// An immutable socket address value.
///
/// An `Endpoint` is either an IPv4 or IPv6 address with a port, or a
/// file-system path for unix-domain sockets. It carries no behavior
/// beyond equality, display, and family classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// An IPv4 address and port.
    V4(SocketAddrV4),
    /// An IPv6 address and port.
    V6(SocketAddrV6),
    /// A unix-domain socket path.
    Unix(PathBuf),
}

impl Endpoint {
    /// A unix-domain endpoint for the given path.
    pub fn unix<P: AsRef<Path>>(path: P) -> Self {
        Endpoint::Unix(path.as_ref().to_path_buf())
    }

    /// The address family of this endpoint.
    pub fn family(&self) -> Family {
        match self {
            Endpoint::V4(_) => Family::Inet,
            Endpoint::V6(_) => Family::Inet6,
            Endpoint::Unix(_) => Family::Unix,
        }
    }

    /// The port, for IP endpoints.
    pub fn port(&self) -> Option<u16> {
        match self {
            Endpoint::V4(v4) => Some(v4.port()),
            Endpoint::V6(v6) => Some(v6.port()),
            Endpoint::Unix(_) => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::V4(v4) => v4.fmt(f),
            Endpoint::V6(v6) => v6.fmt(f),
            Endpoint::Unix(path) => path.display().fmt(f),
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(v4) => Endpoint::V4(v4),
            SocketAddr::V6(v6) => Endpoint::V6(v6),
        }
    }
}

impl FromStr for Endpoint {
    type Err = std::net::AddrParseError;

    /// Parses the textual socket-address forms, such as
    /// `"127.0.0.1:8080"` or `"[::1]:8080"`.
    ///
    /// Unix-domain endpoints are not parsed; build them with
    /// [`Endpoint::unix`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SocketAddr::from_str(s).map(Endpoint::from)
    }
}
