//! Typed sockets and endpoints.
//!
//! This module provides the socket side of the crate:
//! - [`Endpoint`] — an immutable IPv4/IPv6/unix-domain address value,
//! - [`Socket`] — an owned socket handle with lifecycle operations and
//!   option accessors.
//!
//! A [`Socket`] couples to the event queue only through its raw file
//! descriptor, used as the identifier of a `Read` or `Write` event
//! descriptor; the queue never inspects socket state.

mod endpoint;
mod socket;

pub use endpoint::{Endpoint, Family};
pub use socket::{Kind, Socket};
