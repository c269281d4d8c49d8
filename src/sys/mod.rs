//! Raw syscall shims.
//!
//! Thin `sys_*` wrappers over `libc`, one concern each. Every fallible
//! call maps a `-1` return to [`std::io::Error::last_os_error`]; no
//! errno handling happens above this layer except classification.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub(crate) use unix::*;
