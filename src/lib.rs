//! # Vigilia
//!
//! **Vigilia** is a typed, memory-safe interface to two operating-system
//! primitives: BSD-style sockets and kernel event queues. It is the
//! low-level watch-and-notify layer of the **Nebula** ecosystem.
//!
//! Unlike an async runtime, Vigilia adds no scheduler and no threads of
//! its own: [`EventQueue::poll`] is a synchronous, blocking call on the
//! calling thread, and everything above it is the caller's business.
//! What the crate does take care of is the kernel boundary — encoding
//! typed event descriptors into kernel registrations, waiting across
//! heterogeneous sources (descriptor readiness, timers, signals,
//! user-triggered events), and decoding the results back into typed
//! records without leaking resources or losing events between polls.
//!
//! - A **five-filter event model** (`Read`, `Write`, `Signal`, `Timer`,
//!   `User`) shared by registration and delivery
//! - **Kernel-native backends**: `kqueue` on macOS, `epoll` plus
//!   timerfd/signalfd/eventfd on Linux
//! - **Typed sockets** with endpoints, options, and blocking/timeout
//!   control, feeding the queue through plain file descriptors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vigilia::{Event, EventQueue};
//! use std::time::Duration;
//!
//! let queue = EventQueue::new()?;
//! let mut fired = Vec::with_capacity(16);
//!
//! // Arm a 250ms periodic timer and wait for it.
//! let n = queue.poll(&[Event::timer(1, 250)], &mut fired, None)?;
//! assert_eq!(fired[..n][0].ident, 1);
//!
//! queue.close()?;
//! ```
//!
//! ## Modules
//!
//! - [`event`] — The typed descriptor/record model
//! - [`net`] — Sockets and endpoints
//! - [`queue`] — The event queue itself
//! - [`time`] — Kernel time-representation conversions

mod error;
mod sys;

pub mod event;
pub mod net;
pub mod queue;
pub mod time;

pub use error::QueueError;
pub use event::{Event, EventFlags, Filter, FilterFlags};
pub use net::{Endpoint, Family, Kind, Socket};
pub use queue::EventQueue;
