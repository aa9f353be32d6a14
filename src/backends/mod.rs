//! Device backends for `toyhub`.
//!
//! Implementations of [`ToyDevice`](crate::device::ToyDevice) that live in this
//! crate. Real hardware comes from the host's transport library; the backends
//! here are in-process stand-ins.
//!
//! - [`virtual_toy`] records every primitive command instead of driving
//!   hardware. Useful for headless sessions, demos and tests.

pub mod virtual_toy;
