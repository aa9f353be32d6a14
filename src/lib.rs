//! toyhub: shared haptic toys for multi-user sessions.
//!
//! A [`Toy`] is driven either by a device attached to this process or by a
//! peer that owns the device. Local toys send primitive commands to hardware;
//! remote toys turn the same calls into [`SyncMessage`]s for the owning peer.
//! [`ToyRegistry`] keeps the two tables and routes inbound peer messages.
//!
//! ```no_run
//! use std::sync::Arc;
//! use toyhub::backends::virtual_toy::VirtualToy;
//! use toyhub::ToyRegistry;
//!
//! let (peers, _outbox) = crossbeam::channel::unbounded::<toyhub::SyncMessage>();
//! let mut registry = ToyRegistry::new();
//! registry.connect(Arc::new(VirtualToy::new(0, "Lovense Hush").with_vibrators(&[20])));
//!
//! if let Some(toy) = registry.local_mut(0) {
//!     toy.change_role(&peers);
//!     toy.set_speed(10, &peers);
//! }
//! ```

pub mod backends;
pub mod capabilities;
pub mod config;
pub mod device;
pub mod error;
pub mod logger;
pub mod message;
pub mod registry;
pub mod role;
pub mod snapshot;
pub mod toy;

pub use capabilities::*;
pub use config::*;
pub use device::*;
pub use error::*;
pub use logger::*;
pub use message::*;
pub use registry::*;
pub use role::*;
pub use snapshot::*;
pub use toy::*;
