//! Core type definitions using newtype patterns for type safety.

mod port;
mod target;

pub use port::{Port, PortError, PortSpec, COMMON_PORTS};
pub use target::{AddressFamily, Target};
