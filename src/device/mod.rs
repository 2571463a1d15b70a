//! Device handle registry and lifecycle (components A and B, spec §4.A-B).

pub mod handle;
pub mod store;

pub use handle::{ConnState, DeviceHandle, IoDescriptor, OutboundMessage};
pub use store::DeviceHandleStore;
