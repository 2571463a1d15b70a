//! Device transport port (out of scope per spec §1: "the transport code
//! that actually speaks the wire protocol to devices"). Grounded on
//! `domain/ports.rs`'s `DeviceControlPort` shape, narrowed to what the
//! device state machine needs to drive a connection and frame messages.

use crate::device::IoDescriptor;
use crate::domain::{DeviceName, TransportKind};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport for device '{0}' could not be established: {1}")]
    ConnectFailed(DeviceName, String),
    #[error("transport for device '{0}' faulted: {1}")]
    Fault(DeviceName, String),
}

/// The descriptors and process identity a successfully established
/// transport hands back to the device state machine (spec §3: I/O
/// descriptor, optional error-channel descriptor, optional pid).
#[derive(Debug, Clone)]
pub struct EstablishedTransport {
    pub kind: TransportKind,
    pub io: IoDescriptor,
    pub err_io: Option<IoDescriptor>,
    pub pid: Option<u32>,
}

/// Driven port onto the wire-protocol transport (out of scope per spec
/// §1). NETCONF 1.0/1.1 framing detection itself lives on the handle
/// (`domain::framing`); this trait only establishes and tears down the
/// underlying channel.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn connect(
        &self,
        device: &DeviceName,
        kind: TransportKind,
    ) -> Result<EstablishedTransport, TransportError>;

    async fn disconnect(&self, device: &DeviceName) -> Result<(), TransportError>;
}
