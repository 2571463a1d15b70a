//! Error kinds the core distinguishes (spec §7).
//!
//! Per-device faults are contained within the device and reported through
//! `DeviceHandle::failure_reason`; only process-global faults propagate as
//! a `CoreError` out of the controller's own operations.

use crate::domain::value_objects::DeviceName;
use thiserror::Error;

/// Transport, protocol, schema, grammar, and consistency faults.
///
/// `ConsistencyFault` is reserved for invariant violations (name
/// collisions, a handle that escaped the store) and is never swallowed —
/// see spec §7, "Propagation policy".
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("transport fault for device {device}: {reason}")]
    TransportFault { device: DeviceName, reason: String },

    #[error("protocol fault for device {device}: {reason}")]
    ProtocolFault { device: DeviceName, reason: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Mount(#[from] MountError),

    #[error("consistency fault: {0}")]
    ConsistencyFault(String),
}

/// Schema inventory and interner failures (component C/D).
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema inventory is malformed: top level is not module-set")]
    NotModuleSet,

    #[error("module '{0}' failed to parse: {1}")]
    ModuleParseFailed(String, String),

    #[error("device '{0}' has no inventory to compile")]
    NoInventory(DeviceName),
}

/// Grammar synthesis and resolution failures (component E/F).
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("no compiled schema spec available for device '{0}'")]
    NoSpecCompiled(DeviceName),

    #[error("grammar runtime rejected installation of '{0}': {1}")]
    InstallFailed(String, String),
}

/// Mount-point schema provider failures (component G).
#[derive(Error, Debug)]
pub enum MountError {
    #[error("fetch for mount-point '{0}' faulted: {1}")]
    FetchFault(String, String),
}
