//! Data model shared by the device registry and schema layers (spec §3).

pub mod framing;
pub mod schema;
pub mod value_objects;

pub use framing::{DetectorState, FramingState};
pub use schema::{CapabilitySet, Module, ModuleSet, SchemaInventory, Submodule};
pub use value_objects::{
    DeviceName, FramingDiscipline, TransactionId, TransportKind, ValidityLevel, Writability,
    YangConfigMode,
};
