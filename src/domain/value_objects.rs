//! Small value types shared across the device registry and schema layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable device name, immutable once a handle is created (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceName(String);

impl DeviceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DeviceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Transaction identifier; `0` means "not bound to a transaction" (spec §3, §4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub const UNASSIGNED: TransactionId = TransactionId(0);

    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

/// Transport kind a device handle is connected through (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportKind {
    InternalIPC,
    ExternalNetconf,
    SSHSubprocess,
}

/// How device configuration is bound to YANG (supplemented from
/// original_source's `cdh_yang_config` mirror-of-config field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YangConfigMode {
    #[default]
    None,
    Bind,
    Validate,
}

/// Framing discipline negotiated at capability exchange (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FramingDiscipline {
    /// NETCONF 1.0 `]]>]]>` end-of-message marker.
    EndOfMessage,
    /// NETCONF 1.1 chunked framing.
    ChunkedFramed,
}

/// Validity-level hint returned alongside a mounted subtree's schema
/// (spec §4.G side-channel outputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidityLevel {
    Full,
    Skip,
}

/// Writability hint for a mounted subtree (spec §4.G side-channel outputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Writability {
    Configurable,
    ReadOnly,
}
