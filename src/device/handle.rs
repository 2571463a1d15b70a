//! Device Handle + its state machine (component B, spec §3-4.B).
//!
//! Grounded on original_source's `struct controller_device_handle` and its
//! accessor functions (`device_handle_conn_state_set`,
//! `device_handle_msg_id_getinc`, `device_handle_outmsg_set`, ...), restated
//! with static typing in place of the source's magic-number sanity check
//! (spec §9, "Magic-number handle validation → static typing").

use crate::domain::{
    DetectorState, FramingState, SchemaInventory, TransactionId, TransportKind, YangConfigMode,
};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// Connection states (spec §4.B table). Ordered top-to-bottom by their
/// position in the linear progression; `Wresp` is an orthogonal overlay
/// bit on top of `Open`, not a distinct rung of the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Serialize, Deserialize)]
pub enum ConnState {
    Closed,
    Connecting,
    SchemaList,
    SchemaOne,
    OpenSync,
    Open,
    Wresp,
    Closing,
}

impl ConnState {
    fn rung(self) -> Option<u8> {
        match self {
            ConnState::Closed => None,
            ConnState::Connecting => Some(0),
            ConnState::SchemaList => Some(1),
            ConnState::SchemaOne => Some(2),
            ConnState::OpenSync => Some(3),
            ConnState::Open => Some(4),
            ConnState::Wresp => Some(4),
            ConnState::Closing => Some(5),
        }
    }

    /// Is `self -> target` a transition the state machine allows?
    ///
    /// `Closed` is reachable from anywhere (failure or explicit
    /// disconnect). Otherwise movement is linear one rung at a time up the
    /// ladder, with `Open <-> Wresp` as a same-rung overlay toggle in
    /// either direction.
    pub fn can_transition_to(self, target: ConnState) -> bool {
        if target == ConnState::Closed {
            return true;
        }
        match (self, target) {
            (ConnState::Open, ConnState::Wresp) | (ConnState::Wresp, ConnState::Open) => true,
            _ => match (self.rung(), target.rung()) {
                (Some(a), Some(b)) => b == a + 1,
                (None, Some(0)) => true, // Closed -> Connecting
                _ => false,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConnState::Closed => "closed",
            ConnState::Connecting => "connecting",
            ConnState::SchemaList => "schema-list",
            ConnState::SchemaOne => "schema-one",
            ConnState::OpenSync => "open-sync",
            ConnState::Open => "open",
            ConnState::Wresp => "wresp",
            ConnState::Closing => "closing",
        }
    }
}

/// One of the two pending-outbound-message slots (spec §4.B).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub message_id: u64,
    pub payload: String,
}

/// Opaque I/O descriptor recorded by the transport layer; the core never
/// interprets it, only stores and clears it (spec §9, borrowed-accessor
/// note — here made an owned `Copy` value instead of a raw pointer).
pub type IoDescriptor = i64;

/// A single device's connection record (spec §3 DeviceHandle).
///
/// Owned exclusively by the `DeviceHandleStore`; no handle outlives the
/// store that created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceHandle {
    name: crate::domain::DeviceName,
    state: ConnState,
    state_entered_at: DateTime<Utc>,
    last_sync: Option<DateTime<Utc>>,
    transport_kind: Option<TransportKind>,
    io: Option<IoDescriptor>,
    err_io: Option<IoDescriptor>,
    pid: Option<u32>,
    msg_id: u64,
    transaction_id: TransactionId,
    #[serde(skip)]
    framing: FramingState,
    out1: Option<OutboundMessage>,
    out2: Option<OutboundMessage>,
    failure_reason: Option<String>,
    domain: String,
    yang_config: YangConfigMode,
    inventory: Option<SchemaInventory>,
}

impl DeviceHandle {
    /// A new handle begins `Closed` with zero message-id and transaction-id
    /// (spec §4.A Create, scenario 1).
    pub fn new(name: impl Into<crate::domain::DeviceName>, domain: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            state: ConnState::Closed,
            state_entered_at: now,
            last_sync: None,
            transport_kind: None,
            io: None,
            err_io: None,
            pid: None,
            msg_id: 0,
            transaction_id: TransactionId::UNASSIGNED,
            framing: FramingState::new(),
            out1: None,
            out2: None,
            failure_reason: None,
            domain: domain.into(),
            yang_config: YangConfigMode::default(),
            inventory: None,
        }
    }

    pub fn name(&self) -> &crate::domain::DeviceName {
        &self.name
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn state_entered_at(&self) -> DateTime<Utc> {
        self.state_entered_at
    }

    /// Transition to a new state, validating the ladder in
    /// `ConnState::can_transition_to`, bumping the state-entry timestamp,
    /// and clearing the failure reason on leaving `Closed`
    /// (`device_handle_conn_state_set`).
    pub fn transition_to(&mut self, target: ConnState) -> Result<(), CoreError> {
        if !self.state.can_transition_to(target) {
            return Err(CoreError::ConsistencyFault(format!(
                "device '{}': illegal transition {} -> {}",
                self.name,
                self.state.name(),
                target.name()
            )));
        }
        tracing::debug!(
            device = %self.name,
            from = self.state.name(),
            to = target.name(),
            "device state transition"
        );
        if self.state == ConnState::Closed {
            self.failure_reason = None;
        }
        self.state = target;
        self.state_entered_at = Utc::now();
        Ok(())
    }

    /// Force the device `Closed` with a failure reason, regardless of
    /// current state (spec §4.B Failure semantics). Always legal.
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(device = %self.name, reason = %reason, "device transport/protocol fault");
        self.state = ConnState::Closed;
        self.state_entered_at = Utc::now();
        self.failure_reason = Some(reason);
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the current message-id and post-increments it
    /// (`device_handle_msg_id_getinc`).
    pub fn next_message_id(&mut self) -> u64 {
        let id = self.msg_id;
        self.msg_id += 1;
        id
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// Set only by the (external) transaction coordinator.
    pub fn set_transaction_id(&mut self, tid: TransactionId) {
        self.transaction_id = tid;
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    pub fn mark_synced(&mut self) {
        self.last_sync = Some(Utc::now());
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.domain = domain.into();
    }

    pub fn yang_config(&self) -> YangConfigMode {
        self.yang_config
    }

    pub fn set_yang_config(&mut self, mode: YangConfigMode) {
        self.yang_config = mode;
    }

    pub fn framing(&self) -> &FramingState {
        &self.framing
    }

    pub fn framing_mut(&mut self) -> &mut FramingState {
        &mut self.framing
    }

    pub fn transport_kind(&self) -> Option<TransportKind> {
        self.transport_kind
    }

    pub fn inventory(&self) -> Option<&SchemaInventory> {
        self.inventory.as_ref()
    }

    /// Replace the inventory outright (`Set`, spec §4.C).
    pub fn set_inventory(&mut self, inventory: SchemaInventory) {
        self.inventory = Some(inventory);
    }

    /// Merge-append into the existing inventory, or adopt `inventory` as
    /// the first one if none exists yet (`Append`, spec §4.C).
    pub fn append_inventory(&mut self, inventory: SchemaInventory) {
        match &mut self.inventory {
            Some(existing) => existing.append(inventory),
            None => self.inventory = Some(inventory),
        }
    }

    /// Record transport-layer connection state
    /// (`device_handle_connect`/`_disconnect`, supplemented from
    /// original_source). Does not itself change `ConnState` — callers
    /// drive that explicitly via `transition_to`.
    pub fn connect(
        &mut self,
        kind: TransportKind,
        io: IoDescriptor,
        err_io: Option<IoDescriptor>,
        pid: Option<u32>,
    ) {
        self.transport_kind = Some(kind);
        self.io = Some(io);
        self.err_io = err_io;
        self.pid = pid;
    }

    /// Tear down transport-layer bookkeeping. IPC sockets have no error
    /// channel or child process; NETCONF/SSH subprocess transports clear
    /// both.
    pub fn disconnect(&mut self) {
        self.io = None;
        self.err_io = None;
        self.pid = None;
    }

    pub fn io_descriptor(&self) -> Option<IoDescriptor> {
        self.io
    }

    pub fn err_io_descriptor(&self) -> Option<IoDescriptor> {
        self.err_io
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Get a pending outbound slot (1 or 2); `None` for an invalid slot
    /// number (`device_handle_outmsg_get`).
    pub fn outbound(&self, slot: u8) -> Option<&OutboundMessage> {
        match slot {
            1 => self.out1.as_ref(),
            2 => self.out2.as_ref(),
            _ => None,
        }
    }

    /// Set a pending outbound slot, replacing any prior content
    /// (`device_handle_outmsg_set`). Slot must be 1 or 2 — the two-slot
    /// scheme is deliberately bounded (spec §4.B).
    pub fn set_outbound(&mut self, slot: u8, message: OutboundMessage) -> Result<(), CoreError> {
        match slot {
            1 => self.out1 = Some(message),
            2 => self.out2 = Some(message),
            _ => {
                return Err(CoreError::ConsistencyFault(format!(
                    "outbound slot must be 1 or 2, got {slot}"
                )))
            }
        }
        Ok(())
    }

    pub fn take_outbound(&mut self, slot: u8) -> Option<OutboundMessage> {
        match slot {
            1 => self.out1.take(),
            2 => self.out2.take(),
            _ => None,
        }
    }
}
