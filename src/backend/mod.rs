//! Controller backend port (spec §6 "Toward the controller backend (IPC)").
//!
//! Grounded on `domain/ports.rs`'s `EventStorePort`/`InventoryPort` shape:
//! a narrow async trait the core depends on without owning an
//! implementation. All device data crosses this boundary; the core never
//! talks to the datastore directly.

use crate::domain::ModuleSet;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend rejected get-config: {0}")]
    GetConfigFailed(String),
    #[error("backend rejected get: {0}")]
    GetFailed(String),
    #[error("backend could not open subscription '{0}': {1}")]
    SubscriptionFailed(String, String),
}

/// A configuration-fetch reply. `rpc_error`, when set, mirrors the
/// `rpc-error` child original_source checks for before trusting the body.
#[derive(Debug, Clone, Default)]
pub struct BackendReply {
    pub rpc_error: Option<String>,
    pub module_sets: Vec<ModuleSet>,
}

impl BackendReply {
    pub fn find_module_set(&self, name: &str) -> Option<&ModuleSet> {
        self.module_sets.iter().find(|ms| ms.name == name)
    }
}

/// Opaque handle to an open subscription socket (spec §6: the CLI opens
/// exactly one, named `controller-transaction`, on startup). A `Uuid`
/// rather than a counter, following `domain/ports.rs`'s `EventSubscription`
/// convention for opaque cross-process handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub uuid::Uuid);

impl SubscriptionHandle {
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }
}

impl std::fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Driven port onto the controller backend (out of scope per spec §1).
#[async_trait]
pub trait ControllerBackend: Send + Sync {
    /// `get-config` scoped to `xpath`.
    async fn get_config(&self, xpath: &str) -> Result<BackendReply, BackendError>;

    /// `get` scoped to `xpath` (used by the mount-point provider's fetch,
    /// spec §4.G).
    async fn get(&self, xpath: &str) -> Result<BackendReply, BackendError>;

    /// Open a named notification subscription.
    async fn create_subscription(&self, name: &str) -> Result<SubscriptionHandle, BackendError>;

    /// Open the one `controller-transaction` feed the CLI relies on at
    /// startup (spec §6).
    async fn open_transaction_feed(&self) -> Result<SubscriptionHandle, BackendError> {
        self.create_subscription("controller-transaction").await
    }

    /// Close a subscription's socket with an inline `close-session`,
    /// distinct from the general session-close path (spec §6).
    async fn close_transaction_feed(&self, handle: SubscriptionHandle) -> Result<(), BackendError>;
}
