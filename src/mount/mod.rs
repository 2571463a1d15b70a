//! Mount-Point Schema Provider (component G, spec §4.G).
//!
//! Grounded on original_source's `controller_cli_yang_mount`: the
//! static-recursion-counter reentrancy guard bracketing the fetch, the
//! `/devices/device` rootedness check, the `rpc-error` fault check, and the
//! `mount` module-set lookup under the yang-library namespace. Per spec
//! §9's redesign flag ("global reentrancy counter → explicit context"),
//! the guard here is an explicit field on the provider rather than
//! process-wide module state, since the provider already owns the only
//! instance the event loop calls through.

use crate::backend::ControllerBackend;
use crate::domain::{ModuleSet, ValidityLevel, Writability};
use crate::error::MountError;
use std::cell::Cell;
use std::rc::Rc;

const MOUNT_MODULE_SET_NAME: &str = "mount";
const DEVICE_TREE_PREFIX: &str = "/devices/device";

/// Outcome of a mount-point lookup (spec §4.G).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    /// The reentrancy guard was already held; the outer call supplies the
    /// schema.
    Unknown,
    /// The node is not rooted under the device tree; not every subtree is
    /// a device mount.
    NoSchema,
    /// A module-set was found and is returned wrapped in a fresh
    /// yang-library element, with side-channel hints.
    Schema {
        module_set: ModuleSet,
        validity: ValidityLevel,
        writability: Writability,
    },
}

/// Reentrancy-guarded callback invoked by the generic XML layer. Owns its
/// backend via `Rc` (not a borrow) so that the backend itself may hold a
/// handle back to the provider, the shape the real XML fetcher needs to
/// re-enter a mount-point lookup mid-fetch.
pub struct MountPointSchemaProvider {
    backend: Rc<dyn ControllerBackend>,
    recursion: Cell<u32>,
}

impl MountPointSchemaProvider {
    pub fn new(backend: Rc<dyn ControllerBackend>) -> Self {
        Self {
            backend,
            recursion: Cell::new(0),
        }
    }

    /// Current recursion depth; used by tests to confirm the guard returns
    /// to its entry value on every return path (spec §8).
    pub fn recursion_depth(&self) -> u32 {
        self.recursion.get()
    }

    pub async fn provide(&self, xpath: &str) -> Result<MountOutcome, MountError> {
        let depth = self.recursion.get();
        self.recursion.set(depth + 1);
        let result = self.provide_inner(xpath, depth).await;
        self.recursion.set(depth);
        result
    }

    async fn provide_inner(&self, xpath: &str, entry_depth: u32) -> Result<MountOutcome, MountError> {
        if entry_depth > 0 {
            tracing::debug!(xpath, "mount-point provider reentered, returning unknown");
            return Ok(MountOutcome::Unknown);
        }

        // The mount-point node can arrive wrapped in a prefix that isn't
        // itself "/devices" (e.g. "/rpc-reply/data/devices/device[...]"),
        // so look for the device-tree substring anywhere in the path and
        // fetch from there onward, not just when it's a leading prefix.
        let Some(start) = xpath.find(DEVICE_TREE_PREFIX) else {
            return Ok(MountOutcome::NoSchema);
        };
        let xpath = &xpath[start..];

        let reply = self
            .backend
            .get(xpath)
            .await
            .map_err(|e| MountError::FetchFault(xpath.to_string(), e.to_string()))?;

        if let Some(fault) = reply.rpc_error {
            return Err(MountError::FetchFault(xpath.to_string(), fault));
        }

        match reply.find_module_set(MOUNT_MODULE_SET_NAME) {
            None => Ok(MountOutcome::NoSchema),
            Some(module_set) => Ok(MountOutcome::Schema {
                module_set: module_set.clone(),
                validity: ValidityLevel::Full,
                writability: Writability::Configurable,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, BackendReply, ControllerBackend, SubscriptionHandle};
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::rc::Weak;

    struct StubBackend {
        reply: BackendReply,
        /// Set once the provider exists, so `get` can call back into it —
        /// this is what lets the second test below exercise a genuine
        /// nested call rather than two sequential ones.
        reenter_via: RefCell<Option<Weak<MountPointSchemaProvider>>>,
    }

    #[async_trait]
    impl ControllerBackend for StubBackend {
        async fn get_config(&self, _xpath: &str) -> Result<BackendReply, BackendError> {
            unimplemented!()
        }

        async fn get(&self, xpath: &str) -> Result<BackendReply, BackendError> {
            if let Some(provider) = self
                .reenter_via
                .borrow()
                .as_ref()
                .and_then(Weak::upgrade)
            {
                let inner = provider.provide(xpath).await;
                assert_eq!(inner.unwrap(), MountOutcome::Unknown);
            }
            Ok(self.reply.clone())
        }

        async fn create_subscription(&self, _name: &str) -> Result<SubscriptionHandle, BackendError> {
            unimplemented!()
        }

        async fn close_transaction_feed(&self, _handle: SubscriptionHandle) -> Result<(), BackendError> {
            unimplemented!()
        }
    }

    fn provider_with(reply: BackendReply) -> Rc<MountPointSchemaProvider> {
        let backend = Rc::new(StubBackend {
            reply,
            reenter_via: RefCell::new(None),
        });
        Rc::new(MountPointSchemaProvider::new(backend))
    }

    #[tokio::test]
    async fn rpc_reply_paths_return_no_schema_without_fetching() {
        let provider = provider_with(BackendReply::default());
        let outcome = provider.provide("/rpc-reply/data/devices").await.unwrap();
        assert_eq!(outcome, MountOutcome::NoSchema);
    }

    #[tokio::test]
    async fn device_mount_wrapped_in_an_outer_prefix_still_resolves() {
        let mut ms = ModuleSet::new(MOUNT_MODULE_SET_NAME);
        ms.insert(crate::domain::Module {
            name: "a".into(),
            revision: "2024-01-01".into(),
            namespace: "urn:a".into(),
            submodules: Vec::new(),
        });
        let provider = provider_with(BackendReply {
            rpc_error: None,
            module_sets: vec![ms],
        });
        // xm can be rooted somewhere other than "/devices", e.g. under
        // "/rpc-reply" — the device mount-point substring further in the
        // path must still be found and resolved.
        let outcome = provider
            .provide("/rpc-reply/data/devices/device[name='d1']/root")
            .await
            .unwrap();
        assert!(matches!(outcome, MountOutcome::Schema { .. }));
    }

    #[tokio::test]
    async fn absent_mount_module_set_yields_no_schema() {
        let provider = provider_with(BackendReply::default());
        let outcome = provider
            .provide("/devices/device[name='d1']/root")
            .await
            .unwrap();
        assert_eq!(outcome, MountOutcome::NoSchema);
    }

    #[tokio::test]
    async fn present_mount_module_set_yields_schema() {
        let mut ms = ModuleSet::new(MOUNT_MODULE_SET_NAME);
        ms.insert(crate::domain::Module {
            name: "a".into(),
            revision: "2024-01-01".into(),
            namespace: "urn:a".into(),
            submodules: Vec::new(),
        });
        let provider = provider_with(BackendReply {
            rpc_error: None,
            module_sets: vec![ms],
        });
        let outcome = provider
            .provide("/devices/device[name='d1']/root")
            .await
            .unwrap();
        assert!(matches!(outcome, MountOutcome::Schema { .. }));
    }

    #[tokio::test]
    async fn reentrant_call_returns_unknown_and_guard_resets() {
        let backend = Rc::new(StubBackend {
            reply: BackendReply::default(),
            reenter_via: RefCell::new(None),
        });
        let provider = Rc::new(MountPointSchemaProvider::new(backend.clone() as Rc<dyn ControllerBackend>));
        *backend.reenter_via.borrow_mut() = Some(Rc::downgrade(&provider));

        let depth_before = provider.recursion_depth();
        let outcome = provider
            .provide("/devices/device[name='d1']/outer")
            .await
            .unwrap();
        assert_eq!(outcome, MountOutcome::NoSchema);
        assert_eq!(provider.recursion_depth(), depth_before);
    }
}
