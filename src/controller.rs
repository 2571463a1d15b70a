//! Top-level glue tying components A-G together (spec §2 data flow).
//!
//! Grounded on `service/mod.rs`'s `NetworkService`/`NetworkServiceBuilder`
//! pattern: one struct owning every cache, a builder for wiring in the
//! external collaborators, and thin pass-through methods that log at the
//! boundaries tracing-style.

use crate::backend::ControllerBackend;
use crate::config::CoreConfig;
use crate::device::{DeviceHandle, DeviceHandleStore};
use crate::domain::{DeviceName, TransportKind};
use crate::error::CoreError;
use crate::grammar::{
    EditContext, GrammarReferenceResolver, GrammarRuntime, GrammarSynthesizer, InMemoryGrammarRuntime,
    ResolvedReference,
};
use crate::mount::{MountOutcome, MountPointSchemaProvider};
use crate::spec::{IdentitySchemaParser, SchemaParser, SharedSchemaSpecInterner};
use crate::transport::DeviceTransport;
use std::rc::Rc;

/// Owns every per-process shared resource named in spec §5: the device
/// handle store, the schema-spec interner, the grammar runtime, and the
/// mount-point provider's reentrancy guard. All methods assume the
/// single-threaded event-loop model and take `&mut self`.
pub struct Controller {
    store: DeviceHandleStore,
    interner: SharedSchemaSpecInterner,
    runtime: Rc<dyn GrammarRuntime>,
    backend: Rc<dyn ControllerBackend>,
    transport: Rc<dyn DeviceTransport>,
    parser: Box<dyn SchemaParser>,
    mount_provider: MountPointSchemaProvider,
    config: CoreConfig,
}

impl Controller {
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    pub fn store(&self) -> &DeviceHandleStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DeviceHandleStore {
        &mut self.store
    }

    /// Create a device handle (spec §4.A Create). Fails on name collision.
    pub fn create_device(
        &mut self,
        name: impl Into<DeviceName>,
        domain: impl Into<String>,
    ) -> Result<&mut DeviceHandle, CoreError> {
        self.store.create(name, domain)
    }

    /// Get-or-create, for the passive creation path (spec §3 Lifecycles:
    /// "passively when the schema-mount provider is first asked about a
    /// device it does not yet know").
    pub fn ensure_device(&mut self, name: &DeviceName) -> &mut DeviceHandle {
        if self.store.find(name).is_none() {
            tracing::debug!(device = %name, "passively creating device handle from mount-point lookup");
            self.store
                .create(name.clone(), self.config.default_domain.clone())
                .expect("just checked absence");
        }
        self.store.find_mut(name).expect("just ensured presence")
    }

    pub async fn connect_device(&mut self, name: &DeviceName, kind: TransportKind) -> Result<(), CoreError> {
        let established = self
            .transport
            .connect(name, kind)
            .await
            .map_err(|e| CoreError::TransportFault {
                device: name.clone(),
                reason: e.to_string(),
            })?;
        let handle = self
            .store
            .find_mut(name)
            .ok_or_else(|| CoreError::ConsistencyFault(format!("device '{name}' vanished mid-connect")))?;
        handle.connect(established.kind, established.io, established.err_io, established.pid);
        Ok(())
    }

    /// Fetch one module's schema text (the `SchemaOne` state, spec §4.B)
    /// and fold it into the device's inventory, bounded by
    /// `schema_download_deadline`. A timeout or a malformed module fails
    /// only this module; the device remains reachable with an incomplete
    /// inventory (spec §4.B Failure semantics).
    pub async fn download_schema_module(&mut self, name: &DeviceName, xpath: &str) -> Result<(), CoreError> {
        let fetch = tokio::time::timeout(self.config.schema_download_deadline, self.backend.get(xpath));
        let reply = match fetch.await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                return Err(CoreError::TransportFault {
                    device: name.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_elapsed) => {
                tracing::warn!(device = %name, xpath, "schema module download timed out");
                return Err(CoreError::TransportFault {
                    device: name.clone(),
                    reason: "schema download deadline exceeded".to_string(),
                });
            }
        };
        let handle = self
            .store
            .find_mut(name)
            .ok_or_else(|| CoreError::ConsistencyFault(format!("unknown device '{name}'")))?;
        for module_set in reply.module_sets {
            let inventory = crate::domain::SchemaInventory::set(module_set)?;
            handle.append_inventory(inventory);
        }
        Ok(())
    }

    pub async fn disconnect_device(&mut self, name: &DeviceName) -> Result<(), CoreError> {
        self.transport
            .disconnect(name)
            .await
            .map_err(|e| CoreError::TransportFault {
                device: name.clone(),
                reason: e.to_string(),
            })?;
        if let Some(handle) = self.store.find_mut(name) {
            handle.disconnect();
        }
        Ok(())
    }

    /// Release a device's resources, including its interner claim (spec
    /// §4.A Remove, spec §4.D Release).
    pub fn remove_device(&mut self, name: &DeviceName) -> Option<DeviceHandle> {
        self.interner.release(name);
        self.store.remove(name)
    }

    pub fn clear(&mut self) {
        for name in self.store.names().cloned().collect::<Vec<_>>() {
            self.interner.release(&name);
        }
        self.store.clear();
    }

    /// Pull whatever module-sets the backend reports at `xpath` and fold
    /// them into the device's inventory via component C's append (spec
    /// §4.C: "the cache does not itself download; it is filled by the
    /// external ... layer"). Used for the `OpenSync` state's initial
    /// configuration pull.
    pub async fn sync_inventory(&mut self, name: &DeviceName, xpath: &str) -> Result<(), CoreError> {
        let fetch = tokio::time::timeout(self.config.config_pull_deadline, self.backend.get_config(xpath));
        let reply = match fetch.await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                return Err(CoreError::TransportFault {
                    device: name.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_elapsed) => {
                if let Some(handle) = self.store.find_mut(name) {
                    handle.fail("config pull deadline exceeded".to_string());
                }
                return Err(CoreError::TransportFault {
                    device: name.clone(),
                    reason: "config pull deadline exceeded".to_string(),
                });
            }
        };
        let handle = self
            .store
            .find_mut(name)
            .ok_or_else(|| CoreError::ConsistencyFault(format!("unknown device '{name}'")))?;
        for module_set in reply.module_sets {
            let inventory = crate::domain::SchemaInventory::set(module_set)?;
            handle.append_inventory(inventory);
        }
        handle.mark_synced();
        Ok(())
    }

    pub async fn ensure_grammar_for(&mut self, device: &DeviceName) -> Result<String, CoreError> {
        let synth = GrammarSynthesizer::new(self.runtime.as_ref());
        synth
            .ensure_grammar_for(&self.store, &mut self.interner, self.parser.as_ref(), device)
            .await
    }

    /// Eager `-g` pre-expansion (spec §6).
    pub async fn ensure_all_grammars(&mut self) -> Vec<(DeviceName, Result<String, CoreError>)> {
        let synth = GrammarSynthesizer::new(self.runtime.as_ref());
        synth
            .ensure_all(&self.store, &mut self.interner, self.parser.as_ref())
            .await
    }

    pub async fn resolve_reference(
        &mut self,
        name: &str,
        tokens: &[String],
        ctx: &EditContext,
    ) -> Result<ResolvedReference, CoreError> {
        let resolver = GrammarReferenceResolver::new(self.runtime.as_ref());
        resolver
            .resolve(name, tokens, ctx, &self.store, &mut self.interner, self.parser.as_ref())
            .await
    }

    pub async fn mount_point_schema(&self, xpath: &str) -> Result<MountOutcome, crate::error::MountError> {
        self.mount_provider.provide(xpath).await
    }

    pub fn eager_grammar_enabled(&self) -> bool {
        self.config.eager_grammar_expansion
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}

#[derive(Default)]
pub struct ControllerBuilder {
    runtime: Option<Rc<dyn GrammarRuntime>>,
    backend: Option<Rc<dyn ControllerBackend>>,
    transport: Option<Rc<dyn DeviceTransport>>,
    parser: Option<Box<dyn SchemaParser>>,
    config: CoreConfig,
}

impl ControllerBuilder {
    pub fn grammar_runtime(mut self, runtime: Rc<dyn GrammarRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn backend(mut self, backend: Rc<dyn ControllerBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn transport(mut self, transport: Rc<dyn DeviceTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn schema_parser(mut self, parser: Box<dyn SchemaParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Startup flag `-g` (spec §6): eager pre-expansion of every known
    /// device's grammar instead of building on first reference.
    pub fn eager_grammar(mut self, enabled: bool) -> Self {
        self.config.eager_grammar_expansion = enabled;
        self
    }

    pub fn config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Controller {
        let runtime = self
            .runtime
            .unwrap_or_else(|| Rc::new(InMemoryGrammarRuntime::new()));
        let backend = self
            .backend
            .unwrap_or_else(|| panic!("ControllerBuilder requires a backend before build()"));
        Controller {
            store: DeviceHandleStore::new(),
            interner: SharedSchemaSpecInterner::new(),
            runtime,
            mount_provider: MountPointSchemaProvider::new(backend.clone()),
            backend,
            transport: self
                .transport
                .unwrap_or_else(|| panic!("ControllerBuilder requires a transport before build()")),
            parser: self.parser.unwrap_or_else(|| Box::new(IdentitySchemaParser)),
            config: self.config,
        }
    }
}
