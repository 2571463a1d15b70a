//! Grammar Synthesizer (component E, spec §4.E).
//!
//! Grounded on `service/mod.rs`'s `discover_and_provision` pipeline shape
//! (fetch a dependency, then drive a state change) and on
//! `controller_cligen_gentree_all`'s eager `-g` expansion path from
//! original_source, generalized here to `ensure_all`.

use crate::device::DeviceHandleStore;
use crate::domain::DeviceName;
use crate::error::{CoreError, GrammarError};
use crate::grammar::runtime::{GrammarNode, GrammarRuntime, GrammarSubtree};
use crate::spec::{CompiledSchemaSpec, SchemaParser, SharedSchemaSpecInterner};

/// Grammar subtree name convention for a device (spec §3).
pub fn subtree_name(device: &DeviceName) -> String {
    format!("mountpoint-{device}")
}

pub struct GrammarSynthesizer<'a> {
    runtime: &'a dyn GrammarRuntime,
}

impl<'a> GrammarSynthesizer<'a> {
    pub fn new(runtime: &'a dyn GrammarRuntime) -> Self {
        Self { runtime }
    }

    /// Idempotent: if `mountpoint-<device>` already exists, return its name
    /// without touching the interner (spec §4.E).
    pub async fn ensure_grammar_for(
        &self,
        store: &DeviceHandleStore,
        interner: &mut SharedSchemaSpecInterner,
        parser: &dyn SchemaParser,
        device: &DeviceName,
    ) -> Result<String, CoreError> {
        let name = subtree_name(device);
        if self.runtime.has_subtree(&name).await {
            return Ok(name);
        }

        let spec = interner
            .lookup(store, device, parser)
            .map_err(CoreError::Schema)?;

        let subtree = compile_subtree(&name, &spec);
        self.runtime
            .install_subtree(subtree)
            .await
            .map_err(|e| {
                CoreError::Grammar(GrammarError::InstallFailed(name.clone(), e.to_string()))
            })?;

        tracing::debug!(device = %device, grammar = %name, "installed grammar subtree");
        Ok(name)
    }

    /// Eager pre-expansion for every device currently known to the store
    /// (the `-g` flag of spec §6). Per-device failures are logged and
    /// skipped rather than aborting the whole sweep — spec §7's
    /// containment policy for GrammarFault.
    pub async fn ensure_all(
        &self,
        store: &DeviceHandleStore,
        interner: &mut SharedSchemaSpecInterner,
        parser: &dyn SchemaParser,
    ) -> Vec<(DeviceName, Result<String, CoreError>)> {
        let names: Vec<DeviceName> = store.names().cloned().collect();
        let mut results = Vec::with_capacity(names.len());
        for device in names {
            let outcome = self
                .ensure_grammar_for(store, interner, parser, &device)
                .await;
            if let Err(err) = &outcome {
                tracing::warn!(device = %device, error = %err, "eager grammar synthesis failed");
            }
            results.push((device, outcome));
        }
        results
    }
}

fn compile_subtree(name: &str, spec: &CompiledSchemaSpec) -> GrammarSubtree {
    let source = spec.source();
    let top_level = source
        .module_set()
        .modules()
        .map(|module| GrammarNode {
            token: module.name.clone(),
            children: Vec::new(),
        })
        .collect();
    GrammarSubtree {
        name: name.to_string(),
        top_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Module, ModuleSet, SchemaInventory};
    use crate::grammar::runtime::InMemoryGrammarRuntime;
    use crate::spec::IdentitySchemaParser;

    fn module(name: &str) -> Module {
        Module {
            name: name.to_string(),
            revision: "2024-01-01".into(),
            namespace: format!("urn:{name}"),
            submodules: Vec::new(),
        }
    }

    fn seed(store: &mut DeviceHandleStore, name: &str, mods: &[&str]) {
        let handle = store.create(name, "default").unwrap();
        let mut ms = ModuleSet::new("ms");
        for m in mods {
            ms.insert(module(m));
        }
        handle.set_inventory(SchemaInventory::set(ms).unwrap());
    }

    #[tokio::test]
    async fn identical_inventories_share_one_spec_and_produce_equal_grammars() {
        let mut store = DeviceHandleStore::new();
        seed(&mut store, "d1", &["a", "b"]);
        seed(&mut store, "d2", &["a", "b"]);

        let runtime = InMemoryGrammarRuntime::new();
        let synth = GrammarSynthesizer::new(&runtime);
        let mut interner = SharedSchemaSpecInterner::new();

        let n1 = synth
            .ensure_grammar_for(&store, &mut interner, &IdentitySchemaParser, &DeviceName::from("d1"))
            .await
            .unwrap();
        let n2 = synth
            .ensure_grammar_for(&store, &mut interner, &IdentitySchemaParser, &DeviceName::from("d2"))
            .await
            .unwrap();

        assert_eq!(n1, "mountpoint-d1");
        assert_eq!(n2, "mountpoint-d2");

        let g1 = runtime.get_subtree(&n1).await.unwrap();
        let g2 = runtime.get_subtree(&n2).await.unwrap();
        assert!(g1.top_level_equal(&g2));
        assert_eq!(interner.sharers_of(&DeviceName::from("d1")), 2);
    }

    #[tokio::test]
    async fn ensure_grammar_for_is_idempotent() {
        let mut store = DeviceHandleStore::new();
        seed(&mut store, "d1", &["a"]);
        let runtime = InMemoryGrammarRuntime::new();
        let synth = GrammarSynthesizer::new(&runtime);
        let mut interner = SharedSchemaSpecInterner::new();
        let device = DeviceName::from("d1");

        synth
            .ensure_grammar_for(&store, &mut interner, &IdentitySchemaParser, &device)
            .await
            .unwrap();
        let before = interner.sharers_of(&device);
        synth
            .ensure_grammar_for(&store, &mut interner, &IdentitySchemaParser, &device)
            .await
            .unwrap();
        assert_eq!(interner.sharers_of(&device), before);
    }
}
