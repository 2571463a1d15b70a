//! Shared Schema-Spec Interner (component D, spec §4.D).
//!
//! Grounded on `device_handle_yang_lib_get/_set`'s per-device inventory
//! storage together with the sharing rule spec §3 and §9 mandate: two
//! devices whose inventories are tree-equal must end up pointing at the
//! *same* `CompiledSchemaSpec` object, never merely equal copies.

use super::{CompiledSchemaSpec, SchemaParser};
use crate::device::DeviceHandleStore;
use crate::domain::{DeviceName, SchemaInventory};
use crate::error::SchemaError;
use std::collections::HashMap;

/// Maps device names to the `CompiledSchemaSpec` they currently hold, and
/// accelerates the tree-equal search with a content-hash index (spec §4.D:
/// "free to index inventories by a content hash... provided the design
/// falls back on collision to tree-equal").
#[derive(Debug, Default)]
pub struct SharedSchemaSpecInterner {
    specs: HashMap<DeviceName, CompiledSchemaSpec>,
    by_hash: HashMap<u64, Vec<DeviceName>>,
}

impl SharedSchemaSpecInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve (compiling and interning if necessary) the spec for
    /// `device`, whose inventory must already be recorded in `store`.
    ///
    /// Algorithm (spec §4.D Lookup):
    /// 1. If `device` already holds a spec, return it.
    /// 2. Else scan every other device with a spec whose inventory is
    ///    tree-equal to `device`'s; if found, share that object.
    /// 3. Else compile a fresh spec and intern it.
    pub fn lookup(
        &mut self,
        store: &DeviceHandleStore,
        device: &DeviceName,
        parser: &dyn SchemaParser,
    ) -> Result<CompiledSchemaSpec, SchemaError> {
        if let Some(existing) = self.specs.get(device) {
            return Ok(existing.clone());
        }

        let handle = store
            .find(device)
            .ok_or_else(|| SchemaError::NoInventory(device.clone()))?;
        let inventory = handle
            .inventory()
            .ok_or_else(|| SchemaError::NoInventory(device.clone()))?
            .clone();

        let hash = content_hash(&inventory);
        if let Some(candidates) = self.by_hash.get(&hash) {
            for candidate in candidates {
                if candidate == device {
                    continue;
                }
                if let Some(spec) = self.specs.get(candidate) {
                    if spec.source().tree_equal(&inventory) {
                        let spec = spec.clone();
                        tracing::debug!(
                            device = %device,
                            shares_with = %candidate,
                            "sharing compiled schema spec"
                        );
                        self.insert(device.clone(), hash, spec.clone());
                        return Ok(spec);
                    }
                }
            }
        }

        tracing::debug!(device = %device, "compiling fresh schema spec");
        let spec = CompiledSchemaSpec::compile(inventory, parser)?;
        self.insert(device.clone(), hash, spec.clone());
        Ok(spec)
    }

    fn insert(&mut self, device: DeviceName, hash: u64, spec: CompiledSchemaSpec) {
        self.specs.insert(device.clone(), spec);
        self.by_hash.entry(hash).or_default().push(device);
    }

    /// Drop `device`'s claim on its spec (spec §4.D Release, called on
    /// device removal). The underlying `CompiledSchemaSpec` survives as
    /// long as any other sharer's `Rc` remains.
    pub fn release(&mut self, device: &DeviceName) {
        if self.specs.remove(device).is_some() {
            for names in self.by_hash.values_mut() {
                names.retain(|n| n != device);
            }
        }
    }

    /// Number of interner entries currently pointing at the same spec as
    /// `device` (itself included). Used by the refcount invariant in spec
    /// §8; distinct from `CompiledSchemaSpec::refcount`, which also counts
    /// any `Rc` clones callers hold outside the interner.
    pub fn sharers_of(&self, device: &DeviceName) -> usize {
        match self.specs.get(device) {
            Some(spec) => self
                .specs
                .values()
                .filter(|other| other.is_same(spec))
                .count(),
            None => 0,
        }
    }

    pub fn spec_for(&self, device: &DeviceName) -> Option<&CompiledSchemaSpec> {
        self.specs.get(device)
    }
}

fn content_hash(inventory: &SchemaInventory) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    inventory.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::IdentitySchemaParser;
    use crate::domain::{Module, ModuleSet};

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

    #[test]
    fn two_devices_with_identical_inventories_share_one_spec() {
        let mut store = DeviceHandleStore::new();
        seed(&mut store, "d1", &["a", "b"]);
        seed(&mut store, "d2", &["a", "b"]);

        let mut interner = SharedSchemaSpecInterner::new();
        let d1 = DeviceName::from("d1");
        let d2 = DeviceName::from("d2");
        let s1 = interner.lookup(&store, &d1, &IdentitySchemaParser).unwrap();
        let s2 = interner.lookup(&store, &d2, &IdentitySchemaParser).unwrap();

        assert!(s1.is_same(&s2));
        assert_eq!(interner.sharers_of(&d1), 2);
        // Rc sharers: interner's d1 entry, interner's d2 entry, plus s1 and s2 locals.
        assert_eq!(s1.refcount(), 4);
    }

    #[test]
    fn diverging_inventories_compile_separate_specs() {
        let mut store = DeviceHandleStore::new();
        seed(&mut store, "d1", &["a"]);
        seed(&mut store, "d2", &["a", "b"]);

        let mut interner = SharedSchemaSpecInterner::new();
        let d1 = DeviceName::from("d1");
        let d2 = DeviceName::from("d2");
        let s1 = interner.lookup(&store, &d1, &IdentitySchemaParser).unwrap();
        let s2 = interner.lookup(&store, &d2, &IdentitySchemaParser).unwrap();

        assert!(!s1.is_same(&s2));
    }

    #[test]
    fn release_drops_sharer_without_breaking_the_remaining_one() {
        let mut store = DeviceHandleStore::new();
        seed(&mut store, "d1", &["a"]);
        seed(&mut store, "d2", &["a"]);

        let mut interner = SharedSchemaSpecInterner::new();
        let d1 = DeviceName::from("d1");
        let d2 = DeviceName::from("d2");
        interner.lookup(&store, &d1, &IdentitySchemaParser).unwrap();
        let s2 = interner.lookup(&store, &d2, &IdentitySchemaParser).unwrap();

        interner.release(&d1);
        assert_eq!(interner.sharers_of(&d2), 1);
        assert_eq!(s2.module_count(), 1);
    }
}
