//! Schema Inventory Cache (component C).
//!
//! Shape mirrors RFC 8525 yang-library: one `module-set` containing
//! unordered modules keyed by name. Grounded on original_source's
//! `device_handle_yang_lib_set`/`_append` and the capability-lookup rule in
//! `device_handle_capabilities_find`.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single YANG module entry within a module-set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub revision: String,
    pub namespace: String,
    pub submodules: Vec<Submodule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Submodule {
    pub name: String,
    pub revision: String,
}

/// The RFC-8525 module-set: an unordered bag of modules keyed by name.
///
/// Stored as a `BTreeMap` so that structural (tree) equality is a plain
/// `PartialEq` derive rather than an order-sensitive comparison — the spec
/// requires unordered-module semantics for every tree-equal check in
/// components C and D.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleSet {
    pub name: String,
    modules: BTreeMap<String, Module>,
}

impl ModuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: BTreeMap::new(),
        }
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn insert(&mut self, module: Module) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// A device's schema inventory: exactly one module-set at the top level
/// (spec §3 invariant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaInventory {
    module_set: ModuleSet,
}

impl SchemaInventory {
    /// Validate and wrap a module-set as a fresh inventory (the `Set`
    /// operation in spec §4.C).
    pub fn set(module_set: ModuleSet) -> Result<Self, SchemaError> {
        Ok(Self { module_set })
    }

    /// Merge `other` into `self` following the append semantics in spec
    /// §4.C: new modules are inserted, tree-equal modules are left alone,
    /// and modules that share a name but differ are replaced wholesale.
    ///
    /// Consumes `other`, matching original_source's "argument is consumed"
    /// note on `device_handle_yang_lib_append`.
    pub fn append(&mut self, other: SchemaInventory) {
        for module in other.module_set.modules.into_values() {
            match self.module_set.modules.get(&module.name) {
                Some(existing) if existing == &module => {}
                _ => {
                    self.module_set.modules.insert(module.name.clone(), module);
                }
            }
        }
    }

    pub fn module_set(&self) -> &ModuleSet {
        &self.module_set
    }

    /// Tree-equal predicate shared by §4.C append and §4.D interning.
    pub fn tree_equal(&self, other: &SchemaInventory) -> bool {
        self.module_set == other.module_set
    }
}

/// Unordered capability URI set with `?`-prefix-insensitive lookup
/// (spec §3, §4.C `CapabilityContains`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    uris: Vec<String>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>) {
        self.uris.push(uri.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.uris.iter().map(String::as_str)
    }

    /// True if some capability in the set matches `name`, comparing only
    /// the prefix before `?` when a capability carries parameters —
    /// mirrors `device_handle_capabilities_find`'s `index(b, '?')` split.
    pub fn contains(&self, name: &str) -> bool {
        self.uris.iter().any(|uri| match uri.find('?') {
            Some(idx) => &uri[..idx] == name,
            None => uri == name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, rev: &str, ns: &str) -> Module {
        Module {
            name: name.to_string(),
            revision: rev.to_string(),
            namespace: ns.to_string(),
            submodules: Vec::new(),
        }
    }

    #[test]
    fn capability_lookup_ignores_query_suffix() {
        let mut caps = CapabilitySet::new();
        caps.insert("urn:x:y?p=1");
        assert!(caps.contains("urn:x:y"));
        assert!(!caps.contains("urn:x:z"));
    }

    #[test]
    fn append_is_idempotent_modulo_content() {
        let mut base = ModuleSet::new("ms");
        base.insert(module("a", "2024-01-01", "urn:a"));
        let mut inv = SchemaInventory::set(base).unwrap();

        let mut other = ModuleSet::new("ms");
        other.insert(module("b", "2024-01-01", "urn:b"));
        let add = SchemaInventory::set(other.clone()).unwrap();
        inv.append(add.clone());
        let once = inv.clone();

        inv.append(add);
        assert_eq!(inv, once);
    }

    #[test]
    fn append_replaces_differing_module_with_same_name() {
        let mut base = ModuleSet::new("ms");
        base.insert(module("a", "2024-01-01", "urn:a"));
        let mut inv = SchemaInventory::set(base).unwrap();

        let mut updated = ModuleSet::new("ms");
        updated.insert(module("a", "2025-01-01", "urn:a"));
        inv.append(SchemaInventory::set(updated).unwrap());

        assert_eq!(inv.module_set().get("a").unwrap().revision, "2025-01-01");
    }

    proptest::proptest! {
        #[test]
        fn capability_lookup_ignores_any_query_suffix(
            base in "[a-z:]{1,12}",
            query in "[a-z0-9=&]{0,12}",
        ) {
            let mut caps = CapabilitySet::new();
            caps.insert(format!("{base}?{query}"));
            proptest::prop_assert!(caps.contains(&base));
        }
    }

    #[test]
    fn tree_equal_ignores_insertion_order() {
        let mut a = ModuleSet::new("ms");
        a.insert(module("a", "2024-01-01", "urn:a"));
        a.insert(module("b", "2024-01-01", "urn:b"));

        let mut b = ModuleSet::new("ms");
        b.insert(module("b", "2024-01-01", "urn:b"));
        b.insert(module("a", "2024-01-01", "urn:a"));

        let inv_a = SchemaInventory::set(a).unwrap();
        let inv_b = SchemaInventory::set(b).unwrap();
        assert!(inv_a.tree_equal(&inv_b));
    }
}
