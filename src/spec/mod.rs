//! Compiled schema specs and their cross-device interner (component D,
//! spec §3 CompiledSchemaSpec, §4.D).

pub mod interner;

use crate::domain::{Module, SchemaInventory};
use crate::error::SchemaError;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

pub use interner::SharedSchemaSpecInterner;

/// External collaborator: turns schema text into an in-memory schema tree
/// (out of scope per spec §1; here reduced to "parse one already-loaded
/// `Module`"). Grammar synthesis and validation both sit downstream of this
/// trait's output.
pub trait SchemaParser {
    fn parse_module(&self, module: &Module) -> Result<ParsedModule, SchemaError>;
}

/// A parsed module: its name plus the names of modules it imports, used
/// for the "cross-resolving their imports" step of spec §3's
/// CompiledSchemaSpec definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedModule {
    pub name: String,
    pub imports: Vec<String>,
}

/// The default parser: every module parses to itself with no imports.
/// Stands in for the real schema-list parser the core does not own.
#[derive(Debug, Default)]
pub struct IdentitySchemaParser;

impl SchemaParser for IdentitySchemaParser {
    fn parse_module(&self, module: &Module) -> Result<ParsedModule, SchemaError> {
        Ok(ParsedModule {
            name: module.name.clone(),
            imports: Vec::new(),
        })
    }
}

#[derive(Debug)]
struct CompiledSchemaSpecData {
    source: SchemaInventory,
    modules: Vec<ParsedModule>,
}

/// Reference-counted compiled schema spec (spec §3). Multiple device
/// handles may point at the same spec; the interner is always consulted
/// before a new one is constructed (spec §9, sharing is unconditional).
#[derive(Debug, Clone)]
pub struct CompiledSchemaSpec(Rc<RefCell<CompiledSchemaSpecData>>);

impl CompiledSchemaSpec {
    /// Parse every module of `source` and cross-resolve imports against the
    /// set of module names present in the same inventory.
    pub fn compile(
        source: SchemaInventory,
        parser: &dyn SchemaParser,
    ) -> Result<Self, SchemaError> {
        let known: Vec<&str> = source.module_set().modules().map(|m| m.name.as_str()).collect();
        let mut modules = Vec::new();
        for module in source.module_set().modules() {
            let parsed = parser.parse_module(module)?;
            for import in &parsed.imports {
                if !known.contains(&import.as_str()) {
                    return Err(SchemaError::ModuleParseFailed(
                        module.name.clone(),
                        format!("unresolved import '{import}'"),
                    ));
                }
            }
            modules.push(parsed);
        }
        Ok(Self(Rc::new(RefCell::new(CompiledSchemaSpecData {
            source,
            modules,
        }))))
    }

    pub fn source(&self) -> Ref<'_, SchemaInventory> {
        Ref::map(self.0.borrow(), |d| &d.source)
    }

    pub fn module_count(&self) -> usize {
        self.0.borrow().modules.len()
    }

    /// Current number of sharers (device handles plus interner entries
    /// pointing at this spec). Used by the shutdown-refcount invariant in
    /// spec §8.
    pub fn refcount(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Same-object identity check (spec §8: "spec(a) == spec(b) (same
    /// object)").
    pub fn is_same(&self, other: &CompiledSchemaSpec) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
