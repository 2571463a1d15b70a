//! Grammar runtime port (external collaborator, spec §1: "the command-grammar
//! tree engine"). Grounded on `domain/ports.rs`'s driven-port pattern: an
//! async trait plus a `thiserror` error enum that the core depends on but
//! does not implement for production use.

use async_trait::async_trait;
use thiserror::Error;

/// One production node in the installed grammar tree. Equality here models
/// the "one-level parse-tree equivalence" of spec §4.F step 4: same token,
/// same child count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarNode {
    pub token: String,
    pub children: Vec<String>,
}

/// A named subtree installed in the grammar runtime (spec §3
/// GrammarSubtree). `top_level` holds the root production's direct
/// children for the one-level equality check in 4.F.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarSubtree {
    pub name: String,
    pub top_level: Vec<GrammarNode>,
}

impl GrammarSubtree {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            top_level: Vec::new(),
        }
    }

    /// One-level parse-tree equivalence (spec §4.F step 4): same length,
    /// pairwise node equality. Deliberately shallower than full tree
    /// equality.
    pub fn top_level_equal(&self, other: &GrammarSubtree) -> bool {
        self.top_level == other.top_level
    }
}

#[derive(Debug, Error)]
pub enum GrammarRuntimeError {
    #[error("grammar runtime rejected install of '{0}': {1}")]
    InstallRejected(String, String),
}

/// Driven port onto the grammar engine (out of scope per spec §1).
#[async_trait]
pub trait GrammarRuntime: Send + Sync {
    async fn has_subtree(&self, name: &str) -> bool;
    async fn get_subtree(&self, name: &str) -> Option<GrammarSubtree>;
    async fn install_subtree(&self, subtree: GrammarSubtree) -> Result<(), GrammarRuntimeError>;
}

/// In-memory stand-in used by the controller when no external grammar
/// engine is wired up, and by tests.
#[derive(Debug, Default)]
pub struct InMemoryGrammarRuntime {
    subtrees: std::sync::Mutex<std::collections::HashMap<String, GrammarSubtree>>,
}

impl InMemoryGrammarRuntime {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GrammarRuntime for InMemoryGrammarRuntime {
    async fn has_subtree(&self, name: &str) -> bool {
        self.subtrees.lock().expect("grammar runtime mutex poisoned").contains_key(name)
    }

    async fn get_subtree(&self, name: &str) -> Option<GrammarSubtree> {
        self.subtrees.lock().expect("grammar runtime mutex poisoned").get(name).cloned()
    }

    async fn install_subtree(&self, subtree: GrammarSubtree) -> Result<(), GrammarRuntimeError> {
        self.subtrees
            .lock()
            .expect("grammar runtime mutex poisoned")
            .insert(subtree.name.clone(), subtree);
        Ok(())
    }
}
