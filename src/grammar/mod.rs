//! Grammar synthesis and reference resolution (components E and F,
//! spec §4.E-F).

pub mod resolver;
pub mod runtime;
pub mod synthesizer;

pub use resolver::{EditContext, GrammarReferenceResolver, ResolvedReference};
pub use runtime::{GrammarNode, GrammarRuntime, GrammarRuntimeError, GrammarSubtree, InMemoryGrammarRuntime};
pub use synthesizer::{subtree_name, GrammarSynthesizer};
