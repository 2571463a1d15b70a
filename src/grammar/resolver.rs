//! Grammar Reference Resolver (component F, spec §4.F).
//!
//! Grounded on original_source's `controller_cligen_treeref_wrap`: the
//! device-selector extraction (edit-context field first, then a `device`
//! token scan), the glob-over-known-devices fan-out, and the pairwise
//! top-level equality check before committing to a single grammar name.

use crate::device::DeviceHandleStore;
use crate::domain::DeviceName;
use crate::error::CoreError;
use crate::grammar::runtime::GrammarRuntime;
use crate::grammar::synthesizer::GrammarSynthesizer;
use crate::spec::{SchemaParser, SharedSchemaSpecInterner};

/// The currently-active editing cursor (spec §3 EditContext): an ordered
/// sequence of (name, value) pairs inherited from the grammar runtime.
#[derive(Debug, Clone, Default)]
pub struct EditContext {
    fields: Vec<(String, String)>,
}

impl EditContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of a resolver invocation: either leave the reference as-is, or
/// substitute a new concrete grammar name (spec §4.F).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedReference {
    Unresolved,
    Substitute(String),
}

const MOUNTPOINT_REFERENCE: &str = "mountpoint";
const DUMMY_MOUNTPOINT_GRAMMAR: &str = "mountpoint";

pub struct GrammarReferenceResolver<'a> {
    runtime: &'a dyn GrammarRuntime,
}

impl<'a> GrammarReferenceResolver<'a> {
    pub fn new(runtime: &'a dyn GrammarRuntime) -> Self {
        Self { runtime }
    }

    /// Resolve a reference named `name` against `tokens` and `ctx`. Only
    /// `mountpoint` is handled; any other reference name is left as-is.
    pub async fn resolve(
        &self,
        name: &str,
        tokens: &[String],
        ctx: &EditContext,
        store: &DeviceHandleStore,
        interner: &mut SharedSchemaSpecInterner,
        parser: &dyn SchemaParser,
    ) -> Result<ResolvedReference, CoreError> {
        if name != MOUNTPOINT_REFERENCE {
            return Ok(ResolvedReference::Unresolved);
        }

        let Some(selector) = device_selector(tokens, ctx) else {
            return Ok(ResolvedReference::Unresolved);
        };

        let known: Vec<DeviceName> = store.names_with_known_inventory().cloned().collect();
        let matches: Vec<DeviceName> = known
            .into_iter()
            .filter(|device| glob_match(&selector, device.as_str()))
            .collect();

        if matches.is_empty() {
            return Ok(ResolvedReference::Unresolved);
        }

        let synth = GrammarSynthesizer::new(self.runtime);
        let mut names = Vec::with_capacity(matches.len());
        for device in &matches {
            let grammar_name = synth
                .ensure_grammar_for(store, interner, parser, device)
                .await?;
            names.push(grammar_name);
        }

        let first = self
            .runtime
            .get_subtree(&names[0])
            .await
            .expect("just installed");

        for other_name in &names[1..] {
            let other = self
                .runtime
                .get_subtree(other_name)
                .await
                .expect("just installed");
            if !first.top_level_equal(&other) {
                tracing::debug!(
                    selector = %selector,
                    mismatch_against = %names[0],
                    differing = %other_name,
                    "mount-point grammars diverge, falling back to dummy grammar"
                );
                self.install_dummy_if_absent().await?;
                return Ok(ResolvedReference::Unresolved);
            }
        }

        Ok(ResolvedReference::Substitute(names[0].clone()))
    }

    async fn install_dummy_if_absent(&self) -> Result<(), CoreError> {
        if self.runtime.has_subtree(DUMMY_MOUNTPOINT_GRAMMAR).await {
            return Ok(());
        }
        use crate::grammar::runtime::GrammarSubtree;
        self.runtime
            .install_subtree(GrammarSubtree::empty(DUMMY_MOUNTPOINT_GRAMMAR))
            .await
            .map_err(|e| {
                crate::error::GrammarError::InstallFailed(
                    DUMMY_MOUNTPOINT_GRAMMAR.to_string(),
                    e.to_string(),
                )
                .into()
            })
    }
}

/// Step 1 of spec §4.F: prefer the edit context's `name` field; otherwise
/// scan tokens for the literal `device` and take the token after it.
fn device_selector(tokens: &[String], ctx: &EditContext) -> Option<String> {
    if let Some(name) = ctx.get("name") {
        return Some(name.to_string());
    }
    tokens
        .iter()
        .position(|t| t == "device")
        .and_then(|idx| tokens.get(idx + 1))
        .cloned()
}

/// Minimal glob matcher supporting `*` (any run of characters) and `?`
/// (exactly one character), in the spirit of POSIX `fnmatch` as used by
/// original_source's device-pattern matching. No other POSIX fnmatch
/// features (character classes, bracket expressions) are needed by this
/// core.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    fn inner(p: &[u8], c: &[u8]) -> bool {
        match p.first() {
            None => c.is_empty(),
            Some(b'*') => inner(&p[1..], c) || (!c.is_empty() && inner(p, &c[1..])),
            Some(b'?') => !c.is_empty() && inner(&p[1..], &c[1..]),
            Some(&ch) => c.first() == Some(&ch) && inner(&p[1..], &c[1..]),
        }
    }
    inner(pattern.as_bytes(), candidate.as_bytes())
}
