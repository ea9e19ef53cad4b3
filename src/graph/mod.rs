//! Graph loading and validation (C2): ingest declarations from either
//! front-end, resolve them into [`Target`]s, and validate the result.
//!
//! There is no process-wide registry. A [`GraphBuilder`] is an explicit
//! value created per run and threaded through the loading API — the
//! source's global target index is a testing hazard this crate does not
//! reproduce (see the Design Notes).

pub mod declare;
pub mod provider_index;
pub mod validate;

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::Result;
use crate::plugin::ExtensionHooks;
use crate::target::{Action, Target};

pub use declare::{DeclMap, TargetDecl};
pub use provider_index::ProviderIndex;

/// A validated, queryable collection of targets.
#[derive(Debug, Default)]
pub struct Graph {
    targets: HashMap<String, Target>,
}

impl Graph {
    pub fn insert(&mut self, target: Target) {
        self.targets.insert(target.name.clone(), target);
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Target> {
        self.targets.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.targets.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Accumulates declarations from either front-end before they are
/// validated into a [`Graph`]. Programmatic registration and the
/// serialized-file loader both write into the same `decls` map.
#[derive(Default, Clone)]
pub struct GraphBuilder {
    decls: BTreeMap<String, TargetDecl>,
    actions: HashMap<String, Action>,
    clean_actions: HashMap<String, Action>,
    defaults: HashSet<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Programmatic registration: equivalent to the `target(...)` decorator.
    /// Returns a mutable reference to the declaration so callers can fill
    /// in fields fluently.
    pub fn declare(&mut self, name: impl Into<String>) -> &mut TargetDecl {
        self.decls.entry(name.into()).or_default()
    }

    /// Equivalent to the `task(name, depends)` decorator: a target with no
    /// artifact, only dependencies.
    pub fn task<S: Into<String>>(&mut self, name: impl Into<String>, depends: impl IntoIterator<Item = S>) {
        let decl = self.declare(name);
        decl.depends = depends.into_iter().map(Into::into).collect();
    }

    pub fn mark_default(&mut self, name: impl Into<String>) {
        self.defaults.insert(name.into());
    }

    pub fn mark_essential(&mut self, name: impl Into<String>) {
        self.declare(name).essential = true;
    }

    pub fn add_provides<S: Into<String>>(&mut self, name: impl Into<String>, provides: impl IntoIterator<Item = S>) {
        let decl = self.declare(name);
        decl.provides.extend(provides.into_iter().map(Into::into));
    }

    pub fn set_action(&mut self, name: impl Into<String>, action: Action) {
        self.actions.insert(name.into(), action);
    }

    pub fn set_clean_action(&mut self, name: impl Into<String>, action: Action) {
        self.clean_actions.insert(name.into(), action);
    }

    /// Merge in declarations parsed from a serialized document. Existing
    /// entries with the same name are replaced wholesale.
    pub fn load_declarations(&mut self, toml_text: &str) -> Result<()> {
        for (name, decl) in declare::load_declarations(toml_text)? {
            self.decls.insert(name, decl);
        }
        Ok(())
    }

    /// Snapshot the current declarations for serialization (`--json-output`
    /// and the round-trip testable property).
    pub fn to_decls(&self) -> DeclMap {
        self.decls.clone()
    }

    /// Run the extension hooks and produce a validated [`Graph`].
    pub fn build(mut self, hooks: &mut dyn ExtensionHooks) -> Result<Graph> {
        for (name, decl) in hooks.initialize(&self)? {
            self.decls.entry(name).or_insert(decl);
        }

        hooks.finalize(&mut self)?;

        let mut graph = Graph::default();
        for (name, decl) in &self.decls {
            let target = Target {
                name: name.clone(),
                depends: decl.depends.clone(),
                provides: decl.provides.clone(),
                artifact: decl.exists.clone(),
                action: self.actions.get(name).cloned(),
                clean_action: self.clean_actions.get(name).cloned(),
                layers: decl.layers.clone(),
                check_mtime: decl.check_mtime,
                essential: decl.essential,
                is_default: self.defaults.contains(name),
                timestamp: decl.mtime.unwrap_or(0.0),
            };
            graph.insert(target);
        }

        validate::validate(&graph)?;
        Ok(graph)
    }
}
