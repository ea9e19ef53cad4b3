//! The central entity: a named build unit with concrete or abstract standing.

use std::fmt;
use std::sync::Arc;

/// Structured result of running an action or clean-action callback.
///
/// Replaces a dynamic dict-merge-back: only [`FieldUpdates::layers`] may be
/// rewritten on the target that produced it.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub success: bool,
    pub status_message: String,
    pub field_updates: Option<FieldUpdates>,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            status_message: message.into(),
            field_updates: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status_message: message.into(),
            field_updates: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldUpdates {
    pub layers: Option<Vec<String>>,
}

pub type Action = Arc<dyn Fn(&Target) -> Outcome + Send + Sync>;

/// A build unit. Fields are set at load time and are immutable afterward,
/// except `timestamp` (written once by the probe) and `layers` (which an
/// action callback may rewrite via [`FieldUpdates::layers`]).
#[derive(Clone)]
pub struct Target {
    pub name: String,
    pub depends: Vec<String>,
    pub provides: Vec<String>,
    pub artifact: Option<String>,
    pub action: Option<Action>,
    pub clean_action: Option<Action>,
    pub layers: Option<Vec<String>>,
    pub check_mtime: bool,
    pub essential: bool,
    pub is_default: bool,
    pub timestamp: f64,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("depends", &self.depends)
            .field("provides", &self.provides)
            .field("artifact", &self.artifact)
            .field("has_action", &self.action.is_some())
            .field("has_clean_action", &self.clean_action.is_some())
            .field("layers", &self.layers)
            .field("check_mtime", &self.check_mtime)
            .field("essential", &self.essential)
            .field("is_default", &self.is_default)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends: Vec::new(),
            provides: Vec::new(),
            artifact: None,
            action: None,
            clean_action: None,
            layers: None,
            check_mtime: true,
            essential: false,
            is_default: false,
            timestamp: 0.0,
        }
    }

    /// A target is abstract iff it declares no artifact, no action, and no
    /// layers. Abstract targets are never executed; they exist only to be
    /// "covered" by a concrete provider.
    pub fn is_abstract(&self) -> bool {
        self.artifact.is_none() && self.action.is_none() && self.layers.is_none()
    }

    pub fn non_abstract_depends<'a>(&'a self, graph: &'a crate::graph::Graph) -> Vec<&'a str> {
        self.depends
            .iter()
            .filter(|d| graph.get(d).map(|t| !t.is_abstract()).unwrap_or(false))
            .map(String::as_str)
            .collect()
    }

    pub fn abstract_depends<'a>(&'a self, graph: &'a crate::graph::Graph) -> Vec<&'a str> {
        self.depends
            .iter()
            .filter(|d| graph.get(d).map(|t| t.is_abstract()).unwrap_or(false))
            .map(String::as_str)
            .collect()
    }
}
