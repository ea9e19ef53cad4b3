//! A declarative dependency-graph build orchestrator: load target
//! declarations, validate the graph, resolve a request against abstract
//! and concrete dependencies, order the result, and drive execution.

pub mod config;
pub mod error;
pub mod graph;
pub mod order;
pub mod plugin;
pub mod probe;
pub mod resolver;
pub mod scheduler;
pub mod target;

pub use error::{Error, Result};
pub use graph::{Graph, GraphBuilder};
pub use plugin::{ExtensionHooks, NoopHooks};
pub use target::{Action, FieldUpdates, Outcome, Target};
