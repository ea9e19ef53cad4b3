//! Extension hook contract (§6.2). A capability trait with five hook
//! points, each defaulting to a no-op/accept so hosts only override what
//! they need. Dynamic loading of an implementation is a host concern; the
//! core only needs a trait object.

use std::collections::HashMap;

use crate::error::Result;
use crate::graph::declare::TargetDecl;
use crate::graph::GraphBuilder;

pub trait ExtensionHooks {
    /// Runs after declarations are parsed but before the finalize pass.
    /// Returned entries are registered as additional targets, typically
    /// synthesized from a directory scan.
    fn initialize(&mut self, _builder: &GraphBuilder) -> Result<HashMap<String, TargetDecl>> {
        Ok(HashMap::new())
    }

    /// Runs after finalize; may mutate non-structural fields.
    fn finalize(&mut self, _builder: &mut GraphBuilder) -> Result<()> {
        Ok(())
    }

    /// May force which essential is chosen before resolve.
    fn choose_essential(&mut self, _builder: &GraphBuilder, _requested: &str) -> bool {
        true
    }

    /// Post-resolve filter/reorder of the build queue.
    fn build_queue(&mut self, _builder: &GraphBuilder, queue: Vec<String>) -> Result<Vec<String>> {
        Ok(queue)
    }

    /// Final filter applied after `build_queue`.
    fn enqueue_targets(&mut self, _builder: &GraphBuilder, queue: Vec<String>) -> Result<Vec<String>> {
        Ok(queue)
    }
}

/// The default extension: every hook is a no-op/accept.
#[derive(Debug, Default)]
pub struct NoopHooks;

impl ExtensionHooks for NoopHooks {}
