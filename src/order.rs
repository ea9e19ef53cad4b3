//! Orderer (C6): linearize a resolved queue set into depends-before-
//! dependent order, grouped by dependency depth, abstracts dropped.

use std::collections::HashMap;

use tracing::debug;

use crate::graph::Graph;

/// Depth-layer the queue set and flatten it. Depth of a target is one more
/// than the max depth of its concrete dependencies that also lie in
/// `queue_set ∪ full_provides` (a dependency may be an abstract name
/// covered by a provider elsewhere in the queue, not a literal queue_set
/// member); targets with no such dependency sit at depth 0. Within a
/// layer, targets are ordered by name.
pub fn order(
    graph: &Graph,
    queue_set: &std::collections::BTreeSet<String>,
    full_provides: &std::collections::BTreeSet<String>,
) -> Vec<String> {
    debug!(queue = queue_set.len(), "ordering queue set");
    let mut depth: HashMap<String, usize> = HashMap::new();

    for name in queue_set {
        compute_depth(graph, queue_set, full_provides, name, &mut depth, &mut Vec::new());
    }

    let mut by_depth: Vec<(usize, String)> = queue_set
        .iter()
        .filter(|name| !graph.get(name).map(|t| t.is_abstract()).unwrap_or(true))
        .map(|name| (depth[name], name.clone()))
        .collect();

    by_depth.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    let sequence: Vec<String> = by_depth.into_iter().map(|(_, name)| name).collect();
    debug!(sequence = ?sequence, "build order");
    sequence
}

fn compute_depth(
    graph: &Graph,
    queue_set: &std::collections::BTreeSet<String>,
    full_provides: &std::collections::BTreeSet<String>,
    name: &str,
    depth: &mut HashMap<String, usize>,
    stack: &mut Vec<String>,
) -> usize {
    if let Some(d) = depth.get(name) {
        return *d;
    }
    // Validation already rejected cycles; this guard only protects against
    // a target missing from the graph entirely (never a live path).
    if stack.contains(&name.to_string()) {
        return 0;
    }
    stack.push(name.to_string());

    let Some(target) = graph.get(name) else {
        stack.pop();
        return 0;
    };

    let max_dep_depth = target
        .depends
        .iter()
        .filter(|d| queue_set.contains(*d) || full_provides.contains(*d))
        .map(|d| {
            // An abstract dependency covered via `full_provides` has no
            // queue_set membership of its own; its depth is the depth of
            // whichever queued provider actually covers it.
            if queue_set.contains(d) {
                compute_depth(graph, queue_set, full_provides, d, depth, stack)
            } else {
                provider_depth(graph, queue_set, full_provides, d, depth, stack)
            }
        })
        .max();

    let d = match max_dep_depth {
        Some(m) => m + 1,
        None => 0,
    };

    stack.pop();
    depth.insert(name.to_string(), d);
    d
}

/// Depth of the covering provider(s) of an abstract name satisfied through
/// `full_provides` rather than a literal queue_set entry: the max depth of
/// any queued target that provides it.
fn provider_depth(
    graph: &Graph,
    queue_set: &std::collections::BTreeSet<String>,
    full_provides: &std::collections::BTreeSet<String>,
    abstract_name: &str,
    depth: &mut HashMap<String, usize>,
    stack: &mut Vec<String>,
) -> usize {
    queue_set
        .iter()
        .filter(|q| {
            graph
                .get(q)
                .map(|t| t.provides.iter().any(|p| p == abstract_name))
                .unwrap_or(false)
        })
        .map(|q| compute_depth(graph, queue_set, full_provides, q, depth, stack))
        .max()
        .unwrap_or(0)
}
