//! Structural validation: unresolved references, self-dependency, multiple
//! essentials, and cyclic depends/provides.
//!
//! Cycle checks are iterative frontier expansions (worklist over sets), not
//! recursive DFS, per the source's explicit "no recursion" design note.
//! Each walk is bounded by `graph.len() + 1`; exceeding the bound without
//! converging is itself reported as a cycle rather than silently breaking.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::graph::Graph;

pub fn validate(graph: &Graph) -> Result<()> {
    debug!(targets = graph.len(), "validating graph");
    check_references(graph)?;
    check_self_dependency(graph)?;
    check_multiple_essentials(graph)?;
    check_cycles(graph, Relation::Depends)?;
    check_cycles(graph, Relation::Provides)?;
    info!(targets = graph.len(), "graph validated");
    Ok(())
}

fn check_references(graph: &Graph) -> Result<()> {
    for target in graph.iter() {
        for dep in target.depends.iter().chain(target.provides.iter()) {
            if graph.get(dep).is_none() {
                return Err(Error::UnresolvedReference {
                    referrer: target.name.clone(),
                    reference: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_self_dependency(graph: &Graph) -> Result<()> {
    for target in graph.iter() {
        if target.depends.iter().any(|d| d == &target.name) {
            return Err(Error::SelfDependency(target.name.clone()));
        }
    }
    Ok(())
}

fn check_multiple_essentials(graph: &Graph) -> Result<()> {
    for target in graph.iter() {
        let essential_deps = target
            .depends
            .iter()
            .filter(|d| graph.get(d).map(|t| t.essential).unwrap_or(false))
            .count();
        if essential_deps > 1 {
            return Err(Error::MultipleEssentials(target.name.clone()));
        }
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Relation {
    Depends,
    Provides,
}

fn relation_of<'a>(graph: &'a Graph, name: &str, relation: Relation) -> &'a [String] {
    let target = graph.get(name).expect("validated reference");
    match relation {
        Relation::Depends => &target.depends,
        Relation::Provides => &target.provides,
    }
}

/// For every target, walk the named relation transitively with a bounded
/// worklist; if the origin target is reachable from itself, that's a cycle.
fn check_cycles(graph: &Graph, relation: Relation) -> Result<()> {
    let bound = graph.len() + 1;
    for target in graph.iter() {
        let mut frontier: HashSet<String> = relation_of(graph, &target.name, relation)
            .iter()
            .cloned()
            .collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut iterations = 0;

        while !frontier.is_empty() {
            iterations += 1;
            if iterations > bound {
                return Err(match relation {
                    Relation::Depends => Error::CyclicDependency(target.name.clone()),
                    Relation::Provides => Error::CyclicProvide(target.name.clone()),
                });
            }

            if frontier.contains(&target.name) {
                return Err(match relation {
                    Relation::Depends => Error::CyclicDependency(target.name.clone()),
                    Relation::Provides => Error::CyclicProvide(target.name.clone()),
                });
            }

            let mut next = HashSet::new();
            for name in &frontier {
                seen.insert(name.clone());
                for child in relation_of(graph, name, relation) {
                    if !seen.contains(child) {
                        next.insert(child.clone());
                    }
                }
            }
            frontier = next;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;

    fn graph_of(targets: Vec<Target>) -> Graph {
        let mut g = Graph::default();
        for t in targets {
            g.insert(t);
        }
        g
    }

    #[test]
    fn detects_unresolved_reference() {
        let mut a = Target::new("a");
        a.depends.push("missing".into());
        let g = graph_of(vec![a]);
        assert!(matches!(validate(&g), Err(Error::UnresolvedReference { .. })));
    }

    #[test]
    fn detects_self_dependency() {
        let mut a = Target::new("a");
        a.depends.push("a".into());
        let g = graph_of(vec![a]);
        assert!(matches!(validate(&g), Err(Error::SelfDependency(_))));
    }

    #[test]
    fn detects_cyclic_dependency() {
        let mut a = Target::new("a");
        a.depends.push("b".into());
        let mut b = Target::new("b");
        b.depends.push("a".into());
        let g = graph_of(vec![a, b]);
        assert!(matches!(validate(&g), Err(Error::CyclicDependency(_))));
    }

    #[test]
    fn detects_cyclic_provide() {
        let mut a = Target::new("a");
        a.provides.push("b".into());
        let mut b = Target::new("b");
        b.provides.push("a".into());
        let g = graph_of(vec![a, b]);
        assert!(matches!(validate(&g), Err(Error::CyclicProvide(_))));
    }

    #[test]
    fn detects_multiple_essentials() {
        let mut plat_a = Target::new("plat_a");
        plat_a.essential = true;
        let mut plat_b = Target::new("plat_b");
        plat_b.essential = true;
        let mut user = Target::new("user");
        user.depends.push("plat_a".into());
        user.depends.push("plat_b".into());
        let g = graph_of(vec![plat_a, plat_b, user]);
        assert!(matches!(validate(&g), Err(Error::MultipleEssentials(_))));
    }

    #[test]
    fn accepts_valid_diamond() {
        let d = Target::new("d");
        let mut b = Target::new("b");
        b.depends.push("d".into());
        let mut c = Target::new("c");
        c.depends.push("d".into());
        let mut a = Target::new("a");
        a.depends.push("b".into());
        a.depends.push("c".into());
        let g = graph_of(vec![d, b, c, a]);
        assert!(validate(&g).is_ok());
    }
}
