//! Direct and transitive provider maps (C3).

use std::collections::{HashMap, HashSet};

use crate::graph::Graph;

#[derive(Debug, Default)]
pub struct ProviderIndex {
    direct: HashMap<String, HashSet<String>>,
    full: HashMap<String, HashSet<String>>,
}

impl ProviderIndex {
    pub fn build(graph: &Graph) -> Self {
        let mut direct: HashMap<String, HashSet<String>> = HashMap::new();
        for target in graph.iter() {
            for provided in &target.provides {
                direct
                    .entry(provided.clone())
                    .or_default()
                    .insert(target.name.clone());
            }
        }

        let mut full: HashMap<String, HashSet<String>> = HashMap::new();
        for name in direct.keys() {
            let mut closure: HashSet<String> = HashSet::new();
            let mut frontier: Vec<String> = vec![name.clone()];
            let mut visited: HashSet<String> = HashSet::new();
            while let Some(current) = frontier.pop() {
                if !visited.insert(current.clone()) {
                    continue;
                }
                if let Some(providers) = direct.get(&current) {
                    for p in providers {
                        if closure.insert(p.clone()) {
                            frontier.push(p.clone());
                        }
                    }
                }
            }
            full.insert(name.clone(), closure);
        }

        Self { direct, full }
    }

    pub fn direct_providers(&self, target: &str) -> HashSet<String> {
        self.direct.get(target).cloned().unwrap_or_default()
    }

    pub fn full_providers(&self, target: &str) -> HashSet<String> {
        self.full.get(target).cloned().unwrap_or_default()
    }
}
