//! The resolver (C5): given a request, compute the closure of targets
//! required to satisfy it, disambiguating abstract dependencies against
//! their candidate providers.
//!
//! This is an iterative worklist over sets, not a recursive walk — the
//! six mutable sets below (`queue_set`, `provides`, `full_provides`,
//! `depends`, and the two delta frontiers) are propagated to a fixed
//! point each iteration, mirroring the algorithm this crate's lineage
//! uses for dependency closure computation.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::graph::{Graph, ProviderIndex};

#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub queue_set: BTreeSet<String>,
    pub full_provides: BTreeSet<String>,
    pub essentials: BTreeSet<String>,
}

pub fn resolve(graph: &Graph, index: &ProviderIndex, request: &[String]) -> Result<ResolveOutcome> {
    debug!(request = ?request, "resolving request");
    let essentials_universe = essentials_universe(graph, index);
    let abstracts_global: BTreeSet<String> = graph
        .iter()
        .filter(|t| t.is_abstract())
        .map(|t| t.name.clone())
        .collect();

    let r = effective_request(graph, request)?;

    // queue_set takes only R's own concrete members; everything else —
    // R's abstract members and *all* immediate dependencies of R, concrete
    // or abstract — starts life in `depends` and is only promoted to
    // queue_set once its own depends are satisfied (step 5) or, for
    // abstracts, once a provider is chosen (step 4).
    let mut queue_set: BTreeSet<String> = BTreeSet::new();
    let mut depends: BTreeSet<String> = BTreeSet::new();
    for name in &r {
        let t = graph.get(name).expect("validated request");
        if t.is_abstract() {
            depends.insert(name.clone());
        } else {
            queue_set.insert(name.clone());
        }
    }
    for name in &r {
        for dep in &graph.get(name).expect("validated request").depends {
            depends.insert(dep.clone());
        }
    }

    let mut provides: BTreeSet<String> = BTreeSet::new();
    for name in &queue_set {
        provides.extend(graph.get(name).expect("queued target exists").provides.iter().cloned());
    }
    let mut full_provides: BTreeSet<String> = queue_set.union(&provides).cloned().collect();

    let mut delta_p: BTreeSet<String> = provides.clone();
    let mut delta_d: BTreeSet<String> = depends.clone();

    let bound = graph.len() + 1;
    let mut iterations = 0;

    loop {
        iterations += 1;
        if iterations > bound {
            return Err(Error::ResolutionDidNotConverge(iterations));
        }
        let mut changed = false;

        expand_fixed_point(graph, &mut delta_p, &mut provides, |t| &t.provides, &mut changed);
        full_provides = queue_set.union(&provides).cloned().collect();

        let before = depends.len();
        depends = depends.difference(&full_provides).cloned().collect();
        changed |= depends.len() != before;

        expand_fixed_point(graph, &mut delta_d, &mut depends, |t| &t.depends, &mut changed);

        let covered: BTreeSet<String> = queue_set.union(&depends).cloned().collect();
        let chosen_essentials: BTreeSet<String> = essentials_universe.intersection(&covered).cloned().collect();
        let excluded_essentials: BTreeSet<String> = essentials_universe.difference(&chosen_essentials).cloned().collect();

        let abstract_depends_set: BTreeSet<String> = queue_set
            .iter()
            .flat_map(|q| {
                graph
                    .get(q)
                    .expect("queued target exists")
                    .depends
                    .iter()
                    .filter(|d| abstracts_global.contains(*d))
                    .cloned()
            })
            .collect();

        let pending: Vec<String> = depends
            .iter()
            .filter(|d| abstracts_global.contains(*d))
            .cloned()
            .collect();

        let mut resolved = Vec::new();
        let mut residual: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for d in &pending {
            let mut candidates: BTreeSet<String> = index.direct_providers(d).into_iter().collect();
            if candidates.is_empty() {
                continue;
            }

            candidates.retain(|c| {
                let ct = graph.get(c).expect("provider exists");
                ct.depends.is_empty() || ct.depends.iter().any(|cd| chosen_essentials.contains(cd))
            });

            if candidates.len() > 1 && candidates.iter().any(|c| essentials_universe.contains(c)) {
                candidates = candidates
                    .into_iter()
                    .filter(|c| !excluded_essentials.contains(c) && !abstracts_global.contains(c))
                    .collect();
            }

            match disambiguate(
                graph,
                &candidates,
                &queue_set,
                &provides,
                &full_provides,
                &abstracts_global,
                &abstract_depends_set,
            ) {
                Some(chosen) => resolved.push((d.clone(), chosen)),
                None => {
                    residual.insert(d.clone(), candidates);
                }
            }
        }

        for (d, chosen) in &resolved {
            queue_set.insert(chosen.clone());
            depends.remove(d);
            provides.insert(d.clone());
            delta_p.insert(d.clone());
            let chosen_target = graph.get(chosen).expect("chosen provider exists");
            delta_d.extend(chosen_target.depends.iter().cloned());
            delta_p.extend(chosen_target.provides.iter().cloned());
            changed = true;
        }

        full_provides = queue_set.union(&provides).cloned().collect();

        let to_commit: Vec<String> = depends
            .iter()
            .filter(|d| !abstracts_global.contains(*d))
            .filter(|d| {
                let t = graph.get(d).expect("depends entry exists");
                let dep_set: BTreeSet<String> = t.depends.iter().cloned().collect();
                dep_set.is_subset(&full_provides)
            })
            .cloned()
            .collect();

        for name in &to_commit {
            queue_set.insert(name.clone());
            depends.remove(name);
            provides.extend(graph.get(name).expect("committed target exists").provides.iter().cloned());
            changed = true;
        }

        if !changed {
            break;
        }
    }

    full_provides = queue_set.union(&provides).cloned().collect();

    // Vacuous satisfaction: an abstract target that itself has dependencies,
    // all of which are already covered, does not need a provider chosen —
    // it was only in `depends` because something referenced it, and the
    // thing it in turn requires is already satisfied. An abstract target
    // with *no* depends of its own (the ordinary "pick a provider" case)
    // is never dropped this way.
    depends.retain(|d| {
        let t = graph.get(d).expect("depends entry exists");
        if abstracts_global.contains(d) && !t.depends.is_empty() {
            let dep_set: BTreeSet<String> = t.depends.iter().cloned().collect();
            !dep_set.is_subset(&full_provides)
        } else {
            true
        }
    });

    if !depends.is_empty() {
        let residual: BTreeMap<String, BTreeSet<String>> = depends
            .iter()
            .map(|d| (d.clone(), index.direct_providers(d).into_iter().collect()))
            .collect();
        warn!(residual = ?residual, "resolution left ambiguous dependencies");
        return Err(Error::Ambiguous(residual));
    }

    let essentials: BTreeSet<String> = essentials_universe.intersection(&queue_set).cloned().collect();
    info!(queue = queue_set.len(), essentials = essentials.len(), "resolved");
    Ok(ResolveOutcome {
        queue_set,
        full_provides,
        essentials,
    })
}

fn expand_fixed_point(
    graph: &Graph,
    delta: &mut BTreeSet<String>,
    target_set: &mut BTreeSet<String>,
    relation: impl Fn(&crate::target::Target) -> &Vec<String>,
    changed: &mut bool,
) {
    loop {
        let mut next = BTreeSet::new();
        for name in delta.iter() {
            if let Some(t) = graph.get(name) {
                for item in relation(t) {
                    if !target_set.contains(item) {
                        next.insert(item.clone());
                    }
                }
            }
        }
        if next.is_empty() {
            break;
        }
        for item in &next {
            target_set.insert(item.clone());
        }
        *changed = true;
        *delta = next;
    }
}

fn essentials_universe(graph: &Graph, index: &ProviderIndex) -> BTreeSet<String> {
    let mut universe: BTreeSet<String> = graph
        .iter()
        .filter(|t| t.essential)
        .map(|t| t.name.clone())
        .collect();
    let essentials: Vec<String> = universe.iter().cloned().collect();
    for name in essentials {
        universe.extend(index.direct_providers(&name));
    }
    universe
}

/// §4.5.2 default request expansion.
fn effective_request(graph: &Graph, request: &[String]) -> Result<BTreeSet<String>> {
    let mut r: BTreeSet<String> = request.iter().cloned().collect();

    for name in &r {
        if graph.get(name).is_none() {
            return Err(Error::UnresolvedReference {
                referrer: "<request>".to_string(),
                reference: name.clone(),
            });
        }
    }

    if r.is_empty() {
        r.extend(graph.iter().filter(|t| t.is_default).map(|t| t.name.clone()));
        if let Some(default_target) = graph.get("default") {
            r.extend(default_target.depends.iter().cloned());
        }
    }

    if let Some(any) = graph.get("any") {
        r.extend(any.depends.iter().cloned());
    }

    if r.is_empty() {
        return Err(Error::NoRequest);
    }

    Ok(r)
}

/// Ranked filter cascade (§4.5.4 step 4), normative order. Returns the
/// unique survivor, or `None` if ambiguity remains after every filter and
/// the final depends-based tie-break.
#[allow(clippy::too_many_arguments)]
fn disambiguate(
    graph: &Graph,
    candidates: &BTreeSet<String>,
    queue_set: &BTreeSet<String>,
    provides: &BTreeSet<String>,
    full_provides: &BTreeSet<String>,
    abstracts: &BTreeSet<String>,
    abstract_depends_set: &BTreeSet<String>,
) -> Option<String> {
    if candidates.len() == 1 {
        return candidates.iter().next().cloned();
    }

    let one = |set: BTreeSet<String>| -> Option<String> {
        if set.len() == 1 {
            set.into_iter().next()
        } else {
            None
        }
    };

    // (a) P ∩ queue_set
    if let Some(c) = one(candidates.intersection(queue_set).cloned().collect()) {
        return Some(c);
    }

    // (b) P ∩ ((provides ∪ queue_set) − abstracts)
    let provides_or_queued: BTreeSet<String> = provides.union(queue_set).cloned().collect();
    let b: BTreeSet<String> = candidates.intersection(&provides_or_queued).cloned().collect::<BTreeSet<_>>().difference(abstracts).cloned().collect();
    if let Some(c) = one(b) {
        return Some(c);
    }

    // (c) P itself (already excluded len==1 above; a tie of >1 falls through)

    // (d) P − full_provides
    if let Some(c) = one(candidates.difference(full_provides).cloned().collect()) {
        return Some(c);
    }

    // (e) P − abstract_depends_set
    if let Some(c) = one(candidates.difference(abstract_depends_set).cloned().collect()) {
        return Some(c);
    }

    // (f) P − abstracts
    if let Some(c) = one(candidates.difference(abstracts).cloned().collect()) {
        return Some(c);
    }

    // (g) P − (abstracts ∪ full_provides)
    let abstracts_or_full: BTreeSet<String> = abstracts.union(full_provides).cloned().collect();
    if let Some(c) = one(candidates.difference(&abstracts_or_full).cloned().collect()) {
        return Some(c);
    }

    // Final tie-break: prefer a candidate whose depends already intersect
    // queue_set over one whose depends merely intersect full_provides.
    let via_queue: Vec<&String> = candidates
        .iter()
        .filter(|c| {
            graph
                .get(c)
                .map(|t| t.depends.iter().any(|d| queue_set.contains(d)))
                .unwrap_or(false)
        })
        .collect();
    if via_queue.len() == 1 {
        return Some(via_queue[0].clone());
    }

    let via_full: Vec<&String> = candidates
        .iter()
        .filter(|c| {
            graph
                .get(c)
                .map(|t| t.depends.iter().any(|d| full_provides.contains(d)))
                .unwrap_or(false)
        })
        .collect();
    if via_full.len() == 1 {
        return Some(via_full[0].clone());
    }

    None
}
