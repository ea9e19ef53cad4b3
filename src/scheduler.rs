//! Scheduler / driver (C7): walk an ordered sequence and decide, per
//! target, whether to skip, build, or clean — single-threaded, sequential,
//! stopping at the first failure.

use tracing::{debug, info, warn};

use crate::graph::Graph;
use crate::target::FieldUpdates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Build,
    Clean,
}

#[derive(Debug, Clone)]
pub struct TargetResult {
    pub name: String,
    pub ran: bool,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleReport {
    pub results: Vec<TargetResult>,
    pub success: bool,
}

/// Run `sequence` against `graph` in `mode`. `dry_run` suppresses actual
/// callback invocation, recording a "would execute"/"would clean" message
/// instead. Stops at the first failing target; targets already run are not
/// rolled back.
pub fn run(graph: &mut Graph, sequence: &[String], mode: Mode, dry_run: bool) -> ScheduleReport {
    debug!(mode = ?mode, steps = sequence.len(), dry_run, "scheduling run");
    let mut report = ScheduleReport {
        results: Vec::new(),
        success: true,
    };

    for name in sequence {
        let result = match mode {
            Mode::Clean => run_clean(graph, name, dry_run),
            Mode::Build => run_build(graph, name, dry_run),
        };

        let failed = result.ran && !result.success;
        if failed {
            warn!(target = %result.name, message = %result.message, "target failed, halting");
        }
        report.results.push(result);
        if failed {
            report.success = false;
            break;
        }
    }

    info!(ran = report.results.iter().filter(|r| r.ran).count(), success = report.success, "run complete");
    report
}

fn run_clean(graph: &mut Graph, name: &str, dry_run: bool) -> TargetResult {
    let Some(target) = graph.get(name) else {
        return TargetResult {
            name: name.to_string(),
            ran: false,
            success: false,
            message: "unknown target".to_string(),
        };
    };

    let Some(clean_action) = target.clean_action.clone() else {
        return TargetResult {
            name: name.to_string(),
            ran: false,
            success: true,
            message: "no clean action".to_string(),
        };
    };

    if dry_run {
        return TargetResult {
            name: name.to_string(),
            ran: false,
            success: true,
            message: "would clean".to_string(),
        };
    }

    let outcome = clean_action(target);
    apply_field_updates(graph, name, outcome.field_updates.as_ref());
    TargetResult {
        name: name.to_string(),
        ran: true,
        success: outcome.success,
        message: outcome.status_message,
    }
}

fn run_build(graph: &mut Graph, name: &str, dry_run: bool) -> TargetResult {
    let Some(target) = graph.get(name) else {
        return TargetResult {
            name: name.to_string(),
            ran: false,
            success: false,
            message: "unknown target".to_string(),
        };
    };

    if !needs_update(graph, name) {
        return TargetResult {
            name: name.to_string(),
            ran: false,
            success: true,
            message: "up to date".to_string(),
        };
    }

    let target = graph.get(name).expect("checked above");
    let Some(action) = target.action.clone() else {
        return TargetResult {
            name: name.to_string(),
            ran: false,
            success: false,
            message: "no action".to_string(),
        };
    };

    if dry_run {
        return TargetResult {
            name: name.to_string(),
            ran: false,
            success: true,
            message: "would build".to_string(),
        };
    }

    let outcome = action(target);
    apply_field_updates(graph, name, outcome.field_updates.as_ref());
    TargetResult {
        name: name.to_string(),
        ran: true,
        success: outcome.success,
        message: outcome.status_message,
    }
}

/// A target needs a rebuild if it has no recorded timestamp (no artifact,
/// or artifact missing) or if any concrete dependency's timestamp is newer
/// than its own.
fn needs_update(graph: &Graph, name: &str) -> bool {
    let target = graph.get(name).expect("scheduled target exists in graph");
    if target.timestamp == 0.0 {
        return true;
    }
    target
        .non_abstract_depends(graph)
        .iter()
        .filter_map(|dep| graph.get(dep))
        .any(|dep| dep.timestamp > target.timestamp)
}

fn apply_field_updates(graph: &mut Graph, name: &str, updates: Option<&FieldUpdates>) {
    let Some(updates) = updates else { return };
    if let Some(layers) = &updates.layers {
        if let Some(target) = graph.get_mut(name) {
            target.layers = Some(layers.clone());
        }
    }
}
