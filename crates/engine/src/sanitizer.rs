// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash repair.
//!
//! A process can die between any two persisted writes, leaving the last
//! snapshot with paths still marked started, a ticket with no carrier, or
//! no pend pointer. This pass deterministically restores the state
//! invariants so a resume can proceed; running it on already-repaired
//! state changes nothing.

use cf_core::{baskets, ExecPath, PathStatus, ResponseType, StepKind, WorkflowDefinition, WorkflowInfo};
use thiserror::Error;
use tracing::warn;

/// The state cannot be brought back to a runnable shape.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct SanitizeError {
    pub reason: String,
}

/// Repair a loaded info document in place. Returns whether anything was
/// changed.
pub fn sanitize(
    info: &mut WorkflowInfo,
    definition: &WorkflowDefinition,
) -> Result<bool, SanitizeError> {
    let mut changed = false;

    derive_completion(info, &mut changed);
    restore_ticket_carrier(info, &mut changed);
    settle_interrupted_paths(info, definition, &mut changed);
    settle_interrupted_routes(info, definition, &mut changed);
    repair_pend_pointer(info, &mut changed)?;

    if changed {
        warn!(case = %info.case_id, "sanitized state left by an interrupted run");
    }
    Ok(changed)
}

/// Rule 1: a never-written completion flag is derived from the paths.
fn derive_completion(info: &mut WorkflowInfo, changed: &mut bool) {
    if info.is_complete.is_none() {
        let complete = !info.exec_paths.is_empty() && info.all_paths_settled();
        info.is_complete = Some(complete);
        *changed = true;
    }
}

/// Rule 2: a case ticket with no carrier path is stamped onto the
/// shortest-named path, pended at the holding basket.
fn restore_ticket_carrier(info: &mut WorkflowInfo, changed: &mut bool) {
    if info.ticket.is_empty() {
        return;
    }
    if info.exec_paths.values().any(|p| p.ticket == info.ticket) {
        return;
    }
    let carrier = info
        .exec_paths
        .values()
        .map(|p| p.name.clone())
        .min_by_key(|n| n.len());
    if let Some(name) = carrier {
        let ticket = info.ticket.clone();
        if let Some(path) = info.exec_paths.get_mut(&name) {
            path.ticket = ticket;
            path.status = PathStatus::Completed;
            path.pend_work_basket = baskets::TEMP_HOLD.to_string();
            path.response_type = Some(ResponseType::OkPend);
            *changed = true;
        }
    }
}

/// Rule 3 (all kinds except parallel routes): an interrupted path is
/// completed and pended so it gets re-dispatched on resume.
fn settle_interrupted_paths(
    info: &mut WorkflowInfo,
    definition: &WorkflowDefinition,
    changed: &mut bool,
) {
    for path in info.exec_paths.values_mut() {
        if path.status != PathStatus::Started {
            continue;
        }
        let kind = definition.step(&path.step).map(|s| s.kind);
        if matches!(kind, Some(k) if k.is_parallel_route()) {
            continue;
        }
        path.status = PathStatus::Completed;
        path.pend_work_basket = holding_basket(path);
        path.response_type = match (kind, path.response_type) {
            (_, None) => Some(ResponseType::OkPendEor),
            // An already-observed task response must not re-run the task
            (Some(StepKind::Task) | None, Some(ResponseType::OkProceed)) => {
                Some(ResponseType::OkPend)
            }
            // Routes and markers re-evaluate the same step
            (_, Some(ResponseType::OkProceed)) => Some(ResponseType::OkPendEor),
            (_, other) => other,
        };
        *changed = true;
    }
}

/// Rule 3 (parallel routes): no thread survives a crash, so the route
/// path cannot stay started. When every child already settled at the
/// join the route becomes a resumable pend and re-runs once; otherwise
/// the pended children own recovery and the last of them re-identifies
/// as this path.
fn settle_interrupted_routes(
    info: &mut WorkflowInfo,
    definition: &WorkflowDefinition,
    changed: &mut bool,
) {
    let interrupted: Vec<(String, String)> = info
        .exec_paths
        .values()
        .filter(|p| p.status == PathStatus::Started)
        .filter(|p| {
            definition
                .step(&p.step)
                .is_some_and(|s| s.kind.is_parallel_route())
        })
        .map(|p| (p.name.clone(), p.step.clone()))
        .collect();

    for (name, route_step) in interrupted {
        let child_prefix = format!("{name}{route_step}.");
        let child_depth = cf_core::depth(&name) + 2;
        let children_settled = info
            .exec_paths
            .values()
            .filter(|c| c.name.starts_with(&child_prefix) && c.depth() == child_depth)
            .all(|c| c.status == PathStatus::Completed && !c.is_pended());

        if let Some(path) = info.exec_paths.get_mut(&name) {
            path.status = PathStatus::Completed;
            if children_settled {
                path.pend_work_basket = holding_basket(path);
                path.response_type = Some(ResponseType::OkPendEor);
            }
            *changed = true;
        }
    }
}

/// Rule 4: an incomplete case without a valid pend pointer gets the
/// deepest pended path; none at all is unrepairable. Skipped while a
/// ticket is outstanding (resume unwinds to the ticket target instead).
fn repair_pend_pointer(info: &mut WorkflowInfo, changed: &mut bool) -> Result<(), SanitizeError> {
    if info.complete() || !info.ticket.is_empty() {
        return Ok(());
    }
    let valid = !info.pend_exec_path.is_empty()
        && info
            .path(&info.pend_exec_path)
            .is_some_and(|p| p.is_pended());
    if valid {
        return Ok(());
    }
    let deepest = info.deepest_pended_path().map(|p| p.name.clone());
    match deepest {
        Some(name) => {
            info.pend_exec_path = name;
            *changed = true;
            Ok(())
        }
        None => Err(SanitizeError {
            reason: "incomplete case has no pended exec path".to_string(),
        }),
    }
}

fn holding_basket(path: &ExecPath) -> String {
    if path.prev_pend_work_basket.is_empty() {
        baskets::TEMP_HOLD.to_string()
    } else {
        path.prev_pend_work_basket.clone()
    }
}

#[cfg(test)]
#[path = "sanitizer_tests.rs"]
mod tests;
