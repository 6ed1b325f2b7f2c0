// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory per-case state shared by every exec path of a live run.
//!
//! The root fields (exec-path set, ticket, pend pointer, completion) are
//! guarded by one per-case mutex; critical sections never span awaits.
//! Variables live outside the lock in their own per-key concurrent map.

use cf_core::{
    depth, CaseId, EventContext, ExecPath, ResponseType, Variables, WorkflowDefinition,
    WorkflowInfo, ROOT_PATH,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Mutable root of a case, guarded by the case mutex.
pub(crate) struct CaseRoot {
    pub is_complete: bool,
    pub ticket: String,
    pub ticket_response_type: Option<ResponseType>,
    pub pend_exec_path: String,
    pub is_pend_at_same_step: bool,
    /// Step the case was pended at when last resumed (not persisted)
    pub last_pend_step: String,
    pub exec_paths: IndexMap<String, ExecPath>,
}

impl CaseRoot {
    pub fn path(&self, name: &str) -> Option<&ExecPath> {
        self.exec_paths.get(name)
    }

    pub fn path_mut(&mut self, name: &str) -> Option<&mut ExecPath> {
        self.exec_paths.get_mut(name)
    }

    pub fn upsert_path(&mut self, path: ExecPath) {
        self.exec_paths.insert(path.name.clone(), path);
    }

    pub fn has_ticket(&self) -> bool {
        !self.ticket.is_empty()
    }

    /// First raiser wins: sets the case ticket only when none is live.
    /// Returns whether this raise took the slot.
    pub fn raise_ticket(&mut self, ticket: &str, response: ResponseType) -> bool {
        if self.has_ticket() {
            return false;
        }
        self.ticket = ticket.to_string();
        self.ticket_response_type = Some(response);
        true
    }

    /// Depth rule for the case pend pointer: a deeper path replaces a
    /// shallower one, ties keep the incumbent, and the literal root
    /// always wins (post-ticket unification).
    pub fn set_pend_exec_path(&mut self, name: &str) {
        if name == ROOT_PATH {
            self.pend_exec_path = ROOT_PATH.to_string();
            return;
        }
        if self.pend_exec_path.is_empty() || depth(name) > depth(&self.pend_exec_path) {
            self.pend_exec_path = name.to_string();
        }
    }
}

/// Shared handle to a live case.
pub(crate) struct CaseState {
    pub case_id: CaseId,
    pub definition: Arc<WorkflowDefinition>,
    pub variables: Variables,
    /// Serializes event-handler invocations that the contract requires
    /// to fire under the case mutex (persist, ticket observation)
    pub event_gate: tokio::sync::Mutex<()>,
    root: Mutex<CaseRoot>,
}

impl CaseState {
    /// Fresh case: no exec paths yet, variables from the definition.
    pub fn fresh(case_id: CaseId, definition: Arc<WorkflowDefinition>) -> Self {
        let variables = Variables::from_decls(&definition.variables);
        Self {
            case_id,
            definition,
            variables,
            event_gate: tokio::sync::Mutex::new(()),
            root: Mutex::new(CaseRoot {
                is_complete: false,
                ticket: String::new(),
                ticket_response_type: None,
                pend_exec_path: String::new(),
                is_pend_at_same_step: false,
                last_pend_step: String::new(),
                exec_paths: IndexMap::new(),
            }),
        }
    }

    /// Rebuild the live state from a persisted (sanitized) document.
    pub fn hydrate(definition: Arc<WorkflowDefinition>, info: WorkflowInfo) -> Self {
        let variables = Variables::from_snapshot(info.variables);
        Self {
            case_id: info.case_id,
            definition,
            variables,
            event_gate: tokio::sync::Mutex::new(()),
            root: Mutex::new(CaseRoot {
                is_complete: info.is_complete.unwrap_or(false),
                ticket: info.ticket,
                ticket_response_type: info.ticket_response_type,
                pend_exec_path: info.pend_exec_path,
                is_pend_at_same_step: info.is_pend_at_same_step,
                last_pend_step: String::new(),
                exec_paths: info.exec_paths,
            }),
        }
    }

    pub fn with_root<T>(&self, f: impl FnOnce(&CaseRoot) -> T) -> T {
        let guard = self.root.lock();
        f(&guard)
    }

    pub fn with_root_mut<T>(&self, f: impl FnOnce(&mut CaseRoot) -> T) -> T {
        let mut guard = self.root.lock();
        f(&mut guard)
    }

    /// Assemble the persistable document.
    pub fn snapshot(&self) -> WorkflowInfo {
        let variables = self.variables.snapshot();
        self.with_root(|r| WorkflowInfo {
            case_id: self.case_id.clone(),
            journey: self.definition.name.clone(),
            is_complete: Some(r.is_complete),
            ticket: r.ticket.clone(),
            ticket_response_type: r.ticket_response_type,
            pend_exec_path: r.pend_exec_path.clone(),
            is_pend_at_same_step: r.is_pend_at_same_step,
            exec_paths: r.exec_paths.clone(),
            variables,
        })
    }

    /// Event context derived from one exec path of this case.
    pub fn event_context(&self, step: &str, exec_path: &str) -> EventContext {
        self.with_root(|r| {
            let path = r.path(exec_path);
            EventContext {
                journey: self.definition.name.clone(),
                case_id: self.case_id.clone(),
                step: if step.is_empty() {
                    path.map(|p| p.step.clone()).unwrap_or_default()
                } else {
                    step.to_string()
                },
                exec_path: exec_path.to_string(),
                work_basket: path.map(|p| p.pend_work_basket.clone()).unwrap_or_default(),
                prev_work_basket: path.map(|p| p.prev_pend_work_basket.clone()).unwrap_or_default(),
                response_type: path.and_then(|p| p.response_type),
                is_pend_at_same_step: r.is_pend_at_same_step,
                ticket: r.ticket.clone(),
                pend_error: path.and_then(|p| p.pend_error.clone()),
            }
        })
    }
}

#[cfg(test)]
#[path = "case_state_tests.rs"]
mod tests;
