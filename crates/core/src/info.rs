// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted per-case state document.

use crate::case::CaseId;
use crate::exec_path::{ExecPath, PathStatus, ResponseType};
use crate::variable::VariableValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mutable per-case state, persisted after every step under aggressive
/// persistence. Exactly one document exists per case id.
///
/// `is_complete` is an Option so crash repair can distinguish "never
/// written" from "written false".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInfo {
    pub case_id: CaseId,
    /// Name of the workflow definition this case runs
    #[serde(default)]
    pub journey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    /// Case-level ticket; first raiser wins
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ticket: String,
    /// How the ticket raiser pended (or OK_PROCEED)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_response_type: Option<ResponseType>,
    /// Name of the deepest currently-pended exec path; `"."` after ticket
    /// unification
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pend_exec_path: String,
    #[serde(default)]
    pub is_pend_at_same_step: bool,
    #[serde(default)]
    pub exec_paths: IndexMap<String, ExecPath>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableValue>,
}

impl WorkflowInfo {
    pub fn new(case_id: CaseId, journey: impl Into<String>) -> Self {
        Self {
            case_id,
            journey: journey.into(),
            is_complete: Some(false),
            ticket: String::new(),
            ticket_response_type: None,
            pend_exec_path: String::new(),
            is_pend_at_same_step: false,
            exec_paths: IndexMap::new(),
            variables: BTreeMap::new(),
        }
    }

    /// Completion flag, treating "never written" as not complete.
    pub fn complete(&self) -> bool {
        self.is_complete.unwrap_or(false)
    }

    pub fn path(&self, name: &str) -> Option<&ExecPath> {
        self.exec_paths.get(name)
    }

    /// The deepest path with a non-empty pend basket. Ties keep the first
    /// in declaration order.
    pub fn deepest_pended_path(&self) -> Option<&ExecPath> {
        let mut best: Option<&ExecPath> = None;
        for path in self.exec_paths.values().filter(|p| p.is_pended()) {
            match best {
                Some(b) if path.depth() <= b.depth() => {}
                _ => best = Some(path),
            }
        }
        best
    }

    /// Check the completion condition: every path completed with an empty
    /// pend basket.
    pub fn all_paths_settled(&self) -> bool {
        self.exec_paths
            .values()
            .all(|p| p.status == PathStatus::Completed && !p.is_pended())
    }
}

#[cfg(test)]
#[path = "info_tests.rs"]
mod tests;
