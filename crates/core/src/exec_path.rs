// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exec paths: one live branch of execution within a case.
//!
//! Path names form a prefix tree rooted at `"."`. The child spawned for
//! branch `B` of route `R` under parent `P` is named `<P><R>.<B>.`, so
//! depth is simply the number of dots in the name.

use crate::response::PendError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the root exec path.
pub const ROOT_PATH: &str = ".";

/// Whether an exec path is still running or has come to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStatus {
    Started,
    Completed,
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PathStatus::Started => "started",
            PathStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// The four response types; determine the control-flow action taken after
/// a step returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Continue to the next step
    OkProceed,
    /// Pend; on resume the cursor advances past the step
    OkPend,
    /// Pend at end-of-response; on resume the same step re-evaluates
    OkPendEor,
    /// Pend into an error basket with an error record
    ErrorPend,
}

impl ResponseType {
    /// Check if this response suspends the exec path.
    pub fn is_pend(&self) -> bool {
        !matches!(self, ResponseType::OkProceed)
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseType::OkProceed => "ok_proceed",
            ResponseType::OkPend => "ok_pend",
            ResponseType::OkPendEor => "ok_pend_eor",
            ResponseType::ErrorPend => "error_pend",
        };
        write!(f, "{}", s)
    }
}

/// One live branch of execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecPath {
    /// Hierarchical dotted label, root = `"."`
    pub name: String,
    pub status: PathStatus,
    /// Step last executed or about to execute
    pub step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    /// Work basket this path is pended at (empty = not pended)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pend_work_basket: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prev_pend_work_basket: String,
    /// To-be-cleared basket for SLA derivation across OK_PEND_EOR pends
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tbc_sla_work_basket: String,
    /// Ticket raised by this path (empty if none)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ticket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pend_error: Option<PendError>,
}

impl ExecPath {
    /// Create a started path with its cursor on `step`.
    pub fn new(name: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: PathStatus::Started,
            step: step.into(),
            response_type: None,
            pend_work_basket: String::new(),
            prev_pend_work_basket: String::new(),
            tbc_sla_work_basket: String::new(),
            ticket: String::new(),
            pend_error: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_PATH
    }

    pub fn depth(&self) -> usize {
        depth(&self.name)
    }

    /// Check if this path is pended at a work basket.
    pub fn is_pended(&self) -> bool {
        !self.pend_work_basket.is_empty()
    }

    /// Record a pend, rotating the current basket into the previous slot.
    pub fn set_pend(&mut self, work_basket: impl Into<String>, response: ResponseType) {
        if !self.pend_work_basket.is_empty() {
            self.prev_pend_work_basket = std::mem::take(&mut self.pend_work_basket);
        }
        self.pend_work_basket = work_basket.into();
        self.response_type = Some(response);
    }

    /// Clear the pend basket (on resume), keeping it as the previous basket.
    pub fn clear_pend(&mut self) {
        if !self.pend_work_basket.is_empty() {
            self.prev_pend_work_basket = std::mem::take(&mut self.pend_work_basket);
        }
    }
}

/// Depth of a path name: its dot count. Root is 1.
pub fn depth(name: &str) -> usize {
    name.chars().filter(|c| *c == '.').count()
}

/// Name of the child path for `branch` of `route` under `parent`.
pub fn child_name(parent: &str, route: &str, branch: &str) -> String {
    format!("{parent}{route}.{branch}.")
}

/// The common name prefix shared by a path and its siblings under one
/// parallel route. For `".p.A."` this is `".p."`.
pub fn sibling_prefix(name: &str) -> String {
    if name == ROOT_PATH {
        return ROOT_PATH.to_string();
    }
    let trimmed = &name[..name.len().saturating_sub(1)];
    match trimmed.rfind('.') {
        Some(i) => name[..=i].to_string(),
        None => ROOT_PATH.to_string(),
    }
}

/// Name of the parent path: the longest strict prefix that is itself a
/// path name. The root is its own parent.
pub fn parent_name(name: &str) -> String {
    sibling_prefix(&sibling_prefix(name))
}

/// The route step this path is a branch of, encoded as the second-to-last
/// segment of its name. `".p.A."` was forked by route `"p"`; the root has
/// no route.
pub fn route_of(name: &str) -> Option<&str> {
    if name == ROOT_PATH {
        return None;
    }
    let trimmed = name.trim_matches('.');
    let mut segments = trimmed.rsplit('.');
    segments.next();
    segments.next()
}

#[cfg(test)]
#[path = "exec_path_tests.rs"]
mod tests;
