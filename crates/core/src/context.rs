// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only context handed to user components.

use crate::case::CaseId;
use crate::response::PendError;
use crate::step::StepKind;
use crate::variable::Variables;

/// Snapshot passed by value to the component factory and to task/route
/// code. Everything except `variables` is frozen at dispatch time;
/// `variables` is the live shared map of the case.
#[derive(Debug, Clone)]
pub struct Context {
    /// Name of the workflow definition
    pub journey: String,
    pub case_id: CaseId,
    /// Step being dispatched
    pub step: String,
    pub step_kind: StepKind,
    /// Component key from the step definition
    pub component: String,
    pub user_data: String,
    /// Name of the exec path running this step
    pub exec_path: String,
    /// Live shared variables; writes are atomic per variable
    pub variables: Variables,
    /// Current pend basket of the path (normally empty while running)
    pub pend_work_basket: String,
    /// Basket the path was pended at before the current dispatch
    pub last_pend_work_basket: String,
    /// Step the case was pended at when it was last resumed
    pub last_pend_step: String,
    pub pend_error: Option<PendError>,
    /// True when the case woke up at the same pend point it was pended at
    pub is_pend_at_same_step: bool,
    /// Outstanding case-level ticket, if any
    pub ticket: String,
}
