// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events fired to the external handler.

use crate::case::CaseId;
use crate::exec_path::ResponseType;
use crate::response::PendError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Fresh case started
    ProcessStart,
    /// Explicit resume of a pended case
    ProcessResume,
    /// Root execution returned with a pending state
    ProcessPend,
    /// Root execution returned with completion
    ProcessComplete,
    /// Completed case revived via a ticket
    ProcessReopen,
    /// Outstanding ticket first observed at a control point
    TicketRaised,
    /// PERSIST step dispatched
    Persist,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::ProcessStart => "process_start",
            EventKind::ProcessResume => "process_resume",
            EventKind::ProcessPend => "process_pend",
            EventKind::ProcessComplete => "process_complete",
            EventKind::ProcessReopen => "process_reopen",
            EventKind::TicketRaised => "ticket_raised",
            EventKind::Persist => "persist",
        };
        write!(f, "{}", s)
    }
}

/// Context handed to the event handler and the SLA queue manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub journey: String,
    pub case_id: CaseId,
    /// Step the event applies to (empty for case-level events)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub step: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exec_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub work_basket: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prev_work_basket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    #[serde(default)]
    pub is_pend_at_same_step: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ticket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pend_error: Option<PendError>,
}
