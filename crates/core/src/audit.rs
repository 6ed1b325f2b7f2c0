// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit records: one durable entry per step execution.

use crate::case::CaseId;
use crate::exec_path::ResponseType;
use crate::step::StepKind;
use crate::variable::VariableValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One durable log entry per step execution, sequence-numbered per case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub case_id: CaseId,
    pub seq: u64,
    pub step: String,
    pub kind: StepKind,
    pub exec_path: String,
    /// Branches chosen, for route steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub work_basket: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ticket: String,
    /// Point-in-time variable snapshot, when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, VariableValue>>,
    pub started_at_ms: u64,
    pub recorded_at_ms: u64,
}
