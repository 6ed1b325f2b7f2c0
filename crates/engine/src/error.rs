// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine runtime

use cf_core::{CaseId, DefinitionError, EventKind};
use cf_storage::StoreError;
use thiserror::Error;

/// Errors that can occur in the runtime.
///
/// User step/route failures never surface here; they become error pends
/// on the case. These variants are the fatal conditions.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid definition: {0}")]
    Definition(#[from] DefinitionError),
    #[error("case already started: {0}")]
    CaseAlreadyStarted(CaseId),
    #[error("case not found: {0}")]
    CaseNotFound(CaseId),
    #[error("case already complete: {0}")]
    CaseAlreadyComplete(CaseId),
    #[error("case not complete: {0}")]
    CaseNotComplete(CaseId),
    #[error("case {case_id}: invalid case id (empty or contains the key separator)")]
    InvalidCaseId { case_id: CaseId },
    #[error("case {case_id}: step not found: {step}")]
    StepNotFound { case_id: CaseId, step: String },
    #[error("case {case_id}: ticket not found: {ticket}")]
    TicketNotFound { case_id: CaseId, ticket: String },
    #[error("case {case_id}: state cannot be repaired: {reason}")]
    Unrepairable { case_id: CaseId, reason: String },
    #[error("case {case_id}: route {step} returned an invalid response: {reason}")]
    InvalidRouteResponse { case_id: CaseId, step: String, reason: String },
    #[error("case {case_id}: invalid pend state on {path}: {reason}")]
    InvalidPendState { case_id: CaseId, path: String, reason: String },
    #[error("case {case_id}: event handler failed on {event}: {message}")]
    EventHandler { case_id: CaseId, event: EventKind, message: String },
    #[error("case {case_id}: not pended")]
    NotPended { case_id: CaseId },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}
