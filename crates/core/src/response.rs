// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responses returned by user task and route components.

use crate::exec_path::ResponseType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error record embedded in an exec path on ERROR_PEND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,
    /// Hint for an external retry scheduler; the engine never retries.
    #[serde(default)]
    pub retryable: bool,
}

impl PendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: String::new(),
            retryable: false,
        }
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

/// Error surfaced by user components or the component factory. The engine
/// converts it into an error pend at the configured system error basket.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ComponentError(pub String);

impl ComponentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<&str> for ComponentError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ComponentError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What a task component tells the engine to do next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub response_type: ResponseType,
    /// Required for any pend response
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub work_basket: String,
    /// Optional ticket to raise; must name a ticket in the definition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ticket: String,
    /// Required for ERROR_PEND
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PendError>,
}

impl TaskResponse {
    pub fn proceed() -> Self {
        Self {
            response_type: ResponseType::OkProceed,
            work_basket: String::new(),
            ticket: String::new(),
            error: None,
        }
    }

    pub fn proceed_with_ticket(ticket: impl Into<String>) -> Self {
        Self { ticket: ticket.into(), ..Self::proceed() }
    }

    pub fn pend(work_basket: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::OkPend,
            work_basket: work_basket.into(),
            ticket: String::new(),
            error: None,
        }
    }

    pub fn pend_eor(work_basket: impl Into<String>) -> Self {
        Self { response_type: ResponseType::OkPendEor, ..Self::pend(work_basket) }
    }

    pub fn error_pend(work_basket: impl Into<String>, error: PendError) -> Self {
        Self {
            response_type: ResponseType::ErrorPend,
            work_basket: work_basket.into(),
            ticket: String::new(),
            error: Some(error),
        }
    }

    pub fn with_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.ticket = ticket.into();
        self
    }
}

/// What a route component tells the engine. Singular routes return exactly
/// one branch; dynamic parallel routes one or more. Pending response types
/// are a contract violation on routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub work_basket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PendError>,
}

impl RouteResponse {
    /// Proceed down a single branch.
    pub fn take(branch: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::OkProceed,
            branches: vec![branch.into()],
            work_basket: String::new(),
            error: None,
        }
    }

    /// Proceed down several branches (dynamic parallel routes).
    pub fn take_all(branches: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::OkProceed,
            branches,
            work_basket: String::new(),
            error: None,
        }
    }

    pub fn error_pend(work_basket: impl Into<String>, error: PendError) -> Self {
        Self {
            response_type: ResponseType::ErrorPend,
            branches: Vec::new(),
            work_basket: work_basket.into(),
            error: Some(error),
        }
    }
}
