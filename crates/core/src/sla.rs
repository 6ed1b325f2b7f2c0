// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SLA milestones.
//!
//! The engine only derives enqueue/dequeue signals; deadline tracking and
//! escalation policy live in the external queue manager.

use serde::{Deserialize, Serialize};

/// When a milestone becomes eligible for enqueueing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupOn {
    /// When the case starts
    CaseStart,
    /// When a resumed case pends again at the same step
    CaseRestart,
    /// When the case pends at the milestone's work basket
    WorkBasketEntry,
}

/// A time-based deadline tracked by the external SLA queue manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub setup_on: SetupOn,
    /// Basket this milestone watches (WorkBasketEntry only)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub work_basket: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_data: String,
}

impl Milestone {
    pub fn on_case_start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup_on: SetupOn::CaseStart,
            work_basket: String::new(),
            user_data: String::new(),
        }
    }

    pub fn on_case_restart(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup_on: SetupOn::CaseRestart,
            work_basket: String::new(),
            user_data: String::new(),
        }
    }

    pub fn on_work_basket(name: impl Into<String>, work_basket: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup_on: SetupOn::WorkBasketEntry,
            work_basket: work_basket.into(),
            user_data: String::new(),
        }
    }

    /// Check if this milestone fires when the case enters `work_basket`.
    pub fn applies_to_basket(&self, work_basket: &str) -> bool {
        self.setup_on == SetupOn::WorkBasketEntry && self.work_basket == work_basket
    }
}
