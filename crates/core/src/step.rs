// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step and ticket definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the synthetic terminal step. Never present in a definition;
/// a `next` pointer targeting it completes the exec path.
pub const END_STEP: &str = "end";

/// What a step does when the interpreter reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Invokes user task code
    Task,
    /// Singular route: picks exactly one branch
    SRoute,
    /// Parallel route with a static branch set
    PRoute,
    /// Parallel route whose branches are chosen at runtime
    PRouteDynamic,
    /// Synchronization point where parallel branches converge
    PJoin,
    /// Unconditional pend
    Pause,
    /// Checkpoint marker
    Persist,
}

impl StepKind {
    /// Check if this kind forks child exec paths.
    pub fn is_parallel_route(&self) -> bool {
        matches!(self, StepKind::PRoute | StepKind::PRouteDynamic)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepKind::Task => "task",
            StepKind::SRoute => "s_route",
            StepKind::PRoute => "p_route",
            StepKind::PRouteDynamic => "p_route_dynamic",
            StepKind::PJoin => "p_join",
            StepKind::Pause => "pause",
            StepKind::Persist => "persist",
        };
        write!(f, "{}", s)
    }
}

/// One outgoing edge of a route, pointing to a next step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub next: String,
}

impl Branch {
    pub fn new(name: impl Into<String>, next: impl Into<String>) -> Self {
        Self { name: name.into(), next: next.into() }
    }
}

/// A labelled goto: raising the ticket unwinds any parallel structure and
/// resumes the case at the target step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub name: String,
    pub step: String,
}

impl Ticket {
    pub fn new(name: impl Into<String>, step: impl Into<String>) -> Self {
        Self { name: name.into(), step: step.into() }
    }
}

/// A node in the workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step name (injected from the map key on deserialization)
    #[serde(default)]
    pub name: String,
    pub kind: StepKind,
    /// User-code key handed to the component factory
    #[serde(default)]
    pub component: String,
    /// Opaque payload passed through to user code
    #[serde(default)]
    pub user_data: String,
    /// Next step for task/pause/persist/p_join steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Outgoing branches for route steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<Branch>,
    /// The convergence step all branches of a parallel route target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<String>,
}

impl Step {
    /// A task step invoking the named component.
    pub fn task(name: impl Into<String>, component: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::Task,
            component: component.into(),
            user_data: String::new(),
            next: Some(next.into()),
            branches: Vec::new(),
            join: None,
        }
    }

    /// An unconditional pend.
    pub fn pause(name: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::Pause,
            component: String::new(),
            user_data: String::new(),
            next: Some(next.into()),
            branches: Vec::new(),
            join: None,
        }
    }

    /// A checkpoint marker.
    pub fn persist(name: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::Persist,
            component: String::new(),
            user_data: String::new(),
            next: Some(next.into()),
            branches: Vec::new(),
            join: None,
        }
    }

    /// A singular route picking exactly one of `branches`.
    pub fn s_route(
        name: impl Into<String>,
        component: impl Into<String>,
        branches: Vec<Branch>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::SRoute,
            component: component.into(),
            user_data: String::new(),
            next: None,
            branches,
            join: None,
        }
    }

    /// A parallel route forking every declared branch.
    pub fn p_route(
        name: impl Into<String>,
        component: impl Into<String>,
        branches: Vec<Branch>,
        join: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::PRoute,
            component: component.into(),
            user_data: String::new(),
            next: None,
            branches,
            join: Some(join.into()),
        }
    }

    /// A parallel route whose branch subset is chosen by user code at runtime.
    pub fn p_route_dynamic(
        name: impl Into<String>,
        component: impl Into<String>,
        branches: Vec<Branch>,
        join: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::PRouteDynamic,
            component: component.into(),
            user_data: String::new(),
            next: None,
            branches,
            join: Some(join.into()),
        }
    }

    /// A join synchronizing the branches of a parallel route.
    pub fn p_join(name: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::PJoin,
            component: String::new(),
            user_data: String::new(),
            next: Some(next.into()),
            branches: Vec::new(),
            join: None,
        }
    }

    /// Attach a user-data payload.
    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = user_data.into();
        self
    }

    /// Get a declared branch by name.
    pub fn branch(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.name == name)
    }
}
