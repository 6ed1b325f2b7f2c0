// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow definitions.
//!
//! A definition is the immutable graph and metadata for a process type.
//! How a definition gets built (hand-written JSON, generated from another
//! format, constructed in code) is out of scope; the engine only consumes
//! the validated shape.

use crate::step::{Step, StepKind, Ticket, END_STEP};
use crate::variable::VariableDecl;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors found while validating a definition
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("workflow {workflow} has no steps")]
    Empty { workflow: String },
    #[error("step {step}: missing next pointer")]
    MissingNext { step: String },
    #[error("step {step}: unknown target step: {target}")]
    UnknownTarget { step: String, target: String },
    #[error("step {step}: route declares no branches")]
    NoBranches { step: String },
    #[error("step {step}: parallel route has no join pointer")]
    MissingJoin { step: String },
    #[error("step {step}: join target {join} is not a p_join")]
    BadJoin { step: String, join: String },
    #[error("ticket {ticket}: unknown target step: {target}")]
    BadTicketTarget { ticket: String, target: String },
}

/// The immutable graph and metadata for a process type.
///
/// Step order is preserved; the first declared step is where a fresh case
/// starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_steps")]
    pub steps: IndexMap<String, Step>,
    #[serde(default)]
    pub tickets: IndexMap<String, Ticket>,
    /// Initial variable schema applied when a case is created
    #[serde(default)]
    pub variables: Vec<VariableDecl>,
}

/// Deserialize steps from a map of labeled blocks, injecting the map key as
/// the step name when the entry leaves it empty.
fn deserialize_steps<'de, D>(deserializer: D) -> Result<IndexMap<String, Step>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut map = IndexMap::<String, Step>::deserialize(deserializer)?;
    for (key, step) in map.iter_mut() {
        if step.name.is_empty() {
            step.name = key.clone();
        }
    }
    Ok(map)
}

impl WorkflowDefinition {
    /// Create an empty definition with the given journey name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: IndexMap::new(),
            tickets: IndexMap::new(),
            variables: Vec::new(),
        }
    }

    /// Add a step. Declaration order is execution-relevant: the first step
    /// added is the start step.
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.insert(step.name.clone(), step);
        self
    }

    /// Add a ticket.
    pub fn with_ticket(mut self, ticket: Ticket) -> Self {
        self.tickets.insert(ticket.name.clone(), ticket);
        self
    }

    /// Add an initial variable declaration.
    pub fn with_variable(mut self, decl: VariableDecl) -> Self {
        self.variables.push(decl);
        self
    }

    /// The declared start step (first in declaration order).
    pub fn start_step(&self) -> Option<&Step> {
        self.steps.values().next()
    }

    /// Get a step by name.
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    /// Get a ticket by name.
    pub fn ticket(&self, name: &str) -> Option<&Ticket> {
        self.tickets.get(name)
    }

    /// Check the graph for dangling pointers and malformed shapes.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.steps.is_empty() {
            return Err(DefinitionError::Empty { workflow: self.name.clone() });
        }

        for step in self.steps.values() {
            match step.kind {
                StepKind::Task | StepKind::Pause | StepKind::Persist | StepKind::PJoin => {
                    let next = step.next.as_deref().ok_or_else(|| {
                        DefinitionError::MissingNext { step: step.name.clone() }
                    })?;
                    self.check_target(&step.name, next)?;
                }
                StepKind::SRoute => {
                    self.check_branches(step)?;
                }
                StepKind::PRoute | StepKind::PRouteDynamic => {
                    self.check_branches(step)?;
                    let join = step.join.as_deref().ok_or_else(|| {
                        DefinitionError::MissingJoin { step: step.name.clone() }
                    })?;
                    match self.steps.get(join) {
                        Some(j) if j.kind == StepKind::PJoin => {}
                        _ => {
                            return Err(DefinitionError::BadJoin {
                                step: step.name.clone(),
                                join: join.to_string(),
                            })
                        }
                    }
                }
            }
        }

        for ticket in self.tickets.values() {
            if !self.steps.contains_key(&ticket.step) {
                return Err(DefinitionError::BadTicketTarget {
                    ticket: ticket.name.clone(),
                    target: ticket.step.clone(),
                });
            }
        }

        Ok(())
    }

    fn check_branches(&self, step: &Step) -> Result<(), DefinitionError> {
        if step.branches.is_empty() {
            return Err(DefinitionError::NoBranches { step: step.name.clone() });
        }
        for branch in &step.branches {
            self.check_target(&step.name, &branch.next)?;
        }
        Ok(())
    }

    fn check_target(&self, step: &str, target: &str) -> Result<(), DefinitionError> {
        if target == END_STEP || self.steps.contains_key(target) {
            Ok(())
        } else {
            Err(DefinitionError::UnknownTarget {
                step: step.to_string(),
                target: target.to_string(),
            })
        }
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
