// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-code boundary: the component factory and the task/route traits.

use async_trait::async_trait;
use cf_core::{ComponentError, Context, RouteResponse, TaskResponse};
use std::sync::Arc;

/// User code behind a TASK step.
///
/// An `Err` (or a panic inside the implementation) is converted by the
/// engine into an error pend at the configured system error basket.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn execute_step(&self, ctx: &Context) -> Result<TaskResponse, ComponentError>;
}

/// User code behind a route step (singular or parallel).
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn execute_route(&self, ctx: &Context) -> Result<RouteResponse, ComponentError>;
}

/// What the factory hands back for a step.
#[derive(Clone)]
pub enum Component {
    Task(Arc<dyn TaskHandler>),
    Route(Arc<dyn RouteHandler>),
}

/// Instantiates task/route logic by the component name in the step
/// definition. Called once per dispatch; implementations are free to
/// return shared instances.
pub trait ComponentFactory: Send + Sync {
    fn make(&self, ctx: &Context) -> Result<Component, ComponentError>;
}
