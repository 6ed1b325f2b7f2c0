// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cf-engine: the caseflow workflow runtime
//!
//! Interprets a workflow definition over a persisted per-case state:
//! drives exec paths step by step, forks and joins parallel branches,
//! honors ticket interrupts, pends into work baskets, and repairs state
//! left behind by a crash.

mod audit;
mod case_state;
mod component;
mod error;
mod events;
mod executor;
mod runtime;
mod sanitizer;

pub use component::{Component, ComponentFactory, RouteHandler, TaskHandler};
pub use error::RuntimeError;
pub use events::{EventHandler, NoopEventHandler, SlaQueueManager};
pub use runtime::{CaseOutcome, Runtime, RuntimeConfig, RuntimeDeps};
pub use sanitizer::{sanitize, SanitizeError};
