// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for the behavioral specifications.
//!
//! Provides a scripted component factory, a recording event handler, and
//! state-invariant assertions over the public engine API.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use async_trait::async_trait;
use cf_core::{
    parent_name, Branch, ComponentError, Context, EventContext, EventKind, FakeClock, PathStatus,
    RouteResponse, Step, StepKind, TaskResponse, Ticket, WorkflowDefinition, WorkflowInfo,
    ROOT_PATH,
};
use cf_engine::{
    Component, ComponentFactory, EventHandler, Runtime, RuntimeConfig, RuntimeDeps, RouteHandler,
    TaskHandler,
};
use cf_storage::{FileStore, Keys, MemoryStore, Store};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Scripted responses keyed by step name. Unscripted tasks proceed;
/// unscripted routes return OK_PROCEED with no branches (valid only for
/// static parallel routes).
#[derive(Default)]
pub struct Scripts {
    tasks: Mutex<HashMap<String, VecDeque<Result<TaskResponse, ComponentError>>>>,
    routes: Mutex<HashMap<String, VecDeque<Result<RouteResponse, ComponentError>>>>,
    calls: Mutex<Vec<String>>,
}

impl Scripts {
    pub fn on_task(&self, step: &str, responses: Vec<Result<TaskResponse, ComponentError>>) {
        self.tasks.lock().unwrap().entry(step.to_string()).or_default().extend(responses);
    }

    pub fn on_route(&self, step: &str, responses: Vec<Result<RouteResponse, ComponentError>>) {
        self.routes.lock().unwrap().entry(step.to_string()).or_default().extend(responses);
    }

    /// Dispatches so far, as `step@exec_path`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn dispatches(&self, step: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split('@').next() == Some(step))
            .count()
    }
}

struct ScriptedTask(Arc<Scripts>);

#[async_trait]
impl TaskHandler for ScriptedTask {
    async fn execute_step(&self, ctx: &Context) -> Result<TaskResponse, ComponentError> {
        self.0.calls.lock().unwrap().push(format!("{}@{}", ctx.step, ctx.exec_path));
        self.0
            .tasks
            .lock()
            .unwrap()
            .get_mut(&ctx.step)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Ok(TaskResponse::proceed()))
    }
}

struct ScriptedRoute(Arc<Scripts>);

#[async_trait]
impl RouteHandler for ScriptedRoute {
    async fn execute_route(&self, ctx: &Context) -> Result<RouteResponse, ComponentError> {
        self.0.calls.lock().unwrap().push(format!("{}@{}", ctx.step, ctx.exec_path));
        self.0
            .routes
            .lock()
            .unwrap()
            .get_mut(&ctx.step)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Ok(RouteResponse::take_all(Vec::new())))
    }
}

pub struct SpecFactory(pub Arc<Scripts>);

impl ComponentFactory for SpecFactory {
    fn make(&self, ctx: &Context) -> Result<Component, ComponentError> {
        match ctx.step_kind {
            StepKind::Task => Ok(Component::Task(Arc::new(ScriptedTask(self.0.clone())))),
            _ => Ok(Component::Route(Arc::new(ScriptedRoute(self.0.clone())))),
        }
    }
}

/// Records fired events.
#[derive(Default)]
pub struct Events {
    fired: Mutex<Vec<(EventKind, EventContext)>>,
}

impl Events {
    pub fn kinds(&self) -> Vec<EventKind> {
        self.fired.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }

    pub fn clear(&self) {
        self.fired.lock().unwrap().clear();
    }
}

pub struct SpecHandler(pub Arc<Events>);

#[async_trait]
impl EventHandler for SpecHandler {
    async fn invoke(&self, kind: EventKind, ctx: &EventContext) -> Result<(), ComponentError> {
        self.0.fired.lock().unwrap().push((kind, ctx.clone()));
        Ok(())
    }
}

pub type SpecRuntime<S> = Runtime<S, SpecFactory, SpecHandler, FakeClock>;

/// Harness over a given store.
pub struct Harness<S: Store + Clone + 'static> {
    pub runtime: SpecRuntime<S>,
    pub store: S,
    pub scripts: Arc<Scripts>,
    pub events: Arc<Events>,
    pub keys: Keys,
}

fn build<S: Store + Clone + 'static>(store: S) -> Harness<S> {
    let scripts = Arc::new(Scripts::default());
    let events = Arc::new(Events::default());
    let config = RuntimeConfig::default();
    let keys = Keys::new(config.key_separator);
    let runtime = Runtime::new(
        RuntimeDeps {
            store: store.clone(),
            factory: SpecFactory(scripts.clone()),
            handler: SpecHandler(events.clone()),
            sla: None,
        },
        FakeClock::new(),
        config,
    );
    Harness { runtime, store, scripts, events, keys }
}

/// In-memory harness for most specs.
pub fn harness() -> Harness<MemoryStore> {
    build(MemoryStore::new())
}

/// File-backed harness; a second harness over the same directory models
/// a fresh process after a crash.
pub fn harness_on_disk(dir: &std::path::Path) -> Harness<FileStore> {
    build(FileStore::open(dir, cf_storage::DEFAULT_SEPARATOR).unwrap())
}

/// `start(task) → s2(task) → s3(task) → end`
pub fn linear_def() -> WorkflowDefinition {
    WorkflowDefinition::new("linear")
        .with_step(Step::task("start", "comp.start", "s2"))
        .with_step(Step::task("s2", "comp.s2", "s3"))
        .with_step(Step::task("s3", "comp.s3", "end"))
}

/// `start → pause1(PAUSE) → s2 → end`
pub fn pause_def() -> WorkflowDefinition {
    WorkflowDefinition::new("pausing")
        .with_step(Step::task("start", "comp.start", "pause1"))
        .with_step(Step::pause("pause1", "s2"))
        .with_step(Step::task("s2", "comp.s2", "end"))
}

/// `start → p(P_ROUTE {A,B}, join j) → a1|b1 → j(P_JOIN) → end`
pub fn parallel_def() -> WorkflowDefinition {
    WorkflowDefinition::new("forking")
        .with_step(Step::task("start", "comp.start", "p"))
        .with_step(Step::p_route(
            "p",
            "comp.p",
            vec![Branch::new("A", "a1"), Branch::new("B", "b1")],
            "j",
        ))
        .with_step(Step::task("a1", "comp.a1", "j"))
        .with_step(Step::task("b1", "comp.b1", "j"))
        .with_step(Step::p_join("j", "end"))
}

/// The parallel graph with ticket `T` targeting a recover step.
pub fn ticket_def() -> WorkflowDefinition {
    WorkflowDefinition::new("ticketed")
        .with_step(Step::task("start", "comp.start", "p"))
        .with_step(Step::p_route(
            "p",
            "comp.p",
            vec![Branch::new("A", "a1"), Branch::new("B", "b1")],
            "j",
        ))
        .with_step(Step::task("a1", "comp.a1", "j"))
        .with_step(Step::task("b1", "comp.b1", "j"))
        .with_step(Step::p_join("j", "last"))
        .with_step(Step::task("last", "comp.last", "end"))
        .with_step(Step::task("recover", "comp.recover", "end"))
        .with_ticket(Ticket::new("T", "recover"))
}

/// Assert the persisted-state invariants that must hold after any
/// engine call.
pub fn assert_invariants(info: &WorkflowInfo) {
    // A non-empty pend pointer names an existing pended path (except
    // while a ticket owns the resume).
    if !info.pend_exec_path.is_empty() && info.ticket.is_empty() {
        let path = info
            .path(&info.pend_exec_path)
            .unwrap_or_else(|| panic!("pend pointer {} dangling", info.pend_exec_path));
        assert!(path.is_pended(), "pend pointer {} not pended", info.pend_exec_path);
    }

    // Completion means every path settled and no pend pointer.
    if info.complete() {
        assert!(info.all_paths_settled());
        assert!(info.pend_exec_path.is_empty());
        for path in info.exec_paths.values() {
            assert_eq!(path.status, PathStatus::Completed);
        }
    }

    // A live case ticket has exactly one carrier path.
    if !info.ticket.is_empty() {
        let carriers = info.exec_paths.values().filter(|p| p.ticket == info.ticket).count();
        assert_eq!(carriers, 1, "ticket {} has {carriers} carriers", info.ticket);
    }

    // The pend pointer is the deepest pended path, unless it is the
    // literal root (post-ticket unification).
    if !info.pend_exec_path.is_empty() && info.pend_exec_path != ROOT_PATH {
        let depth = cf_core::depth(&info.pend_exec_path);
        for path in info.exec_paths.values().filter(|p| p.is_pended()) {
            assert!(
                path.depth() <= depth,
                "pended path {} deeper than pointer {}",
                path.name,
                info.pend_exec_path
            );
        }
    }

    // Path names form a prefix tree rooted at ".".
    for name in info.exec_paths.keys() {
        if name == ROOT_PATH {
            continue;
        }
        let parent = parent_name(name);
        assert!(
            info.exec_paths.contains_key(&parent),
            "path {name} has no parent {parent} in the tree"
        );
    }
}

/// Load the stored info document and check invariants.
pub async fn checked_info<S: Store + Clone + 'static>(h: &Harness<S>, case: &str) -> WorkflowInfo {
    let info = h
        .runtime
        .get_info(&cf_core::CaseId::new(case))
        .await
        .unwrap()
        .expect("case info stored");
    assert_invariants(&info);
    info
}
