// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The step-graph interpreter.
//!
//! One executor drives one exec path. Parallel routes spawn child
//! executors as tasks and await them all; a parent blocked on its
//! children yields its worker, so fork/join cannot starve the runtime.
//! An outstanding case ticket is resolved by the root invocation at the
//! top of the loop; every other path backs out and lets it.

use crate::audit;
use crate::case_state::CaseState;
use crate::component::Component;
use crate::error::RuntimeError;
use crate::runtime::RuntimeInner;
use cf_core::{
    baskets, child_name, parent_name, route_of, sibling_prefix, AuditRecord, Branch, Clock,
    ComponentError, Context, ExecPath, PathStatus, PendError, ResponseType, RouteResponse, Step,
    StepKind, TaskResponse, END_STEP, ROOT_PATH,
};
use cf_storage::{write_doc, Store};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{info, warn};

use crate::component::ComponentFactory;
use crate::events::EventHandler;

/// What the dispatch of one step decided.
enum Flow {
    /// Move the cursor to `next`. `audited` is set when the dispatch
    /// already wrote its own info snapshot and audit record (parallel
    /// forks do, before spawning).
    Proceed { next: String, branches: Vec<String>, audited: bool },
    /// The path pended; persist, audit, stop.
    Pend,
    /// The path is done here (join handoff, ticket backed out). `audit`
    /// is false when the step already audited or nothing ran.
    Terminate { audit: bool },
}

/// How a ticket observation at the loop top was resolved.
enum TicketUnwind {
    /// Unified onto the root path at the ticket target; keep running.
    Adopted,
    /// Unified onto the root path carrying the raiser's pend.
    Pended,
}

pub(crate) struct StepExecutor<S, F, H, C>
where
    S: Store + 'static,
    F: ComponentFactory + 'static,
    H: EventHandler + 'static,
    C: Clock + 'static,
{
    rt: Arc<RuntimeInner<S, F, H, C>>,
    case: Arc<CaseState>,
    path_name: String,
    /// True for the executor launched by the runtime service; child
    /// executors spawned for parallel branches are not.
    is_root_invocation: bool,
}

impl<S, F, H, C> StepExecutor<S, F, H, C>
where
    S: Store + 'static,
    F: ComponentFactory + 'static,
    H: EventHandler + 'static,
    C: Clock + 'static,
{
    pub(crate) fn root(
        rt: Arc<RuntimeInner<S, F, H, C>>,
        case: Arc<CaseState>,
        path_name: String,
    ) -> Self {
        Self { rt, case, path_name, is_root_invocation: true }
    }

    fn child(rt: Arc<RuntimeInner<S, F, H, C>>, case: Arc<CaseState>, path_name: String) -> Self {
        Self { rt, case, path_name, is_root_invocation: false }
    }

    /// Boxed entry point for spawned child executors.
    fn run_boxed(mut self) -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + Send>> {
        Box::pin(async move { self.run().await })
    }

    pub(crate) async fn run(&mut self) -> Result<(), RuntimeError> {
        loop {
            if self.case.with_root(|r| r.has_ticket()) {
                if self.is_root_invocation {
                    match self.unwind_to_ticket().await? {
                        TicketUnwind::Adopted => continue,
                        TicketUnwind::Pended => break,
                    }
                }
                // a non-root path backs out; its parent resolves the ticket
                break;
            }

            let step_name = self
                .case
                .with_root(|r| r.path(&self.path_name).map(|p| p.step.clone()))
                .ok_or_else(|| {
                    RuntimeError::Internal(format!("exec path vanished: {}", self.path_name))
                })?;
            if step_name == END_STEP {
                self.complete_case().await?;
                break;
            }
            let step = self
                .case
                .definition
                .step(&step_name)
                .cloned()
                .ok_or_else(|| RuntimeError::StepNotFound {
                    case_id: self.case.case_id.clone(),
                    step: step_name.clone(),
                })?;

            let started_at_ms = self.rt.clock.epoch_ms();
            let flow = match step.kind {
                StepKind::Task => self.run_task(&step).await?,
                StepKind::SRoute => self.run_s_route(&step).await?,
                StepKind::PRoute | StepKind::PRouteDynamic => {
                    self.run_parallel_route(&step, started_at_ms).await?
                }
                StepKind::PJoin => self.run_join(&step).await?,
                StepKind::Pause => self.run_pause(),
                StepKind::Persist => self.run_persist(&step).await?,
            };

            info!(
                case = %self.case.case_id,
                path = %self.path_name,
                step = %step.name,
                kind = %step.kind,
                "executed step"
            );

            match flow {
                Flow::Proceed { next, branches, audited } => {
                    if !audited {
                        if self.rt.config.aggressive_persistence {
                            self.persist_info().await?;
                        }
                        self.write_audit(&step, branches, started_at_ms).await?;
                    }
                    self.case.with_root_mut(|r| {
                        if let Some(p) = r.path_mut(&self.path_name) {
                            p.step = next;
                        }
                    });
                }
                Flow::Pend => {
                    self.persist_info().await?;
                    self.write_audit(&step, Vec::new(), started_at_ms).await?;
                    break;
                }
                Flow::Terminate { audit } => {
                    self.persist_info().await?;
                    if audit {
                        self.write_audit(&step, Vec::new(), started_at_ms).await?;
                    }
                    // a ticket raised inside the fork outranks the pend;
                    // loop back so the root invocation unwinds to it
                    if self.is_root_invocation && self.case.with_root(|r| r.has_ticket()) {
                        continue;
                    }
                    break;
                }
            }
        }
        Ok(())
    }

    // === TASK ===

    async fn run_task(&mut self, step: &Step) -> Result<Flow, RuntimeError> {
        let ctx = self.component_context(step);
        let response = self.invoke_task(&ctx).await;
        self.apply_task_response(step, response)
    }

    async fn invoke_task(&self, ctx: &Context) -> TaskResponse {
        match self.rt.factory.make(ctx) {
            Ok(Component::Task(handler)) => match handler.execute_step(ctx).await {
                Ok(response) => response,
                Err(e) => self.task_failure(ctx, e),
            },
            Ok(Component::Route(_)) => self.task_failure(
                ctx,
                ComponentError::new("factory returned a route component for a task step"),
            ),
            Err(e) => self.task_failure(ctx, e),
        }
    }

    fn task_failure(&self, ctx: &Context, error: ComponentError) -> TaskResponse {
        warn!(case = %ctx.case_id, step = %ctx.step, error = %error, "task failed");
        TaskResponse::error_pend(
            self.rt.config.error_work_basket.clone(),
            PendError::new("component_error", error.0),
        )
    }

    fn apply_task_response(
        &mut self,
        step: &Step,
        response: TaskResponse,
    ) -> Result<Flow, RuntimeError> {
        let response = if response.response_type.is_pend() && response.work_basket.is_empty() {
            TaskResponse::error_pend(
                self.rt.config.error_work_basket.clone(),
                PendError::new("contract", "pend response without a work basket"),
            )
        } else {
            response
        };
        if !response.ticket.is_empty()
            && self.case.definition.ticket(&response.ticket).is_none()
        {
            return Err(RuntimeError::TicketNotFound {
                case_id: self.case.case_id.clone(),
                ticket: response.ticket,
            });
        }

        match response.response_type {
            ResponseType::OkProceed => {
                let next = step.next.clone().unwrap_or_else(|| END_STEP.to_string());
                if response.ticket.is_empty() {
                    self.case.with_root_mut(|r| {
                        if let Some(p) = r.path_mut(&self.path_name) {
                            p.response_type = Some(ResponseType::OkProceed);
                        }
                        r.is_pend_at_same_step = false;
                    });
                    return Ok(Flow::Proceed { next, branches: Vec::new(), audited: false });
                }

                let won = self.case.with_root_mut(|r| {
                    let won = r.raise_ticket(&response.ticket, ResponseType::OkProceed);
                    if let Some(p) = r.path_mut(&self.path_name) {
                        p.response_type = Some(ResponseType::OkProceed);
                        p.ticket = response.ticket.clone();
                    }
                    r.is_pend_at_same_step = false;
                    won
                });
                if !won {
                    warn!(
                        case = %self.case.case_id,
                        path = %self.path_name,
                        ticket = %response.ticket,
                        "ticket already live, dropping raise"
                    );
                }
                if self.is_root_invocation {
                    // the loop top unwinds to the target before anything
                    // else dispatches
                    Ok(Flow::Proceed { next, branches: Vec::new(), audited: false })
                } else {
                    self.case.with_root_mut(|r| {
                        if let Some(p) = r.path_mut(&self.path_name) {
                            p.status = PathStatus::Completed;
                        }
                    });
                    Ok(Flow::Terminate { audit: true })
                }
            }
            ResponseType::OkPend | ResponseType::OkPendEor => {
                if self.case.with_root(|r| r.has_ticket()) {
                    // someone else's ticket wins; abandon the pend quietly,
                    // keeping only the variable writes
                    self.case.with_root_mut(|r| {
                        if let Some(p) = r.path_mut(&self.path_name) {
                            p.status = PathStatus::Completed;
                            p.response_type = Some(response.response_type);
                            if !response.ticket.is_empty() {
                                p.ticket = response.ticket.clone();
                            }
                        }
                    });
                    return Ok(Flow::Terminate { audit: false });
                }
                self.case.with_root_mut(|r| {
                    if let Some(p) = r.path_mut(&self.path_name) {
                        let fresh_basket = response.work_basket != p.prev_pend_work_basket;
                        p.status = PathStatus::Completed;
                        p.set_pend(&response.work_basket, response.response_type);
                        if !response.ticket.is_empty() {
                            p.ticket = response.ticket.clone();
                        }
                        if fresh_basket {
                            r.is_pend_at_same_step = false;
                        }
                    }
                    if !response.ticket.is_empty() {
                        r.raise_ticket(&response.ticket, response.response_type);
                    }
                    r.set_pend_exec_path(&self.path_name);
                });
                Ok(Flow::Pend)
            }
            ResponseType::ErrorPend => {
                let error = response
                    .error
                    .unwrap_or_else(|| PendError::new("error", "step failed"));
                Ok(self.apply_error_pend(response.work_basket, error))
            }
        }
    }

    // === Routes ===

    async fn invoke_route(&self, ctx: &Context) -> RouteResponse {
        match self.rt.factory.make(ctx) {
            Ok(Component::Route(handler)) => match handler.execute_route(ctx).await {
                Ok(response) => response,
                Err(e) => self.route_failure(ctx, e),
            },
            Ok(Component::Task(_)) => self.route_failure(
                ctx,
                ComponentError::new("factory returned a task component for a route step"),
            ),
            Err(e) => self.route_failure(ctx, e),
        }
    }

    fn route_failure(&self, ctx: &Context, error: ComponentError) -> RouteResponse {
        warn!(case = %ctx.case_id, step = %ctx.step, error = %error, "route failed");
        RouteResponse::error_pend(
            self.rt.config.error_work_basket.clone(),
            PendError::new("component_error", error.0),
        )
    }

    async fn run_s_route(&mut self, step: &Step) -> Result<Flow, RuntimeError> {
        let ctx = self.component_context(step);
        let response = self.invoke_route(&ctx).await;
        match response.response_type {
            ResponseType::OkProceed => {
                if response.branches.len() != 1 {
                    return Err(self.invalid_route(step, "must pick exactly one branch"));
                }
                let chosen = &response.branches[0];
                let branch = step
                    .branch(chosen)
                    .ok_or_else(|| self.invalid_route(step, &format!("undeclared branch {chosen}")))?;
                let next = branch.next.clone();
                self.case.with_root_mut(|r| {
                    if let Some(p) = r.path_mut(&self.path_name) {
                        p.response_type = Some(ResponseType::OkProceed);
                    }
                    r.is_pend_at_same_step = false;
                });
                Ok(Flow::Proceed { next, branches: response.branches, audited: false })
            }
            ResponseType::ErrorPend => {
                let error = response
                    .error
                    .unwrap_or_else(|| PendError::new("error", "route failed"));
                Ok(self.apply_error_pend(response.work_basket, error))
            }
            ResponseType::OkPend | ResponseType::OkPendEor => {
                Err(self.invalid_route(step, "routes cannot pend"))
            }
        }
    }

    // === Parallel fork/join ===

    async fn run_parallel_route(
        &mut self,
        step: &Step,
        started_at_ms: u64,
    ) -> Result<Flow, RuntimeError> {
        let join = step
            .join
            .clone()
            .ok_or_else(|| RuntimeError::Internal(format!("route {} has no join", step.name)))?;
        let ctx = self.component_context(step);
        let response = self.invoke_route(&ctx).await;
        match response.response_type {
            ResponseType::OkProceed => {}
            ResponseType::ErrorPend => {
                let error = response
                    .error
                    .unwrap_or_else(|| PendError::new("error", "route failed"));
                return Ok(self.apply_error_pend(response.work_basket, error));
            }
            ResponseType::OkPend | ResponseType::OkPendEor => {
                return Err(self.invalid_route(step, "routes cannot pend"));
            }
        }

        let chosen: Vec<Branch> = match step.kind {
            StepKind::PRoute => step.branches.clone(),
            _ => {
                if response.branches.is_empty() {
                    return Err(self.invalid_route(step, "dynamic route picked no branches"));
                }
                let mut picked = Vec::with_capacity(response.branches.len());
                for name in &response.branches {
                    let branch = step.branch(name).ok_or_else(|| {
                        self.invalid_route(step, &format!("undeclared branch {name}"))
                    })?;
                    picked.push(branch.clone());
                }
                picked
            }
        };
        let branch_names: Vec<String> = chosen.iter().map(|b| b.name.clone()).collect();

        let to_run: Vec<String> = self.case.with_root_mut(|r| {
            if let Some(p) = r.path_mut(&self.path_name) {
                p.response_type = Some(ResponseType::OkProceed);
            }
            r.is_pend_at_same_step = false;
            let mut to_run = Vec::new();
            for branch in &chosen {
                let child = child_name(&self.path_name, &step.name, &branch.name);
                let settled = r.path(&child).is_some_and(|c| {
                    c.status == PathStatus::Completed && !c.is_pended() && c.step == join
                });
                if settled {
                    // already made it to the join before a crash; a
                    // re-run of the route must not replay the branch
                    continue;
                }
                r.upsert_path(ExecPath::new(child.clone(), branch.next.clone()));
                to_run.push(child);
            }
            to_run
        });

        // children must be durable before any of them runs
        self.persist_info().await?;
        self.write_audit(step, branch_names.clone(), started_at_ms).await?;

        let mut children = tokio::task::JoinSet::new();
        for child in to_run {
            let exec = Self::child(self.rt.clone(), self.case.clone(), child);
            children.spawn(exec.run_boxed());
        }
        let mut failure: Option<RuntimeError> = None;
        while let Some(joined) = children.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failure = failure.or(Some(e)),
                Err(e) => {
                    failure =
                        failure.or(Some(RuntimeError::Internal(format!("branch task died: {e}"))));
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let pended = self.case.with_root(|r| !r.pend_exec_path.is_empty());
        if pended {
            // the deepest pended descendant owns the case now; the last
            // sibling to clear re-identifies as this path
            self.case.with_root_mut(|r| {
                if let Some(p) = r.path_mut(&self.path_name) {
                    p.status = PathStatus::Completed;
                }
            });
            Ok(Flow::Terminate { audit: false })
        } else {
            Ok(Flow::Proceed { next: join, branches: branch_names, audited: true })
        }
    }

    async fn run_join(&mut self, step: &Step) -> Result<Flow, RuntimeError> {
        let next = step.next.clone().unwrap_or_else(|| END_STEP.to_string());
        let my = self.path_name.clone();

        // A forking path passing through the join it owns has already
        // synchronized its children; only a branch arriving at its own
        // route's join takes part in the handoff below.
        let arriving = route_of(&my)
            .and_then(|route| self.case.definition.step(route))
            .and_then(|s| s.join.as_deref())
            == Some(step.name.as_str());
        if !arriving {
            return Ok(Flow::Proceed { next, branches: Vec::new(), audited: false });
        }

        enum JoinOutcome {
            BecomeParent(String),
            NotLast,
        }

        let outcome = self.case.with_root_mut(|r| {
            if let Some(p) = r.path_mut(&my) {
                p.status = PathStatus::Completed;
                p.response_type = Some(ResponseType::OkProceed);
                p.step = step.name.clone();
            }

            let prefix = sibling_prefix(&my);
            let my_depth = cf_core::depth(&my);
            let pended_sibling = r
                .exec_paths
                .values()
                .find(|p| {
                    p.name != my
                        && p.name.starts_with(&prefix)
                        && p.depth() == my_depth
                        && p.is_pended()
                })
                .map(|p| p.name.clone());
            if let Some(sibling) = pended_sibling {
                r.set_pend_exec_path(&sibling);
                return JoinOutcome::NotLast;
            }

            let parent = parent_name(&my);
            match r.path_mut(&parent) {
                // the parent thread is still awaiting the fork; it will
                // observe the completions and run the join itself
                Some(p) if p.status == PathStatus::Started => JoinOutcome::NotLast,
                Some(p) => {
                    p.status = PathStatus::Started;
                    p.clear_pend();
                    JoinOutcome::BecomeParent(parent)
                }
                None => JoinOutcome::NotLast,
            }
        });

        match outcome {
            JoinOutcome::BecomeParent(parent) => {
                self.path_name = parent;
                Ok(Flow::Proceed { next, branches: Vec::new(), audited: false })
            }
            JoinOutcome::NotLast => Ok(Flow::Terminate { audit: true }),
        }
    }

    // === PAUSE / PERSIST ===

    fn run_pause(&mut self) -> Flow {
        self.case.with_root_mut(|r| {
            if let Some(p) = r.path_mut(&self.path_name) {
                p.status = PathStatus::Completed;
                p.set_pend(baskets::PAUSE, ResponseType::OkPend);
            }
            r.set_pend_exec_path(&self.path_name);
        });
        Flow::Pend
    }

    async fn run_persist(&mut self, step: &Step) -> Result<Flow, RuntimeError> {
        let ctx = self.case.event_context(&step.name, &self.path_name);
        let result = {
            let _gate = self.case.event_gate.lock().await;
            self.rt.dispatcher.persist(&ctx).await
        };
        match result {
            Ok(()) => {
                self.case.with_root_mut(|r| {
                    if let Some(p) = r.path_mut(&self.path_name) {
                        p.response_type = Some(ResponseType::OkProceed);
                    }
                    r.is_pend_at_same_step = false;
                });
                let next = step.next.clone().unwrap_or_else(|| END_STEP.to_string());
                Ok(Flow::Proceed { next, branches: Vec::new(), audited: false })
            }
            Err(e) => {
                warn!(case = %self.case.case_id, step = %step.name, error = %e, "persist handler failed");
                Ok(self.apply_error_pend(String::new(), PendError::new("persist", e.0)))
            }
        }
    }

    // === Ticket unwind ===

    async fn unwind_to_ticket(&mut self) -> Result<TicketUnwind, RuntimeError> {
        let (ticket, response_type, raiser) = self.case.with_root(|r| {
            (
                r.ticket.clone(),
                r.ticket_response_type.unwrap_or(ResponseType::OkProceed),
                r.exec_paths.values().find(|p| p.ticket == r.ticket).cloned(),
            )
        });
        let target = self
            .case
            .definition
            .ticket(&ticket)
            .ok_or_else(|| RuntimeError::TicketNotFound {
                case_id: self.case.case_id.clone(),
                ticket: ticket.clone(),
            })?
            .step
            .clone();

        if response_type == ResponseType::OkProceed {
            self.case.with_root_mut(|r| {
                r.exec_paths.clear();
                r.upsert_path(ExecPath::new(ROOT_PATH, target.clone()));
                r.ticket.clear();
                r.ticket_response_type = None;
                r.pend_exec_path.clear();
            });
            self.path_name = ROOT_PATH.to_string();
            self.persist_info().await?;
            let ctx = self.case.event_context(&target, ROOT_PATH);
            let ctx = cf_core::EventContext { ticket: ticket.clone(), ..ctx };
            {
                let _gate = self.case.event_gate.lock().await;
                self.rt.dispatcher.ticket_raised(&ctx).await?;
            }
            info!(case = %self.case.case_id, ticket = %ticket, step = %target, "ticket adopted");
            Ok(TicketUnwind::Adopted)
        } else {
            // the raiser pended; unify onto the root carrying its pend,
            // leaving the ticket outstanding for the next resume
            let (basket, step_name, error) = raiser
                .map(|p| {
                    let basket = if p.pend_work_basket.is_empty() {
                        baskets::TEMP_HOLD.to_string()
                    } else {
                        p.pend_work_basket.clone()
                    };
                    (basket, p.step.clone(), p.pend_error.clone())
                })
                .unwrap_or_else(|| (baskets::TEMP_HOLD.to_string(), target.clone(), None));
            self.case.with_root_mut(|r| {
                r.exec_paths.clear();
                let mut root = ExecPath::new(ROOT_PATH, step_name.clone());
                root.status = PathStatus::Completed;
                root.set_pend(&basket, response_type);
                root.ticket = ticket.clone();
                root.pend_error = error;
                r.upsert_path(root);
                r.pend_exec_path = ROOT_PATH.to_string();
            });
            self.persist_info().await?;
            info!(case = %self.case.case_id, ticket = %ticket, basket = %basket, "ticket pended");
            Ok(TicketUnwind::Pended)
        }
    }

    // === Shared plumbing ===

    fn apply_error_pend(&self, work_basket: String, error: PendError) -> Flow {
        let basket = if work_basket.is_empty() {
            self.rt.config.error_work_basket.clone()
        } else {
            work_basket
        };
        self.case.with_root_mut(|r| {
            if let Some(p) = r.path_mut(&self.path_name) {
                p.status = PathStatus::Completed;
                p.set_pend(&basket, ResponseType::ErrorPend);
                p.pend_error = Some(error);
            }
            r.set_pend_exec_path(&self.path_name);
        });
        Flow::Pend
    }

    async fn complete_case(&mut self) -> Result<(), RuntimeError> {
        self.case.with_root_mut(|r| {
            if let Some(p) = r.path_mut(&self.path_name) {
                p.status = PathStatus::Completed;
                p.response_type = Some(ResponseType::OkProceed);
            }
            r.pend_exec_path.clear();
            r.is_complete = true;
        });
        self.persist_info().await?;
        info!(case = %self.case.case_id, path = %self.path_name, "case complete");
        Ok(())
    }

    fn invalid_route(&self, step: &Step, reason: &str) -> RuntimeError {
        RuntimeError::InvalidRouteResponse {
            case_id: self.case.case_id.clone(),
            step: step.name.clone(),
            reason: reason.to_string(),
        }
    }

    fn component_context(&self, step: &Step) -> Context {
        let (path, is_pend_at_same_step, ticket, last_pend_step) = self.case.with_root(|r| {
            (
                r.path(&self.path_name).cloned(),
                r.is_pend_at_same_step,
                r.ticket.clone(),
                r.last_pend_step.clone(),
            )
        });
        let path = path.unwrap_or_else(|| ExecPath::new(&self.path_name, &step.name));
        Context {
            journey: self.case.definition.name.clone(),
            case_id: self.case.case_id.clone(),
            step: step.name.clone(),
            step_kind: step.kind,
            component: step.component.clone(),
            user_data: step.user_data.clone(),
            exec_path: self.path_name.clone(),
            variables: self.case.variables.clone(),
            pend_work_basket: path.pend_work_basket.clone(),
            last_pend_work_basket: path.prev_pend_work_basket.clone(),
            last_pend_step,
            pend_error: path.pend_error.clone(),
            is_pend_at_same_step,
            ticket,
        }
    }

    async fn persist_info(&self) -> Result<(), RuntimeError> {
        let info = self.case.snapshot();
        let key = self.rt.keys.workflow_info(&self.case.case_id);
        write_doc(&self.rt.store, &key, &info).await?;
        Ok(())
    }

    async fn write_audit(
        &self,
        step: &Step,
        branches: Vec<String>,
        started_at_ms: u64,
    ) -> Result<(), RuntimeError> {
        let path = match self.case.with_root(|r| r.path(&self.path_name).cloned()) {
            Some(p) => p,
            None => return Ok(()),
        };
        let record = AuditRecord {
            case_id: self.case.case_id.clone(),
            seq: 0,
            step: step.name.clone(),
            kind: step.kind,
            exec_path: self.path_name.clone(),
            branches,
            response_type: path.response_type,
            work_basket: path.pend_work_basket.clone(),
            ticket: path.ticket.clone(),
            variables: self.rt.config.audit_variables.then(|| self.case.variables.snapshot()),
            started_at_ms,
            recorded_at_ms: self.rt.clock.epoch_ms(),
        };
        audit::record(&self.rt.store, &self.rt.keys, record).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
