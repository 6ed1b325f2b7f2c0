// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime service: the public API of the engine.
//!
//! Loads or creates the per-case state, repairs it when a crash left it
//! inconsistent, selects the resume cursor, and drives a step executor
//! on the caller's task. One engine value owns the store, factory,
//! handler, and configuration; there is no global state.

use crate::audit;
use crate::case_state::CaseState;
use crate::component::ComponentFactory;
use crate::error::RuntimeError;
use crate::events::{EventDispatcher, EventHandler, SlaQueueManager};
use crate::executor::StepExecutor;
use crate::sanitizer::sanitize;
use cf_core::{
    baskets, AuditRecord, CaseId, Clock, ExecPath, Milestone, PathStatus, PendError, ResponseType,
    Step, StepKind, VariableDecl, WorkflowDefinition, WorkflowInfo, END_STEP, ROOT_PATH,
};
use cf_storage::{read_doc, write_doc, Keys, Store, StoreError, DEFAULT_SEPARATOR};
use std::sync::Arc;
use tracing::{info, warn};

/// Engine configuration. No globals; construct one per engine value.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Separator embedded in store keys; must not appear in case ids
    pub key_separator: char,
    /// Basket used for error pends when the response names none
    pub error_work_basket: String,
    /// Write the info document after every step (default), not just at
    /// pend/complete boundaries
    pub aggressive_persistence: bool,
    /// Capture a variables snapshot in each audit record
    pub audit_variables: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            key_separator: DEFAULT_SEPARATOR,
            error_work_basket: baskets::ERROR.to_string(),
            aggressive_persistence: true,
            audit_variables: true,
        }
    }
}

/// External collaborators of the engine.
pub struct RuntimeDeps<S, F, H> {
    pub store: S,
    pub factory: F,
    pub handler: H,
    pub sla: Option<Arc<dyn SlaQueueManager>>,
}

pub(crate) struct RuntimeInner<S, F, H, C: Clock> {
    pub store: S,
    pub factory: F,
    pub dispatcher: EventDispatcher<H>,
    pub clock: C,
    pub config: RuntimeConfig,
    pub keys: Keys,
}

/// The workflow runtime service.
///
/// Cheap to clone; clones share the same store, factory, and handler.
pub struct Runtime<S, F, H, C: Clock> {
    inner: Arc<RuntimeInner<S, F, H, C>>,
}

impl<S, F, H, C: Clock> Clone for Runtime<S, F, H, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

/// How a `start_case`/`resume_case`/`reopen_case` call left the case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutcome {
    pub case_id: CaseId,
    pub completed: bool,
    /// Basket the case is pended at (empty when completed)
    pub pend_work_basket: String,
    pub pend_exec_path: String,
    pub pend_error: Option<PendError>,
    /// Outstanding ticket, if any
    pub ticket: String,
}

impl CaseOutcome {
    fn from_info(info: &WorkflowInfo) -> Self {
        let pended = info.path(&info.pend_exec_path);
        Self {
            case_id: info.case_id.clone(),
            completed: info.complete(),
            pend_work_basket: pended.map(|p| p.pend_work_basket.clone()).unwrap_or_default(),
            pend_exec_path: info.pend_exec_path.clone(),
            pend_error: pended.and_then(|p| p.pend_error.clone()),
            ticket: info.ticket.clone(),
        }
    }
}

impl<S, F, H, C> Runtime<S, F, H, C>
where
    S: Store + 'static,
    F: ComponentFactory + 'static,
    H: EventHandler + 'static,
    C: Clock + 'static,
{
    pub fn new(deps: RuntimeDeps<S, F, H>, clock: C, config: RuntimeConfig) -> Self {
        let keys = Keys::new(config.key_separator);
        Self {
            inner: Arc::new(RuntimeInner {
                store: deps.store,
                factory: deps.factory,
                dispatcher: EventDispatcher::new(deps.handler, deps.sla),
                clock,
                config,
                keys,
            }),
        }
    }

    /// Create and run a new case until it completes or pends.
    ///
    /// Fails if a case with this id was already started. A definition
    /// document left by a crashed earlier start is reused.
    pub async fn start_case(
        &self,
        case_id: CaseId,
        definition: &WorkflowDefinition,
        variables: &[VariableDecl],
        milestones: Option<Vec<Milestone>>,
    ) -> Result<CaseOutcome, RuntimeError> {
        let inner = &self.inner;
        if !inner.keys.is_valid_case_id(&case_id) {
            return Err(RuntimeError::InvalidCaseId { case_id });
        }
        definition.validate()?;
        let start = definition
            .start_step()
            .map(|s| s.name.clone())
            .ok_or_else(|| RuntimeError::Internal("validated definition has no steps".into()))?;

        let info_key = inner.keys.workflow_info(&case_id);
        if read_doc::<_, WorkflowInfo>(&inner.store, &info_key).await?.is_some() {
            return Err(RuntimeError::CaseAlreadyStarted(case_id));
        }

        let journey_key = inner.keys.journey(&case_id);
        let definition_value = serde_json::to_value(definition)
            .map_err(|e| RuntimeError::Internal(e.to_string()))?;
        match inner.store.save(&journey_key, definition_value).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                info!(case = %case_id, "definition already stored by an earlier start, continuing");
            }
            Err(e) => return Err(e.into()),
        }

        let milestones = milestones.unwrap_or_default();
        if !milestones.is_empty() {
            write_doc(&inner.store, &inner.keys.journey_sla(&case_id), &milestones).await?;
        }

        let definition = Arc::new(definition.clone());
        let case = Arc::new(CaseState::fresh(case_id, definition.clone()));
        case.variables.overlay(variables);
        case.with_root_mut(|r| r.upsert_path(ExecPath::new(ROOT_PATH, start)));
        self.persist_case(&case).await?;

        let ctx = case.event_context("", ROOT_PATH);
        inner.dispatcher.case_started(&ctx, &milestones).await?;
        info!(case = %case.case_id, journey = %definition.name, "case started");

        self.drive(case, ROOT_PATH.to_string(), &milestones).await
    }

    /// Resume a pended case, optionally overlaying variables (upsert,
    /// never delete).
    pub async fn resume_case(
        &self,
        case_id: &CaseId,
        variables: &[VariableDecl],
    ) -> Result<CaseOutcome, RuntimeError> {
        let inner = &self.inner;
        let (definition, info, milestones) = self.load_case(case_id).await?;
        if info.complete() {
            return Err(RuntimeError::CaseAlreadyComplete(case_id.clone()));
        }

        let definition = Arc::new(definition);
        let case = Arc::new(CaseState::hydrate(definition.clone(), info));
        case.with_root_mut(|r| r.is_pend_at_same_step = true);
        case.variables.overlay(variables);

        let pend_path = case.with_root(|r| r.pend_exec_path.clone());
        let ctx = case.event_context("", &pend_path);
        inner.dispatcher.case_resumed(&ctx).await?;
        if case.with_root(|r| r.has_ticket()) {
            inner.dispatcher.ticket_raised(&ctx).await?;
        }

        let start_path = self.select_cursor(&case)?;
        self.persist_case(&case).await?;
        info!(case = %case.case_id, path = %start_path, "case resumed");

        self.drive(case, start_path, &milestones).await
    }

    /// Revive a completed case via a ticket. With `pend_before_resume`
    /// the case is left pended at `pend_work_basket` instead of running
    /// immediately.
    pub async fn reopen_case(
        &self,
        case_id: &CaseId,
        ticket: &str,
        pend_before_resume: bool,
        pend_work_basket: &str,
        variables: &[VariableDecl],
    ) -> Result<CaseOutcome, RuntimeError> {
        if ticket.is_empty() {
            return Err(RuntimeError::InvalidRequest("reopen requires a ticket".into()));
        }
        if pend_before_resume && pend_work_basket.is_empty() {
            return Err(RuntimeError::InvalidRequest(
                "pend_before_resume requires a work basket".into(),
            ));
        }

        let inner = &self.inner;
        let (definition, mut info, milestones) = self.load_case(case_id).await?;
        if !info.complete() {
            return Err(RuntimeError::CaseNotComplete(case_id.clone()));
        }
        let target = definition
            .ticket(ticket)
            .ok_or_else(|| RuntimeError::TicketNotFound {
                case_id: case_id.clone(),
                ticket: ticket.to_string(),
            })?
            .step
            .clone();

        info.is_complete = Some(false);
        info.pend_exec_path = ROOT_PATH.to_string();
        if info.path(ROOT_PATH).is_none() {
            let mut root = ExecPath::new(ROOT_PATH, target);
            root.status = PathStatus::Completed;
            info.exec_paths.insert(ROOT_PATH.to_string(), root);
        }
        if let Some(root) = info.exec_paths.get_mut(ROOT_PATH) {
            root.ticket = ticket.to_string();
            if pend_before_resume {
                root.set_pend(pend_work_basket, ResponseType::OkPend);
            }
        }
        info.ticket = ticket.to_string();
        info.ticket_response_type =
            Some(if pend_before_resume { ResponseType::OkPend } else { ResponseType::OkProceed });
        for decl in variables {
            info.variables.insert(decl.name.clone(), decl.value.clone());
        }

        write_doc(&inner.store, &inner.keys.workflow_info(case_id), &info).await?;
        info!(case = %case_id, ticket = %ticket, "case reopened");

        let definition = Arc::new(definition);
        let case = Arc::new(CaseState::hydrate(definition, info));
        let ctx = case.event_context("", ROOT_PATH);
        inner.dispatcher.case_reopened(&ctx).await?;

        if pend_before_resume {
            self.emit_pend(&case, &milestones).await?;
            return Ok(CaseOutcome::from_info(&case.snapshot()));
        }
        self.resume_case(case_id, &[]).await
    }

    /// Move a pended case to another work basket. Management operation,
    /// off the hot path; does not resume the case.
    pub async fn change_work_basket(
        &self,
        case_id: &CaseId,
        new_work_basket: &str,
    ) -> Result<(), RuntimeError> {
        if new_work_basket.is_empty() {
            return Err(RuntimeError::InvalidRequest("work basket must not be empty".into()));
        }
        let inner = &self.inner;
        let (definition, mut info, milestones) = self.load_case(case_id).await?;
        if info.complete() {
            return Err(RuntimeError::CaseAlreadyComplete(case_id.clone()));
        }
        let pend_name = info.pend_exec_path.clone();
        let path = info
            .exec_paths
            .get_mut(&pend_name)
            .filter(|p| p.is_pended())
            .ok_or_else(|| RuntimeError::NotPended { case_id: case_id.clone() })?;

        let old = path.pend_work_basket.clone();
        if old == new_work_basket {
            return Ok(());
        }
        path.prev_pend_work_basket = old.clone();
        path.pend_work_basket = new_work_basket.to_string();
        let tbc = path.tbc_sla_work_basket.clone();
        let step_name = path.step.clone();
        let response_type = path.response_type;

        write_doc(&inner.store, &inner.keys.workflow_info(case_id), &info).await?;

        let definition = Arc::new(definition);
        let case = Arc::new(CaseState::hydrate(definition.clone(), info));
        let ctx = case.event_context(&step_name, &pend_name);
        inner
            .dispatcher
            .work_basket_changed(&ctx, &milestones, &old, new_work_basket, &tbc)
            .await;

        let kind = definition.step(&step_name).map(|s| s.kind).unwrap_or(StepKind::Task);
        let now = inner.clock.epoch_ms();
        let record = AuditRecord {
            case_id: case_id.clone(),
            seq: 0,
            step: step_name,
            kind,
            exec_path: pend_name,
            branches: Vec::new(),
            response_type,
            work_basket: new_work_basket.to_string(),
            ticket: String::new(),
            variables: None,
            started_at_ms: now,
            recorded_at_ms: now,
        };
        audit::record(&inner.store, &inner.keys, record).await?;
        info!(case = %case_id, from = %old, to = %new_work_basket, "work basket changed");
        Ok(())
    }

    /// Raw case state as persisted, for embedding callers.
    pub async fn get_info(&self, case_id: &CaseId) -> Result<Option<WorkflowInfo>, RuntimeError> {
        Ok(read_doc(&self.inner.store, &self.inner.keys.workflow_info(case_id)).await?)
    }

    // === internals ===

    async fn load_case(
        &self,
        case_id: &CaseId,
    ) -> Result<(WorkflowDefinition, WorkflowInfo, Vec<Milestone>), RuntimeError> {
        let inner = &self.inner;
        if !inner.keys.is_valid_case_id(case_id) {
            return Err(RuntimeError::InvalidCaseId { case_id: case_id.clone() });
        }
        let definition: WorkflowDefinition = read_doc(&inner.store, &inner.keys.journey(case_id))
            .await?
            .ok_or_else(|| RuntimeError::CaseNotFound(case_id.clone()))?;
        let mut info: WorkflowInfo = read_doc(&inner.store, &inner.keys.workflow_info(case_id))
            .await?
            .ok_or_else(|| RuntimeError::CaseNotFound(case_id.clone()))?;
        let milestones: Vec<Milestone> =
            read_doc(&inner.store, &inner.keys.journey_sla(case_id)).await?.unwrap_or_default();

        match sanitize(&mut info, &definition) {
            Ok(true) => {
                warn!(case = %case_id, "persisting repaired case state");
                write_doc(&inner.store, &inner.keys.workflow_info(case_id), &info).await?;
            }
            Ok(false) => {}
            Err(e) => {
                return Err(RuntimeError::Unrepairable {
                    case_id: case_id.clone(),
                    reason: e.to_string(),
                })
            }
        }
        Ok((definition, info, milestones))
    }

    /// Pick the exec path and cursor to resume at (the initial cursor
    /// selection), mutating the path for the run.
    fn select_cursor(&self, case: &CaseState) -> Result<String, RuntimeError> {
        let definition = case.definition.clone();
        let case_id = case.case_id.clone();
        case.with_root_mut(|r| {
            if r.has_ticket() {
                // unwind parallel structure: one fresh root path at the
                // ticket target
                let ticket = r.ticket.clone();
                let target = definition
                    .ticket(&ticket)
                    .ok_or_else(|| RuntimeError::TicketNotFound {
                        case_id: case_id.clone(),
                        ticket,
                    })?
                    .step
                    .clone();
                r.exec_paths.clear();
                r.upsert_path(ExecPath::new(ROOT_PATH, target));
                r.ticket.clear();
                r.ticket_response_type = None;
                r.pend_exec_path.clear();
                return Ok(ROOT_PATH.to_string());
            }

            let pend_name = r.pend_exec_path.clone();
            let path = r.path(&pend_name).cloned().ok_or_else(|| {
                RuntimeError::InvalidPendState {
                    case_id: case_id.clone(),
                    path: pend_name.clone(),
                    reason: "pended exec path not found".into(),
                }
            })?;

            let step = definition.step(&path.step);
            let cursor = if step.map(|s| s.kind) == Some(StepKind::Pause) {
                // the pause has already held the case once
                next_of(step)
            } else {
                match path.response_type {
                    Some(ResponseType::OkPend) => {
                        let step = step.ok_or_else(|| RuntimeError::StepNotFound {
                            case_id: case_id.clone(),
                            step: path.step.clone(),
                        })?;
                        next_of(Some(step))
                    }
                    Some(ResponseType::OkPendEor) | Some(ResponseType::ErrorPend) => {
                        path.step.clone()
                    }
                    Some(ResponseType::OkProceed) | None => {
                        return Err(RuntimeError::InvalidPendState {
                            case_id: case_id.clone(),
                            path: pend_name.clone(),
                            reason: "pended path has no pend response".into(),
                        })
                    }
                }
            };

            r.last_pend_step = path.step.clone();
            if let Some(p) = r.path_mut(&pend_name) {
                p.status = PathStatus::Started;
                p.clear_pend();
                p.step = cursor;
            }
            r.pend_exec_path.clear();
            Ok(pend_name)
        })
    }

    async fn drive(
        &self,
        case: Arc<CaseState>,
        start_path: String,
        milestones: &[Milestone],
    ) -> Result<CaseOutcome, RuntimeError> {
        let mut executor = StepExecutor::root(self.inner.clone(), case.clone(), start_path);
        executor.run().await?;
        self.finish(case, milestones).await
    }

    /// Fire the terminal event for this engine call: the case is either
    /// complete or pended now.
    async fn finish(
        &self,
        case: Arc<CaseState>,
        milestones: &[Milestone],
    ) -> Result<CaseOutcome, RuntimeError> {
        let snapshot = case.snapshot();
        if snapshot.complete() {
            let ctx = case.event_context("", ROOT_PATH);
            self.inner.dispatcher.case_completed(&ctx).await?;
            return Ok(CaseOutcome::from_info(&snapshot));
        }
        if snapshot.pend_exec_path.is_empty() {
            return Err(RuntimeError::Internal(format!(
                "case {} is neither complete nor pended",
                snapshot.case_id
            )));
        }
        self.emit_pend(&case, milestones).await?;
        Ok(CaseOutcome::from_info(&case.snapshot()))
    }

    async fn emit_pend(
        &self,
        case: &Arc<CaseState>,
        milestones: &[Milestone],
    ) -> Result<(), RuntimeError> {
        let pend_name = case.with_root(|r| r.pend_exec_path.clone());
        let path = case.with_root(|r| r.path(&pend_name).cloned()).ok_or_else(|| {
            RuntimeError::Internal(format!("pended path {pend_name} missing"))
        })?;
        let ctx = case.event_context(&path.step, &pend_name);
        let mut tbc = path.tbc_sla_work_basket.clone();
        self.inner.dispatcher.case_pended(&ctx, milestones, &mut tbc).await?;
        if tbc != path.tbc_sla_work_basket {
            case.with_root_mut(|r| {
                if let Some(p) = r.path_mut(&pend_name) {
                    p.tbc_sla_work_basket = tbc;
                }
            });
            self.persist_case(case).await?;
        }
        info!(
            case = %case.case_id,
            path = %pend_name,
            basket = %path.pend_work_basket,
            "case pended"
        );
        Ok(())
    }

    async fn persist_case(&self, case: &Arc<CaseState>) -> Result<(), RuntimeError> {
        let info = case.snapshot();
        write_doc(&self.inner.store, &self.inner.keys.workflow_info(&case.case_id), &info).await?;
        Ok(())
    }
}

fn next_of(step: Option<&Step>) -> String {
    step.and_then(|s| s.next.clone()).unwrap_or_else(|| END_STEP.to_string())
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
