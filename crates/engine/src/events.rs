// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle event dispatch and SLA signal derivation.
//!
//! The handler is called inline and must be fast. The dispatcher wraps
//! the applicable events with enqueue/dequeue calls to the external SLA
//! queue manager; deadline policy lives entirely on the other side of
//! that trait.

use crate::error::RuntimeError;
use async_trait::async_trait;
use cf_core::{ComponentError, EventContext, EventKind, Milestone, ResponseType, SetupOn};
use std::sync::Arc;
use tracing::debug;

/// External callback for lifecycle events.
///
/// Must be synchronous in effect (the engine awaits it inline) and
/// non-throwing for [`EventKind::Persist`]; an error there converts the
/// PERSIST step into an error pend. Errors on other events abort the
/// current engine call (case state is already durable).
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn invoke(&self, kind: EventKind, ctx: &EventContext) -> Result<(), ComponentError>;
}

/// Event handler that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventHandler;

#[async_trait]
impl EventHandler for NoopEventHandler {
    async fn invoke(&self, _kind: EventKind, _ctx: &EventContext) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// External SLA queue manager. The engine only emits enqueue/dequeue
/// signals derived from case lifecycle; it never tracks deadlines.
#[async_trait]
pub trait SlaQueueManager: Send + Sync {
    async fn enqueue_case_start_milestones(&self, ctx: &EventContext, milestones: &[Milestone]);
    async fn enqueue_work_basket_milestones(
        &self,
        ctx: &EventContext,
        work_basket: &str,
        milestones: &[Milestone],
    );
    async fn dequeue_work_basket_milestones(&self, ctx: &EventContext, work_basket: &str);
    async fn dequeue_all(&self, ctx: &EventContext);
}

/// Fires lifecycle events and derives the SLA signals around them.
pub(crate) struct EventDispatcher<H> {
    handler: Arc<H>,
    sla: Option<Arc<dyn SlaQueueManager>>,
}

impl<H: EventHandler> EventDispatcher<H> {
    pub(crate) fn new(handler: H, sla: Option<Arc<dyn SlaQueueManager>>) -> Self {
        Self { handler: Arc::new(handler), sla }
    }

    async fn fire(&self, kind: EventKind, ctx: &EventContext) -> Result<(), RuntimeError> {
        debug!(case = %ctx.case_id, event = %kind, "firing event");
        self.handler.invoke(kind, ctx).await.map_err(|e| RuntimeError::EventHandler {
            case_id: ctx.case_id.clone(),
            event: kind,
            message: e.0,
        })
    }

    /// ON_PERSIST. The error is returned raw so the executor can convert
    /// it into an error pend instead of aborting.
    pub(crate) async fn persist(&self, ctx: &EventContext) -> Result<(), ComponentError> {
        debug!(case = %ctx.case_id, event = %EventKind::Persist, "firing event");
        self.handler.invoke(EventKind::Persist, ctx).await
    }

    pub(crate) async fn case_started(
        &self,
        ctx: &EventContext,
        milestones: &[Milestone],
    ) -> Result<(), RuntimeError> {
        self.fire(EventKind::ProcessStart, ctx).await?;
        if let Some(sla) = &self.sla {
            let eligible: Vec<Milestone> = milestones
                .iter()
                .filter(|m| m.setup_on == SetupOn::CaseStart)
                .cloned()
                .collect();
            if !eligible.is_empty() {
                sla.enqueue_case_start_milestones(ctx, &eligible).await;
            }
        }
        Ok(())
    }

    pub(crate) async fn case_resumed(&self, ctx: &EventContext) -> Result<(), RuntimeError> {
        self.fire(EventKind::ProcessResume, ctx).await
    }

    pub(crate) async fn ticket_raised(&self, ctx: &EventContext) -> Result<(), RuntimeError> {
        self.fire(EventKind::TicketRaised, ctx).await
    }

    pub(crate) async fn case_reopened(&self, ctx: &EventContext) -> Result<(), RuntimeError> {
        self.fire(EventKind::ProcessReopen, ctx).await
    }

    pub(crate) async fn case_completed(&self, ctx: &EventContext) -> Result<(), RuntimeError> {
        self.fire(EventKind::ProcessComplete, ctx).await?;
        if let Some(sla) = &self.sla {
            sla.dequeue_all(ctx).await;
        }
        Ok(())
    }

    /// ON_PROCESS_PEND plus the basket transition derivation.
    ///
    /// `tbc` is the pended path's to-be-cleared basket cell: an
    /// OK_PEND_EOR pend records its basket there, and the next pend to a
    /// different basket dequeues it before enqueueing its own.
    pub(crate) async fn case_pended(
        &self,
        ctx: &EventContext,
        milestones: &[Milestone],
        tbc: &mut String,
    ) -> Result<(), RuntimeError> {
        self.fire(EventKind::ProcessPend, ctx).await?;
        let Some(sla) = &self.sla else { return Ok(()) };

        let work_basket = ctx.work_basket.clone();
        if !tbc.is_empty() && *tbc != work_basket {
            sla.dequeue_work_basket_milestones(ctx, tbc).await;
            tbc.clear();
        }

        // Woke up and pended at the same point again (e.g. error basket
        // back to the original basket): only restart milestones apply.
        let same_step_return = ctx.is_pend_at_same_step && ctx.prev_work_basket == work_basket;
        let eligible: Vec<Milestone> = if same_step_return {
            milestones.iter().filter(|m| m.setup_on == SetupOn::CaseRestart).cloned().collect()
        } else {
            milestones.iter().filter(|m| m.applies_to_basket(&work_basket)).cloned().collect()
        };
        if !eligible.is_empty() {
            sla.enqueue_work_basket_milestones(ctx, &work_basket, &eligible).await;
        }

        if ctx.response_type == Some(ResponseType::OkPendEor) {
            *tbc = work_basket;
        }
        Ok(())
    }

    /// SLA derivation for the management-path work-basket move. Skipped
    /// entirely when either side is the to-be-cleared basket.
    pub(crate) async fn work_basket_changed(
        &self,
        ctx: &EventContext,
        milestones: &[Milestone],
        old_work_basket: &str,
        new_work_basket: &str,
        tbc: &str,
    ) {
        let Some(sla) = &self.sla else { return };
        if old_work_basket == tbc || new_work_basket == tbc {
            return;
        }
        sla.dequeue_work_basket_milestones(ctx, old_work_basket).await;
        let eligible: Vec<Milestone> =
            milestones.iter().filter(|m| m.applies_to_basket(new_work_basket)).cloned().collect();
        if !eligible.is_empty() {
            sla.enqueue_work_basket_milestones(ctx, new_work_basket, &eligible).await;
        }
    }
}
