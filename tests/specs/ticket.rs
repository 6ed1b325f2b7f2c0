// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: ticket raised from inside a branch.

use crate::prelude::*;
use cf_core::{CaseId, EventKind, TaskResponse};

#[tokio::test]
async fn proceed_ticket_unwinds_to_target_and_completes() {
    let h = harness();
    h.scripts.on_task("a1", vec![Ok(TaskResponse::proceed_with_ticket("T"))]);

    let outcome = h
        .runtime
        .start_case(CaseId::new("C4"), &ticket_def(), &[], None)
        .await
        .unwrap();

    assert!(outcome.completed);
    assert_eq!(h.scripts.dispatches("recover"), 1);
    // the normal continuation after the join never runs
    assert_eq!(h.scripts.dispatches("last"), 0);
    assert!(h.events.kinds().contains(&EventKind::TicketRaised));

    // post-unwind: a single root path, ticket consumed
    let info = checked_info(&h, "C4").await;
    let names: Vec<String> = info.exec_paths.keys().cloned().collect();
    assert_eq!(names, vec!["."]);
    assert!(info.ticket.is_empty());
    assert_eq!(info.is_complete, Some(true));
}

#[tokio::test]
async fn pend_ticket_unifies_onto_root_at_raisers_basket() {
    let h = harness();
    h.scripts
        .on_task("a1", vec![Ok(TaskResponse::pend("escalation").with_ticket("T"))]);

    let outcome = h
        .runtime
        .start_case(CaseId::new("C4"), &ticket_def(), &[], None)
        .await
        .unwrap();

    assert!(!outcome.completed);
    assert_eq!(outcome.pend_exec_path, ".");
    assert_eq!(outcome.pend_work_basket, "escalation");
    assert_eq!(outcome.ticket, "T");
    checked_info(&h, "C4").await;

    // resume jumps straight to the ticket target
    let outcome = h.runtime.resume_case(&CaseId::new("C4"), &[]).await.unwrap();
    assert!(outcome.completed);
    assert_eq!(h.scripts.dispatches("recover"), 1);
    assert!(h.events.kinds().contains(&EventKind::TicketRaised));
    checked_info(&h, "C4").await;
}

#[tokio::test]
async fn sibling_completes_normally_before_unwind() {
    let h = harness();
    h.scripts.on_task("a1", vec![Ok(TaskResponse::proceed_with_ticket("T"))]);

    h.runtime.start_case(CaseId::new("C4"), &ticket_def(), &[], None).await.unwrap();
    // the other branch still ran its task exactly once
    assert_eq!(h.scripts.dispatches("b1"), 1);
}
