// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-cutting state invariants and repair idempotence.

use crate::prelude::*;
use cf_core::{CaseId, ExecPath, PathStatus, ResponseType, TaskResponse, WorkflowInfo};
use cf_engine::sanitize;
use similar_asserts::assert_eq;

#[tokio::test]
async fn invariants_hold_across_a_full_case_lifecycle() {
    let h = harness();
    h.scripts.on_task("a1", vec![Ok(TaskResponse::pend("wb_a"))]);
    h.scripts.on_task("b1", vec![Ok(TaskResponse::pend_eor("wb_b"))]);

    h.runtime.start_case(CaseId::new("P1"), &parallel_def(), &[], None).await.unwrap();
    checked_info(&h, "P1").await;

    let mut outcome = h.runtime.resume_case(&CaseId::new("P1"), &[]).await.unwrap();
    checked_info(&h, "P1").await;
    if !outcome.completed {
        outcome = h.runtime.resume_case(&CaseId::new("P1"), &[]).await.unwrap();
        checked_info(&h, "P1").await;
    }
    assert!(outcome.completed);
}

#[tokio::test]
async fn invariants_hold_after_ticket_unification() {
    let h = harness();
    h.scripts.on_task("a1", vec![Ok(TaskResponse::pend("held").with_ticket("T"))]);

    h.runtime.start_case(CaseId::new("P2"), &ticket_def(), &[], None).await.unwrap();
    let info = checked_info(&h, "P2").await;
    assert_eq!(info.pend_exec_path, ".");

    h.runtime.resume_case(&CaseId::new("P2"), &[]).await.unwrap();
    checked_info(&h, "P2").await;
}

fn crashed_fixture() -> WorkflowInfo {
    let mut info = WorkflowInfo::new(CaseId::new("X"), "forking");
    info.is_complete = None;
    info.exec_paths.insert(".".into(), ExecPath::new(".", "p"));
    let mut a = ExecPath::new(".p.A.", "a1");
    a.response_type = Some(ResponseType::OkProceed);
    info.exec_paths.insert(".p.A.".into(), a);
    let mut b = ExecPath::new(".p.B.", "b1");
    b.status = PathStatus::Completed;
    b.set_pend("wb_b", ResponseType::OkPend);
    info.exec_paths.insert(".p.B.".into(), b);
    info
}

#[test]
fn sanitize_twice_equals_sanitize_once() {
    let def = parallel_def();
    let mut once = crashed_fixture();
    sanitize(&mut once, &def).unwrap();
    assert_invariants(&once);

    let mut twice = once.clone();
    let changed = sanitize(&mut twice, &def).unwrap();
    assert!(!changed);
    assert_eq!(twice, once);
}

#[test]
fn sanitized_state_satisfies_invariants() {
    let def = parallel_def();
    let mut info = crashed_fixture();
    sanitize(&mut info, &def).unwrap();

    assert_invariants(&info);
    // interrupted task with an observed response advances on resume
    assert_eq!(info.path(".p.A.").unwrap().response_type, Some(ResponseType::OkPend));
    // the already-pended branch is untouched
    assert_eq!(info.path(".p.B.").unwrap().pend_work_basket, "wb_b");
    assert_eq!(info.is_complete, Some(false));
}
