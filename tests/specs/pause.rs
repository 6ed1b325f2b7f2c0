// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: pause and resume.

use crate::prelude::*;
use cf_core::{baskets, CaseId, EventKind};

#[tokio::test]
async fn pause_pends_then_resume_completes() {
    let h = harness();
    let outcome = h
        .runtime
        .start_case(CaseId::new("C2"), &pause_def(), &[], None)
        .await
        .unwrap();

    assert!(!outcome.completed);
    assert_eq!(outcome.pend_work_basket, baskets::PAUSE);
    assert_eq!(outcome.pend_exec_path, ".");
    assert_eq!(
        h.events.kinds(),
        vec![EventKind::ProcessStart, EventKind::ProcessPend],
    );

    let info = checked_info(&h, "C2").await;
    assert_eq!(info.pend_exec_path, ".");
    assert_eq!(info.path(".").unwrap().pend_work_basket, baskets::PAUSE);
    h.events.clear();

    let outcome = h.runtime.resume_case(&CaseId::new("C2"), &[]).await.unwrap();
    assert!(outcome.completed);
    // the cursor advanced past the pause to s2
    assert_eq!(h.scripts.dispatches("s2"), 1);
    assert_eq!(
        h.events.kinds(),
        vec![EventKind::ProcessResume, EventKind::ProcessComplete],
    );
    checked_info(&h, "C2").await;
}

#[tokio::test]
async fn pause_is_not_a_component_dispatch() {
    let h = harness();
    h.runtime.start_case(CaseId::new("C2"), &pause_def(), &[], None).await.unwrap();
    assert_eq!(h.scripts.dispatches("pause1"), 0);
}
