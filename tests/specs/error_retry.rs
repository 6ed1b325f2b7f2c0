// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: error pend and retry.

use crate::prelude::*;
use cf_core::{baskets, CaseId, EventKind, ResponseType};

#[tokio::test]
async fn failing_step_pends_in_error_basket_then_retries() {
    let h = harness();
    let def = cf_core::WorkflowDefinition::new("flaky")
        .with_step(cf_core::Step::task("start", "c", "risky"))
        .with_step(cf_core::Step::task("risky", "c", "end"));
    h.scripts.on_task("risky", vec![Err("first call fails".into())]);

    let outcome = h.runtime.start_case(CaseId::new("C5"), &def, &[], None).await.unwrap();
    assert!(!outcome.completed);
    assert_eq!(outcome.pend_work_basket, baskets::ERROR);
    let error = outcome.pend_error.unwrap();
    assert!(error.message.contains("first call fails"));
    assert_eq!(
        h.events.kinds(),
        vec![EventKind::ProcessStart, EventKind::ProcessPend],
    );

    let info = checked_info(&h, "C5").await;
    let root = info.path(".").unwrap();
    assert_eq!(root.response_type, Some(ResponseType::ErrorPend));
    assert!(root.pend_error.is_some());

    // second dispatch succeeds (unscripted tasks proceed)
    let outcome = h.runtime.resume_case(&CaseId::new("C5"), &[]).await.unwrap();
    assert!(outcome.completed);
    assert_eq!(h.scripts.dispatches("risky"), 2);
    checked_info(&h, "C5").await;
}

#[tokio::test]
async fn error_context_reaches_the_retried_dispatch() {
    let h = harness();
    let def = cf_core::WorkflowDefinition::new("flaky")
        .with_step(cf_core::Step::task("risky", "c", "end"));
    h.scripts.on_task("risky", vec![Err("boom".into())]);

    h.runtime.start_case(CaseId::new("C5"), &def, &[], None).await.unwrap();
    let info = checked_info(&h, "C5").await;
    // the error stays on the path until the case moves forward
    assert_eq!(info.path(".").unwrap().pend_error.as_ref().unwrap().code, "component_error");

    h.runtime.resume_case(&CaseId::new("C5"), &[]).await.unwrap();
    let info = checked_info(&h, "C5").await;
    assert_eq!(info.is_complete, Some(true));
}

#[tokio::test]
async fn case_is_never_destroyed_by_failures() {
    let h = harness();
    let def = cf_core::WorkflowDefinition::new("flaky")
        .with_step(cf_core::Step::task("risky", "c", "end"));
    h.scripts.on_task(
        "risky",
        vec![Err("one".into()), Err("two".into()), Err("three".into())],
    );

    h.runtime.start_case(CaseId::new("C5"), &def, &[], None).await.unwrap();
    for _ in 0..2 {
        let outcome = h.runtime.resume_case(&CaseId::new("C5"), &[]).await.unwrap();
        assert!(!outcome.completed);
        assert_eq!(outcome.pend_work_basket, baskets::ERROR);
        checked_info(&h, "C5").await;
    }
    let outcome = h.runtime.resume_case(&CaseId::new("C5"), &[]).await.unwrap();
    assert!(outcome.completed);
    assert_eq!(h.scripts.dispatches("risky"), 4);
}
