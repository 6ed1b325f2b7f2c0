// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: linear happy path.

use crate::prelude::*;
use cf_core::{CaseId, EventKind, PathStatus};
use cf_storage::Store;

#[tokio::test]
async fn three_tasks_run_in_order_and_complete() {
    let h = harness();
    let outcome = h
        .runtime
        .start_case(CaseId::new("C1"), &linear_def(), &[], None)
        .await
        .unwrap();

    assert!(outcome.completed);
    assert_eq!(
        h.scripts.calls(),
        vec!["start@.", "s2@.", "s3@."],
    );
    assert_eq!(
        h.events.kinds(),
        vec![EventKind::ProcessStart, EventKind::ProcessComplete],
    );

    let info = checked_info(&h, "C1").await;
    assert_eq!(info.is_complete, Some(true));
    assert_eq!(info.exec_paths.len(), 1);
    let root = info.path(".").unwrap();
    assert_eq!(root.status, PathStatus::Completed);
    assert_eq!(root.step, "s3");
}

#[tokio::test]
async fn every_executed_step_is_audited_in_sequence() {
    let h = harness();
    h.runtime.start_case(CaseId::new("C1"), &linear_def(), &[], None).await.unwrap();

    let keys = h.store.list_keys(&h.keys.audit_prefix(&CaseId::new("C1"))).await.unwrap();
    assert_eq!(keys.len(), 3);
    for (seq, step) in [(1, "start"), (2, "s2"), (3, "s3")] {
        let expected = h.keys.audit_record(&CaseId::new("C1"), seq, step);
        assert!(keys.contains(&expected), "missing audit record {expected}");
    }
}

#[tokio::test]
async fn no_step_off_the_executed_graph_is_invoked() {
    let h = harness();
    h.scripts.on_route("route", vec![Ok(cf_core::RouteResponse::take("fast"))]);
    let def = cf_core::WorkflowDefinition::new("routing")
        .with_step(cf_core::Step::s_route(
            "route",
            "c",
            vec![cf_core::Branch::new("fast", "fast1"), cf_core::Branch::new("slow", "slow1")],
        ))
        .with_step(cf_core::Step::task("fast1", "c", "end"))
        .with_step(cf_core::Step::task("slow1", "c", "end"));

    h.runtime.start_case(CaseId::new("C1"), &def, &[], None).await.unwrap();
    assert_eq!(h.scripts.dispatches("fast1"), 1);
    assert_eq!(h.scripts.dispatches("slow1"), 0);
}
