// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: parallel route with join.

use crate::prelude::*;
use cf_core::{CaseId, PathStatus, TaskResponse};

#[tokio::test]
async fn fork_runs_both_branches_and_joins() {
    let h = harness();
    let outcome = h
        .runtime
        .start_case(CaseId::new("C3"), &parallel_def(), &[], None)
        .await
        .unwrap();
    assert!(outcome.completed);

    let calls = h.scripts.calls();
    assert!(calls.contains(&"a1@.p.A.".to_string()));
    assert!(calls.contains(&"b1@.p.B.".to_string()));

    let info = checked_info(&h, "C3").await;
    let names: Vec<String> = info.exec_paths.keys().cloned().collect();
    assert_eq!(names, vec![".", ".p.A.", ".p.B."]);
    for path in info.exec_paths.values() {
        assert_eq!(path.status, PathStatus::Completed);
        assert!(!path.is_pended());
    }
}

#[tokio::test]
async fn fork_produces_one_child_per_branch_with_distinct_names() {
    let h = harness();
    h.scripts.on_task("a1", vec![Ok(TaskResponse::pend("wb_a"))]);
    h.scripts.on_task("b1", vec![Ok(TaskResponse::pend("wb_b"))]);

    h.runtime.start_case(CaseId::new("C3"), &parallel_def(), &[], None).await.unwrap();

    let info = checked_info(&h, "C3").await;
    let children: Vec<&String> =
        info.exec_paths.keys().filter(|n| n.as_str() != ".").collect();
    assert_eq!(children.len(), 2);
    assert!(info.path(".p.A.").is_some());
    assert!(info.path(".p.B.").is_some());
}

#[tokio::test]
async fn pended_branch_holds_the_case_and_resumes_through_join() {
    let h = harness();
    h.scripts.on_task("b1", vec![Ok(TaskResponse::pend("wb_b"))]);

    let outcome = h
        .runtime
        .start_case(CaseId::new("C3"), &parallel_def(), &[], None)
        .await
        .unwrap();
    assert!(!outcome.completed);
    assert_eq!(outcome.pend_exec_path, ".p.B.");
    checked_info(&h, "C3").await;

    let outcome = h.runtime.resume_case(&CaseId::new("C3"), &[]).await.unwrap();
    assert!(outcome.completed);
    // the pended task is not re-dispatched after an OK_PEND
    assert_eq!(h.scripts.dispatches("b1"), 1);

    let info = checked_info(&h, "C3").await;
    for path in info.exec_paths.values() {
        assert_eq!(path.status, PathStatus::Completed);
    }
}

#[tokio::test]
async fn deepest_pend_owns_the_pointer() {
    // nested forks: outer route p, inner route q under branch A
    let def = cf_core::WorkflowDefinition::new("nested")
        .with_step(cf_core::Step::p_route(
            "p",
            "c",
            vec![cf_core::Branch::new("A", "q"), cf_core::Branch::new("B", "b1")],
            "j",
        ))
        .with_step(cf_core::Step::p_route_dynamic(
            "q",
            "c",
            vec![cf_core::Branch::new("X", "x1"), cf_core::Branch::new("Y", "y1")],
            "jq",
        ))
        .with_step(cf_core::Step::task("x1", "c", "jq"))
        .with_step(cf_core::Step::task("y1", "c", "jq"))
        .with_step(cf_core::Step::p_join("jq", "j"))
        .with_step(cf_core::Step::task("b1", "c", "j"))
        .with_step(cf_core::Step::p_join("j", "end"));

    let h = harness();
    h.scripts.on_route(
        "q",
        vec![Ok(cf_core::RouteResponse::take_all(vec!["X".into(), "Y".into()]))],
    );
    h.scripts.on_task("x1", vec![Ok(TaskResponse::pend("deep_basket"))]);

    let outcome = h.runtime.start_case(CaseId::new("C3"), &def, &[], None).await.unwrap();
    assert!(!outcome.completed);
    assert_eq!(outcome.pend_exec_path, ".p.A.q.X.");
    assert_eq!(outcome.pend_work_basket, "deep_basket");
    checked_info(&h, "C3").await;

    // resume clears the deep branch, joins ripple up, case completes
    let outcome = h.runtime.resume_case(&CaseId::new("C3"), &[]).await.unwrap();
    assert!(outcome.completed);
    checked_info(&h, "C3").await;
}
