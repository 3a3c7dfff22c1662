/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use context_router::{
    ContextConfig, ContextRegistry, ContextState, RouteDefinition, RoutingContext, RoutingError,
};
use integration_test_utils::{BlackBoxScenario, FailingProcessor, RecordingProcessor};
use std::sync::Arc;

#[tokio::test]
async fn direct_sends_arrive_in_send_order() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());
    let context = support::started_context(
        &registry,
        "ordered",
        vec![RouteDefinition::from_endpoint("direct:in").to("mock:out")],
    )
    .await;

    context.send_body("direct:in", "first").await.unwrap();
    context.send_body("direct:in", "second").await.unwrap();

    support::assert_received_bodies(&context, "mock:out", &["first", "second"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn queued_sends_are_drained_in_fifo_order_across_contexts() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());
    let sink = support::started_context(
        &registry,
        "sink",
        vec![RouteDefinition::from_endpoint("seda:work")
            .set_header("drained", "sink")
            .to("mock:out")],
    )
    .await;
    let source = support::started_context(
        &registry,
        "source",
        vec![RouteDefinition::from_endpoint("direct:in").to("sink:seda:work")],
    )
    .await;

    let bodies = ["m1", "m2", "m3", "m4", "m5"];
    for body in bodies {
        source.send_body("direct:in", body).await.unwrap();
    }

    let out = sink.mock_endpoint("mock:out").await.unwrap();
    out.expected_header_received("drained", "sink").await;
    out.expected_bodies_received(bodies).await;
    out.assert_is_satisfied().await.unwrap();
}

#[tokio::test]
async fn sending_before_start_fails_delivery() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());
    let context = RoutingContext::new("idle", registry, ContextConfig::default()).unwrap();
    context
        .add_route(RouteDefinition::from_endpoint("direct:in").to("mock:out"))
        .await
        .unwrap();

    let err = context.send_body("direct:in", "too early").await.unwrap_err();

    assert_eq!(
        err,
        RoutingError::Delivery {
            context_id: "idle".to_string(),
            route_id: None,
            step: None,
            address: "direct:in".to_string(),
            reason: "context 'idle' is created".to_string(),
        }
    );
}

#[tokio::test]
async fn stopped_context_rejects_traffic_and_restart() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());
    let context = support::started_context(
        &registry,
        "short-lived",
        vec![RouteDefinition::from_endpoint("direct:in").to("mock:out")],
    )
    .await;
    let entry = context.create_endpoint("direct:in").await.unwrap();

    context.stop().await.unwrap();

    assert_eq!(context.state(), ContextState::Stopped);
    assert_eq!(entry.consumer_route_id().await, None);
    assert!(matches!(
        context.send_body("direct:in", "late").await,
        Err(RoutingError::Delivery { ref reason, .. }) if reason == "context 'short-lived' is stopped"
    ));
    assert!(matches!(
        context.start().await,
        Err(RoutingError::InvalidLifecycle { from: ContextState::Stopped, .. })
    ));
}

#[tokio::test]
async fn stopped_black_box_fails_at_the_step_that_enters_it() {
    integration_test_utils::init_logging();
    let scenario = BlackBoxScenario::build(support::test_config()).await.unwrap();
    scenario.black_box_2.stop().await.unwrap();

    let err = scenario
        .enclosing
        .send_body("direct:in", "testing")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RoutingError::Delivery {
            context_id: "enclosing".to_string(),
            route_id: Some("MIDDLE".to_string()),
            step: Some(0),
            address: "blackBox2:in".to_string(),
            reason: "context 'blackBox2' is stopped".to_string(),
        }
    );
    let out = scenario.enclosing.mock_endpoint("mock:out").await.unwrap();
    assert_eq!(out.received_count().await, 0);
}

#[tokio::test]
async fn routing_cycle_hits_the_hop_budget() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());
    let context = context_router::new_context(
        registry,
        "loop",
        vec![
            RouteDefinition::from_endpoint("direct:a").route_id("ping").to("direct:b"),
            RouteDefinition::from_endpoint("direct:b").route_id("pong").to("direct:a"),
        ],
        ContextConfig::default().with_max_hops(4),
    )
    .await
    .unwrap();

    let err = context.send_body("direct:a", "spin").await.unwrap_err();

    match err {
        RoutingError::Delivery {
            context_id,
            route_id,
            step,
            reason,
            ..
        } => {
            assert_eq!(context_id, "loop");
            assert_eq!(route_id.as_deref(), Some("pong"));
            assert_eq!(step, Some(0));
            assert_eq!(reason, "hop limit of 4 exceeded entering route 'ping'");
        }
        other => panic!("expected delivery failure, got {other:?}"),
    }
}

#[tokio::test]
async fn processor_steps_run_in_order_and_failures_name_the_step() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());
    let recorder = Arc::new(RecordingProcessor::new());

    let context = support::started_context(
        &registry,
        "processing",
        vec![
            RouteDefinition::from_endpoint("direct:ok")
                .process(recorder.clone())
                .to("mock:out"),
            RouteDefinition::from_endpoint("direct:fail")
                .route_id("failing")
                .set_header("before", "failure")
                .process(Arc::new(FailingProcessor::new("boom")))
                .to("mock:out"),
        ],
    )
    .await;

    context.send_body("direct:ok", "hello").await.unwrap();
    assert_eq!(recorder.seen().await, vec!["hello".to_string()]);

    let err = context.send_body("direct:fail", "doomed").await.unwrap_err();
    assert_eq!(
        err,
        RoutingError::Delivery {
            context_id: "processing".to_string(),
            route_id: Some("failing".to_string()),
            step: Some(1),
            address: "process".to_string(),
            reason: "processor failed: boom".to_string(),
        }
    );
    support::assert_received_bodies(&context, "mock:out", &["hello"]).await;
}

#[tokio::test]
async fn removed_route_leaves_no_consumer_behind() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());
    let context = support::started_context(
        &registry,
        "editable",
        vec![RouteDefinition::from_endpoint("direct:in")
            .route_id("only")
            .to("mock:out")],
    )
    .await;

    context.remove_route("only").await.unwrap();
    let err = context.send_body("direct:in", "orphan").await.unwrap_err();
    assert!(matches!(
        err,
        RoutingError::Delivery { ref reason, .. }
            if reason == "no consumers available on endpoint 'editable:direct:in'"
    ));

    // A running context activates replacement routes immediately.
    context
        .add_route(RouteDefinition::from_endpoint("direct:in").to("mock:out"))
        .await
        .unwrap();
    context.send_body("direct:in", "adopted").await.unwrap();
    support::assert_received_bodies(&context, "mock:out", &["adopted"]).await;
}
