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
    new_context, ContextConfig, ContextRegistry, ProducerTemplate, RouteDefinition,
    RoutingContext, RoutingError,
};
use integration_test_utils::{black_box_route, BlackBoxScenario};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread")]
async fn message_crosses_both_black_boxes_and_collects_their_headers() {
    integration_test_utils::init_logging();

    let scenario = BlackBoxScenario::build(support::test_config())
        .await
        .expect("black-box scenario should build");

    let out = scenario
        .enclosing
        .mock_endpoint("mock:out")
        .await
        .expect("mock endpoint should exist");
    out.expected_message_count(1).await;
    out.expected_header_received("blackBox1", "blackBox1").await;
    out.expected_header_received("blackBox2", "blackBox2").await;

    ProducerTemplate::new(scenario.registry.clone())
        .send_body("enclosing", "direct:in", "testing")
        .await
        .expect("send should succeed");

    out.assert_is_satisfied()
        .await
        .expect("mock:out should receive one message with both headers");
    let received = out.received_messages().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].body(), "testing");
    assert_eq!(received[0].headers().len(), 2);
}

#[tokio::test]
async fn enclosing_context_alone_composes_the_chain() {
    integration_test_utils::init_logging();
    let scenario = BlackBoxScenario::build(support::test_config()).await.unwrap();
    let BlackBoxScenario {
        black_box_1,
        black_box_2,
        enclosing,
        ..
    } = &scenario;

    // `direct:in` and `direct:out` exist three times, once per context.
    for name in ["direct:in", "direct:out"] {
        let own = enclosing.create_endpoint(name).await.unwrap();
        let first = black_box_1.create_endpoint(name).await.unwrap();
        let second = black_box_2.create_endpoint(name).await.unwrap();
        assert_ne!(own, first);
        assert_ne!(own, second);
        assert_ne!(first, second);
    }

    // Each black box consumes only its own `in`; its `out` is consumed from outside.
    let bb1_in = black_box_1.create_endpoint("in").await.unwrap();
    let bb1_out = black_box_1.create_endpoint("out").await.unwrap();
    let bb2_out = black_box_2.create_endpoint("out").await.unwrap();
    assert_eq!(bb1_in.consumer_route_id().await.as_deref(), Some("route1"));
    assert_eq!(bb1_out.consumer_route_id().await.as_deref(), Some("MIDDLE"));
    assert_eq!(bb2_out.consumer_route_id().await.as_deref(), Some("END"));
    assert_eq!(bb2_out.logical_address(), "blackBox2:direct:out");

    let own_in = enclosing.create_endpoint("in").await.unwrap();
    let own_out = enclosing.create_endpoint("out").await.unwrap();
    assert_eq!(own_in.consumer_route_id().await.as_deref(), Some("BEGIN"));
    assert_eq!(own_out.consumer_route_id().await.as_deref(), Some("OBSERVE"));
    assert_eq!(
        enclosing.route_ids().await,
        vec!["BEGIN", "MIDDLE", "END", "OBSERVE"]
    );

    // The black boxes never route into each other.
    assert_eq!(black_box_1.route_ids().await, vec!["route1"]);
    assert_eq!(black_box_2.route_ids().await, vec!["route1"]);
}

#[tokio::test]
async fn same_local_name_in_two_contexts_never_crosses_over() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());

    let a = support::started_context(
        &registry,
        "A",
        vec![RouteDefinition::from_endpoint("in").to("mock:out")],
    )
    .await;
    let b = support::started_context(
        &registry,
        "B",
        vec![RouteDefinition::from_endpoint("in").to("mock:out")],
    )
    .await;
    let enclosing = support::started_context(
        &registry,
        "enclosing",
        vec![RouteDefinition::from_endpoint("direct:in").to("A:in")],
    )
    .await;

    assert_ne!(
        a.create_endpoint("in").await.unwrap(),
        b.create_endpoint("in").await.unwrap()
    );

    enclosing.send_body("direct:in", "for A").await.unwrap();

    support::assert_received_bodies(&a, "mock:out", &["for A"]).await;
    support::assert_received_bodies(&b, "mock:out", &[]).await;
}

#[tokio::test]
async fn headers_from_every_context_in_a_chain_accumulate() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());

    let third = support::started_context(&registry, "third", vec![black_box_route("h3", "mock:out")]).await;
    let _second =
        support::started_context(&registry, "second", vec![black_box_route("h2", "third:in")]).await;
    let first =
        support::started_context(&registry, "first", vec![black_box_route("h1", "second:in")]).await;

    let delivered = first.send_body("direct:in", "chain").await.unwrap();

    let received = third.mock_endpoint("mock:out").await.unwrap().received_messages().await;
    assert_eq!(received.len(), 1);
    let headers: Vec<(&str, &str)> = received[0]
        .headers()
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    assert_eq!(headers, vec![("h1", "h1"), ("h2", "h2"), ("h3", "h3")]);
    assert_eq!(delivered.headers(), received[0].headers());
}

#[tokio::test]
async fn unbound_prefix_is_unresolved_rather_than_local() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());
    let enclosing =
        RoutingContext::new("enclosing", registry.clone(), ContextConfig::default()).unwrap();

    let err = enclosing
        .add_route(RouteDefinition::from_endpoint("direct:start").to("unknownCtx:in"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RoutingError::UnresolvedAddress {
            address: "unknownCtx:in".to_string(),
            reason: "no context bound under 'unknownCtx'".to_string(),
        }
    );
    assert!(enclosing.route_ids().await.is_empty());
    assert!(enclosing.endpoint_uris().await.is_empty());
}

#[tokio::test]
async fn duplicate_binding_is_rejected_and_original_survives() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());
    let original = support::started_context(
        &registry,
        "blackBox1",
        vec![RouteDefinition::from_endpoint("in").to("mock:out")],
    )
    .await;

    let err = new_context(registry.clone(), "blackBox1", Vec::new(), ContextConfig::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RoutingError::DuplicateBinding {
            id: "blackBox1".to_string()
        }
    );

    let first = registry.lookup("blackBox1").await.unwrap();
    let second = registry.lookup("blackBox1").await.unwrap();
    assert!(first.ptr_eq(&original));
    assert!(first.ptr_eq(&second));

    ProducerTemplate::new(registry.clone())
        .send_body("blackBox1", "in", "still routed")
        .await
        .unwrap();
    support::assert_received_bodies(&original, "mock:out", &["still routed"]).await;
}

#[tokio::test]
async fn foreign_entry_endpoint_accepts_a_single_consumer() {
    integration_test_utils::init_logging();
    let registry = Arc::new(ContextRegistry::new());
    let _owner = support::started_context(
        &registry,
        "owner",
        vec![RouteDefinition::from_endpoint("direct:in").to("mock:out")],
    )
    .await;

    let err = new_context(
        registry.clone(),
        "intruder",
        vec![RouteDefinition::from_endpoint("owner:direct:in").to("mock:stolen")],
        ContextConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RoutingError::BrokenChain { step: None, .. }));
    assert!(!registry.contains("intruder").await);
}
