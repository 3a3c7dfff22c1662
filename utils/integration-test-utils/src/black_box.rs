/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
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

use context_router::{
    new_context, ContextConfig, ContextRegistry, RouteDefinition, RoutingContext, RoutingError,
};
use std::sync::Arc;

/// `direct:in` -> set `header`=`header` -> `next`.
pub fn black_box_route(header: &str, next: &str) -> RouteDefinition {
    RouteDefinition::from_endpoint("direct:in")
        .set_header(header, header)
        .to(next)
}

/// Two independent `in -> out` black boxes chained by an enclosing context.
///
/// Each black box runs `direct:in` -> set its own header -> `direct:out` and
/// knows nothing of the other. The enclosing context alone composes the chain:
///
/// - `BEGIN`: `direct:in` -> `blackBox1:in`
/// - `MIDDLE`: `blackBox1:out` -> `blackBox2:in`
/// - `END`: `blackBox2:out` -> `direct:out`
/// - `OBSERVE`: `direct:out` -> `mock:out`
///
/// The enclosing `direct:in` and `direct:out` share their local names with the
/// black boxes' endpoints.
pub struct BlackBoxScenario {
    pub registry: Arc<ContextRegistry>,
    pub black_box_1: RoutingContext,
    pub black_box_2: RoutingContext,
    pub enclosing: RoutingContext,
}

impl BlackBoxScenario {
    pub async fn build(config: ContextConfig) -> Result<Self, RoutingError> {
        let registry = Arc::new(ContextRegistry::new());

        let black_box_1 = new_context(
            registry.clone(),
            "blackBox1",
            vec![black_box_route("blackBox1", "direct:out")],
            config.clone(),
        )
        .await?;

        let black_box_2 = new_context(
            registry.clone(),
            "blackBox2",
            vec![black_box_route("blackBox2", "direct:out")],
            config.clone(),
        )
        .await?;

        let enclosing = new_context(
            registry.clone(),
            "enclosing",
            vec![
                RouteDefinition::from_endpoint("direct:in")
                    .route_id("BEGIN")
                    .to("blackBox1:in"),
                RouteDefinition::from_endpoint("blackBox1:out")
                    .route_id("MIDDLE")
                    .to("blackBox2:in"),
                RouteDefinition::from_endpoint("blackBox2:out")
                    .route_id("END")
                    .to("direct:out"),
                RouteDefinition::from_endpoint("direct:out")
                    .route_id("OBSERVE")
                    .to("mock:out"),
            ],
            config,
        )
        .await?;

        Ok(Self {
            registry,
            black_box_1,
            black_box_2,
            enclosing,
        })
    }
}
