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

//! # context-router
//!
//! `context-router` hosts independently named routing contexts, each an isolated
//! namespace of endpoints and routes, and composes them into a hierarchy through
//! a shared [`ContextRegistry`].
//!
//! A route addresses endpoints of its own context locally (`direct:in`, `in`)
//! and endpoints of another context logically (`blackBox1:in`). Messages carry
//! their headers across context boundaries.
//!
//! Typical usage is API-first and remains centered on [`RoutingContext`],
//! [`RouteDefinition`] and [`ContextRegistry`]. Internal modules are organized
//! by domain layer to keep behavior ownership explicit.
//!
//! ## Black-box composition
//!
//! ```
//! use std::sync::Arc;
//! use context_router::{
//!     new_context, ContextConfig, ContextRegistry, ProducerTemplate, RouteDefinition,
//! };
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = Arc::new(ContextRegistry::new());
//!
//! // The registry binds contexts weakly: keep every handle alive while routing.
//! // Each black box is an independent `in -> out` box setting its own header.
//! let mut black_boxes = Vec::new();
//! for id in ["blackBox1", "blackBox2"] {
//!     let black_box = new_context(
//!         registry.clone(),
//!         id,
//!         vec![RouteDefinition::from_endpoint("direct:in")
//!             .set_header(id, id)
//!             .to("direct:out")],
//!         ContextConfig::default(),
//!     )
//!     .await
//!     .unwrap();
//!     black_boxes.push(black_box);
//! }
//!
//! // The enclosing context composes the chain; its own `direct:in` and
//! // `direct:out` do not clash with the black boxes' endpoints.
//! let enclosing = new_context(
//!     registry.clone(),
//!     "enclosing",
//!     vec![
//!         RouteDefinition::from_endpoint("direct:in").route_id("BEGIN").to("blackBox1:in"),
//!         RouteDefinition::from_endpoint("blackBox1:out").route_id("MIDDLE").to("blackBox2:in"),
//!         RouteDefinition::from_endpoint("blackBox2:out").route_id("END").to("direct:out"),
//!         RouteDefinition::from_endpoint("direct:out").to("mock:out"),
//!     ],
//!     ContextConfig::default(),
//! )
//! .await
//! .unwrap();
//!
//! let out = enclosing.mock_endpoint("mock:out").await.unwrap();
//! out.expected_message_count(1).await;
//! out.expected_header_received("blackBox1", "blackBox1").await;
//! out.expected_header_received("blackBox2", "blackBox2").await;
//!
//! ProducerTemplate::new(registry)
//!     .send_body("enclosing", "direct:in", "testing")
//!     .await
//!     .unwrap();
//! out.assert_is_satisfied().await.unwrap();
//! # });
//! ```

mod config;
pub use config::ContextConfig;

mod control_plane;
pub use control_plane::context_registry::ContextRegistry;

mod data_plane;
pub use data_plane::mock_endpoint::{MockAssertionError, MockEndpoint};

mod endpoint;
pub use endpoint::Endpoint;

mod error;
pub use error::RoutingError;

mod message;
pub use message::Message;

#[doc(hidden)]
pub mod observability;

mod processor;
pub use processor::{Processor, ProcessorError};

mod producer;
pub use producer::ProducerTemplate;

mod route_definition;
pub use route_definition::{RouteDefinition, StepDefinition};

mod routing;
pub use routing::address::{EndpointKind, EndpointUri, ADDRESS_DELIMITER};

mod routing_context;
pub use routing_context::{new_context, ContextState, RoutingContext};

mod runtime;
