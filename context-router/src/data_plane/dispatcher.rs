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

//! Message dispatcher: drives one message through route chains across contexts.

use crate::endpoint::EndpointBehavior;
use crate::observability::{events, fields};
use crate::routing::route_composer::{Route, RouteStep};
use crate::routing_context::ContextInner;
use crate::{ContextState, Endpoint, Message, RoutingContext, RoutingError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Weak};
use tracing::{debug, Level};

const COMPONENT: &str = "dispatcher";

/// A composed route attached as the consumer of an endpoint.
///
/// The owner is held weakly: an endpoint must not keep its own context alive.
#[derive(Clone)]
pub(crate) struct RouteConsumer {
    pub(crate) route: Arc<Route>,
    pub(crate) owner: Weak<ContextInner>,
}

impl RouteConsumer {
    pub(crate) fn new(route: Arc<Route>, owner: &RoutingContext) -> Self {
        Self {
            route,
            owner: owner.downgrade(),
        }
    }
}

/// Why a dispatch failed.
///
/// `Endpoint` failures carry only a reason: the caller attributes them to the
/// step (or entry point) that targeted the endpoint. `Routed` failures already
/// name their innermost step and are propagated unchanged.
#[derive(Debug)]
pub(crate) enum DispatchFailure {
    Endpoint(String),
    Routed(RoutingError),
}

impl DispatchFailure {
    /// Converts into a public error for a delivery entered at `address` of `context_id`.
    pub(crate) fn at_entry(self, context_id: &str, address: &str) -> RoutingError {
        match self {
            DispatchFailure::Endpoint(reason) => {
                RoutingError::delivery_at_entry(context_id, address, reason)
            }
            DispatchFailure::Routed(err) => err,
        }
    }
}

/// Delivers `message` into `endpoint`.
///
/// `hops` counts route executions already entered for this message.
pub(crate) fn deliver<'a>(
    endpoint: &'a Endpoint,
    message: &'a mut Message,
    hops: usize,
) -> BoxFuture<'a, Result<(), DispatchFailure>> {
    async move {
        let state = endpoint.context_state();
        if state != ContextState::Running {
            return Err(DispatchFailure::Endpoint(format!(
                "context '{}' is {state}",
                endpoint.context_id()
            )));
        }

        match &endpoint.inner.behavior {
            EndpointBehavior::Direct => consume(endpoint, message, hops).await,
            EndpointBehavior::Queue(queue) => queue
                .enqueue(endpoint, message.clone(), hops)
                .map_err(DispatchFailure::Endpoint),
            EndpointBehavior::Mock(mock) => {
                mock.record(endpoint, message.clone()).await;
                Ok(())
            }
        }
    }
    .boxed()
}

/// Runs the route consuming `endpoint` with `message`.
pub(crate) async fn consume(
    endpoint: &Endpoint,
    message: &mut Message,
    hops: usize,
) -> Result<(), DispatchFailure> {
    let consumer = endpoint.inner.consumer.read().await.clone();
    let Some(consumer) = consumer else {
        return Err(DispatchFailure::Endpoint(format!(
            "no consumers available on endpoint '{}'",
            endpoint.logical_address()
        )));
    };

    run_route(consumer, message, hops).await
}

fn run_route(
    consumer: RouteConsumer,
    message: &mut Message,
    hops: usize,
) -> BoxFuture<'_, Result<(), DispatchFailure>> {
    async move {
        let route = consumer.route;
        let Some(owner) = consumer.owner.upgrade() else {
            return Err(DispatchFailure::Endpoint(format!(
                "context '{}' owning route '{}' was dropped",
                route.context_id, route.id
            )));
        };
        let owner = RoutingContext::from_inner(owner);

        let state = owner.state();
        if state != ContextState::Running {
            return Err(DispatchFailure::Endpoint(format!(
                "route '{}' belongs to context '{}' which is {state}",
                route.id,
                owner.id()
            )));
        }

        let max_hops = owner.config().max_hops;
        if hops >= max_hops {
            return Err(DispatchFailure::Endpoint(format!(
                "hop limit of {max_hops} exceeded entering route '{}'",
                route.id
            )));
        }

        for (step, route_step) in route.steps.iter().enumerate() {
            match route_step {
                RouteStep::SetHeader { name, value } => {
                    message.set_header(name.clone(), value.clone());
                }
                RouteStep::Process(processor) => {
                    processor.process(message).await.map_err(|err| {
                        DispatchFailure::Routed(RoutingError::delivery_at_step(
                            owner.id(),
                            &route.id,
                            step,
                            "process",
                            err.to_string(),
                        ))
                    })?;
                }
                RouteStep::To { address, raw } => {
                    let state = owner.state();
                    if state != ContextState::Running {
                        return Err(DispatchFailure::Routed(RoutingError::delivery_at_step(
                            owner.id(),
                            &route.id,
                            step,
                            raw.as_str(),
                            format!("context '{}' is {state}", owner.id()),
                        )));
                    }

                    let target = address.resolve(&owner).await.map_err(|err| {
                        DispatchFailure::Routed(RoutingError::delivery_at_step(
                            owner.id(),
                            &route.id,
                            step,
                            raw.as_str(),
                            err.to_string(),
                        ))
                    })?;

                    if tracing::enabled!(Level::DEBUG) {
                        let event = if target.context_id() == owner.id() {
                            events::DISPATCH_STEP
                        } else {
                            events::DISPATCH_HANDOFF
                        };
                        debug!(
                            event,
                            component = COMPONENT,
                            context_id = owner.id(),
                            route_id = route.id.as_str(),
                            step,
                            endpoint = %target.logical_address(),
                            msg_id = %message.id(),
                            headers = %fields::format_headers(message),
                            "dispatching step"
                        );
                    }

                    match deliver(&target, message, hops + 1).await {
                        Ok(()) => {}
                        Err(DispatchFailure::Endpoint(reason)) => {
                            return Err(DispatchFailure::Routed(RoutingError::delivery_at_step(
                                owner.id(),
                                &route.id,
                                step,
                                raw.as_str(),
                                reason,
                            )));
                        }
                        Err(routed) => return Err(routed),
                    }
                }
            }
        }

        Ok(())
    }
    .boxed()
}

/// Attaches `consumer` to `endpoint`. Fails with the id of the route already attached.
pub(crate) async fn attach_consumer(
    endpoint: &Endpoint,
    consumer: RouteConsumer,
) -> Result<(), String> {
    let mut slot = endpoint.inner.consumer.write().await;
    if let Some(existing) = slot.as_ref() {
        return Err(format!(
            "endpoint '{}' is already consumed by route '{}' of context '{}'",
            endpoint.logical_address(),
            existing.route.id,
            existing.route.context_id
        ));
    }
    *slot = Some(consumer);
    Ok(())
}

/// Detaches `route` from `endpoint` if it is the current consumer.
pub(crate) async fn detach_consumer(endpoint: &Endpoint, route: &Arc<Route>) -> bool {
    let mut slot = endpoint.inner.consumer.write().await;
    match slot.as_ref() {
        Some(consumer) if Arc::ptr_eq(&consumer.route, route) => {
            *slot = None;
            true
        }
        _ => false,
    }
}
