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

//! Error taxonomy surfaced by registry, composition, lifecycle and dispatch calls.

use crate::routing_context::ContextState;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures reported by the routing engine.
///
/// Every error is returned to the immediate caller; nothing is retried.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoutingError {
    /// A context is already bound under `id`. The existing binding is untouched.
    DuplicateBinding { id: String },
    /// No live context is bound under `id`.
    UnknownContext { id: String },
    /// `id` cannot be used as a context identifier.
    ReservedContextId { id: String },
    /// An address is malformed or names no bound context / existing endpoint.
    UnresolvedAddress { address: String, reason: String },
    /// A route could not be composed or activated.
    BrokenChain {
        route_id: String,
        step: Option<usize>,
        reason: String,
    },
    /// A message could not be delivered. Identifies the innermost failing step.
    Delivery {
        context_id: String,
        route_id: Option<String>,
        step: Option<usize>,
        address: String,
        reason: String,
    },
    /// A lifecycle transition that the state machine does not allow.
    InvalidLifecycle {
        context_id: String,
        from: ContextState,
        to: ContextState,
    },
    /// `route_id` is not part of the context's route table.
    UnknownRoute { context_id: String, route_id: String },
    /// A queue endpoint worker thread could not be started.
    WorkerSpawn { endpoint: String, reason: String },
}

impl RoutingError {
    pub(crate) fn delivery_at_entry(
        context_id: &str,
        address: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        RoutingError::Delivery {
            context_id: context_id.to_string(),
            route_id: None,
            step: None,
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn delivery_at_step(
        context_id: &str,
        route_id: &str,
        step: usize,
        address: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        RoutingError::Delivery {
            context_id: context_id.to_string(),
            route_id: Some(route_id.to_string()),
            step: Some(step),
            address: address.into(),
            reason: reason.into(),
        }
    }
}

impl Display for RoutingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::DuplicateBinding { id } => {
                write!(f, "a context is already bound under id '{id}'")
            }
            RoutingError::UnknownContext { id } => write!(f, "no context bound under id '{id}'"),
            RoutingError::ReservedContextId { id } => {
                write!(f, "'{id}' cannot be used as a context id")
            }
            RoutingError::UnresolvedAddress { address, reason } => {
                write!(f, "unable to resolve address '{address}': {reason}")
            }
            RoutingError::BrokenChain {
                route_id,
                step,
                reason,
            } => match step {
                Some(step) => write!(f, "route '{route_id}' is broken at step {step}: {reason}"),
                None => write!(f, "route '{route_id}' is broken: {reason}"),
            },
            RoutingError::Delivery {
                context_id,
                route_id,
                step,
                address,
                reason,
            } => {
                write!(f, "delivery to '{address}' failed in context '{context_id}'")?;
                if let Some(route_id) = route_id {
                    write!(f, " route '{route_id}'")?;
                }
                if let Some(step) = step {
                    write!(f, " step {step}")?;
                }
                write!(f, ": {reason}")
            }
            RoutingError::InvalidLifecycle {
                context_id,
                from,
                to,
            } => write!(
                f,
                "context '{context_id}' cannot transition from {from} to {to}"
            ),
            RoutingError::UnknownRoute {
                context_id,
                route_id,
            } => write!(f, "context '{context_id}' has no route '{route_id}'"),
            RoutingError::WorkerSpawn { endpoint, reason } => {
                write!(f, "unable to start queue worker for '{endpoint}': {reason}")
            }
        }
    }
}

impl Error for RoutingError {}
