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

use crate::Processor;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

///
/// [`RouteDefinition`] is the uncomposed form of a route: the address it consumes
/// from and an ordered list of steps.
///
/// Addresses are plain strings here. They are parsed into local or foreign
/// addresses once, when the definition is added to a
/// [`RoutingContext`][crate::RoutingContext].
///
/// # Examples
///
/// ```
/// use context_router::RouteDefinition;
///
/// let route = RouteDefinition::from_endpoint("direct:in")
///     .route_id("BEGIN")
///     .set_header("blackBox1", "blackBox1")
///     .to("blackBox1:in");
///
/// assert_eq!(route.id(), Some("BEGIN"));
/// assert_eq!(route.from_uri(), "direct:in");
/// assert_eq!(route.steps().len(), 2);
/// ```
#[derive(Clone)]
pub struct RouteDefinition {
    pub(crate) id: Option<String>,
    pub(crate) from: String,
    pub(crate) steps: Vec<StepDefinition>,
}

#[derive(Clone)]
pub enum StepDefinition {
    SetHeader { name: String, value: String },
    To(String),
    Process(Arc<dyn Processor>),
}

impl Debug for StepDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StepDefinition::SetHeader { name, value } => f
                .debug_struct("SetHeader")
                .field("name", name)
                .field("value", value)
                .finish(),
            StepDefinition::To(address) => f.debug_tuple("To").field(address).finish(),
            StepDefinition::Process(_) => f.debug_tuple("Process").finish_non_exhaustive(),
        }
    }
}

impl Debug for RouteDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("id", &self.id)
            .field("from", &self.from)
            .field("steps", &self.steps)
            .finish()
    }
}

impl RouteDefinition {
    pub fn from_endpoint(address: impl Into<String>) -> Self {
        Self {
            id: None,
            from: address.into(),
            steps: Vec::new(),
        }
    }

    pub fn route_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.steps.push(StepDefinition::SetHeader {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.steps.push(StepDefinition::To(address.into()));
        self
    }

    pub fn process(mut self, processor: Arc<dyn Processor>) -> Self {
        self.steps.push(StepDefinition::Process(processor));
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn from_uri(&self) -> &str {
        &self.from
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }
}
