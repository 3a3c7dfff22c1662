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

use crate::Message;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

///
/// [`Processor`] is a user-supplied route step that may inspect or mutate the
/// message in place.
///
/// A failing processor stops the route; the sender receives a
/// [`RoutingError::Delivery`][crate::RoutingError::Delivery] naming the step.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use context_router::{Message, Processor, ProcessorError};
///
/// struct Uppercase;
///
/// #[async_trait]
/// impl Processor for Uppercase {
///     async fn process(&self, message: &mut Message) -> Result<(), ProcessorError> {
///         let body = message.body().to_uppercase();
///         message.set_body(body);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, message: &mut Message) -> Result<(), ProcessorError>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessorError {
    reason: String,
}

impl ProcessorError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Display for ProcessorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "processor failed: {}", self.reason)
    }
}

impl Error for ProcessorError {}
