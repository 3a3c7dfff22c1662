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

//! Terminal `mock:` endpoints and the observation/assertion handle over them.

use crate::endpoint::EndpointBehavior;
use crate::observability::{events, fields};
use crate::{Endpoint, Message};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::debug;

const COMPONENT: &str = "mock_endpoint";

#[derive(Default)]
struct MockExpectations {
    message_count: Option<usize>,
    headers: Vec<(String, String)>,
    bodies: Option<Vec<String>>,
}

/// Recorded traffic and expectations for one mock endpoint.
pub(crate) struct MockState {
    received: Mutex<Vec<Message>>,
    arrivals: Notify,
    expectations: Mutex<MockExpectations>,
    assert_timeout: Duration,
}

impl MockState {
    pub(crate) fn new(assert_timeout: Duration) -> Self {
        Self {
            received: Mutex::new(Vec::new()),
            arrivals: Notify::new(),
            expectations: Mutex::new(MockExpectations::default()),
            assert_timeout,
        }
    }

    pub(crate) async fn record(&self, endpoint: &Endpoint, message: Message) {
        debug!(
            event = events::MOCK_RECEIVE,
            component = COMPONENT,
            endpoint = %endpoint.logical_address(),
            msg_id = %message.id(),
            headers = %fields::format_headers(&message),
            "mock received message"
        );
        self.received.lock().await.push(message);
        self.arrivals.notify_waiters();
    }

    async fn wait_for(&self, count: usize) {
        let deadline = Instant::now() + self.assert_timeout;
        loop {
            let arrival = self.arrivals.notified();
            if self.received.lock().await.len() >= count {
                return;
            }
            if tokio::time::timeout_at(deadline, arrival).await.is_err() {
                return;
            }
        }
    }
}

/// An expectation a mock endpoint did not meet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MockAssertionError {
    pub endpoint: String,
    pub reason: String,
}

impl Display for MockAssertionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "mock endpoint '{}' not satisfied: {}", self.endpoint, self.reason)
    }
}

impl Error for MockAssertionError {}

///
/// [`MockEndpoint`] observes a `mock:` endpoint: what arrived, and whether it
/// matches the expectations registered beforehand.
///
/// Obtain one with [`RoutingContext::mock_endpoint`][crate::RoutingContext::mock_endpoint].
#[derive(Clone, Debug)]
pub struct MockEndpoint {
    endpoint: Endpoint,
}

impl MockEndpoint {
    /// Wraps `endpoint`; `None` unless it is a `mock:` endpoint.
    pub(crate) fn new(endpoint: Endpoint) -> Option<Self> {
        matches!(endpoint.inner.behavior, EndpointBehavior::Mock(_)).then_some(Self { endpoint })
    }

    fn state(&self) -> &MockState {
        match &self.endpoint.inner.behavior {
            EndpointBehavior::Mock(state) => state,
            _ => unreachable!("MockEndpoint always wraps a mock endpoint"),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub async fn received_count(&self) -> usize {
        self.state().received.lock().await.len()
    }

    pub async fn received_messages(&self) -> Vec<Message> {
        self.state().received.lock().await.clone()
    }

    /// Expects exactly `count` messages by the time [`Self::assert_is_satisfied`] runs.
    pub async fn expected_message_count(&self, count: usize) {
        self.state().expectations.lock().await.message_count = Some(count);
    }

    /// Expects every received message to carry `name` = `value`.
    pub async fn expected_header_received(&self, name: impl Into<String>, value: impl Into<String>) {
        self.state()
            .expectations
            .lock()
            .await
            .headers
            .push((name.into(), value.into()));
    }

    /// Expects these bodies, in this order.
    pub async fn expected_bodies_received<I, S>(&self, bodies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bodies: Vec<String> = bodies.into_iter().map(Into::into).collect();
        let mut expectations = self.state().expectations.lock().await;
        expectations.message_count = Some(bodies.len());
        expectations.bodies = Some(bodies);
    }

    /// Waits up to the configured timeout for the expected count, then checks
    /// every registered expectation.
    pub async fn assert_is_satisfied(&self) -> Result<(), MockAssertionError> {
        let state = self.state();
        let expected_count = state.expectations.lock().await.message_count;
        if let Some(count) = expected_count {
            state.wait_for(count).await;
        }

        let fail = |reason: String| MockAssertionError {
            endpoint: self.endpoint.logical_address(),
            reason,
        };

        let received = state.received.lock().await.clone();
        let expectations = state.expectations.lock().await;

        if let Some(count) = expectations.message_count {
            if received.len() != count {
                return Err(fail(format!(
                    "expected {count} message(s) but received {}",
                    received.len()
                )));
            }
        }

        for (index, message) in received.iter().enumerate() {
            for (name, value) in &expectations.headers {
                match message.header(name) {
                    Some(actual) if actual == value.as_str() => {}
                    Some(actual) => {
                        return Err(fail(format!(
                            "message {index}: header '{name}' was '{actual}', expected '{value}'"
                        )))
                    }
                    None => {
                        return Err(fail(format!(
                            "message {index}: header '{name}' missing, expected '{value}'"
                        )))
                    }
                }
            }
        }

        if let Some(bodies) = &expectations.bodies {
            let actual: Vec<&str> = received.iter().map(Message::body).collect();
            if actual != bodies.iter().map(String::as_str).collect::<Vec<_>>() {
                return Err(fail(format!(
                    "expected bodies {bodies:?} but received {actual:?}"
                )));
            }
        }

        Ok(())
    }

    /// Clears recorded messages and expectations.
    pub async fn reset(&self) {
        let state = self.state();
        state.received.lock().await.clear();
        *state.expectations.lock().await = MockExpectations::default();
    }
}
