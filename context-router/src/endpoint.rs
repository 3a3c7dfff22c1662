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

use crate::data_plane::dispatcher::RouteConsumer;
use crate::data_plane::mock_endpoint::MockState;
use crate::data_plane::queue_worker::QueueEndpoint;
use crate::routing::address::{EndpointKind, EndpointUri};
use crate::{ContextConfig, ContextState};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

///
/// [`Endpoint`] is a named entry/exit point scoped to one
/// [`RoutingContext`][crate::RoutingContext]. Its identity is the pair
/// (owning context id, local URI), so `direct:in` in two contexts names two
/// distinct endpoints.
///
/// Endpoints compare equal only when they are the same instance.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use context_router::{ContextConfig, ContextRegistry, RoutingContext};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let registry = Arc::new(ContextRegistry::new());
/// let black_box_1 = RoutingContext::new("blackBox1", registry.clone(), ContextConfig::default()).unwrap();
/// let black_box_2 = RoutingContext::new("blackBox2", registry.clone(), ContextConfig::default()).unwrap();
///
/// let in_1 = black_box_1.create_endpoint("direct:in").await.unwrap();
/// let in_2 = black_box_2.create_endpoint("direct:in").await.unwrap();
///
/// assert_ne!(in_1, in_2);
/// assert_eq!(in_1, black_box_1.create_endpoint("in").await.unwrap());
/// # });
/// ```
#[derive(Clone)]
pub struct Endpoint {
    pub(crate) inner: Arc<EndpointInner>,
}

pub(crate) struct EndpointInner {
    pub(crate) context_id: String,
    pub(crate) uri: EndpointUri,
    pub(crate) state: watch::Receiver<ContextState>,
    pub(crate) consumer: RwLock<Option<RouteConsumer>>,
    pub(crate) behavior: EndpointBehavior,
}

pub(crate) enum EndpointBehavior {
    Direct,
    Queue(QueueEndpoint),
    Mock(MockState),
}

impl Endpoint {
    pub(crate) fn new(
        context_id: &str,
        uri: EndpointUri,
        state: watch::Receiver<ContextState>,
        config: &ContextConfig,
    ) -> Self {
        let behavior = match uri.kind() {
            EndpointKind::Direct => EndpointBehavior::Direct,
            EndpointKind::Queue => {
                EndpointBehavior::Queue(QueueEndpoint::new(config.message_queue_size))
            }
            EndpointKind::Mock => EndpointBehavior::Mock(MockState::new(config.mock_assert_timeout())),
        };

        Self {
            inner: Arc::new(EndpointInner {
                context_id: context_id.to_string(),
                uri,
                state,
                consumer: RwLock::new(None),
                behavior,
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<EndpointInner>) -> Self {
        Self { inner }
    }

    pub fn context_id(&self) -> &str {
        &self.inner.context_id
    }

    pub fn uri(&self) -> &EndpointUri {
        &self.inner.uri
    }

    pub fn kind(&self) -> EndpointKind {
        self.inner.uri.kind()
    }

    /// Logical address of this endpoint as seen from any other context.
    pub fn logical_address(&self) -> String {
        format!("{}:{}", self.inner.context_id, self.inner.uri)
    }

    /// Id of the route currently consuming this endpoint, if any.
    pub async fn consumer_route_id(&self) -> Option<String> {
        self.inner
            .consumer
            .read()
            .await
            .as_ref()
            .map(|consumer| consumer.route.id.clone())
    }

    pub(crate) fn context_state(&self) -> ContextState {
        *self.inner.state.borrow()
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Endpoint {}

impl Debug for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("context_id", &self.inner.context_id)
            .field("uri", &self.inner.uri.to_string())
            .finish_non_exhaustive()
    }
}
