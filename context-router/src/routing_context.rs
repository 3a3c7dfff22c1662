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

use crate::control_plane::context_registry::validate_context_id;
use crate::control_plane::route_lifecycle::{RemoveRouteError, RouteLifecycle};
use crate::control_plane::route_table::RouteTable;
use crate::data_plane::dispatcher;
use crate::observability::{events, fields};
use crate::routing::address::{Address, EndpointKind, EndpointUri};
use crate::routing::route_composer;
use crate::{
    ContextConfig, ContextRegistry, Endpoint, Message, MockEndpoint, RouteDefinition,
    RoutingError,
};
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMPONENT: &str = "routing_context";
const GENERATED_CONTEXT_ID_PREFIX: &str = "context-";
const GENERATED_ROUTE_ID_PREFIX: &str = "route";

/// Lifecycle of a [`RoutingContext`]: `created -> running -> stopped`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ContextState {
    Created,
    Running,
    Stopped,
}

impl Display for ContextState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContextState::Created => "created",
            ContextState::Running => "running",
            ContextState::Stopped => "stopped",
        };
        write!(f, "{name}")
    }
}

pub(crate) struct ContextInner {
    id: String,
    registry: Arc<ContextRegistry>,
    config: ContextConfig,
    state: watch::Sender<ContextState>,
    // Serializes route and lifecycle transitions.
    lifecycle: Mutex<()>,
    endpoints: Mutex<HashMap<EndpointUri, Endpoint>>,
    route_table: RouteTable,
    next_route_number: AtomicUsize,
}

///
/// [`RoutingContext`] is an isolated namespace of endpoints and routes.
///
/// Endpoint names only need to be unique within one context. Other contexts
/// reach this one through the shared [`ContextRegistry`], addressing its
/// endpoints as `contextId:endpoint`.
///
/// Cloning yields another handle to the same context.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use context_router::{ContextConfig, ContextRegistry, ContextState, RouteDefinition, RoutingContext};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let registry = Arc::new(ContextRegistry::new());
/// let context = RoutingContext::new("greeter", registry, ContextConfig::default()).unwrap();
///
/// context
///     .add_route(
///         RouteDefinition::from_endpoint("direct:in")
///             .set_header("greeted", "yes")
///             .to("mock:out"),
///     )
///     .await
///     .unwrap();
/// context.start().await.unwrap();
/// assert_eq!(context.state(), ContextState::Running);
///
/// context.send_body("direct:in", "hello").await.unwrap();
/// let out = context.mock_endpoint("mock:out").await.unwrap();
/// assert_eq!(out.received_count().await, 1);
/// # });
/// ```
#[derive(Clone)]
pub struct RoutingContext {
    inner: Arc<ContextInner>,
}

impl RoutingContext {
    /// Creates a context in the `created` state. It is not bound in `registry`.
    pub fn new(
        id: impl Into<String>,
        registry: Arc<ContextRegistry>,
        config: ContextConfig,
    ) -> Result<Self, RoutingError> {
        let id = id.into();
        validate_context_id(&id)?;
        Ok(Self::with_parts(id, registry, config))
    }

    /// Creates a context under a generated `context-<8 hex>` id.
    pub fn with_generated_id(registry: Arc<ContextRegistry>, config: ContextConfig) -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        let id = format!("{GENERATED_CONTEXT_ID_PREFIX}{}", &uuid[..8]);
        Self::with_parts(id, registry, config)
    }

    fn with_parts(id: String, registry: Arc<ContextRegistry>, config: ContextConfig) -> Self {
        let (state, _) = watch::channel(ContextState::Created);
        Self {
            inner: Arc::new(ContextInner {
                id,
                registry,
                config,
                state,
                lifecycle: Mutex::new(()),
                endpoints: Mutex::new(HashMap::new()),
                route_table: RouteTable::new(),
                next_route_number: AtomicUsize::new(1),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ContextInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ContextInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn registry(&self) -> &Arc<ContextRegistry> {
        &self.inner.registry
    }

    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ContextState {
        *self.inner.state.borrow()
    }

    /// `true` when both handles refer to the same context.
    pub fn ptr_eq(&self, other: &RoutingContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Binds this context in its registry under its own id.
    pub async fn bind(&self) -> Result<(), RoutingError> {
        self.inner.registry.bind(self.id(), self).await
    }

    /// Returns the endpoint named `local_uri` in this context, creating it on
    /// first use. Repeated calls return the same endpoint.
    pub async fn create_endpoint(&self, local_uri: &str) -> Result<Endpoint, RoutingError> {
        let uri = EndpointUri::parse(local_uri).map_err(|reason| {
            RoutingError::UnresolvedAddress {
                address: local_uri.to_string(),
                reason,
            }
        })?;
        Ok(self.endpoint_for(&uri).await)
    }

    pub(crate) async fn endpoint_for(&self, uri: &EndpointUri) -> Endpoint {
        let mut endpoints = self.inner.endpoints.lock().await;
        endpoints
            .entry(uri.clone())
            .or_insert_with(|| {
                Endpoint::new(
                    &self.inner.id,
                    uri.clone(),
                    self.inner.state.subscribe(),
                    &self.inner.config,
                )
            })
            .clone()
    }

    pub(crate) async fn existing_endpoint(&self, uri: &EndpointUri) -> Option<Endpoint> {
        self.inner.endpoints.lock().await.get(uri).cloned()
    }

    /// Local URIs of every endpoint this context owns, sorted.
    pub async fn endpoint_uris(&self) -> Vec<EndpointUri> {
        let mut uris: Vec<EndpointUri> = self.inner.endpoints.lock().await.keys().cloned().collect();
        uris.sort();
        uris
    }

    /// Composes `definition` against this context and stores it, creating the
    /// local endpoints it names. A running context activates the route at once.
    ///
    /// Returns the route id, generated as `route<N>` when the definition has none.
    pub async fn add_route(&self, definition: RouteDefinition) -> Result<String, RoutingError> {
        let _guard = self.inner.lifecycle.lock().await;

        let route_id = match definition.id.as_deref() {
            Some(id) => id.to_string(),
            None => self.next_route_id().await,
        };

        debug!(
            event = events::ROUTE_ADD_START,
            component = COMPONENT,
            context_id = self.id(),
            route_id = route_id.as_str(),
            from = definition.from.as_str(),
            "adding route"
        );

        let result = self.add_route_locked(&definition, &route_id).await;
        match &result {
            Ok(()) => info!(
                event = events::ROUTE_ADD_OK,
                component = COMPONENT,
                context_id = self.id(),
                route_id = route_id.as_str(),
                "route added"
            ),
            Err(err) => warn!(
                event = events::ROUTE_ADD_FAILED,
                component = COMPONENT,
                context_id = self.id(),
                route_id = route_id.as_str(),
                err = %err,
                "unable to add route"
            ),
        }

        result.map(|()| route_id)
    }

    async fn add_route_locked(
        &self,
        definition: &RouteDefinition,
        route_id: &str,
    ) -> Result<(), RoutingError> {
        let state = self.state();
        if state == ContextState::Stopped {
            return Err(RoutingError::BrokenChain {
                route_id: route_id.to_string(),
                step: None,
                reason: format!("context '{}' is stopped", self.id()),
            });
        }

        let route = route_composer::compose(definition, route_id, self).await?;
        RouteLifecycle::new(&self.inner.route_table, self)
            .add_route(route, state == ContextState::Running)
            .await?;
        Ok(())
    }

    async fn next_route_id(&self) -> String {
        loop {
            let number = self.inner.next_route_number.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{GENERATED_ROUTE_ID_PREFIX}{number}");
            if !self.inner.route_table.contains(&candidate).await {
                return candidate;
            }
        }
    }

    /// Detaches and removes a route.
    pub async fn remove_route(&self, route_id: &str) -> Result<(), RoutingError> {
        let _guard = self.inner.lifecycle.lock().await;

        RouteLifecycle::new(&self.inner.route_table, self)
            .remove_route(route_id)
            .await
            .map_err(|err| match err {
                RemoveRouteError::NotFound => RoutingError::UnknownRoute {
                    context_id: self.id().to_string(),
                    route_id: route_id.to_string(),
                },
            })?;

        info!(
            event = events::ROUTE_REMOVE_OK,
            component = COMPONENT,
            context_id = self.id(),
            route_id,
            "route removed"
        );
        Ok(())
    }

    /// Route ids in insertion order.
    pub async fn route_ids(&self) -> Vec<String> {
        self.inner.route_table.route_ids().await
    }

    /// `created -> running`: activates every route in insertion order.
    ///
    /// If any route fails to activate, the routes already activated are
    /// detached again and the context stays `created`.
    pub async fn start(&self) -> Result<(), RoutingError> {
        let _guard = self.inner.lifecycle.lock().await;

        let state = self.state();
        if state != ContextState::Created {
            return Err(RoutingError::InvalidLifecycle {
                context_id: self.id().to_string(),
                from: state,
                to: ContextState::Running,
            });
        }

        if let Err(err) = RouteLifecycle::new(&self.inner.route_table, self)
            .activate_all()
            .await
        {
            warn!(
                event = events::CONTEXT_START_FAILED,
                component = COMPONENT,
                context_id = self.id(),
                err = %err,
                "unable to start context"
            );
            return Err(err);
        }

        self.inner.state.send_replace(ContextState::Running);
        info!(
            event = events::CONTEXT_START_OK,
            component = COMPONENT,
            context_id = self.id(),
            routes = self.inner.route_table.route_ids().await.len(),
            "context started"
        );
        Ok(())
    }

    /// `running -> stopped`, which is terminal.
    ///
    /// Consumers owned by this context are detached and queue workers of its
    /// endpoints exit, dropping whatever is still queued.
    pub async fn stop(&self) -> Result<(), RoutingError> {
        let _guard = self.inner.lifecycle.lock().await;

        let state = self.state();
        if state != ContextState::Running {
            return Err(RoutingError::InvalidLifecycle {
                context_id: self.id().to_string(),
                from: state,
                to: ContextState::Stopped,
            });
        }

        self.inner.state.send_replace(ContextState::Stopped);
        RouteLifecycle::new(&self.inner.route_table, self)
            .deactivate_all()
            .await;

        info!(
            event = events::CONTEXT_STOP_OK,
            component = COMPONENT,
            context_id = self.id(),
            "context stopped"
        );
        Ok(())
    }

    /// Sends a new message with `body` to `address`. See [`Self::send`].
    pub async fn send_body(
        &self,
        address: &str,
        body: impl Into<String>,
    ) -> Result<Message, RoutingError> {
        self.send(address, Message::new(body)).await
    }

    /// Dispatches `message` to `address`, resolved as seen from this context.
    ///
    /// Returns the message as it left the last synchronous step. Hand-offs into
    /// `seda:` endpoints complete once the message is queued. The target must
    /// already exist; sending never creates endpoints.
    pub async fn send(&self, address: &str, mut message: Message) -> Result<Message, RoutingError> {
        let endpoint = match Address::parse(address, self).await? {
            Address::Local(uri) => self.existing_endpoint(&uri).await.ok_or_else(|| {
                RoutingError::delivery_at_entry(
                    self.id(),
                    address,
                    format!("context '{}' has no endpoint '{uri}'", self.id()),
                )
            })?,
            foreign => foreign.resolve(self).await?,
        };

        if let Err(failure) = dispatcher::deliver(&endpoint, &mut message, 0).await {
            let err = failure.at_entry(endpoint.context_id(), address);
            let step = match &err {
                RoutingError::Delivery { step, .. } => *step,
                _ => None,
            };
            warn!(
                event = events::DISPATCH_FAILED,
                component = COMPONENT,
                context_id = self.id(),
                endpoint = %endpoint.logical_address(),
                step = %fields::format_step(step),
                msg_id = %message.id(),
                err = %err,
                "message delivery failed"
            );
            return Err(err);
        }

        Ok(message)
    }

    /// Observation handle for the `mock:` endpoint `local_uri` of this context.
    pub async fn mock_endpoint(&self, local_uri: &str) -> Result<MockEndpoint, RoutingError> {
        let endpoint = self.create_endpoint(local_uri).await?;
        if endpoint.kind() != EndpointKind::Mock {
            return Err(RoutingError::UnresolvedAddress {
                address: local_uri.to_string(),
                reason: "not a mock endpoint".to_string(),
            });
        }
        MockEndpoint::new(endpoint).ok_or_else(|| RoutingError::UnresolvedAddress {
            address: local_uri.to_string(),
            reason: "not a mock endpoint".to_string(),
        })
    }
}

impl Debug for RoutingContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingContext")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Creates a context, adds `routes`, binds it under `id` and starts it.
///
/// If starting fails the binding is removed again.
pub async fn new_context(
    registry: Arc<ContextRegistry>,
    id: &str,
    routes: Vec<RouteDefinition>,
    config: ContextConfig,
) -> Result<RoutingContext, RoutingError> {
    let context = RoutingContext::new(id, registry, config)?;
    for route in routes {
        context.add_route(route).await?;
    }
    context.bind().await?;

    if let Err(err) = context.start().await {
        let _ = context.registry().unbind(id).await;
        return Err(err);
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::{new_context, ContextState, RoutingContext};
    use crate::{ContextConfig, ContextRegistry, RouteDefinition, RoutingError};
    use std::sync::Arc;

    fn context(registry: &Arc<ContextRegistry>, id: &str) -> RoutingContext {
        RoutingContext::new(id, registry.clone(), ContextConfig::default()).unwrap()
    }

    #[test]
    fn reserved_ids_cannot_name_a_context() {
        let registry = Arc::new(ContextRegistry::new());

        assert_eq!(
            RoutingContext::new("direct", registry.clone(), ContextConfig::default()).unwrap_err(),
            RoutingError::ReservedContextId {
                id: "direct".to_string()
            }
        );
        assert!(RoutingContext::new("a:b", registry, ContextConfig::default()).is_err());
    }

    #[test]
    fn generated_ids_are_distinct_and_prefixed() {
        let registry = Arc::new(ContextRegistry::new());
        let first = RoutingContext::with_generated_id(registry.clone(), ContextConfig::default());
        let second = RoutingContext::with_generated_id(registry, ContextConfig::default());

        assert!(first.id().starts_with("context-"));
        assert_eq!(first.id().len(), "context-".len() + 8);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.state(), ContextState::Created);
        assert_eq!(first.config(), &ContextConfig::default());
    }

    #[tokio::test]
    async fn create_endpoint_is_idempotent_per_context() {
        let registry = Arc::new(ContextRegistry::new());
        let ctx = context(&registry, "ctx");

        let first = ctx.create_endpoint("direct:in").await.unwrap();
        let bare = ctx.create_endpoint("in").await.unwrap();
        let mock = ctx.create_endpoint("mock:in").await.unwrap();

        assert_eq!(first, bare);
        assert_ne!(first, mock);
        assert_eq!(ctx.endpoint_uris().await.len(), 2);
    }

    #[tokio::test]
    async fn generated_route_ids_skip_explicit_ones() {
        let registry = Arc::new(ContextRegistry::new());
        let ctx = context(&registry, "ctx");

        ctx.add_route(RouteDefinition::from_endpoint("a").route_id("route1").to("mock:a"))
            .await
            .unwrap();
        let generated = ctx
            .add_route(RouteDefinition::from_endpoint("b").to("mock:b"))
            .await
            .unwrap();

        assert_eq!(generated, "route2");
        assert_eq!(ctx.route_ids().await, vec!["route1", "route2"]);
    }

    #[tokio::test]
    async fn duplicate_route_id_and_mock_from_break_the_chain() {
        let registry = Arc::new(ContextRegistry::new());
        let ctx = context(&registry, "ctx");
        ctx.add_route(RouteDefinition::from_endpoint("a").route_id("r").to("mock:a"))
            .await
            .unwrap();

        assert_eq!(
            ctx.add_route(RouteDefinition::from_endpoint("b").route_id("r")).await,
            Err(RoutingError::BrokenChain {
                route_id: "r".to_string(),
                step: None,
                reason: "route id 'r' is already in use".to_string(),
            })
        );
        // The rejected duplicate creates none of its endpoints.
        assert_eq!(ctx.endpoint_uris().await.len(), 2);
        assert!(matches!(
            ctx.add_route(RouteDefinition::from_endpoint("mock:x")).await,
            Err(RoutingError::BrokenChain { step: None, .. })
        ));
        assert_eq!(ctx.route_ids().await, vec!["r"]);
    }

    #[tokio::test]
    async fn lifecycle_rejects_skipped_and_repeated_transitions() {
        let registry = Arc::new(ContextRegistry::new());
        let ctx = context(&registry, "ctx");

        assert_eq!(
            ctx.stop().await,
            Err(RoutingError::InvalidLifecycle {
                context_id: "ctx".to_string(),
                from: ContextState::Created,
                to: ContextState::Stopped,
            })
        );

        ctx.start().await.unwrap();
        assert!(ctx.start().await.is_err());
        ctx.stop().await.unwrap();

        assert_eq!(ctx.state(), ContextState::Stopped);
        assert_eq!(
            ctx.start().await,
            Err(RoutingError::InvalidLifecycle {
                context_id: "ctx".to_string(),
                from: ContextState::Stopped,
                to: ContextState::Running,
            })
        );
        assert!(matches!(
            ctx.add_route(RouteDefinition::from_endpoint("late")).await,
            Err(RoutingError::BrokenChain { .. })
        ));
    }

    #[tokio::test]
    async fn failed_start_rolls_back_activated_routes() {
        let registry = Arc::new(ContextRegistry::new());
        let ctx = context(&registry, "ctx");
        ctx.add_route(RouteDefinition::from_endpoint("in").route_id("first").to("mock:a"))
            .await
            .unwrap();
        ctx.add_route(RouteDefinition::from_endpoint("in").route_id("second").to("mock:b"))
            .await
            .unwrap();

        assert!(matches!(
            ctx.start().await,
            Err(RoutingError::BrokenChain { ref route_id, .. }) if route_id == "second"
        ));
        assert_eq!(ctx.state(), ContextState::Created);

        let entry = ctx.create_endpoint("in").await.unwrap();
        assert_eq!(entry.consumer_route_id().await, None);
    }

    #[tokio::test]
    async fn remove_route_detaches_consumer() {
        let registry = Arc::new(ContextRegistry::new());
        let ctx = new_context(
            registry.clone(),
            "ctx",
            vec![RouteDefinition::from_endpoint("in").route_id("r").to("mock:out")],
            ContextConfig::default(),
        )
        .await
        .unwrap();

        let entry = ctx.create_endpoint("in").await.unwrap();
        assert_eq!(entry.consumer_route_id().await.as_deref(), Some("r"));

        ctx.remove_route("r").await.unwrap();
        assert_eq!(entry.consumer_route_id().await, None);
        assert_eq!(
            ctx.remove_route("r").await,
            Err(RoutingError::UnknownRoute {
                context_id: "ctx".to_string(),
                route_id: "r".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn send_to_unknown_local_endpoint_fails_without_creating_it() {
        let registry = Arc::new(ContextRegistry::new());
        let ctx = new_context(
            registry,
            "ctx",
            vec![RouteDefinition::from_endpoint("in").to("mock:out")],
            ContextConfig::default(),
        )
        .await
        .unwrap();
        let before = ctx.endpoint_uris().await;

        assert_eq!(
            ctx.send_body("direct:typo", "lost").await,
            Err(RoutingError::Delivery {
                context_id: "ctx".to_string(),
                route_id: None,
                step: None,
                address: "direct:typo".to_string(),
                reason: "context 'ctx' has no endpoint 'direct:typo'".to_string(),
            })
        );
        assert_eq!(ctx.endpoint_uris().await, before);
    }

    #[tokio::test]
    async fn new_context_binds_and_starts() {
        let registry = Arc::new(ContextRegistry::new());
        let ctx = new_context(registry.clone(), "ctx", Vec::new(), ContextConfig::default())
            .await
            .unwrap();

        assert_eq!(ctx.state(), ContextState::Running);
        assert!(registry.lookup("ctx").await.unwrap().ptr_eq(&ctx));
    }
}
