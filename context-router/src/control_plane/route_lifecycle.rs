//! Route lifecycle orchestration for control-plane route transitions.

use crate::control_plane::route_table::{RouteEntry, RouteTable};
use crate::data_plane::dispatcher::{self, RouteConsumer};
use crate::endpoint::{Endpoint, EndpointBehavior};
use crate::observability::events;
use crate::routing::route_composer::Route;
use crate::{RoutingContext, RoutingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "route_lifecycle";

/// Failures attaching a route to the endpoint it consumes.
#[derive(Debug)]
pub(crate) enum ActivateRouteError {
    Unresolved(RoutingError),
    AlreadyConsumed { route_id: String, reason: String },
    WorkerSpawn(RoutingError),
}

/// Failures for route insertion orchestration.
#[derive(Debug)]
pub(crate) enum AddRouteError {
    AlreadyExists { route_id: String },
    Activation(ActivateRouteError),
}

/// Failures for route deletion orchestration.
#[derive(Debug)]
pub(crate) enum RemoveRouteError {
    NotFound,
}

impl Display for ActivateRouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivateRouteError::Unresolved(err) => write!(f, "route entry unresolved: {err}"),
            ActivateRouteError::AlreadyConsumed { reason, .. } => write!(f, "{reason}"),
            ActivateRouteError::WorkerSpawn(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ActivateRouteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ActivateRouteError::Unresolved(err) | ActivateRouteError::WorkerSpawn(err) => Some(err),
            ActivateRouteError::AlreadyConsumed { .. } => None,
        }
    }
}

impl Display for AddRouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AddRouteError::AlreadyExists { route_id } => {
                write!(f, "route '{route_id}' already exists")
            }
            AddRouteError::Activation(err) => write!(f, "failed to activate route: {err}"),
        }
    }
}

impl Error for AddRouteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AddRouteError::Activation(err) => Some(err),
            AddRouteError::AlreadyExists { .. } => None,
        }
    }
}

impl Display for RemoveRouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoveRouteError::NotFound => write!(f, "route not found"),
        }
    }
}

impl Error for RemoveRouteError {}

impl From<ActivateRouteError> for RoutingError {
    fn from(err: ActivateRouteError) -> Self {
        match err {
            ActivateRouteError::Unresolved(err) | ActivateRouteError::WorkerSpawn(err) => err,
            ActivateRouteError::AlreadyConsumed { route_id, reason } => RoutingError::BrokenChain {
                route_id,
                step: None,
                reason,
            },
        }
    }
}

impl From<AddRouteError> for RoutingError {
    fn from(err: AddRouteError) -> Self {
        match err {
            AddRouteError::AlreadyExists { route_id } => RoutingError::BrokenChain {
                reason: format!("route id '{route_id}' is already in use"),
                route_id,
                step: None,
            },
            AddRouteError::Activation(err) => err.into(),
        }
    }
}

/// Orchestrates route transitions between a context's route table and the
/// endpoints its routes consume.
pub(crate) struct RouteLifecycle<'a> {
    route_table: &'a RouteTable,
    context: &'a RoutingContext,
}

impl<'a> RouteLifecycle<'a> {
    /// Creates a lifecycle coordinator using existing domain owners.
    pub(crate) fn new(route_table: &'a RouteTable, context: &'a RoutingContext) -> Self {
        Self {
            route_table,
            context,
        }
    }

    /// Stores a composed route, creating its local endpoints, and activates it
    /// when `activate` is set. Activation failure rolls the insert back.
    pub(crate) async fn add_route(
        &self,
        route: Route,
        activate: bool,
    ) -> Result<Arc<Route>, AddRouteError> {
        let route = Arc::new(route);
        if !self.route_table.insert(route.clone()).await {
            return Err(AddRouteError::AlreadyExists {
                route_id: route.id.clone(),
            });
        }

        for address in route.local_addresses() {
            self.context.endpoint_for(address.endpoint_uri()).await;
        }

        if activate {
            if let Err(err) = self.activate(&route).await {
                self.route_table.remove(&route.id).await;
                return Err(AddRouteError::Activation(err));
            }
        }

        Ok(route)
    }

    /// Removes a route and detaches it from the endpoint it consumes.
    pub(crate) async fn remove_route(&self, route_id: &str) -> Result<(), RemoveRouteError> {
        let entry = self
            .route_table
            .remove(route_id)
            .await
            .ok_or(RemoveRouteError::NotFound)?;
        Self::detach(&entry).await;
        Ok(())
    }

    /// Attaches `route` as the consumer of its `from` endpoint.
    pub(crate) async fn activate(&self, route: &Arc<Route>) -> Result<Endpoint, ActivateRouteError> {
        let endpoint = match route.from.resolve(self.context).await {
            Ok(endpoint) => endpoint,
            Err(err) => {
                warn!(
                    event = events::ROUTE_ACTIVATE_FAILED,
                    component = COMPONENT,
                    context_id = self.context.id(),
                    route_id = route.id.as_str(),
                    err = %err,
                    "route entry endpoint unresolved"
                );
                return Err(ActivateRouteError::Unresolved(err));
            }
        };

        let consumer = RouteConsumer::new(route.clone(), self.context);
        if let Err(reason) = dispatcher::attach_consumer(&endpoint, consumer).await {
            warn!(
                event = events::ROUTE_ACTIVATE_FAILED,
                component = COMPONENT,
                context_id = self.context.id(),
                route_id = route.id.as_str(),
                endpoint = %endpoint.logical_address(),
                err = reason.as_str(),
                "route entry endpoint already consumed"
            );
            return Err(ActivateRouteError::AlreadyConsumed {
                route_id: route.id.clone(),
                reason,
            });
        }

        if let EndpointBehavior::Queue(queue) = &endpoint.inner.behavior {
            if let Err(err) = queue.ensure_worker(&endpoint).await {
                dispatcher::detach_consumer(&endpoint, route).await;
                return Err(ActivateRouteError::WorkerSpawn(err));
            }
        }

        self.route_table
            .set_consumed(&route.id, Some(endpoint.clone()))
            .await;

        info!(
            event = events::ROUTE_ACTIVATE_OK,
            component = COMPONENT,
            context_id = self.context.id(),
            route_id = route.id.as_str(),
            endpoint = %endpoint.logical_address(),
            "route activated"
        );
        Ok(endpoint)
    }

    /// Activates every stored route in insertion order. On failure, routes
    /// activated by this call are detached again.
    pub(crate) async fn activate_all(&self) -> Result<(), RoutingError> {
        let mut activated: Vec<RouteEntry> = Vec::new();

        for entry in self.route_table.snapshot().await {
            match self.activate(&entry.route).await {
                Ok(endpoint) => activated.push(RouteEntry {
                    route: entry.route,
                    consumed: Some(endpoint),
                }),
                Err(err) => {
                    for done in activated.iter().rev() {
                        Self::detach(done).await;
                        self.route_table.set_consumed(&done.route.id, None).await;
                    }
                    return Err(err.into());
                }
            }
        }

        Ok(())
    }

    /// Detaches every stored route from the endpoint it consumes.
    pub(crate) async fn deactivate_all(&self) {
        for entry in self.route_table.snapshot().await {
            Self::detach(&entry).await;
            self.route_table.set_consumed(&entry.route.id, None).await;
        }
    }

    async fn detach(entry: &RouteEntry) {
        let Some(endpoint) = entry.consumed.as_ref() else {
            return;
        };
        if dispatcher::detach_consumer(endpoint, &entry.route).await {
            debug!(
                component = COMPONENT,
                route_id = entry.route.id.as_str(),
                endpoint = %endpoint.logical_address(),
                "route detached"
            );
        }
    }
}
