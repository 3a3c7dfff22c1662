//! Control-plane layer.
//!
//! Owns the context registry, route-table identity model and route lifecycle
//! semantics. This layer is responsible for unique bindings, idempotent
//! insert/remove behavior and rollback-safe activation when a route cannot
//! attach to its entry endpoint.
//!
//! ```
//! use std::sync::Arc;
//! use context_router::{ContextConfig, ContextRegistry, RouteDefinition, RoutingContext, RoutingError};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = Arc::new(ContextRegistry::new());
//! let context = RoutingContext::new("control-plane-doc", registry, ContextConfig::default()).unwrap();
//!
//! // The control plane keeps route ids unique and removal idempotent.
//! context
//!     .add_route(RouteDefinition::from_endpoint("direct:in").route_id("r").to("mock:out"))
//!     .await
//!     .unwrap();
//! assert!(context
//!     .add_route(RouteDefinition::from_endpoint("direct:other").route_id("r"))
//!     .await
//!     .is_err());
//! context.remove_route("r").await.unwrap();
//! assert!(matches!(
//!     context.remove_route("r").await,
//!     Err(RoutingError::UnknownRoute { .. })
//! ));
//! # });
//! ```

pub(crate) mod context_registry;
pub(crate) mod route_lifecycle;
pub(crate) mod route_table;
