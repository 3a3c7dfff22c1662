//! Routing and address-resolution layer.
//!
//! Encapsulates logical address parsing (`contextId:localName`), the local vs.
//! foreign tie-break, and composition of route definitions into immutable chains.
//!
//! ```
//! use std::sync::Arc;
//! use context_router::{ContextConfig, ContextRegistry, RouteDefinition, RoutingContext, RoutingError};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = Arc::new(ContextRegistry::new());
//! let enclosing = RoutingContext::new("enclosing", registry.clone(), ContextConfig::default()).unwrap();
//!
//! // No context is bound under `unknownCtx`, so the address never becomes a local name.
//! let err = enclosing
//!     .add_route(RouteDefinition::from_endpoint("direct:in").to("unknownCtx:in"))
//!     .await
//!     .unwrap_err();
//! assert!(matches!(err, RoutingError::UnresolvedAddress { .. }));
//! # });
//! ```

pub(crate) mod address;
pub(crate) mod route_composer;
