//! Runtime integration layer.
//!
//! Isolates worker-thread boundaries so async/threading behavior for queue
//! endpoints stays localized and predictable for the rest of the crate.
//!
//! ```
//! use std::sync::Arc;
//! use context_router::{ContextConfig, ContextRegistry, RouteDefinition, RoutingContext};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! // Activating a route that consumes a `seda:` endpoint starts its worker thread.
//! let registry = Arc::new(ContextRegistry::new());
//! let context = RoutingContext::new("runtime-doc", registry, ContextConfig::default()).unwrap();
//! context
//!     .add_route(RouteDefinition::from_endpoint("seda:work").to("mock:done"))
//!     .await
//!     .unwrap();
//! context.start().await.unwrap();
//! context.stop().await.unwrap();
//! # });
//! ```

pub(crate) mod worker_runtime;
