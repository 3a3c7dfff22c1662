//! Data-plane layer.
//!
//! Owns message dispatch through route chains, queue endpoint workers and mock
//! endpoint recording. This layer turns composed routes into concrete
//! synchronous and queued hand-offs across context boundaries.
//!
//! ```
//! use std::sync::Arc;
//! use context_router::{new_context, ContextConfig, ContextRegistry, RouteDefinition};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = Arc::new(ContextRegistry::new());
//! let inner = new_context(
//!     registry.clone(),
//!     "inner",
//!     vec![RouteDefinition::from_endpoint("direct:in").set_header("inner", "seen").to("mock:out")],
//!     ContextConfig::default(),
//! )
//! .await
//! .unwrap();
//! let outer = new_context(
//!     registry.clone(),
//!     "outer",
//!     vec![RouteDefinition::from_endpoint("direct:in").to("inner:in")],
//!     ContextConfig::default(),
//! )
//! .await
//! .unwrap();
//!
//! // A direct hand-off runs the foreign route before `send_body` returns.
//! let delivered = outer.send_body("direct:in", "payload").await.unwrap();
//! assert_eq!(delivered.header("inner"), Some("seen"));
//! assert_eq!(inner.mock_endpoint("mock:out").await.unwrap().received_count().await, 1);
//! # });
//! ```

pub(crate) mod dispatcher;
pub(crate) mod mock_endpoint;
pub(crate) mod queue_worker;
