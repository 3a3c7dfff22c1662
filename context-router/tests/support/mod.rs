use context_router::{new_context, ContextConfig, ContextRegistry, RouteDefinition, RoutingContext};
use std::sync::Arc;
use std::time::Duration;

pub(crate) fn test_config() -> ContextConfig {
    ContextConfig::default().with_mock_assert_timeout(Duration::from_secs(2))
}

pub(crate) async fn started_context(
    registry: &Arc<ContextRegistry>,
    id: &str,
    routes: Vec<RouteDefinition>,
) -> RoutingContext {
    new_context(registry.clone(), id, routes, test_config())
        .await
        .expect("context creation should succeed")
}

#[allow(dead_code)]
pub(crate) async fn assert_received_bodies(context: &RoutingContext, mock: &str, bodies: &[&str]) {
    let mock = context
        .mock_endpoint(mock)
        .await
        .expect("mock endpoint should exist");
    mock.expected_bodies_received(bodies.iter().copied()).await;
    mock.assert_is_satisfied()
        .await
        .expect("mock expectations should be satisfied");
}
