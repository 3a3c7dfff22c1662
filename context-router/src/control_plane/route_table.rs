//! Route-table data model and storage owner for a context's composed routes.

use crate::endpoint::Endpoint;
use crate::routing::route_composer::Route;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A stored route and, while active, the endpoint it consumes.
#[derive(Clone, Debug)]
pub(crate) struct RouteEntry {
    pub(crate) route: Arc<Route>,
    pub(crate) consumed: Option<Endpoint>,
}

/// Route storage owner for uniqueness checks and insertion-ordered activation.
pub(crate) struct RouteTable {
    routes: Mutex<Vec<RouteEntry>>,
}

impl RouteTable {
    /// Creates an empty route table.
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
        }
    }

    /// Inserts a route. Returns `true` only when its id was not present.
    pub(crate) async fn insert(&self, route: Arc<Route>) -> bool {
        let mut routes = self.routes.lock().await;
        if routes.iter().any(|entry| entry.route.id == route.id) {
            return false;
        }
        routes.push(RouteEntry {
            route,
            consumed: None,
        });
        true
    }

    /// Removes a route by id, returning its entry when it existed.
    pub(crate) async fn remove(&self, route_id: &str) -> Option<RouteEntry> {
        let mut routes = self.routes.lock().await;
        let position = routes.iter().position(|entry| entry.route.id == route_id)?;
        Some(routes.remove(position))
    }

    pub(crate) async fn contains(&self, route_id: &str) -> bool {
        self.routes
            .lock()
            .await
            .iter()
            .any(|entry| entry.route.id == route_id)
    }

    /// Route ids in insertion order.
    pub(crate) async fn route_ids(&self) -> Vec<String> {
        self.routes
            .lock()
            .await
            .iter()
            .map(|entry| entry.route.id.clone())
            .collect()
    }

    /// Records which endpoint `route_id` consumes, or clears it with `None`.
    pub(crate) async fn set_consumed(&self, route_id: &str, consumed: Option<Endpoint>) {
        let mut routes = self.routes.lock().await;
        if let Some(entry) = routes.iter_mut().find(|entry| entry.route.id == route_id) {
            entry.consumed = consumed;
        }
    }

    /// Point-in-time copy of all entries in insertion order.
    pub(crate) async fn snapshot(&self) -> Vec<RouteEntry> {
        self.routes.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::RouteTable;
    use crate::routing::address::{Address, EndpointKind, EndpointUri};
    use crate::routing::route_composer::Route;
    use std::sync::Arc;

    fn route(id: &str) -> Arc<Route> {
        Arc::new(Route {
            id: id.to_string(),
            context_id: "ctx".to_string(),
            from: Address::Local(EndpointUri::new(EndpointKind::Direct, id)),
            steps: Vec::new(),
        })
    }

    #[tokio::test]
    async fn insert_and_remove_are_idempotent() {
        let route_table = RouteTable::new();

        assert!(route_table.insert(route("route1")).await);
        assert!(!route_table.insert(route("route1")).await);
        assert!(route_table.contains("route1").await);

        assert!(route_table.remove("route1").await.is_some());
        assert!(route_table.remove("route1").await.is_none());
    }

    #[tokio::test]
    async fn route_ids_keep_insertion_order() {
        let route_table = RouteTable::new();
        for id in ["BEGIN", "route1", "alpha"] {
            route_table.insert(route(id)).await;
        }
        route_table.remove("route1").await;

        assert_eq!(route_table.route_ids().await, vec!["BEGIN", "alpha"]);
        assert!(route_table
            .snapshot()
            .await
            .iter()
            .all(|entry| entry.consumed.is_none()));
    }
}
