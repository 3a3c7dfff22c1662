//! Process-local registry binding context ids to live routing contexts.

use crate::observability::events;
use crate::routing::address::{EndpointKind, ADDRESS_DELIMITER};
use crate::routing_context::ContextInner;
use crate::{RoutingContext, RoutingError};
use std::collections::HashMap;
use std::sync::Weak;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const COMPONENT: &str = "context_registry";

/// Rejects ids that could not appear as the prefix of a logical address.
pub(crate) fn validate_context_id(id: &str) -> Result<(), RoutingError> {
    let reserved = id.is_empty()
        || id.contains(ADDRESS_DELIMITER)
        || EndpointKind::from_scheme(id).is_some();
    if reserved {
        return Err(RoutingError::ReservedContextId { id: id.to_string() });
    }
    Ok(())
}

///
/// [`ContextRegistry`] maps context ids to routing contexts so that routes in
/// one context can address endpoints of another as `contextId:endpoint`.
///
/// Bindings are weak: the registry never keeps a context alive, and a binding
/// whose context has been dropped behaves as if it were absent. The registry is
/// passed explicitly to every context; there is no process-global instance.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use context_router::{ContextConfig, ContextRegistry, RoutingContext, RoutingError};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let registry = Arc::new(ContextRegistry::new());
/// let first = RoutingContext::new("blackBox1", registry.clone(), ContextConfig::default()).unwrap();
/// let second = RoutingContext::new("blackBox1", registry.clone(), ContextConfig::default()).unwrap();
///
/// registry.bind("blackBox1", &first).await.unwrap();
/// assert_eq!(
///     registry.bind("blackBox1", &second).await,
///     Err(RoutingError::DuplicateBinding { id: "blackBox1".to_string() })
/// );
/// assert!(registry.lookup("blackBox1").await.unwrap().ptr_eq(&first));
/// # });
/// ```
#[derive(Default)]
pub struct ContextRegistry {
    bindings: RwLock<HashMap<String, Weak<ContextInner>>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `context` under `id`.
    ///
    /// Fails with [`RoutingError::DuplicateBinding`] while another live context
    /// holds `id`; that binding is left untouched.
    pub async fn bind(&self, id: &str, context: &RoutingContext) -> Result<(), RoutingError> {
        if let Err(err) = validate_context_id(id) {
            warn!(
                event = events::REGISTRY_BIND_FAILED,
                component = COMPONENT,
                context_id = id,
                err = %err,
                "rejected reserved context id"
            );
            return Err(err);
        }

        let mut bindings = self.bindings.write().await;
        if bindings
            .get(id)
            .is_some_and(|existing| existing.strong_count() > 0)
        {
            warn!(
                event = events::REGISTRY_BIND_FAILED,
                component = COMPONENT,
                context_id = id,
                "context id already bound"
            );
            return Err(RoutingError::DuplicateBinding { id: id.to_string() });
        }

        bindings.insert(id.to_string(), context.downgrade());
        info!(
            event = events::REGISTRY_BIND_OK,
            component = COMPONENT,
            context_id = id,
            owner = context.id(),
            "context bound"
        );
        Ok(())
    }

    /// Returns the context bound under `id`.
    pub async fn lookup(&self, id: &str) -> Result<RoutingContext, RoutingError> {
        self.bindings
            .read()
            .await
            .get(id)
            .and_then(Weak::upgrade)
            .map(RoutingContext::from_inner)
            .ok_or_else(|| RoutingError::UnknownContext { id: id.to_string() })
    }

    /// Removes the binding for `id`. A stale binding counts as absent.
    pub async fn unbind(&self, id: &str) -> Result<(), RoutingError> {
        let removed = self.bindings.write().await.remove(id);
        match removed {
            Some(binding) if binding.strong_count() > 0 => {
                debug!(
                    event = events::REGISTRY_UNBIND,
                    component = COMPONENT,
                    context_id = id,
                    "context unbound"
                );
                Ok(())
            }
            _ => Err(RoutingError::UnknownContext { id: id.to_string() }),
        }
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.bindings
            .read()
            .await
            .get(id)
            .is_some_and(|binding| binding.strong_count() > 0)
    }

    /// Ids with a live binding, sorted.
    pub async fn bound_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .bindings
            .read()
            .await
            .iter()
            .filter(|(_, binding)| binding.strong_count() > 0)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_context_id, ContextRegistry};
    use crate::{ContextConfig, RoutingContext, RoutingError};
    use std::sync::Arc;

    fn context(registry: &Arc<ContextRegistry>, id: &str) -> RoutingContext {
        RoutingContext::new(id, registry.clone(), ContextConfig::default()).unwrap()
    }

    #[test]
    fn reserved_ids_are_rejected() {
        for id in ["", "a:b", "direct", "seda", "mock"] {
            assert_eq!(
                validate_context_id(id),
                Err(RoutingError::ReservedContextId { id: id.to_string() })
            );
        }
        assert!(validate_context_id("blackBox1").is_ok());
    }

    #[tokio::test]
    async fn duplicate_binding_keeps_original() {
        let registry = Arc::new(ContextRegistry::new());
        let original = context(&registry, "blackBox1");
        let intruder = context(&registry, "other");

        registry.bind("blackBox1", &original).await.unwrap();
        let err = registry.bind("blackBox1", &intruder).await.unwrap_err();

        assert_eq!(
            err,
            RoutingError::DuplicateBinding {
                id: "blackBox1".to_string()
            }
        );
        assert!(registry.lookup("blackBox1").await.unwrap().ptr_eq(&original));
    }

    #[tokio::test]
    async fn lookup_is_idempotent_and_unbind_removes() {
        let registry = Arc::new(ContextRegistry::new());
        let black_box = context(&registry, "blackBox1");
        registry.bind("blackBox1", &black_box).await.unwrap();

        let first = registry.lookup("blackBox1").await.unwrap();
        let second = registry.lookup("blackBox1").await.unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(registry.bound_ids().await, vec!["blackBox1".to_string()]);

        registry.unbind("blackBox1").await.unwrap();
        assert!(!registry.contains("blackBox1").await);
        assert_eq!(
            registry.unbind("blackBox1").await,
            Err(RoutingError::UnknownContext {
                id: "blackBox1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn dropped_context_binding_is_treated_as_absent() {
        let registry = Arc::new(ContextRegistry::new());
        let transient = context(&registry, "transient");
        registry.bind("transient", &transient).await.unwrap();
        drop(transient);

        assert!(matches!(
            registry.lookup("transient").await,
            Err(RoutingError::UnknownContext { .. })
        ));

        let replacement = context(&registry, "transient");
        registry.bind("transient", &replacement).await.unwrap();
        assert!(registry.lookup("transient").await.unwrap().ptr_eq(&replacement));
    }
}
