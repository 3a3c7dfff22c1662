//! Composition of route definitions into immutable execution chains.

use crate::routing::address::{Address, AddressError, EndpointKind};
use crate::{Processor, RouteDefinition, RoutingContext, RoutingError, StepDefinition};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// One executable step of a composed route.
#[derive(Clone)]
pub(crate) enum RouteStep {
    SetHeader { name: String, value: String },
    To { address: Address, raw: String },
    Process(Arc<dyn Processor>),
}

impl Debug for RouteStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteStep::SetHeader { name, value } => write!(f, "SetHeader({name}={value})"),
            RouteStep::To { address, .. } => write!(f, "To({address})"),
            RouteStep::Process(_) => write!(f, "Process"),
        }
    }
}

/// Immutable route graph owned by exactly one context.
#[derive(Debug)]
pub(crate) struct Route {
    pub(crate) id: String,
    pub(crate) context_id: String,
    pub(crate) from: Address,
    pub(crate) steps: Vec<RouteStep>,
}

impl Route {
    /// Local endpoints the route touches, in declaration order.
    pub(crate) fn local_addresses(&self) -> impl Iterator<Item = &Address> {
        std::iter::once(&self.from)
            .chain(self.steps.iter().filter_map(|step| match step {
                RouteStep::To { address, .. } => Some(address),
                _ => None,
            }))
            .filter(|address| matches!(address, Address::Local(_)))
    }
}

fn broken(route_id: &str, step: Option<usize>, reason: String) -> RoutingError {
    RoutingError::BrokenChain {
        route_id: route_id.to_string(),
        step,
        reason,
    }
}

fn classify(err: AddressError, route_id: &str, step: Option<usize>) -> RoutingError {
    match err {
        AddressError::Malformed { address, reason } => {
            broken(route_id, step, format!("malformed address '{address}': {reason}"))
        }
        unbound @ AddressError::UnboundContext { .. } => unbound.into(),
    }
}

/// Builds the execution chain for `definition` as seen from `context`.
///
/// Unbound context prefixes surface as [`RoutingError::UnresolvedAddress`];
/// structural problems surface as [`RoutingError::BrokenChain`]. Nothing is
/// mutated.
pub(crate) async fn compose(
    definition: &RouteDefinition,
    route_id: &str,
    context: &RoutingContext,
) -> Result<Route, RoutingError> {
    let from = Address::parse(&definition.from, context)
        .await
        .map_err(|err| classify(err, route_id, None))?;

    if from.endpoint_uri().kind() == EndpointKind::Mock {
        return Err(broken(
            route_id,
            None,
            format!("'{}' cannot start a route", definition.from),
        ));
    }

    let mut steps = Vec::with_capacity(definition.steps.len());
    for (index, step) in definition.steps.iter().enumerate() {
        let composed = match step {
            StepDefinition::SetHeader { name, value } => {
                if name.is_empty() {
                    return Err(broken(route_id, Some(index), "empty header name".to_string()));
                }
                RouteStep::SetHeader {
                    name: name.clone(),
                    value: value.clone(),
                }
            }
            StepDefinition::To(raw) => RouteStep::To {
                address: Address::parse(raw, context)
                    .await
                    .map_err(|err| classify(err, route_id, Some(index)))?,
                raw: raw.clone(),
            },
            StepDefinition::Process(processor) => RouteStep::Process(processor.clone()),
        };
        steps.push(composed);
    }

    Ok(Route {
        id: route_id.to_string(),
        context_id: context.id().to_string(),
        from,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::{compose, RouteStep};
    use crate::routing::address::Address;
    use crate::{ContextConfig, ContextRegistry, RouteDefinition, RoutingContext, RoutingError};
    use std::sync::Arc;

    fn context(registry: &Arc<ContextRegistry>, id: &str) -> RoutingContext {
        RoutingContext::new(id, registry.clone(), ContextConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn compose_keeps_step_order_and_classifies_addresses() {
        let registry = Arc::new(ContextRegistry::new());
        let enclosing = context(&registry, "enclosing");
        let black_box = context(&registry, "blackBox1");
        registry.bind("blackBox1", &black_box).await.unwrap();

        let definition = RouteDefinition::from_endpoint("direct:in")
            .set_header("k", "v")
            .to("blackBox1:in")
            .to("mock:out");
        let route = compose(&definition, "BEGIN", &enclosing).await.unwrap();

        assert_eq!(route.id, "BEGIN");
        assert_eq!(route.context_id, "enclosing");
        assert_eq!(route.steps.len(), 3);
        assert!(matches!(route.steps[0], RouteStep::SetHeader { .. }));
        assert!(matches!(
            &route.steps[1],
            RouteStep::To { address: Address::Foreign { context_id, .. }, .. } if context_id == "blackBox1"
        ));
        assert_eq!(route.local_addresses().count(), 2);
    }

    #[tokio::test]
    async fn compose_reports_unbound_context_as_unresolved_address() {
        let registry = Arc::new(ContextRegistry::new());
        let enclosing = context(&registry, "enclosing");

        let definition = RouteDefinition::from_endpoint("direct:in").to("unknownCtx:in");
        let err = compose(&definition, "route1", &enclosing).await.unwrap_err();

        assert_eq!(
            err,
            RoutingError::UnresolvedAddress {
                address: "unknownCtx:in".to_string(),
                reason: "no context bound under 'unknownCtx'".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn compose_rejects_structural_problems_as_broken_chain() {
        let registry = Arc::new(ContextRegistry::new());
        let enclosing = context(&registry, "enclosing");

        let from_mock = RouteDefinition::from_endpoint("mock:out").to("direct:x");
        assert!(matches!(
            compose(&from_mock, "route1", &enclosing).await,
            Err(RoutingError::BrokenChain { step: None, .. })
        ));

        let malformed = RouteDefinition::from_endpoint("direct:in").to("direct:");
        assert!(matches!(
            compose(&malformed, "route2", &enclosing).await,
            Err(RoutingError::BrokenChain { step: Some(0), .. })
        ));
    }
}
