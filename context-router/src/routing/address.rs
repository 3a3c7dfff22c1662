//! Logical address model and resolution policy.
//!
//! A raw address is parsed once, at composition time, into [`Address::Local`] or
//! [`Address::Foreign`]. Foreign addresses are resolved to concrete endpoints
//! only when a route is activated or a message is dispatched.

use crate::{Endpoint, RoutingContext, RoutingError};
use std::fmt::{Display, Formatter};

/// Separates a context id or component scheme from the rest of an address.
pub const ADDRESS_DELIMITER: char = ':';

/// Component schemes recognized for local endpoints.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EndpointKind {
    /// Synchronous pass-through into the consuming route.
    Direct,
    /// Bounded FIFO queue drained by a dedicated worker.
    Queue,
    /// Terminal endpoint that records received messages.
    Mock,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 3] = [EndpointKind::Direct, EndpointKind::Queue, EndpointKind::Mock];

    pub const fn scheme(&self) -> &'static str {
        match self {
            EndpointKind::Direct => "direct",
            EndpointKind::Queue => "seda",
            EndpointKind::Mock => "mock",
        }
    }

    pub fn from_scheme(scheme: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.scheme() == scheme)
    }
}

impl PartialOrd for EndpointKind {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EndpointKind {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.scheme().cmp(other.scheme())
    }
}

///
/// [`EndpointUri`] is the local name of an endpoint inside one context, such as
/// `direct:in` or `mock:out`. A bare name (`in`) means `direct:in`.
///
/// # Examples
///
/// ```
/// use context_router::{EndpointKind, EndpointUri};
///
/// let uri = EndpointUri::parse("in").unwrap();
/// assert_eq!(uri.kind(), EndpointKind::Direct);
/// assert_eq!(uri.to_string(), "direct:in");
///
/// assert!(EndpointUri::parse("blackBox1:in").is_err());
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct EndpointUri {
    kind: EndpointKind,
    name: String,
}

impl EndpointUri {
    pub fn new(kind: EndpointKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Parses a local endpoint URI. Anything that is not `<scheme>:<name>` with a
    /// known scheme, or a bare name, is rejected with a reason.
    pub fn parse(local: &str) -> Result<Self, String> {
        match local.split_once(ADDRESS_DELIMITER) {
            None if local.is_empty() => Err("empty endpoint name".to_string()),
            None => Ok(Self::new(EndpointKind::Direct, local)),
            Some((scheme, name)) => {
                let Some(kind) = EndpointKind::from_scheme(scheme) else {
                    return Err(format!("unknown component scheme '{scheme}'"));
                };
                if name.is_empty() {
                    return Err(format!("missing endpoint name after '{scheme}:'"));
                }
                if name.contains(ADDRESS_DELIMITER) {
                    return Err(format!("endpoint name '{name}' must not contain ':'"));
                }
                Ok(Self::new(kind, name))
            }
        }
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for EndpointUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{ADDRESS_DELIMITER}{}", self.kind.scheme(), self.name)
    }
}

/// A parsed route address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Address {
    Local(EndpointUri),
    Foreign {
        context_id: String,
        endpoint: EndpointUri,
    },
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Local(endpoint) => write!(f, "{endpoint}"),
            Address::Foreign {
                context_id,
                endpoint,
            } => write!(f, "{context_id}{ADDRESS_DELIMITER}{endpoint}"),
        }
    }
}

/// Parse failures, split so composition can tell structure from binding problems.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum AddressError {
    Malformed { address: String, reason: String },
    UnboundContext { address: String, context_id: String },
}

impl From<AddressError> for RoutingError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::Malformed { address, reason } => {
                RoutingError::UnresolvedAddress { address, reason }
            }
            AddressError::UnboundContext {
                address,
                context_id,
            } => RoutingError::UnresolvedAddress {
                address,
                reason: format!("no context bound under '{context_id}'"),
            },
        }
    }
}

impl Address {
    /// Classifies `raw` as seen from `current`.
    ///
    /// A prefixed address is foreign only when its prefix is bound to a context
    /// other than `current`. A prefix that matches no scheme and no binding is an
    /// error, never a local name with a literal delimiter.
    pub(crate) async fn parse(raw: &str, current: &RoutingContext) -> Result<Self, AddressError> {
        let malformed = |reason: String| AddressError::Malformed {
            address: raw.to_string(),
            reason,
        };

        let Some((prefix, rest)) = raw.split_once(ADDRESS_DELIMITER) else {
            return EndpointUri::parse(raw).map(Address::Local).map_err(malformed);
        };

        if prefix.is_empty() {
            return Err(malformed("missing context id or scheme".to_string()));
        }
        if EndpointKind::from_scheme(prefix).is_some() {
            return EndpointUri::parse(raw).map(Address::Local).map_err(malformed);
        }
        if rest.is_empty() {
            return Err(malformed(format!("missing endpoint after '{prefix}:'")));
        }

        let endpoint = EndpointUri::parse(rest).map_err(malformed)?;
        if prefix == current.id() {
            return Ok(Address::Local(endpoint));
        }

        match current.registry().lookup(prefix).await {
            Ok(bound) if bound.ptr_eq(current) => Ok(Address::Local(endpoint)),
            Ok(_) => Ok(Address::Foreign {
                context_id: prefix.to_string(),
                endpoint,
            }),
            Err(_) => Err(AddressError::UnboundContext {
                address: raw.to_string(),
                context_id: prefix.to_string(),
            }),
        }
    }

    /// Resolves to a concrete endpoint as seen from `owner`.
    ///
    /// Local endpoints are created on demand. Foreign endpoints must already exist
    /// in their context.
    pub(crate) async fn resolve(&self, owner: &RoutingContext) -> Result<Endpoint, RoutingError> {
        match self {
            Address::Local(endpoint) => Ok(owner.endpoint_for(endpoint).await),
            Address::Foreign {
                context_id,
                endpoint,
            } => {
                let foreign = owner.registry().lookup(context_id).await?;
                foreign
                    .existing_endpoint(endpoint)
                    .await
                    .ok_or_else(|| RoutingError::UnresolvedAddress {
                        address: self.to_string(),
                        reason: format!("context '{context_id}' has no endpoint '{endpoint}'"),
                    })
            }
        }
    }

    pub(crate) fn endpoint_uri(&self) -> &EndpointUri {
        match self {
            Address::Local(endpoint) => endpoint,
            Address::Foreign { endpoint, .. } => endpoint,
        }
    }
}
