/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use crate::{ContextRegistry, Message, RoutingError};
use std::sync::Arc;

///
/// [`ProducerTemplate`] injects messages into a context found by id in a
/// [`ContextRegistry`], without holding on to the context itself.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use context_router::{new_context, ContextConfig, ContextRegistry, ProducerTemplate, RouteDefinition};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let registry = Arc::new(ContextRegistry::new());
/// let context = new_context(
///     registry.clone(),
///     "enclosing",
///     vec![RouteDefinition::from_endpoint("direct:start").to("mock:out")],
///     ContextConfig::default(),
/// )
/// .await
/// .unwrap();
///
/// let producer = ProducerTemplate::new(registry);
/// producer.send_body("enclosing", "direct:start", "testing").await.unwrap();
/// assert_eq!(context.mock_endpoint("mock:out").await.unwrap().received_count().await, 1);
/// # });
/// ```
#[derive(Clone)]
pub struct ProducerTemplate {
    registry: Arc<ContextRegistry>,
}

impl ProducerTemplate {
    pub fn new(registry: Arc<ContextRegistry>) -> Self {
        Self { registry }
    }

    /// Sends a new message with `body` to `endpoint` of context `context_id`.
    pub async fn send_body(
        &self,
        context_id: &str,
        endpoint: &str,
        body: impl Into<String>,
    ) -> Result<Message, RoutingError> {
        self.send(context_id, endpoint, Message::new(body)).await
    }

    /// Sends `message` to `endpoint` of context `context_id`.
    ///
    /// Fails with [`RoutingError::UnknownContext`] when nothing is bound under
    /// `context_id`.
    pub async fn send(
        &self,
        context_id: &str,
        endpoint: &str,
        message: Message,
    ) -> Result<Message, RoutingError> {
        let context = self.registry.lookup(context_id).await?;
        context.send(endpoint, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::ProducerTemplate;
    use crate::{ContextRegistry, RoutingError};
    use std::sync::Arc;

    #[tokio::test]
    async fn unknown_context_is_reported() {
        let producer = ProducerTemplate::new(Arc::new(ContextRegistry::new()));

        assert_eq!(
            producer.send_body("missing", "direct:in", "testing").await,
            Err(RoutingError::UnknownContext {
                id: "missing".to_string()
            })
        );
    }
}
