/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
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

mod config;

use crate::config::Config;
use clap::Parser;
use context_router::{ContextRegistry, Message, RoutingContext};
use serde_json::json;
use std::error::Error;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Builds routing contexts from a json5 file and sends one message through them")]
struct RouterArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

fn find<'a>(contexts: &'a [RoutingContext], id: &str) -> Result<&'a RoutingContext, String> {
    contexts
        .iter()
        .find(|context| context.id() == id)
        .ok_or_else(|| format!("no context named '{id}' in config"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let args = RouterArgs::parse();
    let config = Config::load(&args.config)?;
    info!(config = args.config.as_str(), "starting context-router-cli");

    let registry = Arc::new(ContextRegistry::new());

    // Contexts are only weakly bound; this vector keeps them alive.
    let mut contexts: Vec<RoutingContext> = Vec::with_capacity(config.contexts.len());
    for definition in &config.contexts {
        let context = RoutingContext::new(
            definition.id.as_str(),
            registry.clone(),
            definition.context_config(&config.context_defaults),
        )?;
        for route in &definition.routes {
            context.add_route(route.to_definition()).await?;
        }
        if definition.bind {
            context.bind().await?;
        }
        contexts.push(context);
    }

    for context in &contexts {
        context.start().await?;
    }

    let mut observed = Vec::with_capacity(config.observe.len());
    for observe in &config.observe {
        let mock = find(&contexts, &observe.context)?
            .mock_endpoint(&observe.endpoint)
            .await?;
        if let Some(expected) = observe.expected {
            mock.expected_message_count(expected).await;
        }
        observed.push((observe, mock));
    }

    let mut message = Message::new(config.send.body.clone());
    for (name, value) in &config.send.headers {
        message.set_header(name.clone(), value.clone());
    }
    let delivered = find(&contexts, &config.send.context)?
        .send(&config.send.endpoint, message)
        .await?;

    let mut report = Vec::with_capacity(observed.len());
    let mut unsatisfied = 0;
    for (observe, mock) in &observed {
        let satisfied = match mock.assert_is_satisfied().await {
            Ok(()) => true,
            Err(err) => {
                warn!(err = %err, "observed endpoint not satisfied");
                unsatisfied += 1;
                false
            }
        };
        report.push(json!({
            "context": observe.context,
            "endpoint": observe.endpoint,
            "received": mock.received_messages().await,
            "satisfied": satisfied,
        }));
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "delivered": delivered,
            "observed": report,
        }))?
    );

    for context in contexts.iter().rev() {
        context.stop().await?;
    }

    if unsatisfied > 0 {
        return Err(format!("{unsatisfied} observed endpoint(s) not satisfied").into());
    }
    Ok(())
}
