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

use context_router::{ContextConfig, RouteDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub(crate) context_defaults: ContextConfig,
    pub(crate) contexts: Vec<ContextDefinition>,
    pub(crate) send: SendConfig,
    #[serde(default)]
    pub(crate) observe: Vec<ObserveConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ContextDefinition {
    pub(crate) id: String,
    #[serde(default = "default_bind")]
    pub(crate) bind: bool,
    #[serde(default)]
    pub(crate) config: Option<ContextConfig>,
    #[serde(default)]
    pub(crate) routes: Vec<RouteConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    #[serde(default)]
    pub(crate) id: Option<String>,
    pub(crate) from: String,
    #[serde(default)]
    pub(crate) steps: Vec<StepConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum StepConfig {
    SetHeader { name: String, value: String },
    To(String),
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SendConfig {
    pub(crate) context: String,
    pub(crate) endpoint: String,
    pub(crate) body: String,
    #[serde(default)]
    pub(crate) headers: BTreeMap<String, String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ObserveConfig {
    pub(crate) context: String,
    pub(crate) endpoint: String,
    #[serde(default)]
    pub(crate) expected: Option<usize>,
}

fn default_bind() -> bool {
    true
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| format!("unable to read config file '{path}': {err}"))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        json5::from_str(contents).map_err(|err| format!("unable to parse config: {err}").into())
    }
}

impl ContextDefinition {
    pub fn context_config(&self, defaults: &ContextConfig) -> ContextConfig {
        self.config.clone().unwrap_or_else(|| defaults.clone())
    }
}

impl RouteConfig {
    pub fn to_definition(&self) -> RouteDefinition {
        let mut definition = RouteDefinition::from_endpoint(self.from.clone());
        if let Some(id) = &self.id {
            definition = definition.route_id(id.clone());
        }
        for step in &self.steps {
            definition = match step {
                StepConfig::SetHeader { name, value } => {
                    definition.set_header(name.clone(), value.clone())
                }
                StepConfig::To(address) => definition.to(address.clone()),
            };
        }
        definition
    }
}
