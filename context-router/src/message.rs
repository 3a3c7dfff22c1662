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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

///
/// [`Message`] is a payload plus the headers accumulated while it traverses routes.
///
/// Headers set by one context stay visible to every later step, including steps
/// running inside other contexts.
///
/// # Examples
///
/// ```
/// use context_router::Message;
///
/// let mut message = Message::new("testing");
/// message.set_header("blackBox1", "blackBox1");
///
/// assert_eq!(message.body(), "testing");
/// assert_eq!(message.header("blackBox1"), Some("blackBox1"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: Uuid,
    body: String,
    headers: BTreeMap<String, String>,
}

impl Message {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            body: body.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Sets a header, returning the value it replaced. Last writer wins.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.headers.insert(name.into(), value.into())
    }
}
