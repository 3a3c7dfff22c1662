/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
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

//! Canonical structured field keys and value-format helpers.

use crate::Message;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const WORKER_ID: &str = "worker_id";
pub const WORKER_THREAD: &str = "worker_thread";

pub const CONTEXT_ID: &str = "context_id";
pub const ROUTE_ID: &str = "route_id";
pub const STEP: &str = "step";
pub const ENDPOINT: &str = "endpoint";
pub const MSG_ID: &str = "msg_id";
pub const HEADERS: &str = "headers";

pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const DEFAULT_WORKER_THREAD: &str = "unknown-thread";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkerContext {
    pub worker_id: String,
    pub worker_thread: String,
}

impl WorkerContext {
    pub fn new(worker_id: impl Into<String>, worker_thread: Option<&str>) -> Self {
        Self {
            worker_id: worker_id.into(),
            worker_thread: thread_name_or_default(worker_thread),
        }
    }

    pub fn with_current_thread(worker_id: impl Into<String>) -> Self {
        Self::new(worker_id, std::thread::current().name())
    }
}

pub fn thread_name_or_default(thread_name: Option<&str>) -> String {
    thread_name.unwrap_or(DEFAULT_WORKER_THREAD).to_string()
}

/// Renders headers as `name=value` pairs in name order, or `none`.
pub fn format_headers(message: &Message) -> String {
    if message.headers().is_empty() {
        return NONE.to_string();
    }

    message
        .headers()
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn format_step(step: Option<usize>) -> String {
    step.map(|step| step.to_string())
        .unwrap_or_else(|| NONE.to_string())
}
