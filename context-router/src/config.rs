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

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MESSAGE_QUEUE_SIZE: usize = 64;
const DEFAULT_MAX_HOPS: usize = 64;
const DEFAULT_MOCK_ASSERT_TIMEOUT_MS: u64 = 5_000;

/// Per-context tuning knobs.
///
/// Missing keys fall back to their defaults when deserialized.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ContextConfig {
    /// Capacity of every `seda:` queue endpoint owned by the context.
    pub message_queue_size: usize,
    /// Upper bound on route executions entered while dispatching one message.
    pub max_hops: usize,
    /// How long `MockEndpoint::assert_is_satisfied` waits for expected messages.
    pub mock_assert_timeout_ms: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            message_queue_size: DEFAULT_MESSAGE_QUEUE_SIZE,
            max_hops: DEFAULT_MAX_HOPS,
            mock_assert_timeout_ms: DEFAULT_MOCK_ASSERT_TIMEOUT_MS,
        }
    }
}

impl ContextConfig {
    pub fn with_message_queue_size(mut self, message_queue_size: usize) -> Self {
        self.message_queue_size = message_queue_size;
        self
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn with_mock_assert_timeout(mut self, timeout: Duration) -> Self {
        self.mock_assert_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub(crate) fn mock_assert_timeout(&self) -> Duration {
        Duration::from_millis(self.mock_assert_timeout_ms)
    }
}
