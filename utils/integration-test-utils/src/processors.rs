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

use async_trait::async_trait;
use context_router::{Message, Processor, ProcessorError};
use tokio::sync::Mutex;
use tracing::debug;

/// Records the body of every message it processes.
#[derive(Default)]
pub struct RecordingProcessor {
    seen: Mutex<Vec<String>>,
}

impl RecordingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seen(&self) -> Vec<String> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl Processor for RecordingProcessor {
    async fn process(&self, message: &mut Message) -> Result<(), ProcessorError> {
        debug!(msg_id = %message.id(), "recording processor saw message");
        self.seen.lock().await.push(message.body().to_string());
        Ok(())
    }
}

/// Fails every message with a fixed reason.
pub struct FailingProcessor {
    reason: String,
}

impl FailingProcessor {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Processor for FailingProcessor {
    async fn process(&self, _message: &mut Message) -> Result<(), ProcessorError> {
        Err(ProcessorError::new(self.reason.clone()))
    }
}
