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

//! Queue (`seda:`) endpoints: a bounded FIFO drained by one dedicated worker.

use crate::data_plane::dispatcher;
use crate::endpoint::EndpointInner;
use crate::observability::events;
use crate::observability::fields::WorkerContext;
use crate::runtime::worker_runtime::{
    spawn_queue_dispatch_loop, QueueDispatchLoopHandle, DEFAULT_QUEUE_RUNTIME_THREAD_NAME,
};
use crate::{ContextState, Endpoint, Message, RoutingError};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

const QUEUE_RUNTIME_THREAD_NAME_PREFIX: &str = "ctx-queue-";
const QUEUE_RUNTIME_THREAD_NAME_MAX_LEN: usize = 15;
const COMPONENT: &str = "queue_worker";

pub(crate) struct QueuedMessage {
    pub(crate) message: Message,
    pub(crate) hops: usize,
}

/// Queue state owned by one `seda:` endpoint.
pub(crate) struct QueueEndpoint {
    capacity: usize,
    sender: mpsc::Sender<QueuedMessage>,
    receiver: Mutex<Option<mpsc::Receiver<QueuedMessage>>>,
    worker: Mutex<Option<QueueWorker>>,
}

impl QueueEndpoint {
    pub(crate) fn new(message_queue_size: usize) -> Self {
        let capacity = message_queue_size.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            capacity,
            sender,
            receiver: Mutex::new(Some(receiver)),
            worker: Mutex::new(None),
        }
    }

    /// Enqueues without waiting. A full or closed queue is a delivery failure.
    pub(crate) fn enqueue(
        &self,
        endpoint: &Endpoint,
        message: Message,
        hops: usize,
    ) -> Result<(), String> {
        let msg_id = *message.id();
        match self.sender.try_send(QueuedMessage { message, hops }) {
            Ok(()) => {
                debug!(
                    event = events::QUEUE_ENQUEUE,
                    component = COMPONENT,
                    endpoint = %endpoint.logical_address(),
                    msg_id = %msg_id,
                    "message queued"
                );
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(format!(
                "queue '{}' is full (capacity {})",
                endpoint.logical_address(),
                self.capacity
            )),
            Err(TrySendError::Closed(_)) => {
                Err(format!("queue '{}' is closed", endpoint.logical_address()))
            }
        }
    }

    /// Starts the worker draining this queue, reusing it when already running.
    pub(crate) async fn ensure_worker(&self, endpoint: &Endpoint) -> Result<(), RoutingError> {
        let mut worker = self.worker.lock().await;
        if let Some(existing) = worker.as_ref() {
            debug!(
                event = events::QUEUE_WORKER_REUSE,
                component = COMPONENT,
                endpoint = %endpoint.logical_address(),
                worker_id = existing.worker_id(),
                worker_thread = existing.runtime_thread(),
                "reusing queue worker"
            );
            return Ok(());
        }

        let Some(receiver) = self.receiver.lock().await.take() else {
            return Err(RoutingError::WorkerSpawn {
                endpoint: endpoint.logical_address(),
                reason: "queue receiver is no longer available".to_string(),
            });
        };

        *worker = Some(QueueWorker::new(endpoint, receiver)?);
        Ok(())
    }
}

/// Worker state that owns the spawned queue-dispatch thread handle.
pub(crate) struct QueueWorker {
    worker_id: String,
    dispatch_handle: QueueDispatchLoopHandle,
}

impl QueueWorker {
    fn new(
        endpoint: &Endpoint,
        receiver: mpsc::Receiver<QueuedMessage>,
    ) -> Result<Self, RoutingError> {
        let worker_id = Uuid::new_v4().simple().to_string();
        let runtime_thread_name = Self::build_runtime_thread_name(&worker_id);
        let endpoint_label = endpoint.logical_address();

        let worker_id_for_loop = worker_id.clone();
        let label_for_loop = endpoint_label.clone();
        let weak_endpoint = Arc::downgrade(&endpoint.inner);
        let state = endpoint.inner.state.clone();

        let dispatch_handle = spawn_queue_dispatch_loop(runtime_thread_name, move || {
            Self::queue_dispatch_loop(
                worker_id_for_loop,
                label_for_loop,
                receiver,
                weak_endpoint,
                state,
            )
        })
        .map_err(|err| RoutingError::WorkerSpawn {
            endpoint: endpoint_label.clone(),
            reason: err.to_string(),
        })?;

        info!(
            event = events::QUEUE_WORKER_CREATE,
            component = COMPONENT,
            endpoint = endpoint_label.as_str(),
            worker_id = worker_id.as_str(),
            worker_thread = dispatch_handle.worker_thread(),
            "queue worker started"
        );

        Ok(Self {
            worker_id,
            dispatch_handle,
        })
    }

    pub(crate) fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub(crate) fn runtime_thread(&self) -> &str {
        self.dispatch_handle.worker_thread()
    }

    fn build_runtime_thread_name(worker_id: &str) -> String {
        let suffix_len = QUEUE_RUNTIME_THREAD_NAME_MAX_LEN - QUEUE_RUNTIME_THREAD_NAME_PREFIX.len();
        let suffix: String = worker_id
            .chars()
            .filter(|ch| ch.is_ascii_hexdigit())
            .take(suffix_len)
            .collect();

        if suffix.len() == suffix_len {
            format!("{QUEUE_RUNTIME_THREAD_NAME_PREFIX}{suffix}")
        } else {
            DEFAULT_QUEUE_RUNTIME_THREAD_NAME.to_string()
        }
    }

    /// Drains the queue in FIFO order until the owning context stops or the
    /// endpoint is dropped. Messages still queued at that point are failed.
    pub(crate) async fn queue_dispatch_loop(
        worker_id: String,
        endpoint_label: String,
        mut receiver: mpsc::Receiver<QueuedMessage>,
        endpoint: Weak<EndpointInner>,
        mut state: watch::Receiver<ContextState>,
    ) {
        let worker_context = WorkerContext::with_current_thread(worker_id);

        loop {
            if *state.borrow() == ContextState::Stopped {
                break;
            }

            tokio::select! {
                biased;
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                queued = receiver.recv() => {
                    let Some(mut queued) = queued else {
                        info!(
                            event = events::QUEUE_WORKER_STOP,
                            component = COMPONENT,
                            endpoint = endpoint_label.as_str(),
                            worker_id = worker_context.worker_id.as_str(),
                            worker_thread = worker_context.worker_thread.as_str(),
                            reason = "queue_closed",
                            "queue closed; stopping dispatch loop"
                        );
                        return;
                    };
                    let Some(inner) = endpoint.upgrade() else {
                        break;
                    };
                    let endpoint = Endpoint::from_inner(inner);

                    match dispatcher::consume(&endpoint, &mut queued.message, queued.hops).await {
                        Ok(()) => debug!(
                            event = events::QUEUE_DISPATCH_OK,
                            component = COMPONENT,
                            endpoint = endpoint_label.as_str(),
                            worker_id = worker_context.worker_id.as_str(),
                            msg_id = %queued.message.id(),
                            "queued message dispatched"
                        ),
                        Err(failure) => {
                            let err = failure.at_entry(endpoint.context_id(), &endpoint_label);
                            warn!(
                                event = events::QUEUE_DISPATCH_FAILED,
                                component = COMPONENT,
                                endpoint = endpoint_label.as_str(),
                                worker_id = worker_context.worker_id.as_str(),
                                msg_id = %queued.message.id(),
                                err = %err,
                                "queued message dispatch failed"
                            );
                        }
                    }
                }
            }
        }

        receiver.close();
        while let Ok(queued) = receiver.try_recv() {
            warn!(
                event = events::QUEUE_DROP,
                component = COMPONENT,
                endpoint = endpoint_label.as_str(),
                worker_id = worker_context.worker_id.as_str(),
                msg_id = %queued.message.id(),
                reason = "context_stopped",
                "dropping queued message"
            );
        }

        info!(
            event = events::QUEUE_WORKER_STOP,
            component = COMPONENT,
            endpoint = endpoint_label.as_str(),
            worker_id = worker_context.worker_id.as_str(),
            worker_thread = worker_context.worker_thread.as_str(),
            reason = "context_stopped",
            "stopping queue dispatch loop"
        );
    }
}
