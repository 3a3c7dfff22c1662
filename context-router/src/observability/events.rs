//! Canonical structured event names used across `context-router`.

// Context lifecycle and registry events.
pub const CONTEXT_START_OK: &str = "context_start_ok";
pub const CONTEXT_START_FAILED: &str = "context_start_failed";
pub const CONTEXT_STOP_OK: &str = "context_stop_ok";
pub const REGISTRY_BIND_OK: &str = "registry_bind_ok";
pub const REGISTRY_BIND_FAILED: &str = "registry_bind_failed";
pub const REGISTRY_UNBIND: &str = "registry_unbind";

// Control-plane route events.
pub const ROUTE_ADD_START: &str = "route_add_start";
pub const ROUTE_ADD_OK: &str = "route_add_ok";
pub const ROUTE_ADD_FAILED: &str = "route_add_failed";
pub const ROUTE_REMOVE_OK: &str = "route_remove_ok";
pub const ROUTE_ACTIVATE_OK: &str = "route_activate_ok";
pub const ROUTE_ACTIVATE_FAILED: &str = "route_activate_failed";

// Dispatch events.
pub const DISPATCH_STEP: &str = "dispatch_step";
pub const DISPATCH_HANDOFF: &str = "dispatch_handoff";
pub const DISPATCH_FAILED: &str = "dispatch_failed";

// Queue worker events.
pub const QUEUE_ENQUEUE: &str = "queue_enqueue";
pub const QUEUE_WORKER_CREATE: &str = "queue_worker_create";
pub const QUEUE_WORKER_REUSE: &str = "queue_worker_reuse";
pub const QUEUE_WORKER_STOP: &str = "queue_worker_stop";
pub const QUEUE_DISPATCH_OK: &str = "queue_dispatch_ok";
pub const QUEUE_DISPATCH_FAILED: &str = "queue_dispatch_failed";
pub const QUEUE_DROP: &str = "queue_drop";

pub const MOCK_RECEIVE: &str = "mock_receive";

// Runtime events.
pub const RUNTIME_SPAWN_START: &str = "runtime_spawn_start";
pub const RUNTIME_SPAWN_OK: &str = "runtime_spawn_ok";
pub const RUNTIME_SPAWN_FAILED: &str = "runtime_spawn_failed";
