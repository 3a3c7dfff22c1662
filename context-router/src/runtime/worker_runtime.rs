//! Runtime helper for spawning queue endpoint dispatch loops.

use crate::observability::events;
use std::future::Future;
use std::io;
use std::thread;
use tokio::runtime::Builder;
use tracing::{debug, error};

pub(crate) const DEFAULT_QUEUE_RUNTIME_THREAD_NAME: &str = "ctx-queue-rt";
const COMPONENT: &str = "worker_runtime";

/// Handle to a dispatch loop running on its own thread and current-thread runtime.
pub(crate) struct QueueDispatchLoopHandle {
    worker_thread: String,
    _join_handle: thread::JoinHandle<()>,
}

impl QueueDispatchLoopHandle {
    pub(crate) fn worker_thread(&self) -> &str {
        &self.worker_thread
    }
}

/// Spawns `run_loop` on a dedicated thread.
///
/// The loop does not need to be `Send`: it is built and driven on the new thread.
pub(crate) fn spawn_queue_dispatch_loop<F, Fut>(
    thread_name: String,
    run_loop: F,
) -> io::Result<QueueDispatchLoopHandle>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + 'static,
{
    debug!(
        event = events::RUNTIME_SPAWN_START,
        component = COMPONENT,
        worker_thread = thread_name.as_str(),
        "spawning queue dispatch thread"
    );

    let thread_name_for_loop = thread_name.clone();
    let join_handle = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!(
                        event = events::RUNTIME_SPAWN_FAILED,
                        component = COMPONENT,
                        worker_thread = thread_name_for_loop.as_str(),
                        err = %err,
                        "unable to build queue dispatch runtime"
                    );
                    return;
                }
            };

            runtime.block_on(run_loop());
        })?;

    debug!(
        event = events::RUNTIME_SPAWN_OK,
        component = COMPONENT,
        worker_thread = thread_name.as_str(),
        "queue dispatch thread spawned"
    );

    Ok(QueueDispatchLoopHandle {
        worker_thread: thread_name,
        _join_handle: join_handle,
    })
}
