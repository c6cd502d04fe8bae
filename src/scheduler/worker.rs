use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::MutexGuard;
use tracing::{debug, trace};

use super::{PassRequest, PollOutcome, Shared, UiExecutor};

const WORKER_NAME: &str = "scope-hunter-trigger";

pub(super) fn spawn(
    shared: Arc<Shared>,
    executor: Arc<dyn UiExecutor>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(WORKER_NAME.to_string())
        .spawn(move || run(&shared, executor.as_ref()))
}

/// Sleeps until the next debounce deadline or a wakeup, whichever is first.
fn run(shared: &Arc<Shared>, executor: &dyn UiExecutor) {
    debug!("trigger worker started");
    let mut core = shared.core.lock();
    loop {
        if core.abort {
            core.reset(Instant::now());
            break;
        }
        match core.poll(Instant::now()) {
            PollOutcome::Fire => {
                trace!(transition = ?core.machine.last_transition(), "posting pass request");
                let pass = PassRequest::new(Arc::clone(shared), core.generation);
                MutexGuard::unlocked(&mut core, || executor.post(pass));
            }
            PollOutcome::Sleep(timeout) => {
                shared.wake.wait_for(&mut core, timeout);
            }
        }
    }
    debug!("trigger worker stopped");
}
