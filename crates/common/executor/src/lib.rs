pub mod poller;

use std::future::Future;

use tokio::{runtime, task::JoinHandle};

/// A thin wrapper around a `tokio` runtime handle, mirroring the teacher's
/// `ReamExecutor`: business logic spawns through this instead of calling
/// `tokio::spawn` directly, so a caller running outside any runtime (tests,
/// CLI entry points invoked off the `#[tokio::main]` task) still gets one.
pub struct PodaExecutor {
    // Kept alive only when we built our own runtime; `None` when we borrowed
    // the ambient one.
    _runtime: Option<runtime::Runtime>,
    handle: runtime::Handle,
}

impl PodaExecutor {
    pub fn new() -> anyhow::Result<Self> {
        match runtime::Handle::try_current() {
            Ok(handle) => Ok(Self {
                _runtime: None,
                handle,
            }),
            Err(_) => {
                let runtime = runtime::Builder::new_multi_thread().enable_all().build()?;
                let handle = runtime.handle().clone();
                Ok(Self {
                    _runtime: Some(runtime),
                    handle,
                })
            }
        }
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_its_own_runtime_outside_one() {
        let executor = PodaExecutor::new().unwrap();
        let handle = executor.spawn(async { 1 + 1 });
        let result = executor.handle.block_on(handle).unwrap();
        assert_eq!(result, 2);
    }
}
