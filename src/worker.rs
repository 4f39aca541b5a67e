// Named background threads with cooperative cancellation
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Stop request shared between a worker and its owner
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A thread running `body` until it returns; the owner can ask it to stop.
///
/// Cancellation is cooperative: the body must poll its [`StopSignal`].
/// Dropping the worker requests a stop and joins.
pub struct BackgroundWorker<T> {
    name: String,
    stop: StopSignal,
    handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> BackgroundWorker<T> {
    pub fn spawn<F>(name: &str, body: F) -> Result<Self>
    where
        F: FnOnce(StopSignal) -> T + Send + 'static,
    {
        let stop = StopSignal::new();
        let worker_stop = stop.clone();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(worker_stop))?;

        log::debug!("Started background worker '{}'", name);
        Ok(Self {
            name: name.to_string(),
            stop,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Request a stop and wait for the body to return its value
    pub fn stop_and_join(mut self) -> Result<T> {
        self.stop.request_stop();
        let handle = self
            .handle
            .take()
            .ok_or_else(|| Error::WorkerPanicked(self.name.clone()))?;
        let value = handle
            .join()
            .map_err(|_| Error::WorkerPanicked(self.name.clone()))?;
        log::debug!("Background worker '{}' joined", self.name);
        Ok(value)
    }
}

impl<T> Drop for BackgroundWorker<T> {
    fn drop(&mut self) {
        self.stop.request_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Background worker '{}' panicked", self.name);
            }
        }
    }
}
