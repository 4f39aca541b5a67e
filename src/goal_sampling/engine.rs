// Background goal sampling loop: Idle -> Sampling -> Stopped
use super::generator::{CandidateSource, SamplingContext};
use super::queue::{lock_queue, SharedGoalQueue};
use crate::geometry::Configuration;
use crate::kinematics::HostSearchState;
use crate::worker::{BackgroundWorker, StopSignal};
use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const WORKER_NAME: &str = "goal-sampling";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingPhase {
    Idle,
    Sampling,
    Stopped,
}

/// Runs a [`CandidateSource`] on its own thread and feeds the goal queue.
///
/// The loop re-checks the stop signal and the host's solution state before
/// every iteration, so cancellation is observed between iterations, never
/// in the middle of a projection.
pub struct SamplingEngine {
    source: Option<Box<dyn CandidateSource>>,
    queue: SharedGoalQueue,
    host: Arc<dyn HostSearchState>,
    worker: Option<BackgroundWorker<Box<dyn CandidateSource>>>,
    phase: SamplingPhase,
    iterations: Arc<AtomicU64>,
    idle_backoff: Duration,
}

impl SamplingEngine {
    pub fn new(
        source: Box<dyn CandidateSource>,
        queue: SharedGoalQueue,
        host: Arc<dyn HostSearchState>,
        idle_backoff: Duration,
    ) -> Self {
        Self {
            source: Some(source),
            queue,
            host,
            worker: None,
            phase: SamplingPhase::Idle,
            iterations: Arc::new(AtomicU64::new(0)),
            idle_backoff,
        }
    }

    pub fn queue(&self) -> &SharedGoalQueue {
        &self.queue
    }

    pub fn phase(&self) -> SamplingPhase {
        match (&self.worker, self.phase) {
            (Some(worker), SamplingPhase::Sampling) if worker.is_finished() => SamplingPhase::Stopped,
            (_, phase) => phase,
        }
    }

    pub fn is_sampling(&self) -> bool {
        self.phase() == SamplingPhase::Sampling
    }

    /// Completed sampling iterations since construction
    pub fn sampling_attempts_count(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    /// Start the sampling thread; a no-op while already sampling
    pub fn start(&mut self) -> Result<()> {
        if self.is_sampling() {
            return Ok(());
        }
        // Reap a loop that ended on its own (host found a solution)
        self.join_worker()?;

        // Only a panicked loop leaves the engine without its source
        let Some(mut source) = self.source.take() else {
            log::error!("Cannot restart goal sampling: the candidate source was lost when the sampling thread panicked");
            return Err(Error::WorkerPanicked(WORKER_NAME.to_string()));
        };
        let queue = Arc::clone(&self.queue);
        let host = Arc::clone(&self.host);
        let iterations = Arc::clone(&self.iterations);
        let idle_backoff = self.idle_backoff;

        let worker = BackgroundWorker::spawn(WORKER_NAME, move |stop: StopSignal| {
            let mut accepted: Vec<Configuration> = Vec::new();

            while !stop.is_stopped() && !host.has_solution() {
                let goal_count = lock_queue(&queue).len();
                let context = SamplingContext::new(
                    host.as_ref(),
                    &stop,
                    iterations.load(Ordering::Relaxed),
                    goal_count,
                );

                let success = source.generate(&context, &mut accepted);
                iterations.fetch_add(1, Ordering::Relaxed);

                if !accepted.is_empty() {
                    let mut queue = lock_queue(&queue);
                    for goal in accepted.drain(..) {
                        queue.insert(goal);
                    }
                }
                if !success && !idle_backoff.is_zero() {
                    std::thread::sleep(idle_backoff);
                }
            }

            log::debug!(
                "Goal sampling loop finished after {} iterations",
                iterations.load(Ordering::Relaxed)
            );
            source
        })?;

        log::info!("Started goal sampling thread");
        self.worker = Some(worker);
        self.phase = SamplingPhase::Sampling;
        Ok(())
    }

    /// Stop the sampling thread and wait for its current iteration to finish
    pub fn stop(&mut self) -> Result<()> {
        self.join_worker()?;
        self.phase = SamplingPhase::Stopped;
        Ok(())
    }

    /// Stop sampling and drop every candidate and all source-owned state
    pub fn clear(&mut self) -> Result<()> {
        self.stop()?;
        lock_queue(&self.queue).clear();
        if let Some(source) = self.source.as_mut() {
            source.clear();
        }
        log::info!("Cleared goal sampler state");
        Ok(())
    }

    fn join_worker(&mut self) -> Result<()> {
        if let Some(worker) = self.worker.take() {
            let source = worker.stop_and_join().map_err(|err| {
                log::error!("Goal sampling thread panicked; its candidate source is gone and sampling cannot restart");
                err
            })?;
            self.source = Some(source);
            log::info!("Stopped goal sampling thread");
        }
        Ok(())
    }
}
