//! Pipeline orchestration
//!
//! Runs the three steps strictly in sequence under an explicit retry
//! policy. The original deployment delegated retry to the scheduler
//! ("retry the failed step once"); here the policy is a parameter so the
//! behavior is visible and testable instead of ambient.

use super::Step;
use crate::error::Result;
use std::time::Duration;

/// Per-step retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per step, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    /// One retry after five minutes, matching the original scheduler
    /// configuration (`retries: 1`, default retry delay).
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// No retries: each step gets exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// The fetch → transform → load pipeline.
///
/// # Type Parameters
/// - `F`: fetch step
/// - `T`: transform step
/// - `L`: load step
///
/// # Example
/// ```no_run
/// use coingecko_pipeline::etl::{Pipeline, RetryPolicy};
/// # use coingecko_pipeline::etl::Step;
/// # use coingecko_pipeline::error::Result;
/// # struct Noop(&'static str);
/// # impl Step for Noop {
/// #     fn name(&self) -> &'static str { self.0 }
/// #     async fn run(&self) -> Result<()> { Ok(()) }
/// # }
///
/// # async fn example() -> Result<()> {
/// let pipeline = Pipeline::new(Noop("fetch"), Noop("transform"), Noop("load"))
///     .with_retry_policy(RetryPolicy::none());
/// pipeline.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<F, T, L> {
    fetcher: F,
    transformer: T,
    loader: L,
    retry: RetryPolicy,
}

impl<F, T, L> Pipeline<F, T, L>
where
    F: Step,
    T: Step,
    L: Step,
{
    /// Create a new pipeline with the default retry policy.
    pub fn new(fetcher: F, transformer: T, loader: L) -> Self {
        Self {
            fetcher,
            transformer,
            loader,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run the complete pipeline.
    ///
    /// Steps run strictly in sequence; a step that exhausts its attempts
    /// aborts the run, and later steps never execute.
    ///
    /// # Errors
    /// Returns the failing step's final error.
    pub async fn run(&self) -> Result<()> {
        log::info!("Starting pipeline run");

        self.run_step(&self.fetcher).await?;
        self.run_step(&self.transformer).await?;
        self.run_step(&self.loader).await?;

        log::info!("Pipeline run complete");
        Ok(())
    }

    async fn run_step(&self, step: &impl Step) -> Result<()> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            log::debug!("Running step '{}' (attempt {}/{})", step.name(), attempt, max_attempts);
            match step.run().await {
                Ok(()) => {
                    log::info!("✓ Step '{}' complete", step.name());
                    return Ok(());
                }
                Err(e) if attempt < max_attempts => {
                    log::warn!(
                        "Step '{}' failed (attempt {}/{}), retrying in {:?}: {}",
                        step.name(),
                        attempt,
                        max_attempts,
                        self.retry.backoff,
                        e
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!(
                        "Step '{}' failed after {} attempt(s): {}",
                        step.name(),
                        attempt,
                        e
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    struct RecordingStep {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Step for RecordingStep {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self) -> crate::error::Result<()> {
            self.log.lock().unwrap().push(self.name);
            Ok(())
        }
    }

    struct FailingStep {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Step for FailingStep {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self) -> crate::error::Result<()> {
            self.log.lock().unwrap().push(self.name);
            Err(PipelineError::Config("boom".to_string()))
        }
    }

    /// Fails a configurable number of times, then succeeds.
    struct FlakyStep {
        name: &'static str,
        failures_left: AtomicU32,
    }

    impl Step for FlakyStep {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self) -> crate::error::Result<()> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(PipelineError::Config("flaky".to_string()));
            }
            Ok(())
        }
    }

    fn recording(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> RecordingStep {
        RecordingStep {
            name,
            log: log.clone(),
        }
    }

    #[tokio::test]
    async fn test_steps_run_in_sequence() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let pipeline = Pipeline::new(
            recording("fetch", &log),
            recording("transform", &log),
            recording("load", &log),
        );

        pipeline.run().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["fetch", "transform", "load"]);
    }

    #[tokio::test]
    async fn test_failed_step_aborts_run() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let pipeline = Pipeline::new(
            recording("fetch", &log),
            FailingStep {
                name: "transform",
                log: log.clone(),
            },
            recording("load", &log),
        )
        .with_retry_policy(RetryPolicy::none());

        pipeline.run().await.unwrap_err();
        // The load step never ran
        assert_eq!(*log.lock().unwrap(), vec!["fetch", "transform"]);
    }

    #[tokio::test]
    async fn test_step_is_retried_once() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let pipeline = Pipeline::new(
            FlakyStep {
                name: "fetch",
                failures_left: AtomicU32::new(1),
            },
            recording("transform", &log),
            recording("load", &log),
        )
        .with_retry_policy(RetryPolicy::new(2, Duration::ZERO));

        pipeline.run().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["transform", "load"]);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let pipeline = Pipeline::new(
            FlakyStep {
                name: "fetch",
                failures_left: AtomicU32::new(5),
            },
            recording("transform", &log),
            recording("load", &log),
        )
        .with_retry_policy(RetryPolicy::new(2, Duration::ZERO));

        pipeline.run().await.unwrap_err();
        assert!(log.lock().unwrap().is_empty());
    }
}
