//! Step trait, the unit of orchestration and retry

use crate::error::Result;

/// One pipeline step.
///
/// A step is all-or-nothing: it either completes its side effect (an object
/// staged, a load job finished) or fails as a unit. Steps perform no
/// internal retries; retry belongs to the orchestrator running them.
///
/// # Example
/// ```no_run
/// use coingecko_pipeline::etl::Step;
/// use coingecko_pipeline::error::Result;
///
/// struct Noop;
///
/// impl Step for Noop {
///     fn name(&self) -> &'static str {
///         "noop"
///     }
///
///     async fn run(&self) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait Step: Send + Sync {
    /// Step name used in logs and retry messages.
    fn name(&self) -> &'static str;

    /// Execute the step's side effect.
    ///
    /// # Errors
    /// Returns an error if any part of the step fails; no partial state is
    /// left behind that a rerun would not overwrite.
    fn run(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}
