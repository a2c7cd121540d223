//! Kernel error types.

use ferry_dataflow::SubmitError;
use ferry_staging::StagingError;

/// Errors returned synchronously by the kernel.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
  /// A staging decision failed.
  #[error("staging failed: {0}")]
  Staging(#[from] StagingError),

  /// The scheduler rejected the task.
  #[error("submission failed: {0}")]
  Submit(#[from] SubmitError),

  /// Two executors share a label.
  #[error("duplicate executor label '{0}'")]
  DuplicateExecutor(String),
}
