//! Staging errors.

use std::fmt;

use ferry_dataflow::SubmitError;

/// Direction of a staging decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  In,
  Out,
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Direction::In => f.write_str("in"),
      Direction::Out => f.write_str("out"),
    }
  }
}

/// Errors raised synchronously while making a staging decision.
///
/// Failures of the transfer itself surface later, through the handle of the
/// task that performs it.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
  /// No provider in the applicable registry accepts the artifact.
  #[error("executor '{executor}' cannot stage {direction} file {file}")]
  NoProvider {
    executor: String,
    direction: Direction,
    file: String,
  },

  /// The executor label is not known to the data manager.
  #[error("unknown executor '{0}'")]
  UnknownExecutor(String),

  /// A local artifact could not be read for in-task transfer.
  #[error("failed to read '{path}' for staging: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  /// A transfer task could not be submitted.
  #[error("failed to submit transfer task: {0}")]
  Submit(#[from] SubmitError),
}
