//! Task errors.

use crate::future::TaskId;

/// Failure of a unit of work.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
  /// Local filesystem error.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Artifact bookkeeping failed (e.g. conflicting local path).
  #[error("artifact error: {0}")]
  Artifact(#[from] ferry_artifact::Error),

  /// Moving an artifact's bytes failed.
  #[error("transfer of '{url}' failed: {message}")]
  Transfer { url: String, message: String },

  /// The work itself reported a failure.
  #[error("{message}")]
  Failed { message: String },
}

impl AppError {
  /// Create a transfer error.
  pub fn transfer(url: impl Into<String>, message: impl ToString) -> Self {
    Self::Transfer {
      url: url.into(),
      message: message.to_string(),
    }
  }

  /// Create a generic failure.
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }
}

/// Why a task handle resolved without a result.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
  /// The task ran and failed.
  #[error("task {task_id} failed: {source}")]
  App {
    task_id: TaskId,
    #[source]
    source: AppError,
  },

  /// The task never ran because a dependency failed.
  #[error("task {task_id} not run: dependency {dependency} failed")]
  DependencyFailed { task_id: TaskId, dependency: TaskId },

  /// The task body panicked or was aborted.
  #[error("task {task_id} aborted: {message}")]
  Join { task_id: TaskId, message: String },

  /// The executor stopped accepting work.
  #[error("task {task_id} not run: executor '{executor}' is closed")]
  Closed { task_id: TaskId, executor: String },
}

/// Errors returned synchronously by task submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
  /// No executor with this label is registered.
  #[error("unknown executor '{0}'")]
  UnknownExecutor(String),

  /// Submission happened outside a tokio runtime.
  #[error("no tokio runtime available to run tasks")]
  NoRuntime,
}
