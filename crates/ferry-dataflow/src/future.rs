//! Dependency handles.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use ferry_artifact::File;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::error::TaskError;

/// Identifier of a submitted task.
pub type TaskId = u64;

/// What a task handle resolves to.
pub type TaskOutcome = Result<serde_json::Value, Arc<TaskError>>;

/// Shared completion of a submitted task.
///
/// Every clone observes the same outcome, so one handle can be a dependency
/// of any number of later tasks.
#[derive(Clone)]
pub struct TaskHandle {
  id: TaskId,
  outcome: Shared<BoxFuture<'static, TaskOutcome>>,
}

impl TaskHandle {
  pub fn new<F>(id: TaskId, outcome: F) -> Self
  where
    F: Future<Output = TaskOutcome> + Send + 'static,
  {
    Self {
      id,
      outcome: outcome.boxed().shared(),
    }
  }

  pub fn id(&self) -> TaskId {
    self.id
  }

  /// Wait for the task and return its outcome.
  pub async fn result(&self) -> TaskOutcome {
    self.outcome.clone().await
  }
}

impl fmt::Debug for TaskHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TaskHandle").field("id", &self.id).finish()
  }
}

/// Handle to a submitted task and the artifacts it declared as outputs.
#[derive(Debug, Clone)]
pub struct AppFuture {
  handle: TaskHandle,
  outputs: Vec<DataFuture>,
}

impl AppFuture {
  pub fn new(handle: TaskHandle, outputs: Vec<DataFuture>) -> Self {
    Self { handle, outputs }
  }

  pub fn task_id(&self) -> TaskId {
    self.handle.id()
  }

  pub fn handle(&self) -> &TaskHandle {
    &self.handle
  }

  /// One data handle per declared output, in declaration order.
  pub fn outputs(&self) -> &[DataFuture] {
    &self.outputs
  }

  /// The data handle guarding the output with the same location as `file`.
  pub fn output_for(&self, file: &File) -> Option<&DataFuture> {
    self.outputs.iter().find(|o| o.file().url() == file.url())
  }

  /// Replace the output handles, keeping the task.
  pub fn with_outputs(self, outputs: Vec<DataFuture>) -> Self {
    Self {
      handle: self.handle,
      outputs,
    }
  }

  /// Wait for the task and return its outcome.
  pub async fn result(&self) -> TaskOutcome {
    self.handle.result().await
  }
}

/// An artifact together with the task that makes it available.
///
/// Resolving the handle means the producer finished, so the artifact's bytes
/// are at its local path.
#[derive(Debug, Clone)]
pub struct DataFuture {
  file: Arc<File>,
  producer: Option<TaskHandle>,
}

impl DataFuture {
  /// An artifact made available by `producer`.
  pub fn produced_by(file: Arc<File>, producer: TaskHandle) -> Self {
    Self {
      file,
      producer: Some(producer),
    }
  }

  /// An artifact that is available already.
  pub fn ready(file: Arc<File>) -> Self {
    Self {
      file,
      producer: None,
    }
  }

  pub fn file(&self) -> &Arc<File> {
    &self.file
  }

  pub fn producer(&self) -> Option<&TaskHandle> {
    self.producer.as_ref()
  }

  /// ID of the producing task, if any.
  pub fn task_id(&self) -> Option<TaskId> {
    self.producer.as_ref().map(TaskHandle::id)
  }

  /// Wait for the producer, then return the artifact.
  pub async fn resolve(&self) -> Result<Arc<File>, Arc<TaskError>> {
    if let Some(producer) = &self.producer {
      producer.result().await?;
    }
    Ok(self.file.clone())
  }
}
