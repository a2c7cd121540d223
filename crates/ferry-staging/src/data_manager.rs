//! The staging dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use ferry_artifact::File;
use ferry_dataflow::{AppRef, Arg, Submit, TaskHandle};
use tracing::debug;

use crate::error::{Direction, StagingError};
use crate::executor::Executor;
use crate::provider::Staging;
use crate::registry::StagingRegistry;

/// Decides which provider stages an artifact for an executor, and delegates.
///
/// The registry consulted is the executor's own `storage_access` if it has
/// one, else the default registry given at construction. Every operation is
/// a synchronous scan and delegation; transfers happen in tasks or wrapped
/// apps created by the providers.
pub struct DataManager {
  submitter: Arc<dyn Submit>,
  executors: HashMap<String, Arc<dyn Executor>>,
  default_staging: StagingRegistry,
}

impl DataManager {
  /// Create a data manager that submits transfer tasks to `submitter`.
  pub fn new(submitter: Arc<dyn Submit>, default_staging: StagingRegistry) -> Self {
    Self {
      submitter,
      executors: HashMap::new(),
      default_staging,
    }
  }

  /// Register an executor. A later executor with the same label replaces it.
  pub fn add_executor(&mut self, executor: Arc<dyn Executor>) {
    self
      .executors
      .insert(executor.label().to_string(), executor);
  }

  pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
    self.add_executor(executor);
    self
  }

  /// Look up an executor by label.
  pub fn executor(&self, label: &str) -> Result<&dyn Executor, StagingError> {
    self
      .executors
      .get(label)
      .map(|e| e.as_ref())
      .ok_or_else(|| StagingError::UnknownExecutor(label.to_string()))
  }

  /// Where providers submit transfer tasks.
  pub fn submitter(&self) -> &dyn Submit {
    self.submitter.as_ref()
  }

  pub fn default_staging(&self) -> &StagingRegistry {
    &self.default_staging
  }

  /// The registry that applies to an executor.
  pub fn storage_access(&self, executor: &str) -> Result<&StagingRegistry, StagingError> {
    let executor = self.executor(executor)?;
    Ok(executor.storage_access().unwrap_or(&self.default_staging))
  }

  fn select(
    &self,
    executor: &str,
    file: &File,
    direction: Direction,
  ) -> Result<&Arc<dyn Staging>, StagingError> {
    self
      .storage_access(executor)?
      .find(file, direction)
      .ok_or_else(|| StagingError::NoProvider {
        executor: executor.to_string(),
        direction,
        file: format!("{:?}", file),
      })
  }

  /// Check that some provider can stage `file` in `direction` for
  /// `executor`, without staging anything.
  pub fn check(
    &self,
    file: &File,
    executor: &str,
    direction: Direction,
  ) -> Result<(), StagingError> {
    self.select(executor, file, direction).map(|_| ())
  }

  /// Stage an input for a task on `executor`.
  ///
  /// Plain values are returned as they are. For artifacts and data handles
  /// the selected provider may start a transfer, in which case its handle is
  /// returned and the task must depend on it; otherwise the input is
  /// returned unchanged. A data handle input becomes the transfer's
  /// predecessor.
  pub fn stage_in(&self, input: Arg, executor: &str) -> Result<Arg, StagingError> {
    let (file, parent) = match &input {
      Arg::Value(_) => (None, None),
      Arg::File(file) => (Some(file.clone()), None),
      Arg::Data(data) => (Some(data.file().clone()), Some(data.clone())),
    };
    let Some(file) = file else {
      return Ok(input);
    };

    let provider = self.select(executor, &file, Direction::In)?;
    debug!(provider = provider.name(), url = file.url(), executor, "stage_in");

    match provider.stage_in(self, executor, &file, parent.as_ref())? {
      Some(staged) => Ok(Arg::Data(staged)),
      None => Ok(input),
    }
  }

  /// Stage out an artifact produced by the task behind `app`.
  ///
  /// Returns the handle of the stage-out work, if the provider started any.
  pub fn stage_out(
    &self,
    file: &Arc<File>,
    executor: &str,
    app: &TaskHandle,
  ) -> Result<Option<TaskHandle>, StagingError> {
    let provider = self.select(executor, file, Direction::Out)?;
    debug!(provider = provider.name(), url = file.url(), executor, "stage_out");

    provider.stage_out(self, executor, file, app)
  }

  /// Let the provider for an input wrap the app that consumes it.
  ///
  /// Returns `app` itself for plain values and when the provider declines.
  pub fn replace_task(
    &self,
    input: &Arg,
    app: AppRef,
    executor: &str,
  ) -> Result<AppRef, StagingError> {
    let Some(file) = input.file() else {
      return Ok(app);
    };

    let provider = self.select(executor, file, Direction::In)?;
    Ok(
      provider
        .replace_task(self, executor, file, &app)?
        .unwrap_or(app),
    )
  }

  /// Let the provider for an output wrap the app that produces it.
  pub fn replace_task_stage_out(
    &self,
    file: &Arc<File>,
    app: AppRef,
    executor: &str,
  ) -> Result<AppRef, StagingError> {
    let provider = self.select(executor, file, Direction::Out)?;
    Ok(
      provider
        .replace_task_stage_out(self, executor, file, &app)?
        .unwrap_or(app),
    )
  }
}
