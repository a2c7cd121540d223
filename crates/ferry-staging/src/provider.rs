//! The staging provider interface.

use std::fmt;
use std::sync::Arc;

use ferry_artifact::File;
use ferry_dataflow::{AppRef, DataFuture, TaskHandle};

use crate::data_manager::DataManager;
use crate::error::StagingError;

/// A strategy for moving artifacts of some schemes.
///
/// Providers answer whether they can move an artifact in or out and, if
/// chosen, perform or arrange the move. Every operation has a declining
/// default (`false` or `Ok(None)`), so a provider only implements what its
/// strategy uses. Declining is not an error: the data manager then uses the
/// input or app unchanged.
pub trait Staging: Send + Sync + fmt::Debug {
  /// Name used in logs.
  fn name(&self) -> &str;

  fn can_stage_in(&self, _file: &File) -> bool {
    false
  }

  fn can_stage_out(&self, _file: &File) -> bool {
    false
  }

  /// Arrange for `file` to be present in the executor's working directory.
  ///
  /// `parent` is the handle the artifact arrived with, if any; a transfer task
  /// must depend on it. Returns the handle consumers must depend on.
  fn stage_in(
    &self,
    _dm: &DataManager,
    _executor: &str,
    _file: &Arc<File>,
    _parent: Option<&DataFuture>,
  ) -> Result<Option<DataFuture>, StagingError> {
    Ok(None)
  }

  /// Arrange for `file` to be moved out once `app` has produced it.
  fn stage_out(
    &self,
    _dm: &DataManager,
    _executor: &str,
    _file: &Arc<File>,
    _app: &TaskHandle,
  ) -> Result<Option<TaskHandle>, StagingError> {
    Ok(None)
  }

  /// Wrap the task that consumes `file`.
  fn replace_task(
    &self,
    _dm: &DataManager,
    _executor: &str,
    _file: &Arc<File>,
    _app: &AppRef,
  ) -> Result<Option<AppRef>, StagingError> {
    Ok(None)
  }

  /// Wrap the task that produces `file`.
  fn replace_task_stage_out(
    &self,
    _dm: &DataManager,
    _executor: &str,
    _file: &Arc<File>,
    _app: &AppRef,
  ) -> Result<Option<AppRef>, StagingError> {
    Ok(None)
  }
}
