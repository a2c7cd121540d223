//! The task-submission contract.

use std::sync::Arc;

use ferry_artifact::File;

use crate::app::{AppRef, Arg};
use crate::error::SubmitError;
use crate::future::{AppFuture, TaskHandle};

/// Something that accepts new units of work.
///
/// Submission returns immediately; the returned handle completes when the
/// task has run.
pub trait Submit: Send + Sync {
  fn submit(&self, request: TaskRequest) -> Result<AppFuture, SubmitError>;
}

/// A unit of work to schedule.
#[derive(Debug, Clone)]
pub struct TaskRequest {
  /// Label of the executor to run on.
  pub executor: String,
  /// The work.
  pub app: AppRef,
  /// Arguments. Data handles among them are dependencies.
  pub args: Vec<Arg>,
  /// Additional dependencies that are not passed to the app.
  pub depends_on: Vec<TaskHandle>,
  /// Artifacts the task produces.
  pub outputs: Vec<Arc<File>>,
  /// Skip stage-out for the outputs of this task. Set on transfer tasks so
  /// their own outputs are not staged again.
  pub staging_inhibit_output: bool,
}

impl TaskRequest {
  pub fn new(executor: impl Into<String>, app: AppRef) -> Self {
    Self {
      executor: executor.into(),
      app,
      args: Vec::new(),
      depends_on: Vec::new(),
      outputs: Vec::new(),
      staging_inhibit_output: false,
    }
  }

  pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args(mut self, args: impl IntoIterator<Item = Arg>) -> Self {
    self.args.extend(args);
    self
  }

  pub fn depends_on(mut self, handle: TaskHandle) -> Self {
    self.depends_on.push(handle);
    self
  }

  pub fn output(mut self, file: Arc<File>) -> Self {
    self.outputs.push(file);
    self
  }

  pub fn inhibit_output_staging(mut self) -> Self {
    self.staging_inhibit_output = true;
    self
  }

  /// Every task this request must wait for, without duplicates.
  pub fn dependencies(&self) -> Vec<TaskHandle> {
    let mut deps: Vec<TaskHandle> = Vec::new();
    let producers = self
      .args
      .iter()
      .filter_map(|a| a.data()?.producer().cloned());

    for handle in self.depends_on.iter().cloned().chain(producers) {
      if !deps.iter().any(|d| d.id() == handle.id()) {
        deps.push(handle);
      }
    }
    deps
  }
}
