//! Staged task submission.

use std::collections::HashSet;
use std::sync::Arc;

use ferry_artifact::File;
use ferry_config::Config;
use ferry_dataflow::{
  AppFuture, Arg, DataFuture, Scheduler, Submit, SubmitError, TaskRecord, TaskRequest,
};
use ferry_staging::{DataManager, Direction, StagingRegistry};
use tracing::{debug, info, instrument};

use crate::error::KernelError;
use crate::executor::LocalExecutor;

/// Submits tasks with their inputs staged in and their outputs staged out.
///
/// The kernel owns the scheduler and a data manager whose transfer tasks go
/// to that same scheduler, so transfers and user tasks share one dependency
/// graph.
pub struct DataFlowKernel {
  scheduler: Arc<Scheduler>,
  data_manager: DataManager,
}

impl DataFlowKernel {
  /// Create a kernel from a scheduler and a data manager submitting to it.
  pub fn new(scheduler: Arc<Scheduler>, data_manager: DataManager) -> Self {
    Self {
      scheduler,
      data_manager,
    }
  }

  /// Build a kernel with one local executor per configured executor.
  ///
  /// Must be called from within a tokio runtime.
  pub fn from_config(config: &Config) -> Result<Self, KernelError> {
    let scheduler = Arc::new(Scheduler::new()?);
    let submitter: Arc<dyn Submit> = scheduler.clone();
    let mut data_manager = DataManager::new(submitter, StagingRegistry::standard());

    let mut labels = HashSet::new();
    for def in &config.executors {
      if !labels.insert(def.label.as_str()) {
        return Err(KernelError::DuplicateExecutor(def.label.clone()));
      }

      let executor = LocalExecutor::from_def(def);
      scheduler.add_executor(def.label.clone(), executor.max_threads());
      data_manager.add_executor(Arc::new(executor));

      info!(
        executor = %def.label,
        max_threads = def.max_threads,
        working_dir = ?def.working_dir,
        storage_access = ?def.storage_access,
        "executor registered"
      );
    }

    Ok(Self::new(scheduler, data_manager))
  }

  pub fn data_manager(&self) -> &DataManager {
    &self.data_manager
  }

  pub fn scheduler(&self) -> &Arc<Scheduler> {
    &self.scheduler
  }

  /// All task records, transfer tasks included.
  pub fn tasks(&self) -> Vec<TaskRecord> {
    self.scheduler.tasks()
  }

  /// Submit a task, staging its artifacts on the way.
  ///
  /// Each argument is staged in: transfer handles replace the arguments they
  /// stage, and providers may wrap the app instead. Unless the request
  /// inhibits output staging, outputs are declared to the scheduler as fresh
  /// copies, the app may be wrapped for stage-out, and each returned output
  /// handle guards the original artifact and completes after its stage-out.
  ///
  /// Every staging decision that can fail is made before any transfer task
  /// is submitted, so a rejected request leaves nothing running.
  #[instrument(
    name = "kernel_submit",
    skip(self, request),
    fields(executor = %request.executor, app = %request.app.name())
  )]
  pub fn submit(&self, request: TaskRequest) -> Result<AppFuture, KernelError> {
    let TaskRequest {
      executor,
      mut app,
      args,
      depends_on,
      outputs,
      staging_inhibit_output,
    } = request;
    let dm = &self.data_manager;
    dm.executor(&executor)?;
    if !self.scheduler.has_executor(&executor) {
      return Err(SubmitError::UnknownExecutor(executor).into());
    }

    for file in args.iter().filter_map(Arg::file) {
      dm.check(file, &executor, Direction::In)?;
    }
    if !staging_inhibit_output {
      for file in &outputs {
        dm.check(file, &executor, Direction::Out)?;
      }
    }

    // Wrapping submits nothing, so it goes before the transfers.
    for arg in &args {
      app = dm.replace_task(arg, app, &executor)?;
    }

    let copies: Vec<Arc<File>> = if staging_inhibit_output {
      Vec::new()
    } else {
      outputs
        .iter()
        .map(|file| Arc::new(file.clean_copy()))
        .collect()
    };
    for copy in &copies {
      app = dm.replace_task_stage_out(copy, app, &executor)?;
    }

    let staged_args = args
      .into_iter()
      .map(|arg| dm.stage_in(arg, &executor))
      .collect::<Result<Vec<_>, _>>()?;

    if staging_inhibit_output {
      let request = TaskRequest {
        executor,
        app,
        args: staged_args,
        depends_on,
        outputs,
        staging_inhibit_output,
      };
      return Ok(self.scheduler.submit(request)?);
    }

    let future = self.scheduler.submit(TaskRequest {
      executor: executor.clone(),
      app,
      args: staged_args,
      depends_on,
      outputs: copies.clone(),
      staging_inhibit_output,
    })?;

    let mut guarded = Vec::with_capacity(outputs.len());
    for (original, copy) in outputs.into_iter().zip(&copies) {
      let producer = match dm.stage_out(copy, &executor, future.handle())? {
        Some(stage_out) => {
          debug!(url = copy.url(), stage_out = stage_out.id(), "output staged out by task");
          stage_out
        }
        None => future.handle().clone(),
      };
      guarded.push(DataFuture::produced_by(original, producer));
    }

    Ok(future.with_outputs(guarded))
  }

  /// Wait until every submitted task, transfers included, has finished.
  pub async fn wait_for_current_tasks(&self) {
    self.scheduler.wait_for_current_tasks().await;
  }
}
