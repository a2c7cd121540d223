//! In-process dependency-graph scheduler.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use ferry_artifact::File;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

use crate::app::{AppRef, Arg, Invocation};
use crate::error::{SubmitError, TaskError};
use crate::future::{AppFuture, DataFuture, TaskHandle, TaskId, TaskOutcome};
use crate::submit::{Submit, TaskRequest};

/// Lifecycle of a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
  /// Waiting for dependencies or an executor slot.
  Pending,
  Running,
  Done,
  Failed,
  /// A dependency failed, so the task never ran.
  DepFail,
}

impl TaskState {
  /// Whether the task will not change state again.
  pub fn is_terminal(self) -> bool {
    matches!(self, TaskState::Done | TaskState::Failed | TaskState::DepFail)
  }
}

/// What the scheduler knows about a task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
  pub task_id: TaskId,
  pub app: String,
  pub executor: String,
  /// Tasks that must complete before this one runs.
  pub depends_on: Vec<TaskId>,
  /// Locations of the declared output artifacts.
  pub outputs: Vec<String>,
  pub staging_inhibit_output: bool,
  pub state: TaskState,
}

type TaskTable = Arc<RwLock<BTreeMap<TaskId, TaskRecord>>>;

/// Runs submitted tasks on tokio once their dependencies complete.
///
/// Each executor is a pool bounded by `max_threads` concurrent tasks. The
/// dependency edges of a task are recorded at submission, before the task can
/// become runnable.
pub struct Scheduler {
  runtime: Handle,
  pools: RwLock<HashMap<String, Arc<Semaphore>>>,
  tasks: TaskTable,
  handles: Mutex<Vec<TaskHandle>>,
  next_id: AtomicU64,
}

impl Scheduler {
  /// Create a scheduler on the current tokio runtime.
  pub fn new() -> Result<Self, SubmitError> {
    let runtime = Handle::try_current().map_err(|_| SubmitError::NoRuntime)?;
    Ok(Self {
      runtime,
      pools: RwLock::new(HashMap::new()),
      tasks: Arc::new(RwLock::new(BTreeMap::new())),
      handles: Mutex::new(Vec::new()),
      next_id: AtomicU64::new(0),
    })
  }

  /// Register an executor pool. Re-registering a label resizes it.
  pub fn add_executor(&self, label: impl Into<String>, max_threads: usize) {
    let pool = Arc::new(Semaphore::new(max_threads.max(1)));
    self.pools.write().unwrap().insert(label.into(), pool);
  }

  /// Whether an executor with this label is registered.
  pub fn has_executor(&self, label: &str) -> bool {
    self.pools.read().unwrap().contains_key(label)
  }

  /// Look up a task record.
  pub fn task(&self, task_id: TaskId) -> Option<TaskRecord> {
    self.tasks.read().unwrap().get(&task_id).cloned()
  }

  /// All task records, in submission order.
  pub fn tasks(&self) -> Vec<TaskRecord> {
    self.tasks.read().unwrap().values().cloned().collect()
  }

  /// Wait until every submitted task has finished, including tasks submitted
  /// while waiting.
  ///
  /// Awaited handles are released; task records are kept until
  /// [`Scheduler::prune_finished`].
  pub async fn wait_for_current_tasks(&self) {
    loop {
      let pending: Vec<TaskHandle> = self.handles.lock().unwrap().clone();
      if pending.is_empty() {
        return;
      }
      futures::future::join_all(pending.iter().map(TaskHandle::result)).await;

      let finished: HashSet<TaskId> = pending.iter().map(TaskHandle::id).collect();
      self
        .handles
        .lock()
        .unwrap()
        .retain(|h| !finished.contains(&h.id()));
    }
  }

  /// Number of submitted tasks whose handles are still held.
  pub fn outstanding(&self) -> usize {
    self.handles.lock().unwrap().len()
  }

  /// Drop the records and handles of tasks that have finished, in any
  /// terminal state. Returns how many records were removed.
  pub fn prune_finished(&self) -> usize {
    let mut tasks = self.tasks.write().unwrap();
    let before = tasks.len();
    tasks.retain(|_, record| !record.state.is_terminal());
    self
      .handles
      .lock()
      .unwrap()
      .retain(|h| tasks.contains_key(&h.id()));
    before - tasks.len()
  }
}

impl Submit for Scheduler {
  fn submit(&self, request: TaskRequest) -> Result<AppFuture, SubmitError> {
    let pool = self
      .pools
      .read()
      .unwrap()
      .get(&request.executor)
      .cloned()
      .ok_or_else(|| SubmitError::UnknownExecutor(request.executor.clone()))?;

    let task_id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let dependencies = request.dependencies();

    let record = TaskRecord {
      task_id,
      app: request.app.name().to_string(),
      executor: request.executor.clone(),
      depends_on: dependencies.iter().map(TaskHandle::id).collect(),
      outputs: request.outputs.iter().map(|f| f.url().to_string()).collect(),
      staging_inhibit_output: request.staging_inhibit_output,
      state: TaskState::Pending,
    };

    info!(
      task_id,
      app = %record.app,
      executor = %record.executor,
      depends_on = ?record.depends_on,
      "task_submitted"
    );

    self.tasks.write().unwrap().insert(task_id, record);

    let TaskRequest {
      executor,
      app,
      args,
      outputs,
      ..
    } = request;

    let body = TaskBody {
      task_id,
      executor,
      app,
      args,
      outputs: outputs.clone(),
      dependencies,
      pool,
      tasks: self.tasks.clone(),
    };

    let join = self.runtime.spawn(body.run());
    let handle = TaskHandle::new(task_id, async move {
      match join.await {
        Ok(outcome) => outcome,
        Err(e) => Err(Arc::new(TaskError::Join {
          task_id,
          message: e.to_string(),
        })),
      }
    });

    self.handles.lock().unwrap().push(handle.clone());

    let outputs = outputs
      .into_iter()
      .map(|file| DataFuture::produced_by(file, handle.clone()))
      .collect();

    Ok(AppFuture::new(handle, outputs))
  }
}

/// Everything a spawned task needs to run.
struct TaskBody {
  task_id: TaskId,
  executor: String,
  app: AppRef,
  args: Vec<Arg>,
  outputs: Vec<Arc<File>>,
  dependencies: Vec<TaskHandle>,
  pool: Arc<Semaphore>,
  tasks: TaskTable,
}

impl TaskBody {
  #[instrument(
    name = "task_run",
    skip(self),
    fields(
      task_id = self.task_id,
      executor = %self.executor,
      app = %self.app.name(),
    )
  )]
  async fn run(self) -> TaskOutcome {
    for dependency in &self.dependencies {
      if let Err(e) = dependency.result().await {
        warn!(dependency = dependency.id(), error = %e, "task_dep_failed");
        self.set_state(TaskState::DepFail);
        return Err(Arc::new(TaskError::DependencyFailed {
          task_id: self.task_id,
          dependency: dependency.id(),
        }));
      }
    }

    let Ok(_permit) = self.pool.clone().acquire_owned().await else {
      self.set_state(TaskState::Failed);
      return Err(Arc::new(TaskError::Closed {
        task_id: self.task_id,
        executor: self.executor.clone(),
      }));
    };

    // Producers have completed, so data handles can be handed over as artifacts.
    let args = self
      .args
      .iter()
      .map(|arg| match arg {
        Arg::Data(data) => Arg::File(data.file().clone()),
        other => other.clone(),
      })
      .collect();

    self.set_state(TaskState::Running);
    info!("task_started");

    let call = Invocation::new(self.task_id, args, self.outputs.clone());
    match self.app.invoke(&call).await {
      Ok(value) => {
        self.set_state(TaskState::Done);
        info!("task_completed");
        Ok(value)
      }
      Err(e) => {
        self.set_state(TaskState::Failed);
        error!(error = %e, "task_failed");
        Err(Arc::new(TaskError::App {
          task_id: self.task_id,
          source: e,
        }))
      }
    }
  }

  fn set_state(&self, state: TaskState) {
    if let Some(record) = self.tasks.write().unwrap().get_mut(&self.task_id) {
      record.state = state;
    }
  }
}
