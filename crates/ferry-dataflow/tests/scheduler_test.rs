//! Integration tests for the in-process scheduler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ferry_artifact::File;
use ferry_dataflow::{
  App, AppError, Arg, Invocation, Scheduler, Submit, SubmitError, TaskError, TaskRequest,
  TaskState, app_fn,
};
use serde_json::json;
use tokio::sync::Notify;

/// Sleeps, then appends its name to a shared log.
#[derive(Debug)]
struct Recorder {
  name: String,
  delay_ms: u64,
  log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl App for Recorder {
  fn name(&self) -> &str {
    &self.name
  }

  async fn invoke(&self, _call: &Invocation) -> Result<serde_json::Value, AppError> {
    tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
    self.log.lock().unwrap().push(self.name.clone());
    Ok(json!(self.name))
  }
}

/// Blocks until released.
#[derive(Debug)]
struct Gate {
  release: Arc<Notify>,
}

#[async_trait]
impl App for Gate {
  fn name(&self) -> &str {
    "gate"
  }

  async fn invoke(&self, _call: &Invocation) -> Result<serde_json::Value, AppError> {
    self.release.notified().await;
    Ok(json!("opened"))
  }
}

/// Tracks how many invocations overlap.
#[derive(Debug, Default)]
struct Overlap {
  running: AtomicUsize,
  peak: AtomicUsize,
}

#[async_trait]
impl App for Overlap {
  fn name(&self) -> &str {
    "overlap"
  }

  async fn invoke(&self, _call: &Invocation) -> Result<serde_json::Value, AppError> {
    let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(20)).await;
    self.running.fetch_sub(1, Ordering::SeqCst);
    Ok(serde_json::Value::Null)
  }
}

fn scheduler() -> Scheduler {
  let scheduler = Scheduler::new().expect("runtime available");
  scheduler.add_executor("local", 4);
  scheduler
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dependent_runs_after_dependency() {
  let scheduler = scheduler();
  let log = Arc::new(Mutex::new(Vec::new()));

  let first = scheduler
    .submit(TaskRequest::new(
      "local",
      Arc::new(Recorder {
        name: "first".to_string(),
        delay_ms: 50,
        log: log.clone(),
      }),
    ))
    .unwrap();

  let second = scheduler
    .submit(
      TaskRequest::new(
        "local",
        Arc::new(Recorder {
          name: "second".to_string(),
          delay_ms: 0,
          log: log.clone(),
        }),
      )
      .depends_on(first.handle().clone()),
    )
    .unwrap();

  assert_eq!(second.result().await.unwrap(), json!("second"));
  assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

#[tokio::test]
async fn test_edges_recorded_before_task_is_runnable() {
  let scheduler = scheduler();
  let release = Arc::new(Notify::new());

  let gate = scheduler
    .submit(TaskRequest::new(
      "local",
      Arc::new(Gate {
        release: release.clone(),
      }),
    ))
    .unwrap();

  let file = Arc::new(File::new("ftp://host/pub/in.txt").unwrap());
  let consumer = scheduler
    .submit(
      TaskRequest::new("local", app_fn("consumer", |_| Ok(json!("consumed"))))
        .depends_on(gate.handle().clone())
        .output(file)
        .inhibit_output_staging(),
    )
    .unwrap();

  let record = scheduler.task(consumer.task_id()).unwrap();
  assert_eq!(record.depends_on, vec![gate.task_id()]);
  assert_eq!(record.outputs, vec!["ftp://host/pub/in.txt".to_string()]);
  assert!(record.staging_inhibit_output);
  assert_eq!(record.state, TaskState::Pending);

  release.notify_one();
  assert_eq!(consumer.result().await.unwrap(), json!("consumed"));
  assert_eq!(
    scheduler.task(consumer.task_id()).unwrap().state,
    TaskState::Done
  );
}

#[tokio::test]
async fn test_dependency_failure_propagates() {
  let scheduler = scheduler();

  let failing = scheduler
    .submit(TaskRequest::new(
      "local",
      app_fn("failing", |_| Err(AppError::failed("no such object"))),
    ))
    .unwrap();

  let dependent = scheduler
    .submit(
      TaskRequest::new("local", app_fn("dependent", |_| Ok(json!(1))))
        .depends_on(failing.handle().clone()),
    )
    .unwrap();

  let err = dependent.result().await.unwrap_err();
  assert!(matches!(
    *err,
    TaskError::DependencyFailed { dependency, .. } if dependency == failing.task_id()
  ));

  let err = failing.result().await.unwrap_err();
  assert!(err.to_string().contains("no such object"));

  assert_eq!(
    scheduler.task(failing.task_id()).unwrap().state,
    TaskState::Failed
  );
  assert_eq!(
    scheduler.task(dependent.task_id()).unwrap().state,
    TaskState::DepFail
  );
}

#[tokio::test]
async fn test_data_arguments_become_dependencies_and_artifacts() {
  let scheduler = scheduler();
  let file = Arc::new(File::new("ftp://host/pub/data.bin").unwrap());

  let producer = scheduler
    .submit(
      TaskRequest::new("local", app_fn("producer", |_| Ok(serde_json::Value::Null)))
        .output(file.clone()),
    )
    .unwrap();

  let data = producer.outputs()[0].clone();
  assert_eq!(data.task_id(), Some(producer.task_id()));

  let consumer = scheduler
    .submit(
      TaskRequest::new(
        "local",
        app_fn("consumer", |call| {
          let resolved = matches!(call.args()[0], Arg::File(_));
          let names: Vec<_> = call.files().map(|f| f.filename().to_string()).collect();
          Ok(json!({ "resolved": resolved, "names": names }))
        }),
      )
      .arg(data)
      .arg(json!("plain")),
    )
    .unwrap();

  assert_eq!(
    scheduler.task(consumer.task_id()).unwrap().depends_on,
    vec![producer.task_id()]
  );

  let result = consumer.result().await.unwrap();
  assert_eq!(result["names"], json!(["data.bin"]));
  assert_eq!(result["resolved"], json!(true));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_executor_pool_bounds_concurrency() {
  let scheduler = Scheduler::new().unwrap();
  scheduler.add_executor("single", 1);
  let app = Arc::new(Overlap::default());

  let futures: Vec<_> = (0..4)
    .map(|_| scheduler.submit(TaskRequest::new("single", app.clone())).unwrap())
    .collect();

  for future in futures {
    future.result().await.unwrap();
  }

  assert_eq!(app.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_executor_is_rejected() {
  let scheduler = scheduler();

  let err = scheduler
    .submit(TaskRequest::new("missing", app_fn("noop", |_| Ok(json!(null)))))
    .unwrap_err();

  assert!(matches!(err, SubmitError::UnknownExecutor(label) if label == "missing"));
}

#[tokio::test]
async fn test_wait_for_current_tasks() {
  let scheduler = scheduler();
  let log = Arc::new(Mutex::new(Vec::new()));

  for i in 0..3 {
    scheduler
      .submit(TaskRequest::new(
        "local",
        Arc::new(Recorder {
          name: format!("task-{}", i),
          delay_ms: 10,
          log: log.clone(),
        }),
      ))
      .unwrap();
  }

  scheduler.wait_for_current_tasks().await;

  assert_eq!(log.lock().unwrap().len(), 3);
  assert!(
    scheduler
      .tasks()
      .iter()
      .all(|t| t.state == TaskState::Done)
  );
}

#[tokio::test]
async fn test_finished_tasks_are_released() {
  let scheduler = scheduler();
  let release = Arc::new(Notify::new());

  for i in 0..3 {
    scheduler
      .submit(TaskRequest::new(
        "local",
        app_fn(format!("quick-{}", i), |_| Ok(json!(null))),
      ))
      .unwrap();
  }
  scheduler.wait_for_current_tasks().await;

  assert_eq!(scheduler.outstanding(), 0);
  assert_eq!(scheduler.tasks().len(), 3);

  let gate = scheduler
    .submit(TaskRequest::new(
      "local",
      Arc::new(Gate {
        release: release.clone(),
      }),
    ))
    .unwrap();

  assert_eq!(scheduler.prune_finished(), 3);
  let remaining = scheduler.tasks();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].task_id, gate.task_id());
  assert_eq!(scheduler.outstanding(), 1);

  release.notify_one();
  scheduler.wait_for_current_tasks().await;
  assert_eq!(scheduler.outstanding(), 0);
  assert_eq!(scheduler.prune_finished(), 1);
  assert!(scheduler.tasks().is_empty());
}

#[test]
fn test_scheduler_requires_runtime() {
  assert!(matches!(Scheduler::new(), Err(SubmitError::NoRuntime)));
}
