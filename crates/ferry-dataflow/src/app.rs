//! Units of work and their arguments.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ferry_artifact::File;

use crate::error::AppError;
use crate::future::{DataFuture, TaskId};

/// A task argument.
///
/// Only artifacts and data handles take part in staging; plain values are
/// passed through untouched.
#[derive(Debug, Clone)]
pub enum Arg {
  /// An ordinary value.
  Value(serde_json::Value),
  /// An artifact that is available as soon as the task is submitted.
  File(Arc<File>),
  /// An artifact that becomes available when its producer completes.
  Data(DataFuture),
}

impl Arg {
  /// The artifact behind this argument, if it is artifact-like.
  pub fn file(&self) -> Option<&Arc<File>> {
    match self {
      Arg::Value(_) => None,
      Arg::File(file) => Some(file),
      Arg::Data(data) => Some(data.file()),
    }
  }

  /// The data handle behind this argument, if any.
  pub fn data(&self) -> Option<&DataFuture> {
    match self {
      Arg::Data(data) => Some(data),
      _ => None,
    }
  }

  /// The plain value behind this argument, if any.
  pub fn value(&self) -> Option<&serde_json::Value> {
    match self {
      Arg::Value(value) => Some(value),
      _ => None,
    }
  }
}

impl From<serde_json::Value> for Arg {
  fn from(value: serde_json::Value) -> Self {
    Arg::Value(value)
  }
}

impl From<Arc<File>> for Arg {
  fn from(file: Arc<File>) -> Self {
    Arg::File(file)
  }
}

impl From<File> for Arg {
  fn from(file: File) -> Self {
    Arg::File(Arc::new(file))
  }
}

impl From<DataFuture> for Arg {
  fn from(data: DataFuture) -> Self {
    Arg::Data(data)
  }
}

/// What an [`App`] is invoked with.
///
/// Data handles among the arguments have been resolved to their artifacts by
/// the time an app sees them.
#[derive(Debug, Clone)]
pub struct Invocation {
  task_id: TaskId,
  args: Vec<Arg>,
  outputs: Vec<Arc<File>>,
}

impl Invocation {
  pub fn new(task_id: TaskId, args: Vec<Arg>, outputs: Vec<Arc<File>>) -> Self {
    Self {
      task_id,
      args,
      outputs,
    }
  }

  /// ID of the task being run.
  pub fn task_id(&self) -> TaskId {
    self.task_id
  }

  pub fn args(&self) -> &[Arg] {
    &self.args
  }

  /// Artifacts the task declared as outputs.
  pub fn outputs(&self) -> &[Arc<File>] {
    &self.outputs
  }

  /// Artifact arguments, in order.
  pub fn files(&self) -> impl Iterator<Item = &Arc<File>> {
    self.args.iter().filter_map(Arg::file)
  }
}

/// A unit of work.
///
/// Staging providers may wrap an app in another app that moves data before
/// delegating, so apps are shared as [`AppRef`].
#[async_trait]
pub trait App: Send + Sync + fmt::Debug {
  /// Name used in logs and task records.
  fn name(&self) -> &str;

  /// Run the work.
  async fn invoke(&self, call: &Invocation) -> Result<serde_json::Value, AppError>;
}

/// A shared unit of work.
pub type AppRef = Arc<dyn App>;

/// An [`App`] backed by a synchronous closure.
pub struct FnApp<F> {
  name: String,
  func: F,
}

impl<F> FnApp<F>
where
  F: Fn(&Invocation) -> Result<serde_json::Value, AppError> + Send + Sync,
{
  pub fn new(name: impl Into<String>, func: F) -> Self {
    Self {
      name: name.into(),
      func,
    }
  }
}

impl<F> fmt::Debug for FnApp<F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FnApp").field("name", &self.name).finish()
  }
}

#[async_trait]
impl<F> App for FnApp<F>
where
  F: Fn(&Invocation) -> Result<serde_json::Value, AppError> + Send + Sync,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn invoke(&self, call: &Invocation) -> Result<serde_json::Value, AppError> {
    (self.func)(call)
  }
}

/// Build a shared app from a closure.
pub fn app_fn<F>(name: impl Into<String>, func: F) -> AppRef
where
  F: Fn(&Invocation) -> Result<serde_json::Value, AppError> + Send + Sync + 'static,
{
  Arc::new(FnApp::new(name, func))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_arg_file_accessors() {
    let file = Arc::new(File::new("ftp://host/a.txt").unwrap());

    let plain = Arg::from(json!(3));
    assert!(plain.file().is_none());
    assert_eq!(plain.value(), Some(&json!(3)));

    let direct = Arg::from(file.clone());
    assert!(Arc::ptr_eq(direct.file().unwrap(), &file));

    let data = Arg::from(DataFuture::ready(file.clone()));
    assert!(Arc::ptr_eq(data.file().unwrap(), &file));
    assert!(data.data().is_some());
  }

  #[tokio::test]
  async fn test_fn_app_invokes_closure() {
    let app = app_fn("sum", |call| {
      let total: i64 = call.args().iter().filter_map(|a| a.value()?.as_i64()).sum();
      Ok(json!(total))
    });

    let call = Invocation::new(7, vec![json!(1).into(), json!(2).into()], vec![]);
    let result = app.invoke(&call).await.unwrap();

    assert_eq!(app.name(), "sum");
    assert_eq!(result, json!(3));
  }
}
