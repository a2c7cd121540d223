//! Wrapping an app with an in-task transfer.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use ferry_artifact::{File, prepare_local_path};
use ferry_dataflow::{App, AppError, AppRef, Invocation};
use tracing::debug;

use crate::transport::Transport;

/// Where the bytes of an in-task transfer come from.
#[derive(Clone)]
pub enum Payload {
  /// Read at submission time and carried with the task.
  Captured(Bytes),
  /// Fetched when the task runs.
  Fetched(Arc<dyn Transport>),
}

impl fmt::Debug for Payload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Payload::Captured(bytes) => write!(f, "Captured({} bytes)", bytes.len()),
      Payload::Fetched(transport) => write!(f, "Fetched({})", transport.name()),
    }
  }
}

/// An app that places one artifact in the working directory, then runs the
/// app it wraps.
///
/// The wrapped app sees the same invocation and its result is returned
/// unchanged. Wrappers nest, one per staged artifact.
#[derive(Debug)]
pub struct InTaskTransfer {
  name: String,
  inner: AppRef,
  file: Arc<File>,
  working_dir: Option<PathBuf>,
  payload: Payload,
}

impl InTaskTransfer {
  pub fn new(
    inner: AppRef,
    file: Arc<File>,
    working_dir: Option<PathBuf>,
    payload: Payload,
  ) -> Self {
    Self {
      name: inner.name().to_string(),
      inner,
      file,
      working_dir,
      payload,
    }
  }

  /// The app run after the transfer.
  pub fn inner(&self) -> &AppRef {
    &self.inner
  }

  pub fn file(&self) -> &Arc<File> {
    &self.file
  }

  pub fn payload(&self) -> &Payload {
    &self.payload
  }
}

#[async_trait]
impl App for InTaskTransfer {
  fn name(&self) -> &str {
    &self.name
  }

  async fn invoke(&self, call: &Invocation) -> Result<serde_json::Value, AppError> {
    let local_path = prepare_local_path(&self.file, self.working_dir.as_deref()).await?;

    let written = match &self.payload {
      Payload::Captured(content) => {
        tokio::fs::write(&local_path, content).await?;
        content.len() as u64
      }
      Payload::Fetched(transport) => transport.fetch(&self.file, &local_path).await?,
    };

    debug!(
      task_id = call.task_id(),
      url = self.file.url(),
      path = %local_path.display(),
      bytes = written,
      "staged in task"
    );

    self.inner.invoke(call).await
  }
}
