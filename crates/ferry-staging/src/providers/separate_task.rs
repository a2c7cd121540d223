use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use ferry_artifact::{File, prepare_local_path};
use ferry_dataflow::{App, AppError, DataFuture, Invocation, TaskRequest};
use tracing::info;

use crate::data_manager::DataManager;
use crate::error::StagingError;
use crate::provider::Staging;
use crate::providers::matches_scheme;
use crate::transport::{FtpTransport, HttpTransport, Transport};

/// Remote artifacts fetched by a dedicated transfer task.
///
/// Stage-in submits a task that declares the artifact as its output and the
/// artifact's producer (if any) as its dependency. Consumers depend on the
/// returned data handle, so the scheduler orders producer, transfer and
/// consumer.
#[derive(Debug, Clone)]
pub struct SeparateTaskStaging {
  name: String,
  schemes: Vec<String>,
  transport: Arc<dyn Transport>,
}

impl SeparateTaskStaging {
  pub fn new<S: Into<String>>(
    name: impl Into<String>,
    schemes: impl IntoIterator<Item = S>,
    transport: Arc<dyn Transport>,
  ) -> Self {
    Self {
      name: name.into(),
      schemes: schemes.into_iter().map(Into::into).collect(),
      transport,
    }
  }

  /// `ftp` artifacts over anonymous FTP.
  pub fn ftp() -> Self {
    Self::new("ftp_separate_task", ["ftp"], Arc::new(FtpTransport))
  }

  /// `http` and `https` artifacts.
  pub fn http() -> Self {
    Self::new(
      "http_separate_task",
      ["http", "https"],
      Arc::new(HttpTransport::default()),
    )
  }
}

impl Staging for SeparateTaskStaging {
  fn name(&self) -> &str {
    &self.name
  }

  fn can_stage_in(&self, file: &File) -> bool {
    matches_scheme(&self.schemes, file)
  }

  fn stage_in(
    &self,
    dm: &DataManager,
    executor: &str,
    file: &Arc<File>,
    parent: Option<&DataFuture>,
  ) -> Result<Option<DataFuture>, StagingError> {
    let working_dir = dm.executor(executor)?.working_dir().map(Path::to_path_buf);
    let app = Arc::new(StageInApp::new(self.transport.clone(), working_dir));

    let mut request = TaskRequest::new(executor, app)
      .output(file.clone())
      .inhibit_output_staging();
    if let Some(producer) = parent.and_then(DataFuture::producer) {
      request = request.depends_on(producer.clone());
    }

    let transfer = dm.submitter().submit(request)?;
    Ok(transfer.output_for(file).cloned())
  }
}

/// Body of a transfer task: fetches each declared output into the working
/// directory.
#[derive(Debug)]
pub struct StageInApp {
  name: String,
  transport: Arc<dyn Transport>,
  working_dir: Option<PathBuf>,
}

impl StageInApp {
  pub fn new(transport: Arc<dyn Transport>, working_dir: Option<PathBuf>) -> Self {
    Self {
      name: format!("{}_stage_in", transport.name()),
      transport,
      working_dir,
    }
  }
}

#[async_trait]
impl App for StageInApp {
  fn name(&self) -> &str {
    &self.name
  }

  async fn invoke(&self, call: &Invocation) -> Result<serde_json::Value, AppError> {
    for file in call.outputs() {
      let local_path = prepare_local_path(file, self.working_dir.as_deref()).await?;
      let written = self.transport.fetch(file, &local_path).await?;
      info!(
        task_id = call.task_id(),
        url = file.url(),
        path = %local_path.display(),
        bytes = written,
        "staged in"
      );
    }
    Ok(serde_json::Value::Null)
  }
}
