use std::path::Path;
use std::sync::Arc;

use ferry_artifact::File;
use ferry_dataflow::AppRef;

use crate::data_manager::DataManager;
use crate::error::StagingError;
use crate::provider::Staging;
use crate::providers::matches_scheme;
use crate::providers::wrapper::{InTaskTransfer, Payload};
use crate::transport::{FtpTransport, HttpTransport, Transport};

/// Remote artifacts fetched by the consuming task itself, right before its
/// body runs.
///
/// For executors whose workers can reach the remote location but do not
/// share a filesystem with the submitting side.
#[derive(Debug, Clone)]
pub struct InTaskStaging {
  name: String,
  schemes: Vec<String>,
  transport: Arc<dyn Transport>,
}

impl InTaskStaging {
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

  pub fn ftp() -> Self {
    Self::new("ftp_in_task", ["ftp"], Arc::new(FtpTransport))
  }

  pub fn http() -> Self {
    Self::new(
      "http_in_task",
      ["http", "https"],
      Arc::new(HttpTransport::default()),
    )
  }
}

impl Staging for InTaskStaging {
  fn name(&self) -> &str {
    &self.name
  }

  fn can_stage_in(&self, file: &File) -> bool {
    matches_scheme(&self.schemes, file)
  }

  fn replace_task(
    &self,
    dm: &DataManager,
    executor: &str,
    file: &Arc<File>,
    app: &AppRef,
  ) -> Result<Option<AppRef>, StagingError> {
    let working_dir = dm.executor(executor)?.working_dir().map(Path::to_path_buf);

    Ok(Some(Arc::new(InTaskTransfer::new(
      app.clone(),
      file.clone(),
      working_dir,
      Payload::Fetched(self.transport.clone()),
    ))))
  }
}
