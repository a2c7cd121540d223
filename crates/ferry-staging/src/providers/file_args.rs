use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use ferry_artifact::File;
use ferry_dataflow::AppRef;
use tracing::debug;

use crate::data_manager::DataManager;
use crate::error::StagingError;
use crate::provider::Staging;
use crate::providers::wrapper::{InTaskTransfer, Payload};

/// Local files sent along with the task that uses them.
///
/// The file is read when the task is submitted and written into the
/// executor's working directory right before the task body runs. Only
/// suitable for small files, but needs no shared filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileArgsStaging;

impl Staging for FileArgsStaging {
  fn name(&self) -> &str {
    "file_args"
  }

  fn can_stage_in(&self, file: &File) -> bool {
    debug!(url = file.url(), scheme = file.scheme(), "file_args checking file");
    file.scheme() == "file"
  }

  fn can_stage_out(&self, file: &File) -> bool {
    debug!(url = file.url(), scheme = file.scheme(), "file_args checking file for stage out");
    file.scheme() == "file"
  }

  fn replace_task(
    &self,
    dm: &DataManager,
    executor: &str,
    file: &Arc<File>,
    app: &AppRef,
  ) -> Result<Option<AppRef>, StagingError> {
    let content = std::fs::read(file.path()).map_err(|source| StagingError::Read {
      path: file.path().to_string(),
      source,
    })?;
    let working_dir = dm.executor(executor)?.working_dir().map(Path::to_path_buf);

    Ok(Some(Arc::new(InTaskTransfer::new(
      app.clone(),
      file.clone(),
      working_dir,
      Payload::Captured(Bytes::from(content)),
    ))))
  }
}
