use ferry_artifact::File;

use crate::provider::Staging;

/// Local files that tasks read and write where they are.
///
/// Claims `file` artifacts in both directions and declines every operation,
/// so the artifact is used as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpFileStaging;

impl Staging for NoOpFileStaging {
  fn name(&self) -> &str {
    "no_op"
  }

  fn can_stage_in(&self, file: &File) -> bool {
    file.scheme() == "file"
  }

  fn can_stage_out(&self, file: &File) -> bool {
    file.scheme() == "file"
  }
}
