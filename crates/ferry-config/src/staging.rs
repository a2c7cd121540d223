use serde::{Deserialize, Serialize};

/// A staging provider an executor may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StagingDef {
  /// Local files used in place.
  NoOp,
  /// Local files carried inside the submitted task.
  FileArgs,
  /// FTP download as a separate task.
  FtpSeparateTask,
  /// HTTP(S) download as a separate task.
  HttpSeparateTask,
  /// FTP download inside the consuming task.
  FtpInTask,
  /// HTTP(S) download inside the consuming task.
  HttpInTask,
}
