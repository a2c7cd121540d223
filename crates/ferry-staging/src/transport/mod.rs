//! Wire-level transfer clients.

mod ftp;
mod http;

pub use ftp::FtpTransport;
pub use http::HttpTransport;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use ferry_artifact::File;
use ferry_dataflow::AppError;

/// Fetches a remote artifact's bytes into a local file.
///
/// Transports run inside tasks: errors are task failures, reported through
/// the handle of the task doing the transfer.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
  /// Name used in logs and task names.
  fn name(&self) -> &str;

  /// Write the object behind `file` to `dest`. Returns the bytes written.
  async fn fetch(&self, file: &File, dest: &Path) -> Result<u64, AppError>;
}
