//! Staging provider implementations.

mod file_args;
mod in_task;
mod noop;
mod separate_task;
mod wrapper;

pub use file_args::FileArgsStaging;
pub use in_task::InTaskStaging;
pub use noop::NoOpFileStaging;
pub use separate_task::{SeparateTaskStaging, StageInApp};
pub use wrapper::{InTaskTransfer, Payload};

use ferry_artifact::File;

/// Whether `file` uses one of `schemes`.
fn matches_scheme(schemes: &[String], file: &File) -> bool {
  schemes.iter().any(|s| s == file.scheme())
}
