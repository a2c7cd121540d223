use std::fmt;
use std::path::Path;

use crate::registry::StagingRegistry;

/// What staging needs to know about an executor.
pub trait Executor: Send + Sync + fmt::Debug {
  /// Label tasks are submitted under.
  fn label(&self) -> &str;

  /// Destination root for staged files. `None` means the current directory.
  fn working_dir(&self) -> Option<&Path>;

  /// Providers to use instead of the default registry.
  fn storage_access(&self) -> Option<&StagingRegistry> {
    None
  }
}
