use std::path::{Path, PathBuf};

use ferry_config::ExecutorDef;
use ferry_staging::{Executor, StagingRegistry};

use crate::staging::registry_from_defs;

/// An executor that runs tasks on the local tokio runtime.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
  label: String,
  max_threads: usize,
  working_dir: Option<PathBuf>,
  storage_access: Option<StagingRegistry>,
}

impl LocalExecutor {
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      max_threads: 2,
      working_dir: None,
      storage_access: None,
    }
  }

  /// Build an executor from its configuration entry.
  pub fn from_def(def: &ExecutorDef) -> Self {
    Self {
      label: def.label.clone(),
      max_threads: def.max_threads,
      working_dir: def.working_dir.as_ref().map(PathBuf::from),
      storage_access: def.storage_access.as_deref().map(registry_from_defs),
    }
  }

  pub fn with_max_threads(mut self, max_threads: usize) -> Self {
    self.max_threads = max_threads;
    self
  }

  pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
    self.working_dir = Some(working_dir.into());
    self
  }

  pub fn with_storage_access(mut self, registry: StagingRegistry) -> Self {
    self.storage_access = Some(registry);
    self
  }

  /// Number of tasks run at once.
  pub fn max_threads(&self) -> usize {
    self.max_threads
  }
}

impl Executor for LocalExecutor {
  fn label(&self) -> &str {
    &self.label
  }

  fn working_dir(&self) -> Option<&Path> {
    self.working_dir.as_deref()
  }

  fn storage_access(&self) -> Option<&StagingRegistry> {
    self.storage_access.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ferry_config::StagingDef;

  #[test]
  fn test_from_def() {
    let mut def = ExecutorDef::new("cluster");
    def.max_threads = 8;
    def.working_dir = Some("scratch".to_string());
    def.storage_access = Some(vec![StagingDef::FileArgs]);

    let executor = LocalExecutor::from_def(&def);
    assert_eq!(executor.label(), "cluster");
    assert_eq!(executor.max_threads(), 8);
    assert_eq!(executor.working_dir(), Some(Path::new("scratch")));
    assert_eq!(executor.storage_access().map(StagingRegistry::len), Some(1));
  }

  #[test]
  fn test_defaults_use_shared_registry() {
    let executor = LocalExecutor::from_def(&ExecutorDef::new("local"));
    assert_eq!(executor.max_threads(), 2);
    assert!(executor.working_dir().is_none());
    assert!(executor.storage_access().is_none());
  }
}
