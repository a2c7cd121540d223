use serde::{Deserialize, Serialize};

use crate::staging::StagingDef;

fn default_max_threads() -> usize {
  2
}

/// An executor tasks can be submitted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorDef {
  /// Unique executor label, used when submitting tasks.
  pub label: String,

  /// Number of tasks the executor runs at once.
  #[serde(default = "default_max_threads")]
  pub max_threads: usize,

  /// Destination root for staged files. Absent or empty means the current
  /// directory.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub working_dir: Option<String>,

  /// Staging providers used instead of the default set, in selection order.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub storage_access: Option<Vec<StagingDef>>,
}

impl ExecutorDef {
  /// An executor with default settings.
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      max_threads: default_max_threads(),
      working_dir: None,
      storage_access: None,
    }
  }
}
