//! Ferry Config
//!
//! This crate contains the serializable configuration types for ferry.
//! A configuration lists the executors tasks can run on, where each executor
//! keeps its staged files, and optionally which staging providers it uses
//! instead of the default set.
//!
//! Configuration is loaded from JSON:
//!
//! ```json
//! {
//!   "executors": [
//!     {
//!       "label": "local_threads",
//!       "max_threads": 4,
//!       "working_dir": "work",
//!       "storage_access": [{ "type": "file_args" }]
//!     }
//!   ]
//! }
//! ```

mod executor;
mod staging;

pub use executor::ExecutorDef;
pub use staging::StagingDef;

use serde::{Deserialize, Serialize};

/// Top-level ferry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  pub executors: Vec<ExecutorDef>,
}

impl Config {
  /// Parse a configuration from JSON text.
  pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(text)
  }

  /// Look up an executor definition by label.
  pub fn executor(&self, label: &str) -> Option<&ExecutorDef> {
    self.executors.iter().find(|e| e.label == label)
  }
}

impl Default for Config {
  /// A single thread-pool executor staging into the current directory.
  fn default() -> Self {
    Self {
      executors: vec![ExecutorDef::new("local_threads")],
    }
  }
}
