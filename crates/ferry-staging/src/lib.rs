//! Data staging for ferry.
//!
//! Staging moves task input and output artifacts between their locations and
//! the working directories of executors. The [`DataManager`] decides, per
//! artifact and executor, which [`Staging`] provider handles the move and
//! delegates to it. It never transfers anything itself.
//!
//! # Architecture
//!
//! ```text
//! DataManager
//! ├── stage_in(arg, executor)               -> arg or DataFuture of a transfer task
//! ├── stage_out(file, executor, app)        -> optional stage-out handle
//! ├── replace_task(arg, app, executor)      -> app, possibly wrapped
//! └── replace_task_stage_out(file, app, e)  -> app, possibly wrapped
//!
//! StagingRegistry (executor override, else default): first capable provider wins
//! ├── NoOpFileStaging        - local files used in place
//! ├── FileArgsStaging        - local file bytes carried inside the task
//! ├── SeparateTaskStaging    - transfer runs as its own task (ftp, http)
//! └── InTaskStaging          - transfer runs inside the consuming task (ftp, http)
//! ```

mod data_manager;
mod error;
mod executor;
mod provider;
mod providers;
mod registry;
mod transport;

pub use data_manager::DataManager;
pub use error::{Direction, StagingError};
pub use executor::Executor;
pub use provider::Staging;
pub use providers::{
  FileArgsStaging, InTaskStaging, InTaskTransfer, NoOpFileStaging, Payload, SeparateTaskStaging,
  StageInApp,
};
pub use registry::StagingRegistry;
pub use transport::{FtpTransport, HttpTransport, Transport};
