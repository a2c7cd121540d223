//! Task dependency graph for ferry.
//!
//! This crate provides the pieces staging needs from a task scheduler:
//!
//! - [`App`]: a unit of work, invoked with an [`Invocation`]
//! - [`TaskHandle`], [`AppFuture`], [`DataFuture`]: dependency handles
//! - [`Submit`] and [`TaskRequest`]: the task-submission contract
//! - [`Scheduler`]: an in-process implementation of [`Submit`] on tokio
//!
//! # Architecture
//!
//! ```text
//! Submit::submit(TaskRequest) -> AppFuture
//! ├── TaskHandle      - shared completion of the task
//! └── outputs()       - one DataFuture per declared output artifact
//!
//! Scheduler (per task)
//! └── await dependencies -> acquire executor slot -> App::invoke
//! ```

mod app;
mod error;
mod future;
mod scheduler;
mod submit;

pub use app::{App, AppRef, Arg, FnApp, Invocation, app_fn};
pub use error::{AppError, SubmitError, TaskError};
pub use future::{AppFuture, DataFuture, TaskHandle, TaskId, TaskOutcome};
pub use scheduler::{Scheduler, TaskRecord, TaskState};
pub use submit::{Submit, TaskRequest};
