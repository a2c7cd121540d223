//! Ferry Kernel
//!
//! The [`DataFlowKernel`] is where tasks enter ferry. It owns the scheduler
//! and the data manager and wires staging into every submission: inputs are
//! staged in before the task is scheduled, outputs are staged out after it
//! completes, and the returned handles carry the right dependencies.
//!
//! A kernel is normally built from a [`ferry_config::Config`], which turns
//! each executor definition into a [`LocalExecutor`] with its own pool and,
//! optionally, its own staging providers.

mod error;
mod executor;
mod kernel;
mod staging;

pub use error::KernelError;
pub use executor::LocalExecutor;
pub use kernel::DataFlowKernel;
pub use staging::{provider_for, registry_from_defs};
