//! Log output for the ferry CLI.
//!
//! Logs go to stderr so stdout stays a clean JSON document. The level is
//! taken from `RUST_LOG` and defaults to `info`; `--verbose` raises the
//! default to `debug`.

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let env_filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  let stderr_layer = tracing_subscriber::fmt::layer()
    .with_writer(io::stderr)
    .with_target(false);

  tracing_subscriber::registry()
    .with(env_filter)
    .with(stderr_layer)
    .init();
}
