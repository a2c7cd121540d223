//! Ferry Artifact
//!
//! This crate provides the artifact model for ferry. An artifact ([`File`]) is
//! a data object identified by a location URL. Staging moves its bytes between
//! that location and the working directory of a compute executor, after which
//! the artifact carries the resolved local path.
//!
//! The local side of every transfer goes through the helpers in this crate:
//! [`prepare_local_path`] creates the destination directory and claims the
//! local path, [`write_stream`] streams bytes into it.

mod file;
mod local;

pub use file::File;
pub use local::{ensure_dir, prepare_local_path, resolve_local_path, write_stream};

use bytes::Bytes;
use futures::Stream;
use std::path::PathBuf;
use std::pin::Pin;

/// A boxed stream of bytes for artifact data.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// Error type for artifact operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The location could not be parsed as an artifact URL.
  #[error("invalid artifact url '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  /// The artifact was already staged to a different local path.
  #[error("local path of '{url}' is already {existing:?}, cannot set {requested:?}")]
  LocalPathConflict {
    url: String,
    existing: PathBuf,
    requested: PathBuf,
  },

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}
