//! Local side of a transfer: destination resolution and the streaming sink.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::{ByteStream, Error};

/// Destination of an artifact inside an executor's working directory.
///
/// An absent or empty working directory means the current directory.
pub fn resolve_local_path(working_dir: Option<&Path>, filename: &str) -> PathBuf {
  match working_dir {
    Some(dir) if !dir.as_os_str().is_empty() => dir.join(filename),
    _ => PathBuf::from(filename),
  }
}

/// Create a working directory if it does not exist yet.
///
/// Concurrent transfers may target the same directory, so an existing
/// directory is not an error.
pub async fn ensure_dir(working_dir: Option<&Path>) -> Result<(), Error> {
  if let Some(dir) = working_dir
    && !dir.as_os_str().is_empty()
  {
    fs::create_dir_all(dir).await?;
  }
  Ok(())
}

/// Create the working directory and claim the artifact's local path in it.
pub async fn prepare_local_path(
  file: &crate::File,
  working_dir: Option<&Path>,
) -> Result<PathBuf, Error> {
  ensure_dir(working_dir).await?;
  let local_path = resolve_local_path(working_dir, file.filename());
  file.set_local_path(&local_path)?;
  Ok(local_path)
}

/// Stream bytes into a local file, replacing any previous content.
///
/// Returns the number of bytes written.
pub async fn write_stream(path: &Path, data: ByteStream) -> Result<u64, Error> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).await?;
  }

  let mut file = File::create(path).await?;
  let mut stream = std::pin::pin!(data);
  let mut written = 0u64;

  while let Some(chunk) = stream.next().await {
    let bytes = chunk?;
    file.write_all(&bytes).await?;
    written += bytes.len() as u64;
  }

  file.flush().await?;
  Ok(written)
}
