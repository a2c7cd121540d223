use std::path::Path;

use std::io::{self, Write};

use async_trait::async_trait;
use ferry_artifact::File;
use ferry_dataflow::AppError;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpResult, FtpStream};
use tracing::{debug, instrument};

use crate::transport::Transport;

const DEFAULT_PORT: u16 = 21;
const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// Anonymous FTP downloads.
///
/// The client is blocking, so each session runs on tokio's blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct FtpTransport;

impl FtpTransport {
  /// `host:port` to connect to, with the default port filled in.
  fn address(netloc: &str) -> String {
    // IPv6 hosts are bracketed, so only a colon after the bracket is a port.
    let has_port = match netloc.rfind(']') {
      Some(end) => netloc[end..].contains(':'),
      None => netloc.contains(':'),
    };
    if has_port {
      netloc.to_string()
    } else {
      format!("{}:{}", netloc, DEFAULT_PORT)
    }
  }

  /// Directory holding the object on the server.
  fn remote_dir(path: &str) -> Option<String> {
    Path::new(path)
      .parent()
      .and_then(|p| p.to_str())
      .filter(|p| !p.is_empty())
      .map(str::to_string)
  }

  /// One session: the download, then `QUIT` whether or not it succeeded.
  fn retrieve(address: &str, dir: Option<&str>, filename: &str, dest: &Path) -> FtpResult<u64> {
    let mut ftp = FtpStream::connect(address)?;
    let result = Self::download(&mut ftp, dir, filename, dest);
    if let Err(e) = ftp.quit() {
      debug!(error = %e, "ftp quit failed");
    }
    result
  }

  /// Copy the object into `dest` chunk by chunk as it arrives.
  fn download(
    ftp: &mut FtpStream,
    dir: Option<&str>,
    filename: &str,
    dest: &Path,
  ) -> FtpResult<u64> {
    ftp.login(ANONYMOUS_USER, ANONYMOUS_PASSWORD)?;
    if let Some(dir) = dir {
      ftp.cwd(dir)?;
    }
    ftp.transfer_type(FileType::Binary)?;

    let mut out = std::fs::File::create(dest).map_err(FtpError::ConnectionError)?;
    let written = ftp.retr(filename, |reader| {
      io::copy(reader, &mut out).map_err(FtpError::ConnectionError)
    })?;
    out.flush().map_err(FtpError::ConnectionError)?;
    Ok(written)
  }
}

#[async_trait]
impl Transport for FtpTransport {
  fn name(&self) -> &str {
    "ftp"
  }

  #[instrument(name = "ftp_fetch", skip(self, file), fields(url = %file.url()))]
  async fn fetch(&self, file: &File, dest: &Path) -> Result<u64, AppError> {
    let address = Self::address(file.netloc());
    let dir = Self::remote_dir(file.path());
    let filename = file.filename().to_string();
    let dest = dest.to_path_buf();
    debug!(%address, ?dir, %filename, "retrieving");

    tokio::task::spawn_blocking(move || Self::retrieve(&address, dir.as_deref(), &filename, &dest))
      .await
      .map_err(|e| AppError::transfer(file.url(), e))?
      .map_err(|e| AppError::transfer(file.url(), e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_address_defaults_port() {
    assert_eq!(FtpTransport::address("ftp.example.org"), "ftp.example.org:21");
    assert_eq!(FtpTransport::address("localhost:2121"), "localhost:2121");
    assert_eq!(FtpTransport::address("[::1]"), "[::1]:21");
    assert_eq!(FtpTransport::address("[2001:db8::7]:2121"), "[2001:db8::7]:2121");
  }

  #[test]
  fn test_remote_dir() {
    assert_eq!(
      FtpTransport::remote_dir("/pub/data/input.txt"),
      Some("/pub/data".to_string())
    );
    assert_eq!(FtpTransport::remote_dir("/input.txt"), Some("/".to_string()));
    assert_eq!(FtpTransport::remote_dir("input.txt"), None);
  }
}
