use std::path::Path;

use async_trait::async_trait;
use ferry_artifact::{ByteStream, File, write_stream};
use ferry_dataflow::AppError;
use futures::StreamExt;
use tracing::instrument;

use crate::transport::Transport;

/// HTTP(S) downloads, streamed into the destination file.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new(client: reqwest::Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Transport for HttpTransport {
  fn name(&self) -> &str {
    "http"
  }

  #[instrument(name = "http_fetch", skip(self, file), fields(url = %file.url()))]
  async fn fetch(&self, file: &File, dest: &Path) -> Result<u64, AppError> {
    let response = self
      .client
      .get(file.url())
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(|e| AppError::transfer(file.url(), e))?;

    let body: ByteStream = Box::pin(
      response
        .bytes_stream()
        .map(|chunk| chunk.map_err(|e| ferry_artifact::Error::Io(std::io::Error::other(e)))),
    );

    Ok(write_stream(dest, body).await?)
  }
}
