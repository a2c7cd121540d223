use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use url::Url;

use crate::Error;

/// Schemes whose artifacts live on another host until they are staged.
const REMOTE_SCHEMES: &[&str] = &["ftp", "http", "https"];

/// A data object identified by a location URL.
///
/// The location parts (`scheme`, `netloc`, `path`, `filename`) are fixed at
/// construction. The local path is unset until a staging provider claims the
/// artifact; it can be set once and is stable afterwards, so artifacts are
/// shared between tasks as `Arc<File>`.
pub struct File {
  url: String,
  scheme: String,
  netloc: String,
  path: String,
  filename: String,
  local_path: OnceLock<PathBuf>,
}

impl File {
  /// Parse an artifact from a location URL.
  ///
  /// Strings that are not absolute URLs (`data/input.txt`, `/tmp/input.txt`)
  /// are treated as `file` scheme artifacts whose path is the string itself.
  pub fn new(url: impl Into<String>) -> Result<Self, Error> {
    let url = url.into();
    match Url::parse(&url) {
      Ok(parsed) => Self::from_parsed(url, &parsed),
      Err(url::ParseError::RelativeUrlWithoutBase) => {
        let path = url.clone();
        Self::from_parts(url, "file".to_string(), String::new(), path)
      }
      Err(e) => Err(Error::InvalidUrl {
        url,
        message: e.to_string(),
      }),
    }
  }

  fn from_parsed(url: String, parsed: &Url) -> Result<Self, Error> {
    let scheme = parsed.scheme().to_string();
    let netloc = match (parsed.host_str(), parsed.port()) {
      (Some(host), Some(port)) => format!("{}:{}", host, port),
      (Some(host), None) => host.to_string(),
      _ => String::new(),
    };

    let path = if scheme == "file" {
      parsed
        .to_file_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| parsed.path().to_string())
    } else {
      parsed.path().to_string()
    };

    Self::from_parts(url, scheme, netloc, path)
  }

  fn from_parts(url: String, scheme: String, netloc: String, path: String) -> Result<Self, Error> {
    let filename = path.rsplit('/').next().unwrap_or_default().to_string();
    if filename.is_empty() {
      return Err(Error::InvalidUrl {
        url,
        message: "location has no file name".to_string(),
      });
    }

    Ok(Self {
      url,
      scheme,
      netloc,
      path,
      filename,
      local_path: OnceLock::new(),
    })
  }

  /// The location this artifact was created from.
  pub fn url(&self) -> &str {
    &self.url
  }

  /// Transport identifier, e.g. `file`, `ftp`, `http`.
  pub fn scheme(&self) -> &str {
    &self.scheme
  }

  /// Host (and port, if given) of a remote location. Empty for local files.
  pub fn netloc(&self) -> &str {
    &self.netloc
  }

  /// Path of the object at its location.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// Base name of the object.
  pub fn filename(&self) -> &str {
    &self.filename
  }

  /// Whether the object lives on another host until staged.
  pub fn is_remote(&self) -> bool {
    REMOTE_SCHEMES.contains(&self.scheme.as_str())
  }

  /// Resolved destination path, once a provider has staged the artifact.
  pub fn local_path(&self) -> Option<&Path> {
    self.local_path.get().map(PathBuf::as_path)
  }

  /// Record where the artifact was staged.
  ///
  /// Setting the same path again is accepted; a different path is an error.
  pub fn set_local_path(&self, path: impl Into<PathBuf>) -> Result<(), Error> {
    let requested = path.into();
    let existing = self.local_path.get_or_init(|| requested.clone());
    if *existing == requested {
      Ok(())
    } else {
      Err(Error::LocalPathConflict {
        url: self.url.clone(),
        existing: existing.clone(),
        requested,
      })
    }
  }

  /// The path a task should use to access this artifact.
  ///
  /// The local path once staged. Before that, remote artifacts resolve to
  /// their file name and local ones to their own path.
  pub fn filepath(&self) -> &Path {
    if let Some(local) = self.local_path() {
      local
    } else if self.is_remote() {
      Path::new(&self.filename)
    } else {
      Path::new(&self.path)
    }
  }

  /// A fresh artifact for the same location, with no local path.
  pub fn clean_copy(&self) -> Self {
    Self {
      url: self.url.clone(),
      scheme: self.scheme.clone(),
      netloc: self.netloc.clone(),
      path: self.path.clone(),
      filename: self.filename.clone(),
      local_path: OnceLock::new(),
    }
  }
}

impl fmt::Display for File {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.filepath().display())
  }
}

impl fmt::Debug for File {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "<File url={} scheme={} netloc={} path={} filename={} local_path={:?}>",
      self.url,
      self.scheme,
      self.netloc,
      self.path,
      self.filename,
      self.local_path()
    )
  }
}
