//! Ordered, immutable provider lists.

use std::sync::Arc;

use ferry_artifact::File;
use tracing::debug;

use crate::error::Direction;
use crate::provider::Staging;
use crate::providers::{NoOpFileStaging, SeparateTaskStaging};

/// An ordered list of staging providers.
///
/// Selection is first match: the first provider whose capability check
/// accepts an artifact is used and later ones are not consulted. The list
/// cannot be changed after construction; clones share it.
#[derive(Debug, Clone)]
pub struct StagingRegistry {
  providers: Arc<[Arc<dyn Staging>]>,
}

impl StagingRegistry {
  pub fn new(providers: Vec<Arc<dyn Staging>>) -> Self {
    Self {
      providers: providers.into(),
    }
  }

  /// The default providers: local files in place, FTP and HTTP as separate
  /// transfer tasks.
  pub fn standard() -> Self {
    Self::new(vec![
      Arc::new(NoOpFileStaging),
      Arc::new(SeparateTaskStaging::ftp()),
      Arc::new(SeparateTaskStaging::http()),
    ])
  }

  pub fn providers(&self) -> &[Arc<dyn Staging>] {
    &self.providers
  }

  pub fn len(&self) -> usize {
    self.providers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.providers.is_empty()
  }

  /// The first provider able to stage `file` in the given direction.
  pub fn find(&self, file: &File, direction: Direction) -> Option<&Arc<dyn Staging>> {
    let found = self.providers.iter().find(|provider| {
      debug!(
        provider = provider.name(),
        direction = %direction,
        url = file.url(),
        "checking staging provider"
      );
      match direction {
        Direction::In => provider.can_stage_in(file),
        Direction::Out => provider.can_stage_out(file),
      }
    });

    if found.is_none() {
      debug!(url = file.url(), direction = %direction, "reached end of staging provider list");
    }
    found
  }
}

impl FromIterator<Arc<dyn Staging>> for StagingRegistry {
  fn from_iter<I: IntoIterator<Item = Arc<dyn Staging>>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::providers::FileArgsStaging;

  #[test]
  fn test_standard_registry_order() {
    let registry = StagingRegistry::standard();
    let names: Vec<_> = registry.providers().iter().map(|p| p.name()).collect();
    assert_eq!(
      names,
      vec!["no_op", "ftp_separate_task", "http_separate_task"]
    );
  }

  #[test]
  fn test_find_by_direction() {
    let registry = StagingRegistry::standard();

    let ftp = File::new("ftp://host/a.txt").unwrap();
    assert_eq!(
      registry.find(&ftp, Direction::In).map(|p| p.name()),
      Some("ftp_separate_task")
    );
    assert!(registry.find(&ftp, Direction::Out).is_none());

    let https = File::new("https://host/a.txt").unwrap();
    assert_eq!(
      registry.find(&https, Direction::In).map(|p| p.name()),
      Some("http_separate_task")
    );

    let local = File::new("a.txt").unwrap();
    assert_eq!(
      registry.find(&local, Direction::Out).map(|p| p.name()),
      Some("no_op")
    );
  }

  #[test]
  fn test_first_match_wins() {
    let registry: StagingRegistry = vec![
      Arc::new(FileArgsStaging) as Arc<dyn Staging>,
      Arc::new(NoOpFileStaging),
    ]
    .into_iter()
    .collect();

    let local = File::new("a.txt").unwrap();
    assert_eq!(
      registry.find(&local, Direction::In).map(|p| p.name()),
      Some("file_args")
    );
  }

  #[test]
  fn test_unknown_scheme_matches_nothing() {
    let registry = StagingRegistry::standard();
    let file = File::new("globus://endpoint/a.txt").unwrap();
    assert!(registry.find(&file, Direction::In).is_none());
    assert!(StagingRegistry::new(vec![]).is_empty());
  }
}
