//! Building staging providers from configuration.

use std::sync::Arc;

use ferry_config::StagingDef;
use ferry_staging::{
  FileArgsStaging, InTaskStaging, NoOpFileStaging, SeparateTaskStaging, Staging, StagingRegistry,
};

/// The provider a configuration entry names.
pub fn provider_for(def: StagingDef) -> Arc<dyn Staging> {
  match def {
    StagingDef::NoOp => Arc::new(NoOpFileStaging),
    StagingDef::FileArgs => Arc::new(FileArgsStaging),
    StagingDef::FtpSeparateTask => Arc::new(SeparateTaskStaging::ftp()),
    StagingDef::HttpSeparateTask => Arc::new(SeparateTaskStaging::http()),
    StagingDef::FtpInTask => Arc::new(InTaskStaging::ftp()),
    StagingDef::HttpInTask => Arc::new(InTaskStaging::http()),
  }
}

/// A registry with one provider per entry, in configuration order.
pub fn registry_from_defs(defs: &[StagingDef]) -> StagingRegistry {
  defs.iter().copied().map(provider_for).collect()
}
