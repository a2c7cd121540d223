mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};

use ferry_artifact::File;
use ferry_config::Config;
use ferry_dataflow::{Arg, TaskRequest, app_fn};
use ferry_kernel::DataFlowKernel;

/// Ferry - stages task data between storage locations and executors
#[derive(Parser)]
#[command(name = "ferry")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the configuration file (default: ~/.ferry/config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Also log provider selection and transfer details
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Stage artifacts in for a task and print where they landed
  Stage {
    /// Executor to stage for (default: the first configured executor)
    #[arg(long)]
    executor: Option<String>,

    /// Artifact locations (local paths, file://, ftp://, http://, https://)
    #[arg(required = true)]
    urls: Vec<String>,
  },

  /// Show the staging providers that apply to an executor
  Providers {
    /// Executor to inspect (default: the first configured executor)
    #[arg(long)]
    executor: Option<String>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::init_logging(cli.verbose);

  let config = load_config(cli.config)?;

  match cli.command {
    Some(Commands::Stage { executor, urls }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { stage(&config, executor, urls).await })?;
    }
    Some(Commands::Providers { executor }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { providers(&config, executor) })?;
    }
    None => {
      println!("ferry - use --help to see available commands");
    }
  }

  Ok(())
}

/// The explicit config file, else `~/.ferry/config.json` if present, else the
/// built-in single-executor configuration.
fn load_config(path: Option<PathBuf>) -> Result<Config> {
  let path = match path {
    Some(path) => path,
    None => {
      let default_path = dirs::home_dir().map(|home| home.join(".ferry").join("config.json"));
      match default_path {
        Some(path) if path.exists() => path,
        _ => {
          debug!("no config file, using built-in configuration");
          return Ok(Config::default());
        }
      }
    }
  };

  let content = std::fs::read_to_string(&path)
    .with_context(|| format!("failed to read config file: {}", path.display()))?;
  let config = Config::from_json(&content)
    .with_context(|| format!("failed to parse config file: {}", path.display()))?;

  info!(path = %path.display(), executors = config.executors.len(), "loaded config");
  Ok(config)
}

fn executor_label(config: &Config, executor: Option<String>) -> Result<String> {
  match executor {
    Some(label) => Ok(label),
    None => config
      .executors
      .first()
      .map(|e| e.label.clone())
      .context("configuration defines no executors"),
  }
}

async fn stage(config: &Config, executor: Option<String>, urls: Vec<String>) -> Result<()> {
  let executor = executor_label(config, executor)?;
  let kernel = DataFlowKernel::from_config(config).context("failed to set up executors")?;

  let files = urls
    .iter()
    .map(|url| File::new(url.as_str()).map(Arc::new))
    .collect::<Result<Vec<_>, _>>()?;

  // A task that only reports the paths its artifacts resolved to.
  let locate = app_fn("locate", |call| {
    let paths: Vec<String> = call
      .files()
      .map(|f| f.filepath().display().to_string())
      .collect();
    Ok(json!(paths))
  });

  let request = TaskRequest::new(executor.clone(), locate)
    .args(files.iter().cloned().map(Arg::File));
  let future = kernel
    .submit(request)
    .with_context(|| format!("failed to stage for executor '{}'", executor))?;

  let outcome = future.result().await;
  kernel.wait_for_current_tasks().await;

  let staged: Vec<_> = files
    .iter()
    .map(|file| {
      json!({
        "url": file.url(),
        "scheme": file.scheme(),
        "local_path": file.local_path().map(|p| p.display().to_string()),
        "filepath": file.filepath().display().to_string(),
      })
    })
    .collect();

  let report = json!({
    "executor": executor,
    "files": staged,
    "result": outcome.as_ref().ok(),
    "error": outcome.as_ref().err().map(|e| e.to_string()),
    "tasks": kernel.tasks(),
  });
  println!("{}", serde_json::to_string_pretty(&report)?);

  if let Err(e) = outcome {
    bail!("staging task failed: {}", e);
  }
  Ok(())
}

fn providers(config: &Config, executor: Option<String>) -> Result<()> {
  let label = executor_label(config, executor)?;
  let kernel = DataFlowKernel::from_config(config).context("failed to set up executors")?;
  let dm = kernel.data_manager();

  let executor = dm.executor(&label)?;
  let registry = dm.storage_access(&label)?;
  let names: Vec<&str> = registry.providers().iter().map(|p| p.name()).collect();

  let report = json!({
    "executor": label,
    "working_dir": executor.working_dir().map(|p| p.display().to_string()),
    "override": executor.storage_access().is_some(),
    "providers": names,
  });
  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}
