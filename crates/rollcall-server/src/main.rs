//! Rollcall server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! configured record store and serves the attendance API over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use rollcall_core::memory::MemoryStore;
use rollcall_server::{Backend, ServerConfig, serve};
use rollcall_store_json::JsonStore;
use rollcall_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rollcall attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = ServerConfig::load(&cli.config)?;
  let store_path = config.resolved_store_path();

  tracing::info!(backend = %config.backend, "opening record store");
  match config.backend {
    Backend::Sqlite => {
      if let Some(parent) = store_path.parent()
        && !parent.as_os_str().is_empty()
      {
        std::fs::create_dir_all(parent)
          .with_context(|| format!("failed to create {parent:?}"))?;
      }
      let store = SqliteStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open store at {store_path:?}"))?;
      serve(store, &config).await
    }
    Backend::Json => {
      let store = JsonStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open store at {store_path:?}"))?;
      serve(store, &config).await
    }
    Backend::Memory => {
      tracing::warn!("memory backend: data is lost on shutdown");
      serve(MemoryStore::new(), &config).await
    }
  }
}
