//! cascade server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) overlaid with
//! `CASCADE__<SECTION>__<KEY>` environment variables, opens the SQLite store,
//! and serves the parameter RPC methods over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use cascade_server::{ServerConfig, auth::TokenVerifier};
use cascade_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Cascade hierarchical parameter store")]
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("CASCADE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let verifier = TokenVerifier::from_config(&cfg.auth).context("failed to load auth key")?;

  let store = if cfg.store.is_in_memory() {
    SqliteStore::open_in_memory().await.context("failed to open in-memory store")?
  } else {
    let path = expand_tilde(&cfg.store.path);
    SqliteStore::open(&path)
      .await
      .with_context(|| format!("failed to open store at {path:?}"))?
  };

  let service = cascade_server::service(store, &cfg.cache);
  let app = cascade_server::app(
    Arc::new(service),
    Arc::new(verifier),
    cfg.server.request_timeout(),
  );

  let address = cfg.server.address();
  tracing::info!(
    cache = cfg.cache.enabled,
    store = %cfg.store.path.display(),
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
