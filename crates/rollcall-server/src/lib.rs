//! HTTP server assembly for Rollcall.
//!
//! Loads [`ServerConfig`], wraps the API router in CORS and request tracing,
//! and serves it over any [`RecordStore`] backend.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{
  Router,
  http::{HeaderValue, Method, header::CONTENT_TYPE},
};
use rollcall_api::{AppState, DEFAULT_UPLOAD_LIMIT, Settings};
use rollcall_core::{day::DayBoundary, import::IdScheme, store::RecordStore};
use rollcall_qr::QrGenerator;
use serde::Deserialize;
use strum::Display;
use tokio::net::TcpListener;
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};
use tracing::info;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which [`RecordStore`] implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
  #[default]
  Sqlite,
  Json,
  Memory,
}

impl Backend {
  fn default_store_path(self) -> &'static str {
    match self {
      Backend::Sqlite => "rollcall.db",
      Backend::Json | Backend::Memory => "rollcall-data",
    }
  }
}

/// Runtime server configuration, read once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// Origin allowed by CORS; any origin when unset.
  pub allowed_origin:     Option<String>,
  pub backend:            Backend,
  /// SQLite database file, or the data directory for the JSON backend.
  /// Defaults per backend when unset.
  pub store_path:         Option<PathBuf>,
  pub id_scheme:          IdScheme,
  pub day_boundary:       DayBoundary,
  pub qr_size:            u32,
  pub upload_limit_bytes: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "0.0.0.0".to_string(),
      port:               5000,
      allowed_origin:     None,
      backend:            Backend::default(),
      store_path:         None,
      id_scheme:          IdScheme::default(),
      day_boundary:       DayBoundary::default(),
      qr_size:            rollcall_qr::DEFAULT_SIZE,
      upload_limit_bytes: DEFAULT_UPLOAD_LIMIT,
    }
  }
}

impl ServerConfig {
  /// Layer `ROLLCALL_*` environment variables over the optional TOML file at
  /// `path`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ROLLCALL"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path`, or the backend's default, with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf {
    match &self.store_path {
      Some(path) => expand_tilde(path),
      None => PathBuf::from(self.backend.default_store_path()),
    }
  }

  fn settings(&self) -> Settings {
    Settings {
      id_scheme:    self.id_scheme,
      day_boundary: self.day_boundary,
      upload_limit: self.upload_limit_bytes,
    }
  }
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

// ─── Router ───────────────────────────────────────────────────────────────────

fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
  let cors = CorsLayer::new()
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
    .allow_headers([CONTENT_TYPE]);

  Ok(match allowed_origin {
    Some(origin) => {
      let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("invalid allowed_origin {origin:?}"))?;
      cors
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
    }
    None => cors.allow_origin(Any),
  })
}

/// Build the full application router: the API under `/api`, with CORS and
/// request tracing.
pub fn app<S>(store: S, config: &ServerConfig) -> anyhow::Result<Router>
where
  S: RecordStore + 'static,
{
  let state = AppState {
    store:     Arc::new(store),
    generator: Arc::new(QrGenerator::new(config.qr_size)),
    settings:  config.settings(),
  };

  Ok(
    Router::new()
      .nest("/api", rollcall_api::api_router(state))
      .layer(cors_layer(config.allowed_origin.as_deref())?)
      .layer(TraceLayer::new_for_http()),
  )
}

/// Bind and serve until Ctrl-C.
pub async fn serve<S>(store: S, config: &ServerConfig) -> anyhow::Result<()>
where
  S: RecordStore + 'static,
{
  let app = app(store, config)?;
  let address = config.address();

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  info!("Listening on http://{address}");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  info!("Server shut down");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("failed to listen for shutdown signal: {e}");
    std::future::pending::<()>().await;
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use rollcall_core::memory::MemoryStore;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ServerConfig::load(&dir.path().join("missing.toml")).unwrap();
    assert_eq!(cfg.port, 5000);
    assert_eq!(cfg.backend, Backend::Sqlite);
    assert_eq!(cfg.id_scheme, IdScheme::Distinct);
    assert_eq!(cfg.day_boundary, DayBoundary::Local);
    assert!(cfg.allowed_origin.is_none());
    assert_eq!(cfg.resolved_store_path(), PathBuf::from("rollcall.db"));
  }

  #[test]
  fn store_path_defaults_follow_backend() {
    let json = ServerConfig { backend: Backend::Json, ..ServerConfig::default() };
    assert_eq!(json.resolved_store_path(), PathBuf::from("rollcall-data"));

    let sqlite = ServerConfig::default();
    assert_eq!(sqlite.resolved_store_path(), PathBuf::from("rollcall.db"));
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollcall.toml");
    std::fs::write(
      &path,
      "port = 8080\nbackend = \"json\"\nstore_path = \"data\"\n\
       id_scheme = \"unified\"\nday_boundary = \"utc\"\n\
       allowed_origin = \"http://localhost:5173\"\n",
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.address(), "0.0.0.0:8080");
    assert_eq!(cfg.backend, Backend::Json);
    assert_eq!(cfg.resolved_store_path(), PathBuf::from("data"));
    assert_eq!(cfg.id_scheme, IdScheme::Unified);
    assert_eq!(cfg.day_boundary, DayBoundary::Utc);
    assert_eq!(cfg.allowed_origin.as_deref(), Some("http://localhost:5173"));
  }

  #[test]
  fn environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollcall.toml");
    std::fs::write(&path, "qr_size = 200\nupload_limit_bytes = 1024\n").unwrap();

    // Tests share the process environment; no other test reads this key.
    unsafe {
      std::env::set_var("ROLLCALL_QR_SIZE", "120");
    }
    let cfg = ServerConfig::load(&path);
    unsafe {
      std::env::remove_var("ROLLCALL_QR_SIZE");
    }

    let cfg = cfg.unwrap();
    assert_eq!(cfg.qr_size, 120);
    assert_eq!(cfg.upload_limit_bytes, 1024);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let cfg = ServerConfig {
      store_path: Some(PathBuf::from("~/rollcall/db.sqlite")),
      ..ServerConfig::default()
    };
    assert_eq!(
      cfg.resolved_store_path(),
      PathBuf::from(home).join("rollcall/db.sqlite")
    );
  }

  #[test]
  fn bad_origin_is_rejected() {
    assert!(cors_layer(Some("bad\norigin")).is_err());
  }

  #[tokio::test]
  async fn api_is_mounted_with_cors() {
    let cfg = ServerConfig {
      allowed_origin: Some("http://localhost:5173".into()),
      ..ServerConfig::default()
    };
    let app = app(MemoryStore::new(), &cfg).unwrap();

    let req = Request::builder()
      .uri("/api/stats")
      .header(header::ORIGIN, "http://localhost:5173")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
      "http://localhost:5173"
    );
  }

  #[tokio::test]
  async fn unknown_paths_are_404() {
    let app = app(MemoryStore::new(), &ServerConfig::default()).unwrap();
    let req = Request::builder().uri("/stats").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
