use crate::service::LinkService;
use anyhow::{bail, Context};
use lnk_clipper::{ClipperConfig, HttpClipper};
use lnk_core::{Clipper, Storage};
use lnk_storage::{MemoryStorage, RedisStorage};
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_REDIS_HOST: &str = "localhost";
const DEFAULT_REDIS_PORT: u16 = 6379;

/// Which [`Storage`] implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Redis,
    Memory,
}

impl StorageBackend {
    fn from_name(name: &str) -> anyhow::Result<Self> {
        match name {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

/// Process configuration, loaded from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StorageBackend,
    pub redis_host: String,
    pub redis_port: u16,
    /// Clipping endpoint; empty disables clipping.
    pub clipper_url: String,
    /// Clipping service token; empty disables clipping.
    pub clipper_token: String,
}

impl Config {
    /// Loads configuration from environment variables. Every variable
    /// has a default; only a malformed value is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(name) => StorageBackend::from_name(&name)?,
            Err(_) => StorageBackend::Redis,
        };

        let redis_port = match std::env::var("REDIS_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .context("REDIS_PORT must be a valid port number")?,
            Err(_) => DEFAULT_REDIS_PORT,
        };

        Ok(Self {
            backend,
            redis_host: std::env::var("REDIS_HOST").unwrap_or_else(|_| DEFAULT_REDIS_HOST.into()),
            redis_port,
            clipper_url: std::env::var("CLIPPER_URL").unwrap_or_default(),
            clipper_token: std::env::var("CLIPPER_TOKEN").unwrap_or_default(),
        })
    }

    /// An in-memory configuration for tests and local experiments.
    pub fn in_memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            redis_host: DEFAULT_REDIS_HOST.into(),
            redis_port: DEFAULT_REDIS_PORT,
            clipper_url: String::new(),
            clipper_token: String::new(),
        }
    }
}

/// The assembled service plus the resources it owns.
///
/// The embedding HTTP layer calls [`App::start`] at boot and
/// [`App::shutdown`] at teardown; everything in between goes through
/// [`App::service`].
pub struct App {
    service: LinkService,
    storage: Arc<dyn Storage>,
    clipper: Arc<dyn Clipper>,
}

impl App {
    /// Builds the configured backend and clipper and wires up the
    /// service. An unreachable storage backend is fatal here, before
    /// any request is accepted.
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let storage: Arc<dyn Storage> = match config.backend {
            StorageBackend::Redis => Arc::new(
                RedisStorage::connect(&config.redis_host, config.redis_port).await?,
            ),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        };

        if !storage.ping().await.context("cannot ping storage")? {
            bail!("cannot ping storage");
        }
        debug!("storage initialized");

        let clipper = Arc::new(HttpClipper::new(
            ClipperConfig::builder()
                .endpoint(config.clipper_url)
                .token(config.clipper_token)
                .build(),
        )?);
        debug!(enabled = clipper.is_enabled(), "clipper initialized");

        info!(backend = ?config.backend, "lnk service started");

        let service = LinkService::new(Arc::clone(&storage), clipper.clone());

        Ok(Self {
            service,
            storage,
            clipper,
        })
    }

    pub fn service(&self) -> &LinkService {
        &self.service
    }

    /// Releases the storage connection and the clipper session.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.storage.close().await?;
        self.clipper.close().await;

        debug!("lnk service stopped");

        Ok(())
    }
}
