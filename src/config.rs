//! Layered service configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, `STATSWATCH_*` environment variables and command-line flags.
//!
//! ```toml
//! scrape_interval = "1s"
//! refresh_interval = "10s"
//! call_timeout = "2s"
//! window = 3600
//! listen = "127.0.0.1:8089"
//! registry_file = "services.json"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use statswatch_collector::CollectorConfig;

use crate::duration::parse_duration;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "STATSWATCH";

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8089";

/// Where the collector discovers services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// A JSON file listing services and nodes.
    File(PathBuf),
    /// A registry HTTP API endpoint.
    Http(String),
}

/// Fully resolved settings for the `serve` command.
#[derive(Debug, Clone)]
pub struct Settings {
    pub collector: CollectorConfig,
    pub listen: SocketAddr,
    pub registry: RegistrySource,
}

/// Values supplied on the command line, applied over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub scrape_interval: Option<String>,
    pub refresh_interval: Option<String>,
    pub call_timeout: Option<String>,
    pub window: Option<u32>,
    pub listen: Option<String>,
    pub registry_file: Option<PathBuf>,
    pub registry_url: Option<String>,
}

/// The settings as read from config sources, before validation.
#[derive(Debug, Deserialize)]
struct RawSettings {
    scrape_interval: String,
    refresh_interval: String,
    call_timeout: String,
    window: usize,
    max_window: Option<usize>,
    listen: String,
    registry_file: Option<PathBuf>,
    registry_url: Option<String>,
}

impl Settings {
    /// Load settings from an optional config file, the environment and
    /// command-line overrides.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("scrape_interval", "1s")?
            .set_default("refresh_interval", "10s")?
            .set_default("call_timeout", "2s")?
            .set_default("window", 3600_i64)?
            .set_default("listen", DEFAULT_LISTEN)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .set_override_option("scrape_interval", overrides.scrape_interval.clone())?
            .set_override_option("refresh_interval", overrides.refresh_interval.clone())?
            .set_override_option("call_timeout", overrides.call_timeout.clone())?
            .set_override_option("window", overrides.window.map(i64::from))?
            .set_override_option("listen", overrides.listen.clone())?
            .set_override_option(
                "registry_file",
                overrides
                    .registry_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .set_override_option("registry_url", overrides.registry_url.clone())?
            .build()
            .context("failed to load configuration")?;

        let raw: RawSettings = config
            .try_deserialize()
            .context("invalid configuration")?;
        raw.resolve()
    }
}

impl RawSettings {
    fn resolve(self) -> Result<Settings> {
        let collector = CollectorConfig {
            scrape_interval: parse_duration(&self.scrape_interval)
                .context("invalid scrape_interval")?,
            refresh_interval: parse_duration(&self.refresh_interval)
                .context("invalid refresh_interval")?,
            call_timeout: parse_duration(&self.call_timeout).context("invalid call_timeout")?,
            window: self.window,
            max_window: self.max_window,
        };
        collector.validate()?;

        let listen: SocketAddr = self
            .listen
            .parse()
            .with_context(|| format!("invalid listen address: {}", self.listen))?;

        let registry = match (self.registry_file, self.registry_url) {
            (Some(path), None) => RegistrySource::File(path),
            (None, Some(url)) => RegistrySource::Http(url),
            (Some(_), Some(_)) => bail!("configure either registry_file or registry_url, not both"),
            (None, None) => bail!("no registry configured: set registry_file or registry_url"),
        };

        Ok(Settings {
            collector,
            listen,
            registry,
        })
    }
}
