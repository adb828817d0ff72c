//! The main Collector type wiring discovery, scraping and queries together.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::directory::Directory;
use crate::error::{CollectorError, RegistryError};
use crate::handler::StatsHandler;
use crate::registry::Registry;
use crate::scraper::{Scraper, TickReport};
use crate::state::PublishedState;

/// How far back a history read reaches by default.
const HISTORY_SPAN: Duration = Duration::from_secs(3600);

/// Timing and retention settings for a [`Collector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Time between scrape ticks.
    pub scrape_interval: Duration,
    /// Time between directory refreshes.
    pub refresh_interval: Duration,
    /// Deadline for each individual node call.
    pub call_timeout: Duration,
    /// Number of ticks the history ring retains.
    pub window: usize,
    /// Most ticks a history read returns. Defaults to one hour of ticks.
    pub max_window: Option<usize>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            scrape_interval: Duration::from_secs(1),
            refresh_interval: Duration::from_secs(10),
            call_timeout: Duration::from_secs(2),
            window: 3600,
            max_window: None,
        }
    }
}

impl CollectorConfig {
    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), CollectorError> {
        if self.scrape_interval.is_zero() {
            return Err(CollectorError::Config("scrape interval must be non-zero".into()));
        }
        if self.refresh_interval.is_zero() {
            return Err(CollectorError::Config("refresh interval must be non-zero".into()));
        }
        if self.call_timeout.is_zero() {
            return Err(CollectorError::Config("call timeout must be non-zero".into()));
        }
        if self.window == 0 {
            return Err(CollectorError::Config("history window must hold at least one tick".into()));
        }
        if self.max_window == Some(0) {
            return Err(CollectorError::Config("max window must be at least one tick".into()));
        }
        Ok(())
    }

    /// Ticks returned by a history read: the explicit `max_window`, or one
    /// hour's worth at the scrape interval.
    pub fn effective_max_window(&self) -> usize {
        self.max_window.unwrap_or_else(|| {
            let per_tick = self.scrape_interval.as_millis().max(1);
            let ticks = HISTORY_SPAN.as_millis().div_ceil(per_tick);
            usize::try_from(ticks).unwrap_or(usize::MAX).max(1)
        })
    }
}

/// Discovers service nodes, scrapes their stats and serves queries.
///
/// Building a collector performs one directory scan; if that fails the
/// collector is not created. [`Collector::start`] then spawns the refresh
/// and scrape loops.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use statswatch_collector::{Client, Collector, MemoryRegistry};
/// # async fn run(client: Arc<dyn Client>) -> Result<(), Box<dyn std::error::Error>> {
/// let collector = Collector::builder()
///     .registry(Arc::new(MemoryRegistry::new()))
///     .client(client)
///     .build()
///     .await?;
///
/// let handle = collector.start();
/// let handler = collector.handler();
///
/// // ... serve handler.read(..) requests ...
///
/// handle.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Collector {
    registry: Arc<dyn Registry>,
    directory: Arc<Directory>,
    state: Arc<PublishedState>,
    scraper: Scraper,
    handler: StatsHandler,
    config: CollectorConfig,
}

impl Collector {
    /// Create a builder for configuring the collector.
    pub fn builder() -> CollectorBuilder {
        CollectorBuilder::new()
    }

    /// The query handler, sharing this collector's published state.
    pub fn handler(&self) -> StatsHandler {
        self.handler.clone()
    }

    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    pub fn state(&self) -> &Arc<PublishedState> {
        &self.state
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Run a single scrape tick immediately.
    pub async fn scrape_now(&self) -> TickReport {
        self.scraper.tick().await
    }

    /// Rescan the registry immediately.
    pub async fn refresh_now(&self) -> Result<usize, RegistryError> {
        self.directory.refresh(self.registry.as_ref()).await
    }

    /// Start the background refresh and scrape loops.
    ///
    /// The first scrape happens right away; the first refresh after one
    /// refresh interval, since building already scanned once. Dropping the
    /// returned handle also stops both loops.
    pub fn start(&self) -> CollectorHandle {
        let (stop_tx, stop_rx) = watch::channel(false);

        let scrape = tokio::spawn(scrape_loop(
            self.scraper.clone(),
            self.config.scrape_interval,
            stop_rx.clone(),
        ));
        let refresh = tokio::spawn(refresh_loop(
            self.registry.clone(),
            self.directory.clone(),
            self.config.refresh_interval,
            stop_rx,
        ));

        info!(
            scrape_interval = ?self.config.scrape_interval,
            refresh_interval = ?self.config.refresh_interval,
            "collector started"
        );

        CollectorHandle {
            stop_tx,
            tasks: vec![scrape, refresh],
        }
    }
}

async fn scrape_loop(scraper: Scraper, interval: Duration, mut stop_rx: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *stop_rx.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                // An in-flight tick always runs to completion.
                scraper.tick().await;
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    debug!("scrape loop stopped");
}

async fn refresh_loop(
    registry: Arc<dyn Registry>,
    directory: Arc<Directory>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *stop_rx.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = directory.refresh(registry.as_ref()).await {
                    warn!(error = %e, "directory refresh failed, keeping previous directory");
                }
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    debug!("refresh loop stopped");
}

/// Builder for configuring a Collector.
#[derive(Debug, Default)]
pub struct CollectorBuilder {
    registry: Option<Arc<dyn Registry>>,
    client: Option<Arc<dyn Client>>,
    config: CollectorConfig,
}

impl CollectorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the registry used for discovery.
    pub fn registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the client used to call nodes.
    pub fn client(mut self, client: Arc<dyn Client>) -> Self {
        self.client = Some(client);
        self
    }

    /// Replace all timing and retention settings.
    pub fn config(mut self, config: CollectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the scrape interval (default: 1 second).
    pub fn scrape_interval(mut self, interval: Duration) -> Self {
        self.config.scrape_interval = interval;
        self
    }

    /// Set the directory refresh interval (default: 10 seconds).
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.config.refresh_interval = interval;
        self
    }

    /// Set the per-call timeout (default: 2 seconds).
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    /// Set how many ticks of history are retained (default: 3600).
    pub fn window(mut self, window: usize) -> Self {
        self.config.window = window;
        self
    }

    /// Set how many ticks a history read returns (default: one hour's worth).
    pub fn max_window(mut self, max_window: usize) -> Self {
        self.config.max_window = Some(max_window);
        self
    }

    /// Build the collector, performing the initial directory scan.
    pub async fn build(self) -> Result<Collector, CollectorError> {
        self.config.validate()?;
        let registry = self.registry.ok_or(CollectorError::Missing("registry"))?;
        let client = self.client.ok_or(CollectorError::Missing("client"))?;

        let directory = Arc::new(Directory::new());
        let services = directory
            .refresh(registry.as_ref())
            .await
            .map_err(CollectorError::InitialScan)?;
        info!(services, "initial directory scan complete");

        let state = Arc::new(PublishedState::new(self.config.window));
        let scraper = Scraper::new(
            directory.clone(),
            client,
            state.clone(),
            self.config.call_timeout,
        );
        let handler = StatsHandler::new(state.clone(), self.config.effective_max_window());

        Ok(Collector {
            registry,
            directory,
            state,
            scraper,
            handler,
            config: self.config,
        })
    }
}

/// Handle for controlling the background loops.
///
/// Drop this handle to stop the loops, or call [`shutdown`](Self::shutdown)
/// to stop them and wait until they have exited.
#[derive(Debug)]
pub struct CollectorHandle {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl CollectorHandle {
    /// Signal both loops to stop without waiting.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Signal both loops to stop and wait for them, including any scrape
    /// tick still in flight.
    pub async fn shutdown(mut self) {
        self.stop();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "collector task ended abnormally");
            }
        }
        info!("collector stopped");
    }
}
