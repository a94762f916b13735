//! The Arbiter runtime: inbound message loop and background maintenance.
//!
//! The runtime owns a [`Pipeline`] and a [`ReplySink`]. Transports push
//! [`InboundMessage`]s into a channel; [`ArbiterRuntime::run`] handles each
//! one in its own task, so a slow lookup in one message never holds up the
//! next. A background task sweeps expired entries out of the dedup store.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use arbiter_runtime::ArbiterRuntime;
//!
//! let runtime = ArbiterRuntime::builder()
//!     .config_file("arbiter.toml")
//!     .router(router)
//!     .sink(irc_sink)
//!     .build()?;
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(64);
//! transport.forward_into(tx);
//! runtime.run(rx).await?;
//! ```

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::config::{ArbiterConfig, ConfigLoader, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use arbiter_core::{BoxedReporter, BoxedSink, InboundMessage, ReplySink};
use arbiter_framework::{DedupStore, Pipeline, Router};

/// Runs the message pipeline against a stream of inbound messages.
pub struct ArbiterRuntime {
    config: ArbiterConfig,
    pipeline: Pipeline,
    sink: BoxedSink,
    shutdown: CancellationToken,
    running: AtomicBool,
}

impl ArbiterRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Returns the configuration the runtime was built from.
    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    /// Returns the message pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns whether [`run`](Self::run) is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns a token that is cancelled when the runtime shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Asks a running [`run`](Self::run) loop to stop.
    ///
    /// Messages already being handled are finished; queued ones are not.
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown.cancel();
    }

    /// Handles one message inline and returns the number of lines sent.
    pub async fn handle(&self, message: InboundMessage) -> usize {
        self.pipeline.deliver(&message, self.sink.as_ref()).await
    }

    /// Handles inbound messages until the channel closes or
    /// [`shutdown`](Self::shutdown) is called.
    ///
    /// Each message runs in its own task. Before returning, `run` waits for
    /// every in-flight message and stops the dedup sweeper.
    pub async fn run(&self, mut inbound: mpsc::Receiver<InboundMessage>) -> RuntimeResult<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::AlreadyRunning);
        }

        info!("Arbiter runtime is now running");
        let sweeper_token = self.shutdown.child_token();
        let sweeper = self.spawn_sweeper(sweeper_token.clone());
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Stopping message loop");
                    break;
                }
                message = inbound.recv() => {
                    let Some(message) = message else {
                        info!("Inbound channel closed");
                        break;
                    };
                    let pipeline = self.pipeline.clone();
                    let sink = Arc::clone(&self.sink);
                    in_flight.spawn(async move {
                        pipeline.deliver(&message, sink.as_ref()).await
                    });
                }
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_message_task(done);
                }
            }
        }

        debug!(in_flight = in_flight.len(), "Waiting for in-flight messages");
        while let Some(done) = in_flight.join_next().await {
            log_message_task(done);
        }

        sweeper_token.cancel();
        if let Err(e) = sweeper.await {
            error!(error = %e, "Dedup sweeper task failed");
        }

        self.running.store(false, Ordering::Release);
        info!("Arbiter runtime stopped");
        Ok(())
    }

    fn spawn_sweeper(&self, token: CancellationToken) -> JoinHandle<()> {
        let store = Arc::clone(self.pipeline.store());
        let period = self.config.pipeline.sweep_interval();
        tokio::spawn(sweep_loop(store, period, token))
    }
}

impl std::fmt::Debug for ArbiterRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArbiterRuntime")
            .field("pipeline", &self.pipeline)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

async fn sweep_loop(store: Arc<DedupStore>, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let removed = store.sweep(Instant::now());
                trace!(removed, remaining = store.len(), "Dedup sweep");
            }
        }
    }
}

fn log_message_task(done: Result<usize, tokio::task::JoinError>) {
    match done {
        Ok(lines) => trace!(lines, "Message delivered"),
        Err(e) => error!(error = %e, "Message task failed"),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`ArbiterRuntime`].
///
/// Configuration comes from the [`ConfigLoader`] unless a ready
/// [`ArbiterConfig`] is supplied with [`config`](Self::config).
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<ArbiterConfig>,
    router: Router,
    sink: Option<BoxedSink>,
    reporter: Option<BoxedReporter>,
    store: Option<Arc<DedupStore>>,
    init_logging: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            config: None,
            router: Router::new(),
            sink: None,
            reporter: None,
            store: None,
            init_logging: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: ArbiterConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `config` as is, skipping file and environment loading.
    pub fn config(mut self, config: ArbiterConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the router.
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Sets the reply sink. Required.
    pub fn sink<S: ReplySink>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Sets the error reporter (defaults to logging through `tracing`).
    pub fn reporter(mut self, reporter: BoxedReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Shares an existing dedup store.
    pub fn store(mut self, store: Arc<DedupStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Whether `build` installs the global tracing subscriber (default: true).
    pub fn init_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    /// Loads and validates configuration, then builds the runtime.
    pub fn build(self) -> RuntimeResult<ArbiterRuntime> {
        let sink = self.sink.ok_or(RuntimeError::MissingSink)?;
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let mut pipeline = Pipeline::builder(self.router).settings(config.pipeline.to_settings());
        if let Some(reporter) = self.reporter {
            pipeline = pipeline.reporter(reporter);
        }
        if let Some(store) = self.store {
            pipeline = pipeline.store(store);
        }

        info!(
            log_level = %config.logging.level,
            line_width = config.pipeline.line_width,
            dedup_window_secs = config.pipeline.dedup_window_secs,
            "Runtime initialized from configuration"
        );

        Ok(ArbiterRuntime {
            pipeline: pipeline.build(),
            config,
            sink,
            shutdown: CancellationToken::new(),
            running: AtomicBool::new(false),
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use arbiter_core::{Destination, Resolution, SinkResult};
    use arbiter_framework::{FnResolver, Route, TableResolver};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().clone()
        }
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn send(&self, _destination: &Destination, line: &str) -> SinkResult<()> {
            self.lines.lock().push(line.to_string());
            Ok(())
        }
    }

    fn router() -> Router {
        let slow = FnResolver::new("slow", |q: String| async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(Resolution::Reply(format!("slow {q}")))
        });
        Router::new()
            .with(Route::new(slow).prefix("slow"))
            .fallback(Route::new(
                TableResolver::new("cards")
                    .entry("fog", "Fog {G}")
                    .entry("bolt", "Lightning Bolt {R}"),
            ))
    }

    fn runtime(sink: Arc<RecordingSink>) -> ArbiterRuntime {
        let mut config = ArbiterConfig::default();
        config.pipeline.address_replies = false;
        ArbiterRuntime::builder()
            .config(config)
            .router(router())
            .sink(sink)
            .init_logging(false)
            .build()
            .unwrap()
    }

    fn channel(text: &str) -> InboundMessage {
        InboundMessage::new(Destination::channel("#mtg"), "alice", text)
    }

    #[tokio::test]
    async fn test_handle_delivers_inline() {
        let sink = Arc::new(RecordingSink::default());
        let runtime = runtime(Arc::clone(&sink));
        assert_eq!(runtime.handle(channel("!fog !bolt")).await, 2);
        assert_eq!(sink.lines(), vec!["Fog {G}", "Lightning Bolt {R}"]);
    }

    #[tokio::test]
    async fn test_run_drains_until_channel_closes() {
        let sink = Arc::new(RecordingSink::default());
        let runtime = runtime(Arc::clone(&sink));
        let (tx, rx) = mpsc::channel(8);

        tx.send(channel("!fog")).await.unwrap();
        tx.send(channel("[[bolt]]")).await.unwrap();
        drop(tx);

        runtime.run(rx).await.unwrap();
        let mut lines = sink.lines();
        lines.sort();
        assert_eq!(lines, vec!["Fog {G}", "Lightning Bolt {R}"]);
        assert!(!runtime.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_message_does_not_block_others() {
        let sink = Arc::new(RecordingSink::default());
        let runtime = Arc::new(runtime(Arc::clone(&sink)));
        let (tx, rx) = mpsc::channel(8);

        let task = tokio::spawn({
            let runtime = Arc::clone(&runtime);
            async move { runtime.run(rx).await }
        });

        tx.send(channel("!slow lookup")).await.unwrap();
        tx.send(channel("!fog")).await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.lines(), vec!["Fog {G}"]);

        drop(tx);
        task.await.unwrap().unwrap();
        assert_eq!(sink.lines(), vec!["Fog {G}", "slow lookup"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_clears_expired_entries() {
        let sink = Arc::new(RecordingSink::default());
        let runtime = Arc::new(runtime(sink));
        let (tx, rx) = mpsc::channel(8);

        let task = tokio::spawn({
            let runtime = Arc::clone(&runtime);
            async move { runtime.run(rx).await }
        });

        tx.send(channel("!fog")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(runtime.pipeline().store().len(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(runtime.pipeline().store().is_empty());

        runtime.shutdown();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_run_and_rejects_second_run() {
        let runtime = Arc::new(runtime(Arc::new(RecordingSink::default())));
        let (_tx, rx) = mpsc::channel(8);

        let task = tokio::spawn({
            let runtime = Arc::clone(&runtime);
            async move { runtime.run(rx).await }
        });
        while !runtime.is_running() {
            tokio::task::yield_now().await;
        }

        let (_tx2, rx2) = mpsc::channel(1);
        assert!(matches!(
            runtime.run(rx2).await,
            Err(RuntimeError::AlreadyRunning)
        ));

        runtime.shutdown();
        task.await.unwrap().unwrap();
        assert!(runtime.shutdown_token().is_cancelled());
    }

    #[test]
    fn test_build_requires_sink() {
        let result = ArbiterRuntime::builder()
            .config(ArbiterConfig::default())
            .init_logging(false)
            .build();
        assert!(matches!(result, Err(RuntimeError::MissingSink)));
    }

    #[test]
    fn test_build_validates_config() {
        let mut config = ArbiterConfig::default();
        config.pipeline.line_width = 0;
        let result = ArbiterRuntime::builder()
            .config(config)
            .sink(RecordingSink::default())
            .init_logging(false)
            .build();
        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::InvalidValue { .. }))
        ));
    }
}
