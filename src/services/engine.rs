//! Wires the scanner, watcher and click routing together for one page.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::{HostError, RelevanceError};
use crate::domain::models::{Config, IndicatorId, WatcherConfig};
use crate::domain::ports::{FailureSink, FeedHost, RelevanceStore};
use crate::infrastructure::relevance::HttpRelevanceClient;

use super::feed_scanner::{FeedScanner, ScanReport};
use super::indicator_controller::{IndicatorRegistry, SyncContext};
use super::mutation_watcher::MutationWatcher;

/// Entry point run once per page load.
pub struct RelevanceEngine {
    ctx: SyncContext,
    config: WatcherConfig,
}

impl RelevanceEngine {
    pub fn new(
        host: Arc<dyn FeedHost>,
        store: Arc<dyn RelevanceStore>,
        failures: Arc<dyn FailureSink>,
        config: WatcherConfig,
    ) -> Self {
        Self {
            ctx: SyncContext::new(host, store, failures),
            config,
        }
    }

    /// Build an engine talking HTTP to the relevance service.
    ///
    /// Without an explicit `remote.base_url` the service is reached under the host
    /// page's origin.
    pub fn from_config(
        host: Arc<dyn FeedHost>,
        failures: Arc<dyn FailureSink>,
        config: &Config,
    ) -> Result<Self, RelevanceError> {
        let origin = host.page_origin();
        let store = HttpRelevanceClient::with_config(&config.remote, origin.as_deref())?;
        info!(base_url = %store.base_url(), "relevance service resolved");
        Ok(Self::new(
            host,
            Arc::new(store),
            failures,
            config.watcher.clone(),
        ))
    }

    /// Observe the feed container, scan what is already there and start routing
    /// clicks and submission signals.
    ///
    /// Host signals are subscribed before the first scan so no click on a freshly
    /// attached indicator can be missed.
    pub async fn start(self) -> Result<EngineHandle, HostError> {
        let clicks = self.ctx.host.indicator_clicks();
        let submissions = self.ctx.host.activity_submissions();

        let registry = Arc::new(IndicatorRegistry::new());
        let scanner = Arc::new(FeedScanner::new(self.ctx, Arc::clone(&registry)));
        let watcher = Arc::new(MutationWatcher::new(Arc::clone(&scanner), self.config));

        let container = watcher.attach()?;
        let initial_scan = scanner.scan(container).await;
        info!(
            container = %container,
            attached = initial_scan.attached,
            "relevance engine started"
        );

        let cancel = CancellationToken::new();
        let tasks = vec![
            watcher.listen_for_submissions(submissions, cancel.clone()),
            spawn_click_router(Arc::clone(&registry), clicks, cancel.clone()),
        ];

        Ok(EngineHandle {
            registry,
            scanner,
            watcher,
            initial_scan,
            cancel,
            tasks,
        })
    }
}

fn spawn_click_router(
    registry: Arc<IndicatorRegistry>,
    mut clicks: broadcast::Receiver<IndicatorId>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                click = clicks.recv() => match click {
                    Ok(indicator) => {
                        registry.click(indicator);
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "indicator clicks dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        debug!("click router stopped");
    })
}

/// Running engine. Dropping it without [`EngineHandle::stop`] leaves the
/// background tasks running until the host closes its signal channels.
pub struct EngineHandle {
    registry: Arc<IndicatorRegistry>,
    scanner: Arc<FeedScanner>,
    watcher: Arc<MutationWatcher>,
    initial_scan: ScanReport,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl EngineHandle {
    pub const fn registry(&self) -> &Arc<IndicatorRegistry> {
        &self.registry
    }

    pub const fn scanner(&self) -> &Arc<FeedScanner> {
        &self.scanner
    }

    pub const fn watcher(&self) -> &Arc<MutationWatcher> {
        &self.watcher
    }

    /// Tally of the scan run by [`RelevanceEngine::start`].
    pub const fn initial_scan(&self) -> ScanReport {
        self.initial_scan
    }

    /// Stop routing signals and end the observation session.
    ///
    /// A re-attach still pending from a submission is abandoned.
    pub async fn stop(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "engine task ended abnormally");
            }
        }
        // Detached last so no listener can open a session afterwards.
        self.watcher.detach();
        info!("relevance engine stopped");
    }
}
