//! Observes the feed container and triggers scans on new activity blocks.
//!
//! Posting the first activity into an empty stream makes the portal replace the
//! container element instead of inserting into it, so the watcher also listens for
//! the host's "activity submitted" signal and re-attaches to whatever container is
//! present once the host has had time to re-render.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn, Instrument};

use crate::domain::errors::HostError;
use crate::domain::models::{MutationBatch, NodeId, SessionId, WatcherConfig};
use crate::domain::ports::SyncFailure;

use super::feed_scanner::{FeedScanner, ScanReport};

/// Live binding between the watcher and one container element.
struct ObservationSession {
    id: SessionId,
    container: NodeId,
    cancel: CancellationToken,
}

impl ObservationSession {
    /// Stops the observation loop. Scans it already started run to completion.
    fn teardown(self) {
        self.cancel.cancel();
        debug!(session = %self.id, container = %self.container, "observation session closed");
    }
}

/// Keeps exactly one observation session alive against the current container.
pub struct MutationWatcher {
    scanner: Arc<FeedScanner>,
    config: WatcherConfig,
    session: Mutex<Option<ObservationSession>>,
}

impl MutationWatcher {
    pub const fn new(scanner: Arc<FeedScanner>, config: WatcherConfig) -> Self {
        Self {
            scanner,
            config,
            session: Mutex::new(None),
        }
    }

    fn session(&self) -> MutexGuard<'_, Option<ObservationSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Container observed by the active session.
    pub fn current_container(&self) -> Option<NodeId> {
        self.session().as_ref().map(|session| session.container)
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.session().as_ref().map(|session| session.id)
    }

    /// Tear down the active session, then observe the container currently in the page.
    ///
    /// When the container changed, controllers of indicators the host no longer knows
    /// are dropped from the registry.
    pub fn attach(&self) -> Result<NodeId, HostError> {
        let host = &self.scanner.context().host;
        let mut slot = self.session();
        let previous = slot.take().map(|previous| {
            let container = previous.container;
            previous.teardown();
            container
        });

        let container = host.container().ok_or(HostError::NoContainer)?;
        let mutations = host.observe(container)?;
        let id = SessionId::new();
        let cancel = CancellationToken::new();
        let span = tracing::info_span!("observation", session = %id, container = %container);
        tokio::spawn(
            observe_loop(
                Arc::clone(&self.scanner),
                mutations,
                cancel.clone(),
                self.config.insert_threshold,
            )
            .instrument(span),
        );

        *slot = Some(ObservationSession {
            id,
            container,
            cancel,
        });
        drop(slot);
        info!(session = %id, container = %container, "observing feed container");

        if previous.is_some_and(|previous| previous != container) {
            let pruned = self
                .scanner
                .registry()
                .retain(|indicator| host.has_indicator(indicator));
            debug!(pruned, "dropped controllers of removed indicators");
        }
        Ok(container)
    }

    /// End observation without starting a new session.
    pub fn detach(&self) {
        if let Some(session) = self.session().take() {
            session.teardown();
        }
    }

    /// Wait for the host to finish re-rendering, re-attach and scan the whole container.
    pub async fn reattach_and_scan(&self) -> Result<ScanReport, HostError> {
        tokio::time::sleep(self.config.reattach_delay()).await;
        let container = self.attach()?;
        Ok(self.scanner.scan(container).await)
    }

    /// Re-attach after every "activity submitted" signal until `cancel` fires.
    ///
    /// Cancellation also abandons a re-attach that is still waiting or scanning.
    pub fn listen_for_submissions(
        self: &Arc<Self>,
        mut submissions: broadcast::Receiver<()>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let watcher = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    signal = submissions.recv() => match signal {
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            debug!("activity submitted; re-attaching after delay");
                            tokio::select! {
                                biased;
                                () = cancel.cancelled() => break,
                                result = watcher.reattach_and_scan() => {
                                    if let Err(e) = result {
                                        watcher.report_reattach_failure(&e);
                                    }
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!("submission listener stopped");
        })
    }

    fn report_reattach_failure(&self, error: &HostError) {
        warn!(error = %error, "re-attach after submission failed");
        self.scanner.context().failures.report(SyncFailure::Host {
            operation: "re-attach feed observation".to_string(),
            error: error.to_string(),
        });
    }
}

impl Drop for MutationWatcher {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn observe_loop(
    scanner: Arc<FeedScanner>,
    mut mutations: mpsc::UnboundedReceiver<MutationBatch>,
    cancel: CancellationToken,
    insert_threshold: usize,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            batch = mutations.recv() => {
                let Some(batch) = batch else {
                    debug!("container removed; observation stream ended");
                    break;
                };
                if !batch.qualifies(insert_threshold) {
                    trace!(inserted = batch.inserted_count(), "mutation batch ignored");
                    continue;
                }
                let scanner = Arc::clone(&scanner);
                tokio::spawn(
                    async move {
                        scanner.scan(batch.target).await;
                    }
                    .in_current_span(),
                );
            }
        }
    }
}
