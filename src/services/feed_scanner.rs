//! Finds activity blocks without an indicator and attaches one to each.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::HostError;
use crate::domain::models::{ActivityId, NodeId, UserId};
use crate::domain::ports::SyncFailure;

use super::indicator_controller::{IndicatorController, IndicatorRegistry, SyncContext};

/// What happened to one block during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Attached,
    AlreadyIndicated,
    Unlinked,
    Failed,
}

/// Per-scan tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub examined: usize,
    pub attached: usize,
    pub already_indicated: usize,
    pub unlinked: usize,
    pub failed: usize,
}

impl ScanReport {
    fn record(&mut self, outcome: BlockOutcome) {
        self.examined += 1;
        match outcome {
            BlockOutcome::Attached => self.attached += 1,
            BlockOutcome::AlreadyIndicated => self.already_indicated += 1,
            BlockOutcome::Unlinked => self.unlinked += 1,
            BlockOutcome::Failed => self.failed += 1,
        }
    }
}

/// Attaches indicators to activity blocks, at most one per block.
///
/// The "already indicated" check runs twice per block: before the fetch, to avoid
/// needless requests, and atomically at attach time, so overlapping scans of the same
/// subtree cannot both attach. Attaching and registering the controller happen under
/// the registry's write lock, so no click reaches an indicator before its controller.
pub struct FeedScanner {
    ctx: SyncContext,
    registry: Arc<IndicatorRegistry>,
}

impl FeedScanner {
    pub const fn new(ctx: SyncContext, registry: Arc<IndicatorRegistry>) -> Self {
        Self { ctx, registry }
    }

    pub const fn context(&self) -> &SyncContext {
        &self.ctx
    }

    pub const fn registry(&self) -> &Arc<IndicatorRegistry> {
        &self.registry
    }

    /// Scan `root` and its descendants.
    #[instrument(skip_all, fields(root = %root))]
    pub async fn scan(&self, root: NodeId) -> ScanReport {
        let mut report = ScanReport::default();

        // Resolved once so every block in this scan is keyed by the same user.
        let Some(user_id) = self.ctx.host.current_user() else {
            warn!("no current user; scan skipped");
            return report;
        };

        let blocks = match self.ctx.host.activity_blocks(root) {
            Ok(blocks) => blocks,
            Err(e) => {
                self.ctx.failures.report(SyncFailure::Host {
                    operation: format!("list activity blocks under {root}"),
                    error: e.to_string(),
                });
                return report;
            }
        };

        let outcomes = join_all(
            blocks
                .into_iter()
                .map(|block| self.process_block(block, &user_id)),
        )
        .await;
        for outcome in outcomes {
            report.record(outcome);
        }

        if report.attached > 0 || report.failed > 0 {
            info!(
                attached = report.attached,
                failed = report.failed,
                skipped = report.already_indicated,
                "feed scan finished"
            );
        } else {
            debug!(examined = report.examined, "feed scan found nothing new");
        }
        report
    }

    async fn process_block(&self, block: NodeId, user_id: &UserId) -> BlockOutcome {
        let host = &self.ctx.host;
        if host.indicator_of(block).is_some() {
            return BlockOutcome::AlreadyIndicated;
        }

        let link = match host.activity_link(block) {
            Ok(link) => link,
            Err(e) => {
                self.report_host("read activity link", &e);
                return BlockOutcome::Failed;
            }
        };
        let Some(activity_id) = link.as_deref().and_then(ActivityId::from_link) else {
            debug!(block = %block, link = ?link, "activity block without usable link");
            return BlockOutcome::Unlinked;
        };

        let state = match self.ctx.store.fetch_state(user_id, &activity_id).await {
            Ok(outcome) => outcome.state(),
            Err(e) => {
                self.ctx.failures.report(SyncFailure::Fetch {
                    user_id: user_id.clone(),
                    activity_id,
                    error: e.to_string(),
                });
                return BlockOutcome::Failed;
            }
        };

        let attached = self.registry.attach_with(|| {
            let indicator = host.attach_indicator(block, state)?;
            Ok::<_, HostError>(indicator.map(|indicator| {
                IndicatorController::new(
                    indicator,
                    user_id.clone(),
                    activity_id,
                    state,
                    self.ctx.clone(),
                )
            }))
        });
        match attached {
            Ok(Some(_)) => BlockOutcome::Attached,
            Ok(None) => BlockOutcome::AlreadyIndicated,
            Err(e) => {
                self.report_host("attach indicator", &e);
                BlockOutcome::Failed
            }
        }
    }

    fn report_host(&self, operation: &str, error: &impl ToString) {
        self.ctx.failures.report(SyncFailure::Host {
            operation: operation.to_string(),
            error: error.to_string(),
        });
    }
}
