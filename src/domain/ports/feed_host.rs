use tokio::sync::{broadcast, mpsc};

use crate::domain::errors::HostError;
use crate::domain::models::{IndicatorId, IndicatorState, MutationBatch, NodeId, UserId};

/// Port onto the host page that renders the activity feed.
///
/// All methods are synchronous: they model DOM calls made from the UI event loop.
/// Implementations must make [`FeedHost::attach_indicator`] atomic with respect to the
/// per-block indicator marker, since concurrent scans race on it.
pub trait FeedHost: Send + Sync {
    /// Identifier of the signed-in user, if the page exposes one.
    fn current_user(&self) -> Option<UserId>;

    /// Scheme, host and port of the page, e.g. `https://intranet.example.com:8443`.
    fn page_origin(&self) -> Option<String>;

    /// The feed container element currently in the page.
    fn container(&self) -> Option<NodeId>;

    /// Activity blocks at or below `root`.
    fn activity_blocks(&self, root: NodeId) -> Result<Vec<NodeId>, HostError>;

    /// Target of the block's designated activity link.
    fn activity_link(&self, block: NodeId) -> Result<Option<String>, HostError>;

    /// Indicator already attached to the block, if any.
    fn indicator_of(&self, block: NodeId) -> Option<IndicatorId>;

    /// Whether the indicator is still part of the page.
    fn has_indicator(&self, indicator: IndicatorId) -> bool;

    /// Insert an indicator rendered in `state` into the block's action bar and mark the block.
    ///
    /// Returns `Ok(None)` without touching the block when it is already marked.
    fn attach_indicator(
        &self,
        block: NodeId,
        state: IndicatorState,
    ) -> Result<Option<IndicatorId>, HostError>;

    /// Re-render an indicator's style for `state`.
    fn render_indicator(&self, indicator: IndicatorId, state: IndicatorState)
        -> Result<(), HostError>;

    /// Subscribe to structural changes below `container`.
    ///
    /// The stream ends when the container is removed from the page. Dropping the
    /// receiver unsubscribes.
    fn observe(&self, container: NodeId) -> Result<mpsc::UnboundedReceiver<MutationBatch>, HostError>;

    /// Fires each time the user submits a new activity through the host UI.
    fn activity_submissions(&self) -> broadcast::Receiver<()>;

    /// Fires each time the user clicks an indicator.
    fn indicator_clicks(&self) -> broadcast::Receiver<IndicatorId>;
}
