//! Per-indicator lifecycle: click transitions and outbound state pushes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::models::{ActivityId, IndicatorId, IndicatorState, UserId};
use crate::domain::ports::{FailureSink, FeedHost, RelevanceStore, SyncFailure};

/// Collaborators shared by the scanner and every controller.
#[derive(Clone)]
pub struct SyncContext {
    pub host: Arc<dyn FeedHost>,
    pub store: Arc<dyn RelevanceStore>,
    pub failures: Arc<dyn FailureSink>,
}

impl SyncContext {
    pub fn new(
        host: Arc<dyn FeedHost>,
        store: Arc<dyn RelevanceStore>,
        failures: Arc<dyn FailureSink>,
    ) -> Self {
        Self {
            host,
            store,
            failures,
        }
    }
}

/// Owns one attached indicator.
///
/// A click advances the state, queues the push and then re-renders. Nothing awaits in
/// between, so the UI never waits on the network and a push is always queued before its
/// style shows. Queued pushes are sent one at a time in click order, so the remote
/// record ends on the state the user sees.
pub struct IndicatorController {
    indicator: IndicatorId,
    user_id: UserId,
    activity_id: ActivityId,
    state: Mutex<IndicatorState>,
    pushes: mpsc::UnboundedSender<bool>,
    ctx: SyncContext,
}

impl IndicatorController {
    /// Bind a controller to an indicator the host already rendered in `initial`.
    ///
    /// Must be called from within a tokio runtime: the controller's push queue is
    /// drained by a task that lives as long as the controller.
    pub fn new(
        indicator: IndicatorId,
        user_id: UserId,
        activity_id: ActivityId,
        initial: IndicatorState,
        ctx: SyncContext,
    ) -> Self {
        let (pushes, queue) = mpsc::unbounded_channel();
        tokio::spawn(drain_pushes(
            queue,
            user_id.clone(),
            activity_id.clone(),
            ctx.clone(),
        ));
        Self {
            indicator,
            user_id,
            activity_id,
            state: Mutex::new(initial),
            pushes,
            ctx,
        }
    }

    pub const fn indicator(&self) -> IndicatorId {
        self.indicator
    }

    pub const fn activity_id(&self) -> &ActivityId {
        &self.activity_id
    }

    pub fn state(&self) -> IndicatorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle one click and return the new state.
    pub fn click(&self) -> IndicatorState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let next = state.next();
        *state = next;

        // Every reachable post-click state carries a boolean.
        let relevant = next == IndicatorState::Relevant;
        self.dispatch_push(relevant);

        if let Err(e) = self.ctx.host.render_indicator(self.indicator, next) {
            self.ctx.failures.report(SyncFailure::Host {
                operation: format!("render {}", self.indicator),
                error: e.to_string(),
            });
        }
        debug!(
            indicator = %self.indicator,
            activity_id = %self.activity_id,
            state = %next,
            "indicator toggled"
        );
        next
    }

    fn dispatch_push(&self, relevant: bool) {
        if self.pushes.send(relevant).is_err() {
            self.ctx.failures.report(SyncFailure::Push {
                user_id: self.user_id.clone(),
                activity_id: self.activity_id.clone(),
                relevant,
                error: "push queue closed".to_string(),
            });
        }
    }
}

/// Sends queued pushes in order until the controller is dropped.
async fn drain_pushes(
    mut queue: mpsc::UnboundedReceiver<bool>,
    user_id: UserId,
    activity_id: ActivityId,
    ctx: SyncContext,
) {
    while let Some(relevant) = queue.recv().await {
        if let Err(e) = ctx.store.push_state(&user_id, &activity_id, relevant).await {
            warn!(activity_id = %activity_id, error = %e, "relevance push failed");
            ctx.failures.report(SyncFailure::Push {
                user_id: user_id.clone(),
                activity_id: activity_id.clone(),
                relevant,
                error: e.to_string(),
            });
        }
    }
}

/// Routes indicator clicks to their controllers.
#[derive(Default)]
pub struct IndicatorRegistry {
    controllers: RwLock<HashMap<IndicatorId, Arc<IndicatorController>>>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `attach` and register the controller it yields as one step.
    ///
    /// The write lock is held across `attach`, so a click on the freshly attached
    /// indicator waits in [`IndicatorRegistry::get`] until the controller is in place.
    /// `attach` must not call back into the registry.
    pub fn attach_with<E>(
        &self,
        attach: impl FnOnce() -> Result<Option<IndicatorController>, E>,
    ) -> Result<Option<Arc<IndicatorController>>, E> {
        let mut controllers = self
            .controllers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(controller) = attach()? else {
            return Ok(None);
        };
        let controller = Arc::new(controller);
        controllers.insert(controller.indicator(), Arc::clone(&controller));
        Ok(Some(controller))
    }

    pub fn register(&self, controller: IndicatorController) -> Arc<IndicatorController> {
        let controller = Arc::new(controller);
        self.controllers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(controller.indicator(), Arc::clone(&controller));
        controller
    }

    pub fn get(&self, indicator: IndicatorId) -> Option<Arc<IndicatorController>> {
        self.controllers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&indicator)
            .cloned()
    }

    /// Deliver a click. Returns the new state, or `None` for an unknown indicator.
    pub fn click(&self, indicator: IndicatorId) -> Option<IndicatorState> {
        let Some(controller) = self.get(indicator) else {
            debug!(indicator = %indicator, "click on unregistered indicator ignored");
            return None;
        };
        Some(controller.click())
    }

    /// Drop controllers whose indicator fails `keep`. Returns how many were removed.
    pub fn retain(&self, mut keep: impl FnMut(IndicatorId) -> bool) -> usize {
        let mut controllers = self
            .controllers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = controllers.len();
        controllers.retain(|indicator, _| keep(*indicator));
        before - controllers.len()
    }

    pub fn len(&self) -> usize {
        self.controllers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
