//! In-process feed host.
//!
//! Models the parts of the portal page the engine touches: a container holding
//! activity blocks, each with an action bar and an activity link. Insertions are
//! reported to observers the way a DOM mutation observer would report them, and the
//! container can be torn down and rebuilt the way the portal does when the first
//! activity is posted into an empty stream.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::domain::errors::HostError;
use crate::domain::models::{IndicatorId, IndicatorState, MutationBatch, NodeId, UserId};
use crate::domain::ports::FeedHost;

const SIGNAL_CAPACITY: usize = 64;

/// Role of an element in the feed markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    ActivityBlock,
    ActionBar,
    StatusActions,
    Link,
    Indicator,
    Element,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    href: Option<String>,
    /// Explicit per-block marker; set only on activity blocks.
    indicator: Option<IndicatorId>,
}

impl Node {
    const fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            href: None,
            indicator: None,
        }
    }
}

#[derive(Debug)]
struct IndicatorEntry {
    block: NodeId,
    state: IndicatorState,
}

struct Observer {
    container: NodeId,
    sender: mpsc::UnboundedSender<MutationBatch>,
}

#[derive(Default)]
struct FeedTree {
    next_id: u64,
    nodes: HashMap<NodeId, Node>,
    indicators: HashMap<IndicatorId, IndicatorEntry>,
    container: Option<NodeId>,
    observers: Vec<Observer>,
}

impl FeedTree {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn create(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.allocate());
        self.nodes.insert(id, Node::new(kind, parent));
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.push(id);
            }
        }
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, HostError> {
        self.nodes.get(&id).ok_or(HostError::NodeNotFound(id))
    }

    /// Build one activity block below `parent`; returns every created node, block first.
    fn build_activity(&mut self, parent: NodeId, href: Option<&str>) -> Vec<NodeId> {
        let block = self.create(NodeKind::ActivityBlock, Some(parent));
        let action_bar = self.create(NodeKind::ActionBar, Some(block));
        let status_actions = self.create(NodeKind::StatusActions, Some(action_bar));
        let mut created = vec![block, action_bar, status_actions];
        if let Some(href) = href {
            let link = self.create(NodeKind::Link, Some(block));
            if let Some(node) = self.nodes.get_mut(&link) {
                node.href = Some(href.to_string());
            }
            created.push(link);
        }
        created
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    fn container_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.nodes.get(&node_id)?;
            if node.kind == NodeKind::Container {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    fn remove_subtree(&mut self, root: NodeId) {
        for id in self.descendants(root) {
            self.nodes.remove(&id);
        }
        self.indicators
            .retain(|_, entry| self.nodes.contains_key(&entry.block));
        self.observers.retain(|observer| observer.container != root);
    }

    fn notify(&mut self, batch: &MutationBatch) {
        let Some(container) = self.container_of(batch.target) else {
            return;
        };
        self.observers.retain(|observer| {
            observer.container != container || observer.sender.send(batch.clone()).is_ok()
        });
    }
}

/// [`FeedHost`] backed by an in-memory element tree.
pub struct InMemoryFeed {
    tree: Mutex<FeedTree>,
    user: Mutex<Option<UserId>>,
    origin: Option<String>,
    submissions: broadcast::Sender<()>,
    clicks: broadcast::Sender<IndicatorId>,
}

impl InMemoryFeed {
    /// Create a page with an empty feed container.
    pub fn new(origin: impl Into<String>) -> Self {
        let mut tree = FeedTree::default();
        let container = tree.create(NodeKind::Container, None);
        tree.container = Some(container);

        let (submissions, _) = broadcast::channel(SIGNAL_CAPACITY);
        let (clicks, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            tree: Mutex::new(tree),
            user: Mutex::new(None),
            origin: Some(origin.into()),
            submissions,
            clicks,
        }
    }

    #[must_use]
    pub fn with_user(self, user: UserId) -> Self {
        self.set_current_user(Some(user));
        self
    }

    pub fn set_current_user(&self, user: Option<UserId>) {
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = user;
    }

    fn tree(&self) -> MutexGuard<'_, FeedTree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an activity block whose link points at `href`.
    ///
    /// Observers see one batch holding the block and its children.
    pub fn append_activity(&self, href: &str) -> Result<NodeId, HostError> {
        self.append_block(Some(href))
    }

    /// Append an activity block that carries no activity link.
    pub fn append_unlinked_activity(&self) -> Result<NodeId, HostError> {
        self.append_block(None)
    }

    fn append_block(&self, href: Option<&str>) -> Result<NodeId, HostError> {
        let mut tree = self.tree();
        let container = tree.container.ok_or(HostError::NoContainer)?;
        let created = tree.build_activity(container, href);
        let block = created[0];
        tree.notify(&MutationBatch::inserted(container, created));
        Ok(block)
    }

    /// Append `count` plain elements to the container in a single batch.
    pub fn append_elements(&self, count: usize) -> Result<Vec<NodeId>, HostError> {
        let mut tree = self.tree();
        let container = tree.container.ok_or(HostError::NoContainer)?;
        let created: Vec<NodeId> = (0..count)
            .map(|_| tree.create(NodeKind::Element, Some(container)))
            .collect();
        tree.notify(&MutationBatch::inserted(container, created.clone()));
        Ok(created)
    }

    /// Destroy the container and put a new one holding blocks for `hrefs` in its place.
    ///
    /// No mutation is reported: observers of the old container see their stream end.
    pub fn replace_container(&self, hrefs: &[&str]) -> NodeId {
        let mut tree = self.tree();
        if let Some(old) = tree.container.take() {
            tree.remove_subtree(old);
        }
        let container = tree.create(NodeKind::Container, None);
        for href in hrefs {
            tree.build_activity(container, Some(href));
        }
        tree.container = Some(container);
        debug!(container = %container, blocks = hrefs.len(), "feed container replaced");
        container
    }

    /// Signal that the user posted a new activity.
    pub fn submit_activity(&self) {
        let _ = self.submissions.send(());
    }

    /// Signal a click on an indicator.
    pub fn click(&self, indicator: IndicatorId) {
        let _ = self.clicks.send(indicator);
    }

    /// State rendered by the indicator attached to `block`.
    pub fn indicator_state(&self, block: NodeId) -> Option<IndicatorState> {
        let tree = self.tree();
        let id = tree.nodes.get(&block)?.indicator?;
        tree.indicators.get(&id).map(|entry| entry.state)
    }

    /// Class attribute of the indicator attached to `block`.
    pub fn indicator_class(&self, block: NodeId) -> Option<String> {
        self.indicator_state(block).map(IndicatorState::class_list)
    }

    /// Number of indicator elements inside `block`.
    pub fn indicator_count(&self, block: NodeId) -> usize {
        let tree = self.tree();
        tree.descendants(block)
            .into_iter()
            .filter(|id| {
                tree.nodes
                    .get(id)
                    .is_some_and(|node| node.kind == NodeKind::Indicator)
            })
            .count()
    }

    /// Number of observers whose receiver is still alive.
    pub fn live_observers(&self) -> usize {
        let mut tree = self.tree();
        tree.observers.retain(|observer| !observer.sender.is_closed());
        tree.observers.len()
    }

    pub fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.tree().nodes.get(&id).map(|node| node.kind)
    }
}

impl FeedHost for InMemoryFeed {
    fn current_user(&self) -> Option<UserId> {
        self.user.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn page_origin(&self) -> Option<String> {
        self.origin.clone()
    }

    fn container(&self) -> Option<NodeId> {
        self.tree().container
    }

    fn activity_blocks(&self, root: NodeId) -> Result<Vec<NodeId>, HostError> {
        let tree = self.tree();
        tree.node(root)?;
        Ok(tree
            .descendants(root)
            .into_iter()
            .filter(|id| {
                tree.nodes
                    .get(id)
                    .is_some_and(|node| node.kind == NodeKind::ActivityBlock)
            })
            .collect())
    }

    fn activity_link(&self, block: NodeId) -> Result<Option<String>, HostError> {
        let tree = self.tree();
        let node = tree.node(block)?;
        Ok(node.children.iter().find_map(|child| {
            tree.nodes
                .get(child)
                .filter(|node| node.kind == NodeKind::Link)
                .and_then(|node| node.href.clone())
        }))
    }

    fn indicator_of(&self, block: NodeId) -> Option<IndicatorId> {
        self.tree().nodes.get(&block)?.indicator
    }

    fn has_indicator(&self, indicator: IndicatorId) -> bool {
        self.tree().indicators.contains_key(&indicator)
    }

    fn attach_indicator(
        &self,
        block: NodeId,
        state: IndicatorState,
    ) -> Result<Option<IndicatorId>, HostError> {
        let mut tree = self.tree();
        let node = tree.node(block)?;
        if node.indicator.is_some() {
            return Ok(None);
        }

        let status_actions = tree
            .descendants(block)
            .into_iter()
            .find(|id| {
                tree.nodes
                    .get(id)
                    .is_some_and(|node| node.kind == NodeKind::StatusActions)
            })
            .ok_or(HostError::MissingActionBar(block))?;

        let indicator = IndicatorId(tree.allocate());
        let element = NodeId(tree.allocate());
        tree.nodes
            .insert(element, Node::new(NodeKind::Indicator, Some(status_actions)));
        if let Some(parent) = tree.nodes.get_mut(&status_actions) {
            // Prepended so the indicator leads the action bar.
            parent.children.insert(0, element);
        }
        if let Some(block_node) = tree.nodes.get_mut(&block) {
            block_node.indicator = Some(indicator);
        }
        tree.indicators.insert(
            indicator,
            IndicatorEntry {
                block,
                state,
            },
        );
        debug!(
            block = %block,
            indicator = %indicator,
            class = %state.class_list(),
            "indicator attached"
        );
        Ok(Some(indicator))
    }

    fn render_indicator(
        &self,
        indicator: IndicatorId,
        state: IndicatorState,
    ) -> Result<(), HostError> {
        let mut tree = self.tree();
        let entry = tree
            .indicators
            .get_mut(&indicator)
            .ok_or(HostError::IndicatorNotFound(indicator))?;
        entry.state = state;
        Ok(())
    }

    fn observe(
        &self,
        container: NodeId,
    ) -> Result<mpsc::UnboundedReceiver<MutationBatch>, HostError> {
        let mut tree = self.tree();
        if tree.node(container)?.kind != NodeKind::Container {
            return Err(HostError::NotAContainer(container));
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        tree.observers.push(Observer { container, sender });
        Ok(receiver)
    }

    fn activity_submissions(&self) -> broadcast::Receiver<()> {
        self.submissions.subscribe()
    }

    fn indicator_clicks(&self) -> broadcast::Receiver<IndicatorId> {
        self.clicks.subscribe()
    }
}
