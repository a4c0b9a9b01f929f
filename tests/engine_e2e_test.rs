/// End-to-end tests for the relevance engine
///
/// Drives the engine through the in-memory feed host against a mock relevance
/// service, the way a page load followed by user interaction would.
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fast_watcher, feed, recording_sink, setup_test_logging, wait_for, ScriptedStore};
use feed_relevance::{
    Config, FeedHost, HostError, HttpRelevanceClient, InMemoryFeed, IndicatorId, IndicatorState,
    MutationBatch, NodeId, RelevanceEngine, RelevanceError, RemoteConfig, SyncFailure, UserId,
    WatcherConfig,
};
use mockito::{Matcher, Server};
use tokio::sync::{broadcast, mpsc};

/// Host whose user clicks each indicator the instant it appears, before the
/// attaching call has returned.
struct EagerClickFeed {
    inner: Arc<InMemoryFeed>,
}

impl FeedHost for EagerClickFeed {
    fn current_user(&self) -> Option<UserId> {
        self.inner.current_user()
    }

    fn page_origin(&self) -> Option<String> {
        self.inner.page_origin()
    }

    fn container(&self) -> Option<NodeId> {
        self.inner.container()
    }

    fn activity_blocks(&self, root: NodeId) -> Result<Vec<NodeId>, HostError> {
        self.inner.activity_blocks(root)
    }

    fn activity_link(&self, block: NodeId) -> Result<Option<String>, HostError> {
        self.inner.activity_link(block)
    }

    fn indicator_of(&self, block: NodeId) -> Option<IndicatorId> {
        self.inner.indicator_of(block)
    }

    fn has_indicator(&self, indicator: IndicatorId) -> bool {
        self.inner.has_indicator(indicator)
    }

    fn attach_indicator(
        &self,
        block: NodeId,
        state: IndicatorState,
    ) -> Result<Option<IndicatorId>, HostError> {
        let attached = self.inner.attach_indicator(block, state)?;
        if let Some(indicator) = attached {
            self.inner.click(indicator);
            // Give the click router time to run before the call returns.
            std::thread::sleep(Duration::from_millis(50));
        }
        Ok(attached)
    }

    fn render_indicator(&self, indicator: IndicatorId, state: IndicatorState) -> Result<(), HostError> {
        self.inner.render_indicator(indicator, state)
    }

    fn observe(&self, container: NodeId) -> Result<mpsc::UnboundedReceiver<MutationBatch>, HostError> {
        self.inner.observe(container)
    }

    fn activity_submissions(&self) -> broadcast::Receiver<()> {
        self.inner.activity_submissions()
    }

    fn indicator_clicks(&self) -> broadcast::Receiver<IndicatorId> {
        self.inner.indicator_clicks()
    }
}

async fn wait_until_matched(mock: &mockito::Mock, timeout_ms: u64) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if mock.matched_async().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

fn client_for(server: &mockito::ServerGuard) -> Arc<HttpRelevanceClient> {
    Arc::new(HttpRelevanceClient::new(&format!("{}/rest/datacollector", server.url())).unwrap())
}

#[tokio::test]
async fn test_page_load_then_click_records_relevance() {
    setup_test_logging();

    // Arrange: one activity with no stored opinion
    let mut server = Server::new_async().await;
    let get = server
        .mock("GET", "/rest/datacollector/relevance/u1/42")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/rest/datacollector/relevance")
        .match_body(Matcher::Json(serde_json::json!({
            "userId": "u1",
            "activityId": "42",
            "relevant": true
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let feed = feed();
    let block = feed.append_activity("/portal/intranet/activity?id=42").unwrap();
    let sink = recording_sink();

    // Act: page ready
    let handle = RelevanceEngine::new(feed.clone(), client_for(&server), sink.clone(), fast_watcher())
        .start()
        .await
        .unwrap();

    // Assert: indicator rendered in the default style
    get.assert_async().await;
    assert_eq!(handle.initial_scan().attached, 1);
    assert_eq!(feed.indicator_class(block).as_deref(), Some("eye eye-default"));

    // Act: user clicks the eye
    let indicator = feed.indicator_of(block).unwrap();
    feed.click(indicator);

    // Assert: style flips at once and the record is written
    assert!(wait_for(|| feed.indicator_state(block) == Some(IndicatorState::Relevant), 1000).await);
    assert_eq!(feed.indicator_class(block).as_deref(), Some("eye eye-relevant"));
    assert!(wait_until_matched(&post, 2000).await);
    assert!(sink.failures().is_empty());

    handle.stop().await;
}

#[tokio::test]
async fn test_first_post_into_empty_stream_gets_an_indicator() {
    setup_test_logging();

    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/rest/datacollector/relevance/u1/100")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"userId":"u1","activityId":"100","relevant":false}"#)
        .create_async()
        .await;
    let feed = feed();
    let sink = recording_sink();
    let handle = RelevanceEngine::new(feed.clone(), client_for(&server), sink.clone(), fast_watcher())
        .start()
        .await
        .unwrap();
    assert_eq!(handle.initial_scan().examined, 0);
    let original = handle.watcher().current_container();

    // The portal swaps the container instead of inserting into it.
    let container = feed.replace_container(&["/activity?id=100"]);
    feed.submit_activity();

    let block = feed.activity_blocks(container).unwrap()[0];
    assert!(wait_for(|| feed.indicator_state(block) == Some(IndicatorState::Irrelevant), 2000).await);
    assert_eq!(handle.watcher().current_container(), Some(container));
    assert_ne!(original, Some(container));
    assert_eq!(feed.live_observers(), 1);
    assert!(sink.failures().is_empty());

    handle.stop().await;
    assert!(wait_for(|| feed.live_observers() == 0, 1000).await);
}

#[tokio::test]
async fn test_unavailable_service_leaves_feed_untouched() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", Matcher::Regex(r"^/rest/datacollector/relevance/.*$".to_string()))
        .with_status(500)
        .create_async()
        .await;
    let feed = feed();
    let block = feed.append_activity("/activity?id=42").unwrap();
    let sink = recording_sink();

    let handle = RelevanceEngine::new(feed.clone(), client_for(&server), sink.clone(), fast_watcher())
        .start()
        .await
        .unwrap();

    assert_eq!(handle.initial_scan().failed, 1);
    assert_eq!(feed.indicator_of(block), None);
    assert!(matches!(sink.failures()[0], SyncFailure::Fetch { .. }));
    handle.stop().await;
}

#[tokio::test]
async fn test_base_url_derived_from_page_origin() {
    let server = Server::new_async().await;
    let feed = feed();
    let origin = server.url();

    let client = HttpRelevanceClient::with_config(&RemoteConfig::default(), Some(&origin)).unwrap();

    assert_eq!(
        client.base_url().as_str(),
        format!("{origin}/rest/datacollector")
    );
    assert_eq!(feed.page_origin().as_deref(), Some("http://localhost:8080"));
}

#[tokio::test]
async fn test_clicks_on_new_blocks_are_routed() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", Matcher::Regex(r"^/rest/datacollector/relevance/u1/\d+$".to_string()))
        .with_status(404)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/rest/datacollector/relevance")
        .match_body(Matcher::PartialJson(serde_json::json!({ "activityId": "7" })))
        .with_status(200)
        .create_async()
        .await;
    let feed = feed();
    let handle = RelevanceEngine::new(feed.clone(), client_for(&server), recording_sink(), fast_watcher())
        .start()
        .await
        .unwrap();

    let block = feed.append_activity("/activity?id=7").unwrap();
    assert!(wait_for(|| feed.indicator_of(block).is_some(), 1000).await);
    feed.click(feed.indicator_of(block).unwrap());

    assert!(wait_until_matched(&post, 2000).await);
    assert_eq!(handle.registry().len(), 1);
    handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_click_during_attach_is_not_lost() {
    setup_test_logging();

    let feed = feed();
    let host = Arc::new(EagerClickFeed { inner: feed.clone() });
    let store = Arc::new(ScriptedStore::new());
    let sink = recording_sink();
    let handle = RelevanceEngine::new(host, store.clone(), sink.clone(), fast_watcher())
        .start()
        .await
        .unwrap();

    let block = feed.append_activity("/activity?id=42").unwrap();

    assert!(wait_for(|| feed.indicator_state(block) == Some(IndicatorState::Relevant), 2000).await);
    assert!(wait_for(|| store.pushes().len() == 1, 2000).await);
    assert!(store.pushes()[0].relevant);
    assert!(sink.failures().is_empty());
    handle.stop().await;
}

#[tokio::test]
async fn test_engine_from_config_reaches_service_under_page_origin() {
    let mut server = Server::new_async().await;
    let get = server
        .mock("GET", "/rest/datacollector/relevance/u1/42")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"userId":"u1","activityId":"42","relevant":true}"#)
        .expect(1)
        .create_async()
        .await;
    let feed = Arc::new(InMemoryFeed::new(server.url()).with_user(UserId::new("u1")));
    let block = feed.append_activity("/activity?id=42").unwrap();

    let handle = RelevanceEngine::from_config(feed.clone(), recording_sink(), &Config::default())
        .unwrap()
        .start()
        .await
        .unwrap();

    get.assert_async().await;
    assert_eq!(feed.indicator_state(block), Some(IndicatorState::Relevant));
    handle.stop().await;
}

#[tokio::test]
async fn test_engine_from_config_rejects_invalid_base_url() {
    let mut config = Config::default();
    config.remote.base_url = Some("not a url".to_string());

    let result = RelevanceEngine::from_config(feed(), recording_sink(), &config);

    assert!(matches!(result, Err(RelevanceError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_stop_abandons_pending_reattach() {
    let feed = feed();
    let config = WatcherConfig {
        reattach_delay_ms: 5000,
        ..WatcherConfig::default()
    };
    let handle = RelevanceEngine::new(feed.clone(), Arc::new(ScriptedStore::new()), recording_sink(), config)
        .start()
        .await
        .unwrap();
    let watcher = Arc::clone(handle.watcher());

    feed.replace_container(&["/activity?id=1"]);
    feed.submit_activity();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stopped = tokio::time::timeout(Duration::from_millis(1000), handle.stop()).await;

    assert!(stopped.is_ok());
    assert_eq!(watcher.current_session(), None);
    assert!(wait_for(|| feed.live_observers() == 0, 1000).await);
}
