mod common;

use std::sync::Arc;

use common::{recording_sink, wait_for, Reply, ScriptedStore};
use feed_relevance::services::{IndicatorController, SyncContext};
use feed_relevance::{ActivityId, FeedHost, IndicatorState, UserId};
use proptest::prelude::*;

fn initial_state() -> impl Strategy<Value = IndicatorState> {
    prop_oneof![
        Just(IndicatorState::Unset),
        Just(IndicatorState::Relevant),
        Just(IndicatorState::Irrelevant),
    ]
}

proptest! {
    /// Property: Once clicked, an indicator never returns to Unset
    ///
    /// Every click after the first alternates between Relevant and Irrelevant.
    #[test]
    fn prop_clicks_alternate_and_never_unset(
        start in initial_state(),
        clicks in 1usize..50
    ) {
        let mut state = start;
        let mut previous = None;
        for _ in 0..clicks {
            state = state.next();
            prop_assert_ne!(state, IndicatorState::Unset);
            if let Some(previous) = previous {
                prop_assert_ne!(state, previous);
            }
            previous = Some(state);
        }
    }

    /// Property: The first click on an Unset indicator always yields Relevant
    #[test]
    fn prop_first_click_from_unset_is_relevant(clicks in 1usize..50) {
        let states: Vec<IndicatorState> = std::iter::successors(
            Some(IndicatorState::Unset.next()),
            |state| Some(state.next()),
        )
        .take(clicks)
        .collect();

        for (i, state) in states.iter().enumerate() {
            let expected = if i % 2 == 0 {
                IndicatorState::Relevant
            } else {
                IndicatorState::Irrelevant
            };
            prop_assert_eq!(*state, expected);
        }
    }

    /// Property: The activity id is everything after the first '='
    #[test]
    fn prop_activity_id_follows_first_equals(
        prefix in "[a-z/?]{0,20}",
        id in "[a-zA-Z0-9=&]{1,20}"
    ) {
        let link = format!("{prefix}={id}");
        let parsed = ActivityId::from_link(&link);
        prop_assert_eq!(parsed, Some(ActivityId::new(id)));
    }

    /// Property: N clicks produce exactly N pushes, in order, each carrying the state it produced
    #[test]
    fn prop_each_click_pushes_its_own_state(clicks in 1usize..12) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let (states, pushes) = runtime.block_on(async {
            let feed = common::feed();
            let block = feed.append_activity("/activity?id=42").unwrap();
            let indicator = feed
                .attach_indicator(block, IndicatorState::Unset)
                .unwrap()
                .unwrap();
            let store = Arc::new(ScriptedStore::new().reply("42", Reply::Missing));
            let ctx = SyncContext::new(feed.clone(), store.clone(), recording_sink());
            let controller = IndicatorController::new(
                indicator,
                UserId::new("u1"),
                ActivityId::new("42"),
                IndicatorState::Unset,
                ctx,
            );

            let states: Vec<IndicatorState> = (0..clicks).map(|_| controller.click()).collect();
            assert!(wait_for(|| store.pushes().len() == clicks, 2000).await);
            (states, store.pushes())
        });

        // Pushes are sent in click order.
        let expected: Vec<bool> = states.iter().map(|s| *s == IndicatorState::Relevant).collect();
        let pushed: Vec<bool> = pushes.iter().map(|record| record.relevant).collect();
        prop_assert_eq!(pushed, expected);
        prop_assert!(pushes.iter().all(|record| record.activity_id.as_str() == "42"));
    }
}
