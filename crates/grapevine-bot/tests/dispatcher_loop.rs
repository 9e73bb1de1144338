//! Event loop behaviour against scripted update sources.

mod common;

use async_trait::async_trait;
use common::*;
use grapevine_bot::{dispatcher, ChatEvent, DispatchStats, Error, PlatformError, UpdateSource};
use std::collections::VecDeque;

type Poll = Result<Option<Vec<ChatEvent>>, PlatformError>;

/// Replays a fixed sequence of poll results, then reports exhaustion.
struct ScriptedSource {
    script: VecDeque<Poll>,
    polls: usize,
}

impl ScriptedSource {
    fn new(script: Vec<Poll>) -> Self {
        Self {
            script: script.into(),
            polls: 0,
        }
    }
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    async fn next_batch(&mut self) -> Poll {
        self.polls += 1;
        self.script.pop_front().unwrap_or(Ok(None))
    }
}

/// Never yields a batch.
struct SilentSource;

#[async_trait]
impl UpdateSource for SilentSource {
    async fn next_batch(&mut self) -> Poll {
        std::future::pending().await
    }
}

fn never() -> std::future::Pending<()> {
    std::future::pending()
}

#[tokio::test]
async fn events_are_handled_in_order() {
    let mut harness = Harness::new(MockPlatform::new());
    let alice = user(1, "alice");
    let mut source = ScriptedSource::new(vec![
        Ok(Some(vec![
            members_added(1, alice.clone(), vec![user(2, "bob")]),
            members_added(2, alice.clone(), vec![user(3, "carol")]),
        ])),
        Ok(Some(Vec::new())),
        Ok(Some(vec![members_added(3, alice, vec![user(4, "dave")])])),
    ]);

    let stats = dispatcher::run(&mut harness.engine, &mut source, never())
        .await
        .unwrap();

    assert_eq!(
        stats,
        DispatchStats {
            events: 3,
            failures: 0,
            poll_retries: 0,
        }
    );
    let invitees: Vec<_> = harness.edges().into_iter().map(|e| e.invitee).collect();
    assert_eq!(invitees, vec!["bob", "carol", "dave"]);
    assert_eq!(source.polls, 4);
}

#[tokio::test]
async fn failing_event_does_not_stop_the_loop() {
    let mut harness = Harness::new(MockPlatform::new().failing_links());
    let mut source = ScriptedSource::new(vec![Ok(Some(vec![
        dm(1, user(1, "alice"), "/invite"),
        members_added(2, user(1, "alice"), vec![user(2, "bob")]),
    ]))]);

    let stats = dispatcher::run(&mut harness.engine, &mut source, never())
        .await
        .unwrap();

    assert_eq!(stats.events, 2);
    assert_eq!(stats.failures, 1);
    assert_eq!(harness.edges().len(), 1);
}

#[tokio::test]
async fn retryable_poll_failure_is_retried() {
    let mut harness = Harness::new(MockPlatform::new());
    let mut source = ScriptedSource::new(vec![
        Err(PlatformError::Api {
            code: Some(429),
            description: "Too Many Requests: retry after 0".into(),
            retry_after: Some(0),
        }),
        Ok(Some(vec![join(user(5, "erin"), None)])),
    ]);

    let stats = dispatcher::run(&mut harness.engine, &mut source, never())
        .await
        .unwrap();

    assert_eq!(stats.poll_retries, 1);
    assert_eq!(stats.events, 1);
    assert_eq!(harness.edges().len(), 1);
}

#[tokio::test]
async fn permanent_poll_failure_ends_the_loop() {
    let mut harness = Harness::new(MockPlatform::new());
    let mut source = ScriptedSource::new(vec![
        Err(PlatformError::Api {
            code: Some(401),
            description: "Unauthorized".into(),
            retry_after: None,
        }),
        Ok(Some(vec![join(user(5, "erin"), None)])),
    ]);

    let result = dispatcher::run(&mut harness.engine, &mut source, never()).await;

    assert!(matches!(result, Err(Error::Platform(PlatformError::Api { code: Some(401), .. }))));
    assert_eq!(source.polls, 1);
    assert!(harness.edges().is_empty());
}

#[tokio::test]
async fn shutdown_stops_a_waiting_loop() {
    let mut harness = Harness::new(MockPlatform::new());

    let stats = dispatcher::run(&mut harness.engine, &mut SilentSource, async {})
        .await
        .unwrap();

    assert_eq!(stats, DispatchStats::default());
}
