//! End-to-end behavior of the broadcast hub against an in-process live source.

use std::sync::Arc;
use std::time::Duration;

use liveboard_core::types::ConnId;
use liveboard_gateway::hub::HubHandle;
use liveboard_upstream::{MemorySource, RawEvent, UpstreamError};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::timeout;

fn hub_with(source: &MemorySource) -> HubHandle {
    HubHandle::spawn(Arc::new(source.clone()), 3)
}

async fn subscribe(hub: &HubHandle, capacity: usize) -> (ConnId, mpsc::Receiver<String>) {
    let conn_id = ConnId::new();
    let (tx, rx) = mpsc::channel(capacity);
    hub.register(conn_id.clone(), tx).await.unwrap();
    (conn_id, rx)
}

/// Wait for the next frame on a subscriber queue.
async fn next_frame(rx: &mut mpsc::Receiver<String>) -> Value {
    let raw = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("subscriber queue closed");
    serde_json::from_str(&raw).unwrap()
}

/// Everything already queued, without waiting.
fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(raw) = rx.try_recv() {
        frames.push(serde_json::from_str(&raw).unwrap());
    }
    frames
}

fn names(frames: &[Value]) -> Vec<&str> {
    frames.iter().map(|f| f["event"].as_str().unwrap()).collect()
}

async fn like(hub: &HubHandle, username: &str, count: i64) {
    hub.inject("like", json!({ "username": username, "likeCount": count }))
        .await
        .unwrap();
}

#[tokio::test]
async fn three_first_likers_produce_one_ranking() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    let (_, mut rx) = subscribe(&hub, 64).await;
    assert_eq!(next_frame(&mut rx).await["event"], "status");

    like(&hub, "alice", 10).await;
    like(&hub, "bob", 15).await;
    like(&hub, "carol", 5).await;

    let frames = drain(&mut rx);
    assert_eq!(names(&frames), vec!["like", "like", "topliker", "like"]);

    let top3 = frames[2]["payload"]["top3"].as_array().unwrap();
    let podium: Vec<(&str, u64)> = top3
        .iter()
        .map(|e| (e["username"].as_str().unwrap(), e["likeCount"].as_u64().unwrap()))
        .collect();
    assert_eq!(podium, vec![("bob", 15), ("alice", 10), ("carol", 5)]);
    assert_eq!(frames[3]["payload"]["username"], "carol");
}

#[tokio::test]
async fn ranking_precedes_the_like_that_changed_it() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    let (_, mut rx) = subscribe(&hub, 64).await;
    next_frame(&mut rx).await;

    for (user, count) in [("a", 5), ("b", 4), ("c", 3)] {
        like(&hub, user, count).await;
    }
    drain(&mut rx);

    // d overtakes c for third place
    like(&hub, "d", 4).await;
    let frames = drain(&mut rx);
    assert_eq!(names(&frames), vec!["topliker", "like"]);
    assert_eq!(frames[0]["payload"]["top3"][2]["username"], "d");

    // a bump that leaves the podium as it is only relays the like
    like(&hub, "a", 1).await;
    assert_eq!(names(&drain(&mut rx)), vec!["like"]);
}

#[tokio::test]
async fn zero_like_count_is_relayed_without_scoring() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    let (_, mut rx) = subscribe(&hub, 64).await;
    next_frame(&mut rx).await;

    like(&hub, "ghost", 0).await;
    let frames = drain(&mut rx);
    assert_eq!(names(&frames), vec!["like"]);
    assert_eq!(frames[0]["payload"]["likeCount"], 0);
    assert_eq!(hub.snapshot().await.unwrap().participants, 0);

    hub.inject("like", json!({ "username": "tapper" })).await.unwrap();
    let frames = drain(&mut rx);
    assert_eq!(frames[0]["payload"]["likeCount"], 1);
    assert_eq!(hub.snapshot().await.unwrap().participants, 1);
}

#[tokio::test]
async fn late_joiner_receives_current_status() {
    let source = MemorySource::new();
    let hub = hub_with(&source);

    let outcome = hub.configure("  streamer ").await.unwrap();
    assert_eq!(outcome.username, "streamer");
    assert!(outcome.connected);

    let (_, mut rx) = subscribe(&hub, 16).await;
    let status = next_frame(&mut rx).await;
    assert_eq!(status["event"], "status");
    assert_eq!(status["payload"]["connected"], true);
    assert_eq!(status["payload"]["username"], "streamer");
}

#[tokio::test]
async fn idle_hub_reports_disconnected_status_on_register() {
    let source = MemorySource::new();
    let hub = hub_with(&source);

    let (_, mut rx) = subscribe(&hub, 16).await;
    let status = next_frame(&mut rx).await;
    assert_eq!(status["payload"]["connected"], false);
    assert!(status["payload"]["username"].is_null());
}

#[tokio::test]
async fn disconnect_keeps_every_subscriber() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    hub.configure("streamer").await.unwrap();

    let mut clients = Vec::new();
    for _ in 0..3 {
        let (_, mut rx) = subscribe(&hub, 64).await;
        next_frame(&mut rx).await;
        clients.push(rx);
    }
    for (user, count) in [("a", 5), ("b", 4), ("c", 3)] {
        like(&hub, user, count).await;
    }
    assert_eq!(hub.snapshot().await.unwrap().leaderboard.len(), 3);

    assert!(hub.disconnect().await.unwrap());

    for rx in &mut clients {
        let frames = drain(rx);
        let tail = &frames[frames.len() - 2..];
        assert_eq!(names(tail), vec!["disconnected", "status"]);
        assert_eq!(tail[1]["payload"]["connected"], false);
    }

    let snapshot = hub.snapshot().await.unwrap();
    assert_eq!(snapshot.subscribers, 3);
    assert_eq!(snapshot.participants, 0);
    assert!(snapshot.leaderboard.is_empty());
    assert!(!snapshot.upstream.is_connected());
    assert_eq!(source.open_streams(), 0);
}

#[tokio::test]
async fn disconnect_when_idle_is_a_quiet_no_op() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    let (_, mut rx) = subscribe(&hub, 16).await;
    next_frame(&mut rx).await;

    assert!(!hub.disconnect().await.unwrap());
    assert!(!hub.disconnect().await.unwrap());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn reconfigure_starts_the_new_session_from_zero() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    let (_, mut rx) = subscribe(&hub, 64).await;
    next_frame(&mut rx).await;

    hub.configure("first").await.unwrap();
    like(&hub, "alice", 40).await;
    assert_eq!(hub.snapshot().await.unwrap().participants, 1);

    hub.configure("second").await.unwrap();

    // the old stream is closed before the new one is dialed
    assert_eq!(source.open_streams_for("first"), 0);
    assert_eq!(source.open_streams_for("second"), 1);
    assert_eq!(source.open_streams(), 1);

    let snapshot = hub.snapshot().await.unwrap();
    assert_eq!(snapshot.participants, 0);
    assert!(snapshot.leaderboard.is_empty());
    assert_eq!(snapshot.upstream.channel.as_deref(), Some("second"));

    like(&hub, "alice", 2).await;
    let snapshot = hub.snapshot().await.unwrap();
    assert_eq!(snapshot.leaderboard[0].score, 2);

    let frames = drain(&mut rx);
    let statuses: Vec<&Value> = frames.iter().filter(|f| f["event"] == "status").collect();
    assert_eq!(statuses.last().unwrap()["payload"]["username"], "second");
    assert!(names(&frames).contains(&"disconnected"));
}

#[tokio::test]
async fn newer_configure_supersedes_a_pending_one() {
    let source = MemorySource::new();
    source.delay("slow", Duration::from_millis(500));
    let hub = hub_with(&source);

    let pending = {
        let hub = hub.clone();
        tokio::spawn(async move { hub.configure("slow").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fast = hub.configure("fast").await.unwrap();
    assert_eq!(fast.username, "fast");

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(err.code(), "SUPERSEDED");

    let snapshot = hub.snapshot().await.unwrap();
    assert_eq!(snapshot.upstream.channel.as_deref(), Some("fast"));
    assert_eq!(source.open_streams_for("slow"), 0);
}

#[tokio::test]
async fn blank_username_is_rejected_without_broadcast() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    hub.configure("streamer").await.unwrap();
    let (_, mut rx) = subscribe(&hub, 16).await;
    next_frame(&mut rx).await;

    let err = hub.configure("   ").await.unwrap_err();
    assert_eq!(err.code(), "INVALID_CHANNEL");
    assert!(drain(&mut rx).is_empty());

    // the running session is untouched
    assert!(hub.snapshot().await.unwrap().upstream.is_connected());
}

#[tokio::test]
async fn connect_failure_is_reported_to_caller_and_subscribers() {
    let source = MemorySource::new();
    source.reject("offline_user", "user is not live");
    let hub = hub_with(&source);
    let (_, mut rx) = subscribe(&hub, 16).await;
    next_frame(&mut rx).await;

    let err = hub.configure("offline_user").await.unwrap_err();
    assert_eq!(err.code(), "UPSTREAM_ERROR");
    assert!(err.to_string().contains("user is not live"));

    let frames = drain(&mut rx);
    assert_eq!(names(&frames), vec!["error"]);
    assert!(frames[0]["payload"]["message"]
        .as_str()
        .unwrap()
        .contains("user is not live"));
    assert!(!hub.snapshot().await.unwrap().upstream.is_connected());

    // a later configure can still succeed
    hub.configure("someone_else").await.unwrap();
}

#[tokio::test]
async fn platform_events_are_normalized_and_relayed() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    hub.configure("streamer").await.unwrap();
    let (_, mut rx) = subscribe(&hub, 16).await;
    next_frame(&mut rx).await;

    source.push(
        "streamer",
        RawEvent::new(
            "chat",
            json!({ "uniqueId": "viewer1", "nickname": "Viewer", "comment": "hi" }),
        ),
    );
    let chat = next_frame(&mut rx).await;
    assert_eq!(chat["event"], "chat");
    assert_eq!(chat["payload"]["username"], "viewer1");
    assert_eq!(chat["payload"]["comment"], "hi");

    source.push("streamer", RawEvent::new("like", json!({ "uniqueId": "viewer1", "likeCount": "7" })));
    let like = next_frame(&mut rx).await;
    assert_eq!(like["payload"]["likeCount"], 7);
}

#[tokio::test]
async fn fatal_upstream_error_ends_the_session() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    hub.configure("streamer").await.unwrap();
    let (_, mut rx) = subscribe(&hub, 16).await;
    next_frame(&mut rx).await;

    source.fail("streamer", || UpstreamError::StreamTerminated("socket reset".into()));

    assert_eq!(next_frame(&mut rx).await["event"], "error");
    assert_eq!(next_frame(&mut rx).await["event"], "disconnected");
    let status = next_frame(&mut rx).await;
    assert_eq!(status["payload"]["connected"], false);
    assert!(!hub.snapshot().await.unwrap().upstream.is_connected());
}

#[tokio::test]
async fn recoverable_upstream_errors_keep_the_session() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    hub.configure("streamer").await.unwrap();
    let (_, mut rx) = subscribe(&hub, 16).await;
    next_frame(&mut rx).await;

    source.fail("streamer", || UpstreamError::Platform("rate limited".into()));
    let error = next_frame(&mut rx).await;
    assert_eq!(error["event"], "error");
    assert!(error["payload"]["message"]
        .as_str()
        .unwrap()
        .contains("rate limited"));

    // in-band platform error event
    source.push("streamer", RawEvent::new("error", json!({ "message": "captcha" })));
    let error = next_frame(&mut rx).await;
    assert_eq!(error["event"], "error");
    assert_eq!(error["payload"]["message"], "captcha");

    // the stream is still live and relaying
    source.push("streamer", RawEvent::new("member", json!({ "uniqueId": "late" })));
    assert_eq!(next_frame(&mut rx).await["event"], "member");

    assert!(drain(&mut rx).is_empty());
    assert!(hub.snapshot().await.unwrap().upstream.is_connected());
    assert_eq!(source.open_streams_for("streamer"), 1);
}

#[tokio::test]
async fn stream_end_from_platform_disconnects() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    hub.configure("streamer").await.unwrap();
    let (_, mut rx) = subscribe(&hub, 16).await;
    next_frame(&mut rx).await;

    source.push("streamer", RawEvent::new("streamEnd", json!({})));

    assert_eq!(next_frame(&mut rx).await["event"], "disconnected");
    assert_eq!(next_frame(&mut rx).await["event"], "status");
}

#[tokio::test]
async fn slow_subscriber_does_not_hold_back_others() {
    let source = MemorySource::new();
    let hub = hub_with(&source);

    // capacity 1, already filled by the status frame and never drained
    let (_, _stalled) = subscribe(&hub, 1).await;
    let (_, mut rx) = subscribe(&hub, 64).await;
    next_frame(&mut rx).await;

    for i in 0..10 {
        like(&hub, &format!("user{i}"), 1).await;
    }
    let frames = drain(&mut rx);
    assert_eq!(frames.iter().filter(|f| f["event"] == "like").count(), 10);
    assert_eq!(hub.snapshot().await.unwrap().subscribers, 2);
}

#[tokio::test]
async fn closed_subscriber_is_dropped_on_next_publish() {
    let source = MemorySource::new();
    let hub = hub_with(&source);
    let (_, rx) = subscribe(&hub, 16).await;
    drop(rx);
    let (conn_id, _keep) = subscribe(&hub, 16).await;

    like(&hub, "alice", 1).await;
    assert_eq!(hub.snapshot().await.unwrap().subscribers, 1);

    hub.unregister(conn_id.clone()).await;
    hub.unregister(conn_id).await;
    assert_eq!(hub.snapshot().await.unwrap().subscribers, 0);
}

#[tokio::test]
async fn unknown_injected_kind_is_invalid_params() {
    let source = MemorySource::new();
    let hub = hub_with(&source);

    let err = hub.inject("streamEnd", json!({})).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_PARAMS");
}
