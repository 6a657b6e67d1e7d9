//! Push relay tests against a mocked ntfy server.

use chrono::Utc;
use mockito::Matcher;
use roastplan_core::alerts::{PushRelay, Reminder, ReminderSink};
use roastplan_core::DeliveryError;
use serde_json::json;

fn reminder(is_now: bool) -> Reminder {
    Reminder {
        title: "Cook: Beef (2 Joints) → Oven Top".into(),
        description: "230°C then 180°C fan".into(),
        is_now,
        event_time: Utc::now(),
        kind: None,
    }
}

/// Test: an urgent reminder is published with topic, headline and priority.
#[tokio::test]
async fn test_push_relay_publishes_json() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "topic": "xmas-kitchen",
            "title": "NOW: Cook: Beef (2 Joints) → Oven Top",
            "message": "230°C then 180°C fan",
            "priority": 5,
        })))
        .with_status(200)
        .with_body(r#"{"id":"abc"}"#)
        .create_async()
        .await;

    let relay = PushRelay::new(&server.url(), "xmas-kitchen").unwrap();
    relay.send(&reminder(true)).await.unwrap();
    mock.assert_async().await;
}

/// Test: a non-success answer surfaces as a status error.
#[tokio::test]
async fn test_push_relay_reports_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let relay = PushRelay::new(&server.url(), "xmas-kitchen").unwrap();
    let err = relay.send(&reminder(false)).await.unwrap_err();
    match err {
        DeliveryError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Test: delivering through the sink trait spawns the request and returns.
#[tokio::test]
async fn test_push_relay_sink_is_fire_and_forget() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "priority": 4 })))
        .with_status(200)
        .create_async()
        .await;

    let relay = PushRelay::new(&server.url(), "xmas-kitchen").unwrap();
    relay.deliver(&reminder(false)).unwrap();

    for _ in 0..50 {
        if mock.matched_async().await {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    mock.assert_async().await;
}
