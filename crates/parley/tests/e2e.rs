// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete chat pipeline.
//!
//! Each test creates an isolated TestHarness with temp SQLite, a mock
//! relay, and the real axum router. Tests are independent and
//! order-insensitive.

use parley_storage::queries::{messages, sessions};
use parley_test_utils::{TestHarness, TEST_CHANNEL_PREFIX};
use serde_json::json;

async fn settle_publishes() {
    // Relay fan-out runs on spawned tasks.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}

// ---- Test 1: Guided flow, no operator online ----

#[tokio::test(flavor = "multi_thread")]
async fn flow_walk_collects_contact_and_parks_in_waiting() {
    let harness = TestHarness::new().await;

    // Fresh widget bootstraps its flow and gets the greeting.
    let (status, body) = harness.post_json("/v1/sessions/s1/flow", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["flow"]["step"], "welcome");
    assert!(body["data"]["flow"]["prompt"]
        .as_str()
        .unwrap()
        .contains("How can we help"));

    // First message advances to the phone ask.
    let (status, body) = harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "my printer is haunted" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["flow"]["step"], "first_message_received");
    assert!(body["data"]["flow"]["prompt"]
        .as_str()
        .unwrap()
        .contains("mobile number"));

    // Invalid phone is rejected inline and does not advance.
    let (status, body) = harness
        .post_json("/v1/messages", json!({ "session_id": "s1", "text": "123" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["flow"]["step"], "first_message_received");
    assert!(body["data"]["flow"]["error"]
        .as_str()
        .unwrap()
        .contains("valid mobile number"));

    // Valid phone advances to the name ask.
    let (_, body) = harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "09123456789" }),
        )
        .await;
    assert_eq!(body["data"]["flow"]["step"], "name_received");

    // Name completes collection; with nobody online the session parks.
    let (_, body) = harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "Acme Co" }),
        )
        .await;
    assert_eq!(body["data"]["flow"]["step"], "waiting_for_admin");
    assert!(body["data"]["flow"]["prompt"]
        .as_str()
        .unwrap()
        .contains("away right now"));

    // Contact details landed on the session row.
    let session = sessions::get_session(&harness.db, "s1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.user_phone.as_deref(), Some("09123456789"));
    assert_eq!(session.user_name.as_deref(), Some("Acme Co"));
}

// ---- Test 2: Routing with an operator online ----

#[tokio::test(flavor = "multi_thread")]
async fn flow_routes_straight_to_chat_when_operator_is_online() {
    let harness = TestHarness::builder()
        .with_operator_online(true)
        .build()
        .await
        .unwrap();

    for text in ["hello", "09123456789"] {
        harness
            .post_json("/v1/messages", json!({ "session_id": "s1", "text": text }))
            .await;
    }
    let (_, body) = harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "Acme Co" }),
        )
        .await;
    assert_eq!(body["data"]["flow"]["step"], "chat_active");
    assert!(body["data"]["flow"]["prompt"]
        .as_str()
        .unwrap()
        .contains("connected"));
}

// ---- Test 3: Operator reply promotes a waiting session ----

#[tokio::test(flavor = "multi_thread")]
async fn operator_reply_promotes_waiting_session_to_connected() {
    let harness = TestHarness::new().await;
    for text in ["hello", "09123456789", "Acme Co"] {
        harness
            .post_json("/v1/messages", json!({ "session_id": "s1", "text": text }))
            .await;
    }

    let (status, body) = harness
        .post_json_auth(
            "/v1/operator/messages",
            json!({ "session_id": "s1", "text": "Hi, Sara here", "author_name": "Sara" }),
        )
        .await;
    assert_eq!(status, 200);
    assert!(body["data"]["message_id"].as_i64().unwrap() > 0);

    // The visitor's next message lands in free chat without a queue prompt.
    let (_, body) = harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "great, thanks" }),
        )
        .await;
    assert_eq!(body["data"]["flow"]["step"], "chat_active");
    assert!(body["data"]["flow"]["prompt"].is_null());
}

// ---- Test 4: Persistence and history ----

#[tokio::test(flavor = "multi_thread")]
async fn history_returns_user_and_system_messages_in_order() {
    let harness = TestHarness::new().await;
    harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "hello" }),
        )
        .await;

    let (status, body) = harness.get("/v1/sessions/s1/messages").await;
    assert_eq!(status, 200);
    let list = body["data"].as_array().unwrap();
    // Visitor message plus the flow's phone prompt.
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["author_kind"], "user");
    assert_eq!(list[0]["body"], "hello");
    assert_eq!(list[1]["author_kind"], "system");
    assert!(list[0]["id"].as_i64().unwrap() < list[1]["id"].as_i64().unwrap());

    // Incremental fetch returns only what came after.
    let after = list[0]["id"].as_i64().unwrap();
    let (_, body) = harness
        .get(&format!("/v1/sessions/s1/messages?after={after}"))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Unknown sessions yield an empty list; the widget polls early.
    let (status, body) = harness.get("/v1/sessions/nope/messages").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

// ---- Test 5: Relay fan-out ----

#[tokio::test(flavor = "multi_thread")]
async fn messages_and_session_creation_are_pushed() {
    let harness = TestHarness::new().await;
    harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "hello" }),
        )
        .await;
    settle_publishes().await;

    let session_channel = format!("{TEST_CHANNEL_PREFIX}-s1");
    let pushed = harness.relay.events_on(&session_channel, "new-message");
    // Visitor message and the flow prompt.
    assert_eq!(pushed.len(), 2);
    assert_eq!(pushed[0].payload["text"], "hello");
    assert!(pushed[0].payload["id"].as_i64().is_some());

    let broadcast = harness.relay.events_on(
        &format!("{TEST_CHANNEL_PREFIX}-operators"),
        "new-session-created",
    );
    assert_eq!(broadcast.len(), 1);
    assert_eq!(broadcast[0].payload["session_id"], "s1");
}

#[tokio::test(flavor = "multi_thread")]
async fn lead_capture_is_broadcast_to_operators() {
    let harness = TestHarness::new().await;
    for text in ["hello", "09123456789", "Acme Co"] {
        harness
            .post_json("/v1/messages", json!({ "session_id": "s1", "text": text }))
            .await;
    }
    settle_publishes().await;

    let leads = harness.relay.events_on(
        &format!("{TEST_CHANNEL_PREFIX}-operators"),
        "lead-captured",
    );
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].payload["phone"], "09123456789");
    assert_eq!(leads[0].payload["name"], "Acme Co");
}

// ---- Test 6: Relay outage never blocks chat ----

#[tokio::test(flavor = "multi_thread")]
async fn send_succeeds_while_relay_is_down() {
    let harness = TestHarness::new().await;
    harness.relay.set_fail_publish(true);

    let (status, body) = harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "hello" }),
        )
        .await;
    assert_eq!(status, 200);
    assert!(body["data"]["message_id"].as_i64().unwrap() > 0);

    // The message is durable and retrievable by polling.
    let stored = messages::get_messages_for_session(&harness.db, "s1")
        .await
        .unwrap();
    assert!(!stored.is_empty());
}

// ---- Test 7: Operator surface authentication ----

#[tokio::test(flavor = "multi_thread")]
async fn operator_routes_require_bearer_token() {
    let harness = TestHarness::new().await;

    let (status, _) = harness.get("/v1/sessions").await;
    assert_eq!(status, 401);

    let (status, body) = harness.get_auth("/v1/sessions").await;
    assert_eq!(status, 200);
    assert!(body["data"].as_array().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn operator_surface_fails_closed_without_configured_token() {
    let harness = TestHarness::builder()
        .without_operator_token()
        .build()
        .await
        .unwrap();

    // Even a well-formed bearer header is rejected.
    let (status, _) = harness.get_auth("/v1/sessions").await;
    assert_eq!(status, 401);
}

// ---- Test 8: Channel authorization ----

#[tokio::test(flavor = "multi_thread")]
async fn channel_authorization_scopes_visitors_to_their_session() {
    let harness = TestHarness::new().await;

    // A visitor may join their own session channel.
    let (status, body) = harness
        .post_json(
            "/v1/channels/authorize",
            json!({
                "socket_id": "81.1234",
                "channel_name": format!("{TEST_CHANNEL_PREFIX}-s1"),
                "session_id": "s1"
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert!(body["data"]["signature"].as_str().is_some());

    // Another visitor's channel is denied.
    let (status, _) = harness
        .post_json(
            "/v1/channels/authorize",
            json!({
                "socket_id": "81.1234",
                "channel_name": format!("{TEST_CHANNEL_PREFIX}-s2"),
                "session_id": "s1"
            }),
        )
        .await;
    assert_eq!(status, 403);

    // The operator broadcast channel has no session scope.
    let (status, _) = harness
        .post_json(
            "/v1/channels/authorize",
            json!({
                "socket_id": "81.1234",
                "channel_name": format!("{TEST_CHANNEL_PREFIX}-operators")
            }),
        )
        .await;
    assert_eq!(status, 200);
}

// ---- Test 9: Operator console listing and read receipts ----

#[tokio::test(flavor = "multi_thread")]
async fn session_list_counts_unread_and_marks_read() {
    let harness = TestHarness::new().await;
    harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "anyone there?" }),
        )
        .await;

    let (_, body) = harness.get_auth("/v1/sessions").await;
    let summaries = body["data"].as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["unread_count"], 1);

    let stored = messages::get_messages_for_session(&harness.db, "s1")
        .await
        .unwrap();
    let user_ids: Vec<i64> = stored
        .iter()
        .filter(|m| m.author_kind == "user")
        .map(|m| m.id)
        .collect();
    let (status, body) = harness
        .post_json_auth(
            "/v1/sessions/s1/read",
            json!({ "message_ids": user_ids }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["updated"], 1);

    let (_, body) = harness.get_auth("/v1/sessions").await;
    assert_eq!(body["data"][0]["unread_count"], 0);
}

// ---- Test 10: Presence heartbeat ----

#[tokio::test(flavor = "multi_thread")]
async fn heartbeat_is_recorded_and_broadcast() {
    let harness = TestHarness::new().await;

    let (status, _) = harness
        .post_json_auth("/v1/operator/heartbeat", json!({ "operator": "sara" }))
        .await;
    assert_eq!(status, 200);
    settle_publishes().await;

    let online = harness.relay.events_on(
        &format!("{TEST_CHANNEL_PREFIX}-operators"),
        "operator-online",
    );
    assert_eq!(online.len(), 1);
    assert_eq!(online[0].payload["operator"], "sara");

    let (status, _) = harness
        .post_json_auth(
            "/v1/operator/heartbeat",
            json!({ "operator": "sara", "online": false }),
        )
        .await;
    assert_eq!(status, 200);
}

// ---- Test 11: Flow disabled means plain chat ----

#[tokio::test(flavor = "multi_thread")]
async fn flow_disabled_persists_without_prompts() {
    let harness = TestHarness::builder()
        .with_flow_disabled()
        .build()
        .await
        .unwrap();

    let (status, body) = harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "hello" }),
        )
        .await;
    assert_eq!(status, 200);
    assert!(body["data"]["flow"].is_null());

    let stored = messages::get_messages_for_session(&harness.db, "s1")
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

// ---- Test 12: Input hygiene ----

#[tokio::test(flavor = "multi_thread")]
async fn empty_and_oversized_messages_are_rejected() {
    let harness = TestHarness::new().await;

    let (status, _) = harness
        .post_json("/v1/messages", json!({ "session_id": "s1", "text": "   " }))
        .await;
    assert_eq!(status, 400);

    let (status, _) = harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "x".repeat(4001) }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = harness
        .post_json("/v1/messages", json!({ "session_id": "", "text": "hi" }))
        .await;
    assert_eq!(status, 400);
}

// ---- Test 13: Direct contact submission ----

#[tokio::test(flavor = "multi_thread")]
async fn user_info_endpoint_validates_like_the_flow() {
    let harness = TestHarness::new().await;
    harness
        .post_json(
            "/v1/messages",
            json!({ "session_id": "s1", "text": "hello" }),
        )
        .await;

    let (status, _) = harness
        .post_json(
            "/v1/sessions/s1/user-info",
            json!({ "phone": "123", "name": "Acme Co" }),
        )
        .await;
    assert_eq!(status, 422);

    let (status, _) = harness
        .post_json(
            "/v1/sessions/s1/user-info",
            json!({ "phone": "09123456789", "name": "Acme Co" }),
        )
        .await;
    assert_eq!(status, 200);

    let session = sessions::get_session(&harness.db, "s1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.user_phone.as_deref(), Some("09123456789"));
}
