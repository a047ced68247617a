#![allow(clippy::unwrap_used, clippy::expect_used)]

use fieldreport_channels::{
    BotApi, Channel, ChannelEvent, TelegramChannel, TelegramNotifier, MAX_MESSAGE_CHARS,
};
use fieldreport_core::{ActionId, EventKind, OutboundPrompt};
use fieldreport_sinks::{MediaAttachment, MediaKind, NotificationDispatcher, SinkError};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123:abc";

fn api(server: &MockServer) -> BotApi {
    BotApi::new(TOKEN, reqwest::Client::new()).with_api_base(server.uri())
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": result}))
}

#[tokio::test]
async fn send_renders_inline_keyboard() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_json(json!({
            "chat_id": "42",
            "text": "Visit type?",
            "reply_markup": {"inline_keyboard": [
                [{"text": "Productive", "callback_data": "pick:success"}],
                [{"text": "Outdated", "callback_data": "pick:outdated"}]
            ]}
        })))
        .respond_with(ok(json!({"message_id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let channel = TelegramChannel::new(api(&server), 8);
    let prompt = OutboundPrompt::text("Visit type?")
        .with_button("Productive", &ActionId::Pick("success".into()))
        .with_button("Outdated", &ActionId::Pick("outdated".into()));
    channel.send("42", &prompt).await.unwrap();
}

#[tokio::test]
async fn send_without_buttons_omits_markup() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_json(json!({"chat_id": "42", "text": "Object?"})))
        .respond_with(ok(json!({"message_id": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let channel = TelegramChannel::new(api(&server), 8);
    channel.send("42", &OutboundPrompt::text("Object?")).await.unwrap();
}

/// Bodies of every `sendMessage` call the server saw, in order.
async fn sent_messages(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().ends_with("/sendMessage"))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn long_summary_is_split_with_keyboard_last() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ok(json!({"message_id": 1})))
        .expect(3)
        .mount(&server)
        .await;

    let answer = "y".repeat(1000);
    let lines: Vec<String> = (1..=9).map(|i| format!("Step {i}: {answer}")).collect();
    let summary = format!("Please check your report:\n\n{}", lines.join("\n"));
    assert!(summary.chars().count() > MAX_MESSAGE_CHARS);

    let prompt = OutboundPrompt::text(summary.as_str())
        .with_button("Confirm", &ActionId::Confirm)
        .with_button("Cancel", &ActionId::Cancel);
    let channel = TelegramChannel::new(api(&server), 8);
    channel.send("42", &prompt).await.unwrap();

    let sent = sent_messages(&server).await;
    assert_eq!(sent.len(), 3);
    for body in &sent {
        assert!(body["text"].as_str().unwrap().chars().count() <= MAX_MESSAGE_CHARS);
    }
    assert!(sent[0].get("reply_markup").is_none());
    assert!(sent[1].get("reply_markup").is_none());
    assert_eq!(
        sent[2]["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
        "confirm"
    );
    assert!(sent[0]["text"].as_str().unwrap().starts_with("Please check your report:"));
    assert!(sent[2]["text"].as_str().unwrap().ends_with(&answer));
}

#[tokio::test]
async fn send_surfaces_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "ok": false, "error_code": 403, "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&server)
        .await;

    let channel = TelegramChannel::new(api(&server), 8);
    let err = channel.send("42", &OutboundPrompt::text("hi")).await.unwrap_err();
    assert!(err.to_string().contains("bot was blocked"));
}

#[tokio::test]
async fn poll_forwards_updates_until_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .respond_with(ok(json!([
            {"update_id": 10, "message": {
                "message_id": 1, "date": 0,
                "from": {"id": 42, "is_bot": false, "first_name": "Dana", "username": "dana"},
                "chat": {"id": 42, "type": "private"},
                "text": "/start"
            }},
            {"update_id": 11, "edited_message": {"message_id": 1}},
            {"update_id": 12, "callback_query": {
                "id": "cb-1", "chat_instance": "x", "data": "done",
                "from": {"id": 42, "is_bot": false, "first_name": "Dana"}
            }}
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .and(body_partial_json(json!({"offset": 13})))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "ok": false, "description": "Conflict: can't use getUpdates method while webhook is active"
        })))
        .mount(&server)
        .await;

    let mut channel = TelegramChannel::new(api(&server), 8);
    let mut rx = channel.take_event_receiver().unwrap();
    assert!(channel.take_event_receiver().is_none());

    let err = channel.poll_updates().await.unwrap_err();
    assert!(err.to_string().contains("Conflict"));

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            ChannelEvent::UpdateReceived(update) => kinds.push(update.event.unwrap().kind),
            ChannelEvent::Disconnected(reason) => assert!(reason.contains("Conflict")),
        }
    }
    assert_eq!(kinds, vec![EventKind::Start, EventKind::Done]);
}

#[tokio::test]
async fn webhook_and_callback_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/setWebhook")))
        .and(body_partial_json(json!({"url": "https://bot.example.com/webhook"})))
        .respond_with(ok(json!(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/answerCallbackQuery")))
        .and(body_json(json!({"callback_query_id": "cb-9"})))
        .respond_with(ok(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let channel = TelegramChannel::new(api(&server), 8);
    channel.set_webhook("https://bot.example.com/webhook").await.unwrap();
    channel.acknowledge("cb-9").await.unwrap();
}

// --- Notifier ---

#[tokio::test]
async fn notifier_posts_text_into_thread() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_json(json!({
            "chat_id": "-1001234",
            "message_thread_id": 7,
            "text": "New report from @dana"
        })))
        .respond_with(ok(json!({"message_id": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(api(&server), "-1001234").with_thread(Some(7));
    notifier.send_text("New report from @dana").await.unwrap();
}

#[tokio::test]
async fn notifier_splits_long_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({"chat_id": "-1001234", "message_thread_id": 7})))
        .respond_with(ok(json!({"message_id": 3})))
        .expect(2)
        .mount(&server)
        .await;

    let text = format!("New report from @dana\n\n{}", "z".repeat(MAX_MESSAGE_CHARS));
    let notifier = TelegramNotifier::new(api(&server), "-1001234").with_thread(Some(7));
    notifier.send_text(&text).await.unwrap();

    let sent = sent_messages(&server).await;
    assert_eq!(sent[0]["text"], "New report from @dana\n");
    assert_eq!(sent[1]["text"].as_str().unwrap().len(), MAX_MESSAGE_CHARS);
}

#[tokio::test]
async fn notifier_sends_photo_and_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendPhoto")))
        .and(body_json(json!({
            "chat_id": "-1001234",
            "photo": "https://storage.googleapis.com/b/AQAD.jpg",
            "caption": "New report"
        })))
        .respond_with(ok(json!({"message_id": 4})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendDocument")))
        .and(body_partial_json(json!({"document": "BQAC"})))
        .respond_with(ok(json!({"message_id": 5})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(api(&server), "-1001234");
    let photo = MediaAttachment {
        reference: "https://storage.googleapis.com/b/AQAD.jpg".into(),
        kind: MediaKind::Photo,
    };
    notifier.send_media_with_caption(&photo, "New report").await.unwrap();

    let document = MediaAttachment {
        reference: "BQAC".into(),
        kind: MediaKind::Document,
    };
    notifier.send_media_with_caption(&document, "New report").await.unwrap();
}

#[tokio::test]
async fn notifier_classifies_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false, "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let rejected = TelegramNotifier::new(api(&server), "nope")
        .send_text("x")
        .await
        .unwrap_err();
    assert!(matches!(rejected, SinkError::Rejected(msg) if msg.contains("chat not found")));

    let offline = BotApi::new(TOKEN, reqwest::Client::new()).with_api_base("http://127.0.0.1:1");
    let unreachable = TelegramNotifier::new(offline, "-1").send_text("x").await.unwrap_err();
    assert!(matches!(unreachable, SinkError::Unreachable(_)));
}
