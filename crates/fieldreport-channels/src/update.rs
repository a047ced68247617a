use crate::channel::ChannelUpdate;
use fieldreport_core::{ActionId, EventKind, InboundEvent, MediaKind, TransportFileRef};
use serde::Deserialize;

/// Telegram always re-encodes photos as JPEG.
const PHOTO_MIME: &str = "image/jpeg";

/// One entry of `getUpdates` or one webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// One resolution of a sent photo.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_unique_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// A pressed inline keyboard button.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

/// Map a raw update to a [`ChannelUpdate`].
///
/// Returns `None` for updates that carry nothing to act on (edits, stickers,
/// service messages). Button presses always produce an update so they can be
/// acknowledged, even when their payload is not understood.
pub fn parse_update(update: &Update) -> Option<ChannelUpdate> {
    if let Some(query) = &update.callback_query {
        let chat_id = query.message.as_ref().map_or(query.from.id, |m| m.chat.id);
        let event = query
            .data
            .as_deref()
            .and_then(ActionId::parse)
            .map(|action| inbound(&query.from, chat_id, action.into()));
        return Some(ChannelUpdate {
            event,
            callback_id: Some(query.id.clone()),
        });
    }

    let message = update.message.as_ref()?;
    let from = message.from.as_ref()?;
    let kind = message_kind(message)?;
    Some(ChannelUpdate {
        event: Some(inbound(from, message.chat.id, kind)),
        callback_id: None,
    })
}

fn inbound(user: &User, chat_id: i64, kind: EventKind) -> InboundEvent {
    let event = InboundEvent::new(user.id.to_string(), chat_id.to_string(), kind);
    match &user.username {
        Some(name) => event.with_username(name.as_str()),
        None => event,
    }
}

fn message_kind(message: &Message) -> Option<EventKind> {
    if let Some(text) = &message.text {
        return Some(match command(text) {
            Some("start") => EventKind::Start,
            Some("cancel") => EventKind::Cancel,
            _ => EventKind::Text(text.clone()),
        });
    }

    if let Some(photo) = message.photo.as_deref().and_then(largest_photo) {
        return Some(EventKind::MediaSubmitted(TransportFileRef {
            file_id: photo.file_id.clone(),
            file_unique_id: photo.file_unique_id.clone(),
            file_name: None,
            mime_type: Some(PHOTO_MIME.to_string()),
            file_size: photo.file_size,
            kind: MediaKind::Photo,
        }));
    }

    message.document.as_ref().map(|doc| {
        EventKind::MediaSubmitted(TransportFileRef {
            file_id: doc.file_id.clone(),
            file_unique_id: doc.file_unique_id.clone(),
            file_name: doc.file_name.clone(),
            mime_type: doc.mime_type.clone(),
            file_size: doc.file_size,
            kind: MediaKind::Document,
        })
    })
}

/// `/start`, `/start@my_bot`, `/start payload` → `start`.
fn command(text: &str) -> Option<&str> {
    let word = text.strip_prefix('/')?.split_whitespace().next()?;
    word.split('@').next()
}

fn largest_photo(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes
        .iter()
        .max_by_key(|p| (u64::from(p.width) * u64::from(p.height), p.file_size.unwrap_or(0)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Option<ChannelUpdate> {
        let update: Update = serde_json::from_value(value).unwrap();
        parse_update(&update)
    }

    fn message(extra: serde_json::Value) -> serde_json::Value {
        let mut msg = json!({
            "message_id": 7,
            "from": {"id": 42, "is_bot": false, "first_name": "Dana", "username": "dana"},
            "chat": {"id": 42, "type": "private"},
            "date": 1_700_000_000
        });
        msg.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        json!({"update_id": 1, "message": msg})
    }

    fn kind(update: Option<ChannelUpdate>) -> EventKind {
        update.unwrap().event.unwrap().kind
    }

    #[test]
    fn commands_map_to_lifecycle_events() {
        assert_eq!(kind(parse(message(json!({"text": "/start"})))), EventKind::Start);
        assert_eq!(kind(parse(message(json!({"text": "/start@field_bot"})))), EventKind::Start);
        assert_eq!(kind(parse(message(json!({"text": "/cancel"})))), EventKind::Cancel);
        assert_eq!(
            kind(parse(message(json!({"text": "/help"})))),
            EventKind::Text("/help".into())
        );
    }

    #[test]
    fn text_keeps_identity() {
        let event = parse(message(json!({"text": "Bridge"}))).unwrap().event.unwrap();
        assert_eq!(event.user_id, "42");
        assert_eq!(event.chat_id, "42");
        assert_eq!(event.submitter(), "@dana");
        assert_eq!(event.kind, EventKind::Text("Bridge".into()));
    }

    #[test]
    fn photo_picks_largest_size() {
        let update = parse(message(json!({
            "photo": [
                {"file_id": "small", "file_unique_id": "s", "width": 90, "height": 60, "file_size": 1000},
                {"file_id": "big", "file_unique_id": "b", "width": 1280, "height": 853, "file_size": 90000},
                {"file_id": "mid", "file_unique_id": "m", "width": 320, "height": 213, "file_size": 9000}
            ],
            "caption": "site"
        })));
        match kind(update) {
            EventKind::MediaSubmitted(file) => {
                assert_eq!(file.file_id, "big");
                assert_eq!(file.mime_type.as_deref(), Some("image/jpeg"));
                assert_eq!(file.file_size, Some(90000));
                assert_eq!(file.kind, MediaKind::Photo);
            }
            other => panic!("expected media, got {other:?}"),
        }
    }

    #[test]
    fn document_keeps_name_and_type() {
        let update = parse(message(json!({
            "document": {"file_id": "doc", "file_unique_id": "d1", "file_name": "plan.pdf", "mime_type": "application/pdf"}
        })));
        match kind(update) {
            EventKind::MediaSubmitted(file) => {
                assert_eq!(file.file_name.as_deref(), Some("plan.pdf"));
                assert_eq!(file.mime_type.as_deref(), Some("application/pdf"));
                assert_eq!(file.file_size, None);
                assert_eq!(file.kind, MediaKind::Document);
            }
            other => panic!("expected media, got {other:?}"),
        }
    }

    #[test]
    fn callback_data_is_decoded() {
        let update = parse(json!({
            "update_id": 2,
            "callback_query": {
                "id": "cb-1",
                "from": {"id": 42, "is_bot": false, "first_name": "Dana"},
                "message": {"message_id": 9, "chat": {"id": -100}, "date": 0},
                "chat_instance": "x",
                "data": "toggle:@bob"
            }
        }))
        .unwrap();
        assert_eq!(update.callback_id.as_deref(), Some("cb-1"));
        let event = update.event.unwrap();
        assert_eq!(event.chat_id, "-100");
        assert_eq!(event.kind, EventKind::ToggleChoice("@bob".into()));
        assert_eq!(event.submitter(), "42");
    }

    #[test]
    fn unknown_callback_is_still_acknowledged() {
        let update = parse(json!({
            "update_id": 3,
            "callback_query": {
                "id": "cb-2",
                "from": {"id": 42, "is_bot": false, "first_name": "Dana"},
                "chat_instance": "x",
                "data": "DONE_MAN"
            }
        }))
        .unwrap();
        assert_eq!(update.callback_id.as_deref(), Some("cb-2"));
        assert!(update.event.is_none());
    }

    #[test]
    fn non_actionable_updates_are_skipped() {
        assert!(parse(message(json!({"sticker": {"file_id": "x"}}))).is_none());
        assert!(parse(json!({"update_id": 4, "edited_message": {}})).is_none());
    }
}
