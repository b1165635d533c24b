//! Telegram update → core message conversion.

use teloxide::types::Message;

use sbot_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::IncomingMessage,
};

/// Strip a Telegram message down to what the command processor needs.
///
/// Non-text messages (photos, stickers, ...) keep `text: None` so they still get
/// the "invalid option" reply.
pub fn incoming_message(msg: &Message) -> IncomingMessage {
    let chat_id = ChatId(msg.chat.id.0);
    let user = msg.from();
    IncomingMessage {
        chat_id,
        message: MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        },
        user_id: user.map(|u| UserId(u.id.0 as i64)),
        username: user.and_then(|u| u.username.clone()),
        text: msg.text().map(|s| s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Message {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn converts_text_message() {
        let msg = parse(json!({
            "message_id": 77,
            "date": 1760000000,
            "chat": { "id": 42, "type": "private", "first_name": "Ann" },
            "from": { "id": 42, "is_bot": false, "first_name": "Ann", "username": "ann" },
            "text": "/approve 1 2 3"
        }));

        let incoming = incoming_message(&msg);
        assert_eq!(incoming.chat_id, ChatId(42));
        assert_eq!(incoming.message.message_id, MessageId(77));
        assert_eq!(incoming.user_id, Some(UserId(42)));
        assert_eq!(incoming.username.as_deref(), Some("ann"));
        assert_eq!(incoming.text.as_deref(), Some("/approve 1 2 3"));
    }

    #[test]
    fn sticker_like_message_has_no_text() {
        let msg = parse(json!({
            "message_id": 5,
            "date": 1760000000,
            "chat": { "id": 42, "type": "private", "first_name": "Ann" },
            "from": { "id": 42, "is_bot": false, "first_name": "Ann" },
            "dice": { "emoji": "🎲", "value": 3 }
        }));

        let incoming = incoming_message(&msg);
        assert_eq!(incoming.text, None);
        assert_eq!(incoming.username, None);
    }
}
