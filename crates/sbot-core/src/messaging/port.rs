use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, UserId},
    messaging::types::{MemberStatus, ReplyKeyboard},
    Result,
};

/// Outbound messaging port.
///
/// Telegram is the only implementation today; all text is Telegram-style HTML.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Send `html` to the chat of `to`, quoting it.
    async fn reply_html(&self, to: MessageRef, html: &str) -> Result<MessageRef>;

    async fn send_reply_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageRef>;
}

/// Live chat-membership lookup, used as the authorization signal for admin commands.
#[async_trait]
pub trait MembershipPort: Send + Sync {
    async fn member_status(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberStatus>;
}
