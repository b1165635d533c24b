use crate::domain::{ChatId, MessageRef, UserId};

/// Cross-messenger incoming message.
///
/// Telegram-specific fields stay in the Telegram adapter; non-text messages arrive
/// with `text: None`.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message: MessageRef,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub text: Option<String>,
}

/// Reply keyboard (persistent buttons under the input field).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub resize: bool,
    pub one_time: bool,
}

impl ReplyKeyboard {
    /// Lay `labels` out `per_row` buttons per row.
    pub fn grid(labels: &[&str], per_row: usize) -> Self {
        let rows = labels
            .chunks(per_row.max(1))
            .map(|row| row.iter().map(|l| l.to_string()).collect())
            .collect();
        Self {
            rows,
            resize: false,
            one_time: false,
        }
    }

    pub fn resized(mut self) -> Self {
        self.resize = true;
        self
    }

    pub fn one_time(mut self) -> Self {
        self.one_time = true;
        self
    }
}

/// Membership status of a user in a chat, as reported by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    /// Creators and administrators may run admin commands.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator)
    }
}
