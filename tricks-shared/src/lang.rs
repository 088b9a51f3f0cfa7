/// Localized flash messages
///
/// Messages are addressed by dotted keys (`user_tricks.trick_updated`) so the
/// catalogue can grow more locales without touching handlers. Only English
/// ships today.

/// Flash messages shown after trick mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    TrickUpdated,
    TrickDeleted,
    TrickArchiveDeleted,
}

impl Message {
    /// Catalogue key
    pub fn key(&self) -> &'static str {
        match self {
            Message::TrickUpdated => "user_tricks.trick_updated",
            Message::TrickDeleted => "user_tricks.trick_deleted",
            Message::TrickArchiveDeleted => "user_tricks.trick_archive_deleted",
        }
    }

    /// English text
    pub fn text(&self) -> &'static str {
        match self {
            Message::TrickUpdated => "The trick has been updated.",
            Message::TrickDeleted => "The trick has been deleted.",
            Message::TrickArchiveDeleted => "The trick archive has been deleted.",
        }
    }
}
